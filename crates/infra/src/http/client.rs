use std::time::Duration;

use cadence_domain::CadenceError;
use reqwest::{Client as ReqwestClient, Method, Request, RequestBuilder, Response, StatusCode};
use tracing::debug;

use crate::errors::InfraError;

/// HTTP client with timeout and retry support.
///
/// Only idempotent methods are retried. Anything else (event creation in
/// particular) is sent exactly once, so a lost response can never produce a
/// duplicate calendar event.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    retry: RetryPolicy,
}

/// Attempt budget and exponential backoff for idempotent requests.
#[derive(Debug, Clone, Copy)]
struct RetryPolicy {
    max_attempts: usize,
    base_backoff: Duration,
}

impl RetryPolicy {
    /// Attempts granted to `method`.
    fn attempts_for(self, method: &Method) -> usize {
        let idempotent = matches!(
            *method,
            Method::GET | Method::HEAD | Method::OPTIONS | Method::PUT | Method::DELETE
        );
        if idempotent {
            self.max_attempts
        } else {
            1
        }
    }

    /// Delay before retry number `retry` (1-based), doubling each time.
    fn delay_before(self, retry: usize) -> Duration {
        let shift = u32::try_from(retry.saturating_sub(1).min(8)).unwrap_or(8);
        self.base_backoff.saturating_mul(1u32 << shift)
    }
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Client with default timeout and retry settings.
    pub fn new() -> Result<Self, CadenceError> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Send with retries when the method is idempotent, once otherwise.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, CadenceError> {
        let request = build_request(builder)?;
        let attempts = self.retry.attempts_for(request.method());
        self.execute(request, attempts).await
    }

    /// Execute the request exactly once.
    pub async fn send_once(&self, builder: RequestBuilder) -> Result<Response, CadenceError> {
        self.execute(build_request(builder)?, 1).await
    }

    async fn execute(&self, request: Request, attempts: usize) -> Result<Response, CadenceError> {
        let method = request.method().clone();
        let url = request.url().clone();
        let mut pending = Some(request);

        for attempt in 1..=attempts {
            let is_last = attempt == attempts;
            // Keep a copy only while another attempt may follow.
            let current = match pending.take() {
                Some(request) if !is_last => {
                    pending = request.try_clone();
                    request
                }
                Some(request) => request,
                None => break,
            };

            debug!(attempt, %method, %url, "sending HTTP request");
            match self.client.execute(current).await {
                Ok(response) if !is_last && is_retryable_status(response.status()) => {
                    let status = response.status();
                    debug!(attempt, %method, %url, %status, "retrying HTTP request");
                }
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt, %method, %url, %status, "received HTTP response");
                    return Ok(response);
                }
                Err(err) if !is_last && is_retryable_error(&err) => {
                    debug!(attempt, %method, %url, error = %err, "retrying failed HTTP request");
                }
                Err(err) => return Err(InfraError::from(err).into()),
            }

            if pending.is_none() {
                return Err(CadenceError::Internal(
                    "request body cannot be cloned; buffer the body to enable retries".into(),
                ));
            }
            let delay = self.retry.delay_before(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        Err(CadenceError::Internal(format!("{method} {url} produced no response")))
    }
}

fn build_request(builder: RequestBuilder) -> Result<Request, CadenceError> {
    builder.build().map_err(|err| InfraError::from(err).into())
}

/// 5xx and rate limiting; Google answers 429 under quota pressure.
fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
    user_agent: Option<String>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            base_backoff: Duration::from_millis(200),
            user_agent: None,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total attempts for idempotent requests (initial try + retries).
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<HttpClient, CadenceError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();
        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }
        let client = builder.build().map_err(InfraError::from)?;

        Ok(HttpClient {
            client,
            retry: RetryPolicy { max_attempts: self.max_attempts, base_backoff: self.base_backoff },
        })
    }
}
