//! Conversions from external infrastructure errors into domain errors.

use cadence_domain::CadenceError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub CadenceError);

impl From<InfraError> for CadenceError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<CadenceError> for InfraError {
    fn from(value: CadenceError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoCadenceError {
    fn into_cadence(self) -> CadenceError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → CadenceError */
/* -------------------------------------------------------------------------- */

impl IntoCadenceError for SqlError {
    fn into_cadence(self) -> CadenceError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        CadenceError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        CadenceError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        CadenceError::Database("unique constraint violation".into())
                    }
                    (ErrorCode::CannotOpen, _) => {
                        CadenceError::Database(format!("unable to open database: {message}"))
                    }
                    _ => CadenceError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => CadenceError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                CadenceError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                CadenceError::Database(format!("invalid column type: {ty}"))
            }
            RE::InvalidPath(path) => CadenceError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => CadenceError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_cadence())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → CadenceError */
/* -------------------------------------------------------------------------- */

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(CadenceError::Database(format!("connection pool error: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → CadenceError */
/* -------------------------------------------------------------------------- */

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(CadenceError::Internal(format!("JSON serialization failed: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → CadenceError */
/* -------------------------------------------------------------------------- */

impl IntoCadenceError for HttpError {
    fn into_cadence(self) -> CadenceError {
        if self.is_timeout() {
            return CadenceError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return CadenceError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            return status_error(status, None);
        }

        if self.is_decode() {
            return CadenceError::Network(format!("failed to decode HTTP response: {self}"));
        }

        CadenceError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_cadence())
    }
}

/// Map a non-success HTTP status (and optional response body) to a domain
/// error.
pub fn status_error(status: reqwest::StatusCode, body: Option<&str>) -> CadenceError {
    let code = status.as_u16();
    let mut message =
        format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));
    if let Some(body) = body.map(str::trim).filter(|body| !body.is_empty()) {
        message.push_str(": ");
        message.push_str(body);
    }

    match code {
        401 | 403 => CadenceError::Auth(message),
        404 => CadenceError::NotFound(message),
        400..=499 if code != 429 => CadenceError::InvalidInput(message),
        _ => CadenceError::Network(message),
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
