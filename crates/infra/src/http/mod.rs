//! HTTP client with timeout and retry support

pub mod client;

pub use client::{HttpClient, HttpClientBuilder};
