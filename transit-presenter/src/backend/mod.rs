//! Optimization backend abstraction

mod http;

pub use http::HttpBackend;

use crate::form::RequestPayload;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when calling the optimization backend
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Non-success status with a JSON body
    #[error("{message}")]
    ServerError { status: u16, message: String },

    #[error("Connection failed: {0}")]
    ConnectionError(String),
}

impl BackendError {
    /// Build a server error from a non-success status and its JSON body
    pub fn from_error_body(status: u16, body: &Value) -> Self {
        let message = body
            .get("error")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or("Unknown error")
            .to_string();
        BackendError::ServerError { status, message }
    }

    /// True when the server answered and reported the failure itself
    pub fn is_server_reported(&self) -> bool {
        matches!(self, BackendError::ServerError { .. })
    }
}

/// Trait for optimization backends
#[async_trait]
pub trait Backend: Send + Sync {
    /// Backend name for logging/identification
    fn name(&self) -> &str;

    /// POST the payload as JSON to `endpoint` and return the decoded body
    async fn post(&self, endpoint: &str, payload: &RequestPayload) -> Result<Value, BackendError>;
}
