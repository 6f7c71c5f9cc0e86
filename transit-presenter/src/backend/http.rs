//! HTTP implementation of the optimization backend

use super::{Backend, BackendError};
use crate::form::RequestPayload;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::debug;

/// Backend reached over HTTP at a base URL
pub struct HttpBackend {
    client: Client,
    base_url: String,
    name: String,
}

impl HttpBackend {
    /// Create a backend with no request timeout
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, None)
    }

    /// Create a backend, optionally bounding each request
    pub fn with_timeout(base_url: impl Into<String>, timeout: Option<Duration>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let name = format!("http:{}", base_url);

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Self {
            client: builder.build().expect("Failed to create HTTP client"),
            base_url,
            name,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn post(&self, endpoint: &str, payload: &RequestPayload) -> Result<Value, BackendError> {
        let url = self.url(endpoint);
        let start = Instant::now();

        // .json() sets Content-Type: application/json
        let response = self.client.post(&url).json(payload).send().await?;
        let status = response.status();

        let body: Value = response.json().await?;

        debug!(
            url = %url,
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Backend responded"
        );

        if !status.is_success() {
            return Err(BackendError::from_error_body(status.as_u16(), &body));
        }

        Ok(body)
    }
}
