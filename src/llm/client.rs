//! LLM HTTP Client
//!
//! This module provides a reusable HTTP client for making requests to LLM APIs,
//! with built-in retry logic, exponential backoff, and error handling.

use crate::error::{RecordForgeError, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Default maximum number of retry attempts
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default initial retry delay in milliseconds
const DEFAULT_INITIAL_DELAY_MS: u64 = 1000;

/// Default timeout for HTTP requests (in seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// HTTP client for LLM API requests
#[derive(Clone)]
pub struct LLMHttpClient {
    /// Reqwest HTTP client
    client: Client,
    /// Maximum number of retry attempts
    max_retries: u32,
    /// Initial retry delay in milliseconds
    initial_delay_ms: u64,
}

impl LLMHttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Create a new HTTP client with custom timeout
    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
        })
    }

    /// Set the maximum number of retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the initial retry delay
    pub fn with_retry_delay(mut self, delay_ms: u64) -> Self {
        self.initial_delay_ms = delay_ms;
        self
    }

    /// Make a POST request, retrying rate limits and server errors
    ///
    /// # Arguments
    /// * `provider` - Provider name used in errors
    /// * `url` - Request URL
    /// * `headers` - Request headers
    /// * `body` - Request body (serializable)
    ///
    /// # Returns
    /// Response body as string
    pub async fn post_with_retry<T: Serialize + Sync>(
        &self,
        provider: &str,
        url: &str,
        headers: HeaderMap,
        body: &T,
    ) -> Result<String> {
        let mut attempt = 0;
        loop {
            debug!(provider, url, attempt, "sending completion request");
            let response = self
                .client
                .post(url)
                .headers(headers.clone())
                .json(body)
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                return Ok(response.text().await?);
            }

            if self.should_retry(status, attempt) {
                let delay = self.calculate_delay(attempt);
                warn!(
                    provider,
                    status = status.as_u16(),
                    attempt,
                    delay_ms = delay,
                    "completion request failed, retrying"
                );
                tokio::time::sleep(Duration::from_millis(delay)).await;
                attempt += 1;
                continue;
            }

            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());

            return Err(RecordForgeError::LLMApiError {
                provider: provider.to_string(),
                message,
                status: status.as_u16(),
            });
        }
    }

    /// Check if a request should be retried
    fn should_retry(&self, status: StatusCode, attempt: u32) -> bool {
        if attempt >= self.max_retries {
            return false;
        }

        status == StatusCode::TOO_MANY_REQUESTS
            || status == StatusCode::REQUEST_TIMEOUT
            || status.is_server_error()
    }

    /// Calculate retry delay with exponential backoff
    fn calculate_delay(&self, attempt: u32) -> u64 {
        // delay * 2^attempt
        self.initial_delay_ms * 2_u64.pow(attempt)
    }

    /// Build JSON headers with bearer authorization
    pub fn build_headers(api_key: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth = HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|_| {
            RecordForgeError::InvalidHeader("API key is not a valid header value".to_string())
        })?;
        headers.insert(AUTHORIZATION, auth);
        Ok(headers)
    }
}
