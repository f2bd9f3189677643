use crate::error::{FeedError, Result};
use reqwest::{Client, Response};
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Number of retry attempts
    pub retry_attempts: u32,
    /// Initial retry delay in milliseconds
    pub retry_delay_ms: u64,
    /// Maximum retry delay in milliseconds (for exponential backoff cap)
    pub max_retry_delay_ms: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            retry_attempts: 3,
            retry_delay_ms: 1000,
            max_retry_delay_ms: 30000,
            user_agent: format!("validate-feed/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Async HTTP client for fetching feed documents
pub struct AsyncHttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl AsyncHttpClient {
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { client, config })
    }

    /// Fetch the body of `url` as text, retrying with exponential backoff
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self.get_response_with_retry(url).await?;
        response
            .text()
            .await
            .map_err(|e| FeedError::Http(e.without_url()))
    }

    async fn get_response_with_retry(&self, url: &str) -> Result<Response> {
        let mut attempt = 0;

        loop {
            match self.make_request(url).await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    let error = FeedError::HttpStatus {
                        url: redact_url(url),
                        status: status.as_u16(),
                        message: format!(
                            "HTTP {}: {}",
                            status.as_u16(),
                            status.canonical_reason().unwrap_or("Unknown")
                        ),
                    };

                    // 4xx means the request itself is wrong; only 5xx is retried
                    if status.is_server_error() && attempt < self.config.retry_attempts {
                        warn!(%error, attempt, "retrying feed request");
                        self.wait_before_retry(attempt).await;
                        attempt += 1;
                        continue;
                    }

                    return Err(error);
                }
                Err(error) => {
                    if attempt < self.config.retry_attempts && self.is_retryable_error(&error) {
                        warn!(%error, attempt, "retrying feed request");
                        self.wait_before_retry(attempt).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(error);
                }
            }
        }
    }

    async fn make_request(&self, url: &str) -> Result<Response> {
        debug!(url = %redact_url(url), "GET");

        timeout(
            Duration::from_secs(self.config.timeout_seconds),
            self.client.get(url).send(),
        )
        .await
        .map_err(|_| FeedError::Timeout {
            url: redact_url(url),
            timeout_seconds: self.config.timeout_seconds,
        })?
        .map_err(|e| FeedError::Http(e.without_url()))
    }

    /// Delay before retry number `attempt`: `retry_delay_ms * 2^attempt`, capped
    fn retry_delay(&self, attempt: u32) -> Duration {
        let delay_ms = self
            .config
            .retry_delay_ms
            .saturating_mul(2_u64.saturating_pow(attempt));
        Duration::from_millis(delay_ms.min(self.config.max_retry_delay_ms))
    }

    async fn wait_before_retry(&self, attempt: u32) {
        sleep(self.retry_delay(attempt)).await;
    }

    fn is_retryable_error(&self, error: &FeedError) -> bool {
        match error {
            FeedError::Http(reqwest_error) => {
                reqwest_error.is_timeout() || reqwest_error.is_connect() || reqwest_error.is_request()
            }
            FeedError::Timeout { .. } => true,
            _ => false,
        }
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}

/// Hide the value of the `api_key` query parameter so URLs can be logged
pub fn redact_url(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };

    let query: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some(("api_key", _)) => "api_key=***".to_string(),
            _ => pair.to_string(),
        })
        .collect();

    format!("{}?{}", base, query.join("&"))
}
