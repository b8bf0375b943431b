//! HTTP client implementation

use super::rate_limit::RateLimiter;
use crate::config::TapConfig;
use crate::error::{Error, Result};
use crate::types::StringMap;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const MAX_RETRIES: u32 = 5;
const INITIAL_BACKOFF: Duration = Duration::from_millis(200);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Configuration for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters
    pub query: StringMap,
    /// Request headers
    pub headers: StringMap,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

/// HTTP client with retry and rate limiting
pub struct HttpClient {
    client: Client,
    base_url: Option<Url>,
    api_key: Option<String>,
    timeout: Duration,
    rate_limiter: RateLimiter,
}

impl HttpClient {
    /// Build a client from tap configuration.
    ///
    /// This is the only construction failure mode the run context has:
    /// a malformed `base_url` or an unbuildable underlying client.
    pub fn from_config(config: &TapConfig) -> Result<Self> {
        let base_url = match config.base_url.as_deref() {
            Some(raw) => {
                let mut url = Url::parse(raw)?;
                // join() treats a base without a trailing slash as a file
                if !url.path().ends_with('/') {
                    url.set_path(&format!("{}/", url.path()));
                }
                Some(url)
            }
            None => None,
        };

        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| format!("tapflow/{}", env!("CARGO_PKG_VERSION")));

        let timeout = Duration::from_secs(config.request_timeout_seconds);

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(Error::Http)?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
            timeout,
            rate_limiter: RateLimiter::per_second(config.requests_per_second),
        })
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        self.request(Method::GET, path, RequestConfig::default())
            .await
    }

    /// Make a GET request with config
    pub async fn get_with_config(&self, path: &str, config: RequestConfig) -> Result<Response> {
        self.request(Method::GET, path, config).await
    }

    /// Make a GET request and parse the JSON response
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, config: RequestConfig) -> Result<T> {
        let response = self.request(Method::GET, path, config).await?;
        let json: T = response.json().await.map_err(Error::Http)?;
        Ok(json)
    }

    /// Make a generic request with retries
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        config: RequestConfig,
    ) -> Result<Response> {
        let url = self.build_url(path)?;
        let mut last_error = None;

        for attempt in 0..=MAX_RETRIES {
            self.rate_limiter.wait().await;

            let mut req = self.client.request(method.clone(), url.clone());
            if let Some(ref key) = self.api_key {
                req = req.bearer_auth(key);
            }
            for (key, value) in &config.headers {
                req = req.header(key.as_str(), value.as_str());
            }
            if !config.query.is_empty() {
                req = req.query(&config.query);
            }

            match req.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = extract_retry_after(&response);
                        if attempt < MAX_RETRIES {
                            warn!(
                                attempt = attempt + 1,
                                retry_after, "Rate limited (429), backing off"
                            );
                            tokio::time::sleep(Duration::from_secs(retry_after)).await;
                            last_error = Some(Error::RateLimited {
                                retry_after_seconds: retry_after,
                            });
                            continue;
                        }
                        return Err(Error::RateLimited {
                            retry_after_seconds: retry_after,
                        });
                    }

                    if status.is_server_error() && attempt < MAX_RETRIES {
                        let delay = backoff_delay(attempt);
                        warn!(
                            status = status.as_u16(),
                            attempt = attempt + 1,
                            ?delay,
                            "Server error, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        last_error = Some(Error::http_status(status.as_u16(), String::new()));
                        continue;
                    }

                    if status.is_client_error() || status.is_server_error() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(Error::http_status(status.as_u16(), body));
                    }

                    debug!(%method, %url, "Request succeeded");
                    return Ok(response);
                }
                Err(e) => {
                    if e.is_timeout() && attempt < MAX_RETRIES {
                        let delay = backoff_delay(attempt);
                        warn!(attempt = attempt + 1, ?delay, "Request timeout, retrying");
                        tokio::time::sleep(delay).await;
                        last_error = Some(Error::Timeout {
                            timeout_ms: self.timeout.as_millis() as u64,
                        });
                        continue;
                    }
                    if e.is_connect() && attempt < MAX_RETRIES {
                        let delay = backoff_delay(attempt);
                        warn!(attempt = attempt + 1, ?delay, "Connection error, retrying");
                        tokio::time::sleep(delay).await;
                        last_error = Some(Error::Http(e));
                        continue;
                    }
                    return Err(Error::Http(e));
                }
            }
        }

        Err(last_error.unwrap_or(Error::MaxRetriesExceeded {
            max_retries: MAX_RETRIES,
        }))
    }

    /// Resolve a path against the configured base URL
    fn build_url(&self, path: &str) -> Result<Url> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(Url::parse(path)?);
        }
        match &self.base_url {
            Some(base) => Ok(base.join(path.trim_start_matches('/'))?),
            None => Ok(Url::parse(path)?),
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("has_api_key", &self.api_key.is_some())
            .finish_non_exhaustive()
    }
}

/// Exponential backoff, capped
fn backoff_delay(attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt);
    std::cmp::min(INITIAL_BACKOFF * factor, MAX_BACKOFF)
}

/// Extract retry-after header value, defaulting to 60s
fn extract_retry_after(response: &Response) -> u64 {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .unwrap_or(60)
}
