//! HTTP transport with connection pooling and retry logic

use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use reqwest::{Client, ClientBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use quay_core::error::QuayError;
use quay_core::types::HostCredentials;

use crate::RegistryResult;

mod error;

pub use error::{FailureClass, HttpError, TransportCode};

/// Configuration for exponential backoff retry logic
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Never retry
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

/// Transport configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Per-request timeout
    pub timeout: Duration,
    /// User agent sent with every request
    pub user_agent: String,
    /// Retry policy
    pub retry: RetryConfig,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("quay/{}", env!("CARGO_PKG_VERSION")),
            retry: RetryConfig::default(),
        }
    }
}

/// Basic auth credentials for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: Option<String>,
}

/// Per-request options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Basic auth credentials
    pub basic_auth: Option<BasicAuth>,
    /// Raw `Authorization` header value, takes precedence over basic auth
    pub authorization: Option<String>,
}

impl RequestOptions {
    /// Build request options from resolved host credentials
    pub fn from_credentials(credentials: &HostCredentials) -> Self {
        let authorization = credentials
            .token
            .as_ref()
            .map(|token| format!("Bearer {}", token));

        let basic_auth = credentials.username.as_ref().map(|username| BasicAuth {
            username: username.clone(),
            password: credentials.password.clone(),
        });

        Self {
            basic_auth,
            authorization,
        }
    }

    /// Whether the request carries an `Authorization` header.
    ///
    /// Responses to such requests must never be written to or served from a
    /// shared cache. A username without a password still sends basic auth.
    pub fn is_authenticated(&self) -> bool {
        self.authorization.is_some() || self.basic_auth.is_some()
    }

    /// The `Authorization` header value to send, if any
    pub fn authorization_header(&self) -> Option<String> {
        if let Some(authorization) = &self.authorization {
            return Some(authorization.clone());
        }

        self.basic_auth.as_ref().map(|auth| {
            let pair = format!(
                "{}:{}",
                auth.username,
                auth.password.as_deref().unwrap_or_default()
            );
            format!("Basic {}", general_purpose::STANDARD.encode(pair))
        })
    }
}

/// A decoded JSON response
#[derive(Debug, Clone)]
pub struct JsonResponse<T> {
    /// Decoded body
    pub body: T,
    /// Response status
    pub status_code: u16,
}

/// HTTP client for registry requests
#[derive(Debug, Clone)]
pub struct HttpClient {
    /// Underlying HTTP client with connection pooling
    client: Client,
    /// Retry configuration
    retry_config: RetryConfig,
}

impl HttpClient {
    /// Create new client with default configuration
    pub fn new() -> RegistryResult<Self> {
        Self::with_config(HttpConfig::default())
    }

    /// Create client with custom configuration
    pub fn with_config(config: HttpConfig) -> RegistryResult<Self> {
        let client = ClientBuilder::new()
            // Connection pooling configuration
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(config.timeout)
            .gzip(true)
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| QuayError::network("Failed to create HTTP client".to_string(), e))?;

        Ok(Self {
            client,
            retry_config: config.retry,
        })
    }

    /// Retry policy in effect
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry_config
    }

    /// Execute a request with exponential backoff retry logic
    async fn with_retry<F, Fut, T>(&self, operation: F) -> Result<T, HttpError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, HttpError>>,
    {
        let mut delay = self.retry_config.initial_delay;
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(error) => {
                    if attempt >= self.retry_config.max_retries || !error.is_retryable() {
                        return Err(error);
                    }
                    attempt += 1;

                    debug!(url = %error.url, code = %error.code, attempt, "Retrying request");
                    tokio::time::sleep(delay).await;

                    delay = std::cmp::min(
                        Duration::from_millis(
                            (delay.as_millis() as f64 * self.retry_config.multiplier) as u64,
                        ),
                        self.retry_config.max_delay,
                    );
                },
            }
        }
    }

    /// Fetch a JSON document
    pub async fn get_json<T>(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<JsonResponse<T>, HttpError>
    where
        T: DeserializeOwned,
    {
        let authorization = options.authorization_header();

        self.with_retry(|| async {
            let mut request = self
                .client
                .get(url)
                .header(reqwest::header::ACCEPT, "application/json");
            if let Some(value) = &authorization {
                request = request.header(reqwest::header::AUTHORIZATION, value);
            }

            debug!(url, "GET");
            let response = request
                .send()
                .await
                .map_err(|e| HttpError::transport(url, e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(HttpError::status(url, status.as_u16()));
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| HttpError::transport(url, e))?;
            let body = serde_json::from_slice::<T>(&bytes).map_err(|e| HttpError::decode(url, e))?;

            Ok(JsonResponse {
                body,
                status_code: status.as_u16(),
            })
        })
        .await
    }
}
