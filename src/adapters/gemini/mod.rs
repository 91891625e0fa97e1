//! Google Gemini REST adapters.
//!
//! One [`GeminiHttp`] is shared by the embedding provider and the generation
//! client so both draw from the same request quota.

pub mod embedding;
pub mod generation;

pub use embedding::GeminiEmbeddingProvider;
pub use generation::GeminiGenerationClient;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::num::NonZeroU32;
use std::time::Duration;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::ProviderConfig;
use crate::infrastructure::logging::SecretScrubber;

pub(crate) const PROVIDER_NAME: &str = "gemini";

/// Longest provider error body kept in an error message.
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Connection settings for the Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    /// Base URL. Default: `https://generativelanguage.googleapis.com/v1beta`.
    pub base_url: String,
    pub timeout_secs: u64,
    pub requests_per_minute: u32,
}

impl GeminiConfig {
    /// Build from provider configuration. Fails with `MissingApiKey` when no
    /// non-blank key is configured.
    pub fn from_provider(provider: &ProviderConfig) -> DomainResult<Self> {
        let api_key = provider.api_key().ok_or_else(|| DomainError::MissingApiKey {
            provider: PROVIDER_NAME.to_string(),
        })?;

        Ok(Self {
            api_key: api_key.to_string(),
            base_url: provider.base_url.trim_end_matches('/').to_string(),
            timeout_secs: provider.request_timeout_secs,
            requests_per_minute: provider.requests_per_minute,
        })
    }
}

/// Shared HTTP transport: client, rate limiter and error mapping.
pub struct GeminiHttp {
    client: reqwest::Client,
    config: GeminiConfig,
    limiter: DefaultDirectRateLimiter,
    scrubber: SecretScrubber,
}

impl std::fmt::Debug for GeminiHttp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiHttp")
            .field("base_url", &self.config.base_url)
            .field("timeout_secs", &self.config.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl GeminiHttp {
    pub fn new(config: GeminiConfig) -> DomainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DomainError::InvalidArgument(format!("Failed to build HTTP client: {e}")))?;
        let per_minute = NonZeroU32::new(config.requests_per_minute).ok_or_else(|| {
            DomainError::InvalidArgument("requests_per_minute must be at least 1".to_string())
        })?;

        Ok(Self {
            client,
            limiter: RateLimiter::direct(Quota::per_minute(per_minute)),
            config,
            scrubber: SecretScrubber::new(),
        })
    }

    /// Model path segment, accepting names with or without the `models/` prefix.
    pub fn model_path(model: &str) -> String {
        if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{model}")
        }
    }

    /// POST `body` to `{base_url}/{endpoint}` and decode the JSON response.
    pub async fn post_json<Req, Resp>(&self, endpoint: &str, body: &Req) -> DomainResult<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        self.limiter.until_ready().await;

        let url = format!("{}/{endpoint}", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(endpoint, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(self.status_error(endpoint, status, &body));
        }

        response.json::<Resp>().await.map_err(|e| {
            if e.is_timeout() {
                self.timeout_error(endpoint)
            } else {
                DomainError::Provider {
                    provider: PROVIDER_NAME.to_string(),
                    endpoint: endpoint.to_string(),
                    status: Some(status.as_u16()),
                    message: format!("Failed to parse response: {e}"),
                    transient: false,
                }
            }
        })
    }

    fn timeout_error(&self, endpoint: &str) -> DomainError {
        DomainError::Timeout {
            stage: format!("{PROVIDER_NAME} {endpoint}"),
            after_ms: self.config.timeout_secs.saturating_mul(1000),
        }
    }

    fn transport_error(&self, endpoint: &str, err: &reqwest::Error) -> DomainError {
        if err.is_timeout() {
            return self.timeout_error(endpoint);
        }
        DomainError::Provider {
            provider: PROVIDER_NAME.to_string(),
            endpoint: endpoint.to_string(),
            status: err.status().map(|s| s.as_u16()),
            message: self.scrubber.scrub(&err.to_string()),
            transient: true,
        }
    }

    fn status_error(&self, endpoint: &str, status: StatusCode, body: &str) -> DomainError {
        DomainError::Provider {
            provider: PROVIDER_NAME.to_string(),
            endpoint: endpoint.to_string(),
            status: Some(status.as_u16()),
            message: self.scrubber.scrub_truncated(body.trim(), MAX_ERROR_BODY_CHARS),
            transient: is_transient_status(status),
        }
    }
}

/// Rate limiting, timeouts and server errors are worth retrying later.
pub fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}
