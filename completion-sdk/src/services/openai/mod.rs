//! OpenAI-compatible chat completion provider
//!
//! Sends `POST {base_url}/chat/completions` with bearer authentication and
//! maps non-success responses to `ServiceError`s that carry the HTTP status.
//! The client makes exactly one HTTP call per `complete`; retries belong to
//! the resilience layer.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;

use crate::config::{ConfigProvider, OpenAIConfig, ServiceConfig, DEFAULT_PROVIDER};
use crate::core::CompletionProvider;
use crate::error::mapping::classify_http_error;
use crate::error::{ErrorContext, Result, ServiceError};
use crate::models::{ChatCompletionRequest, ChatCompletionResponse};
use crate::services::common::{build_http_client, parse_error_response, UserAgent};
use crate::util::{generate_request_id, sanitize_for_logging};

const SERVICE_NAME: &str = "openai";
const CHAT_COMPLETIONS: &str = "chat/completions";

/// OpenAI API client
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    /// HTTP client
    http_client: Client,

    /// Configuration
    config: OpenAIConfig,
}

impl OpenAIClient {
    /// Create a client from an explicit configuration
    pub fn new_with_config(config: OpenAIConfig) -> Result<Self> {
        config.validate()?;

        let http_client = build_http_client(
            Some(UserAgent {
                extra: Some("openai-provider".to_string()),
                ..UserAgent::default()
            }),
            Some(Duration::from_secs(config.timeout_seconds)),
        )?;

        Ok(Self { http_client, config })
    }

    /// Create a client from a configuration provider
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        Self::new_with_config(OpenAIConfig::from_provider(provider)?)
    }

    /// Create a new builder for the OpenAI client
    pub fn builder() -> OpenAIClientBuilder {
        OpenAIClientBuilder::default()
    }

    /// The configuration in effect
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint)
    }
}

#[async_trait]
impl CompletionProvider for OpenAIClient {
    fn name(&self) -> &str {
        SERVICE_NAME
    }

    async fn complete(&self, request: ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        let url = self.endpoint_url(CHAT_COMPLETIONS);
        let request_id = generate_request_id();
        debug!(
            "Sending request to OpenAI: POST {} (model {}, request {})",
            url, request.model, request_id
        );

        let start_time = Instant::now();

        let mut builder = self
            .http_client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .header("X-Request-Id", &request_id)
            .json(&request);

        if let Some(ref org) = self.config.org_id {
            builder = builder.header("OpenAI-Organization", org);
        }

        let response = builder.send().await.map_err(|e| {
            ServiceError::from(e).with_context(
                ErrorContext::for_service(SERVICE_NAME)
                    .endpoint(CHAT_COMPLETIONS)
                    .request_id(request_id.clone()),
            )
        })?;

        let status = response.status();

        if !status.is_success() {
            let error = parse_error_response(SERVICE_NAME, CHAT_COMPLETIONS, response).await;
            warn!(
                "OpenAI request {} failed with {} ({}): {}",
                request_id,
                status.as_u16(),
                classify_http_error(status),
                sanitize_for_logging(&error.to_string())
            );
            return Err(error);
        }

        let completion = response.json::<ChatCompletionResponse>().await.map_err(|e| {
            ServiceError::parsing(format!("Failed to parse response: {}", e)).with_context(
                ErrorContext::for_service(SERVICE_NAME)
                    .status_code(status.as_u16())
                    .endpoint(CHAT_COMPLETIONS),
            )
        })?;

        debug!(
            "OpenAI request {} completed in {:.2}ms",
            request_id,
            start_time.elapsed().as_secs_f64() * 1000.0
        );

        Ok(completion)
    }
}

/// Builder for OpenAI client
#[derive(Debug, Default)]
pub struct OpenAIClientBuilder {
    /// API key for authentication
    api_key: Option<String>,

    /// Organization ID
    org_id: Option<String>,

    /// Base URL for the API
    base_url: Option<String>,

    /// Request timeout
    timeout_seconds: Option<u64>,
}

impl OpenAIClientBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API key
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the organization ID
    pub fn org_id(mut self, org_id: impl Into<String>) -> Self {
        self.org_id = Some(org_id.into());
        self
    }

    /// Set the base URL
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the timeout in seconds
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Build the OpenAI client.
    ///
    /// Values come from `CRISIS_OPENAI_*` environment variables first and are
    /// then overridden by anything set explicitly on the builder.
    pub fn build(self) -> Result<OpenAIClient> {
        let mut config = OpenAIConfig::from_provider(&**DEFAULT_PROVIDER).unwrap_or_default();

        if let Some(api_key) = self.api_key {
            config.api_key = api_key;
        }

        if let Some(org_id) = self.org_id {
            config.org_id = Some(org_id);
        }

        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }

        if let Some(timeout) = self.timeout_seconds {
            config.timeout_seconds = timeout;
        }

        OpenAIClient::new_with_config(config)
    }
}
