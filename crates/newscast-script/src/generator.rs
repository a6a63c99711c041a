use std::time::Duration;

use newscast_core::{NewsDigest, ScriptSettings};
use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use crate::error::{Result, ScriptError};
use crate::prompt;
use crate::provider::Provider;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One logical generation request, provider-independent.
///
/// Immutable once built; the provider variant decides how these fields land
/// on the wire.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system: String,
    pub prompt: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Text-generation client over a configured provider.
#[derive(Debug)]
pub struct ScriptGenerator {
    client: Client,
    settings: ScriptSettings,
    provider: Provider,
    endpoint: String,
}

impl ScriptGenerator {
    /// Create a generator, resolving the provider variant and endpoint once.
    pub fn new(settings: ScriptSettings) -> Result<Self> {
        let provider = Provider::parse(&settings.provider).ok_or_else(|| {
            ScriptError::Config(format!("unsupported provider: {}", settings.provider))
        })?;

        let endpoint = if settings.api_base.is_empty() {
            provider
                .default_endpoint()
                .ok_or_else(|| {
                    ScriptError::Config("custom provider requires api_base".to_string())
                })?
                .to_string()
        } else {
            settings.api_base.clone()
        };

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            settings,
            provider,
            endpoint,
        })
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Generate a bulletin script for a news digest.
    pub async fn generate_script(&self, digest: &NewsDigest) -> Result<String> {
        if digest.is_empty() {
            return Err(ScriptError::Config(
                "news digest has no keyword stats".to_string(),
            ));
        }

        let request = GenerationRequest {
            system: prompt::SYSTEM_PROMPT.to_string(),
            prompt: prompt::build_prompt(digest),
            model: self.settings.model.clone(),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };
        self.generate(&request).await
    }

    /// Run one generation request. A single network attempt is made; the
    /// caller owns any retry policy.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        if !self.settings.enabled {
            return Err(ScriptError::Config(
                "script generation disabled in configuration".to_string(),
            ));
        }
        if self.settings.api_key.is_empty() {
            return Err(ScriptError::Config("api key not set".to_string()));
        }
        if request.prompt.trim().is_empty() {
            return Err(ScriptError::Config("prompt is empty".to_string()));
        }

        info!(provider = self.provider.id(), model = %request.model, "calling text generation provider");

        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .json(&self.provider.request_body(request));
        builder = match self.provider {
            Provider::Claude => builder
                .header("x-api-key", &self.settings.api_key)
                .header("anthropic-version", "2023-06-01"),
            _ => builder.bearer_auth(&self.settings.api_key),
        };

        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ScriptError::Auth {
                status: status.as_u16(),
            });
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ScriptError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScriptError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ScriptError::MalformedResponse(e.to_string()))?;
        debug!("provider response received");

        let text = self.provider.extract_text(body)?;
        info!(chars = text.chars().count(), "script generated");
        Ok(text)
    }
}
