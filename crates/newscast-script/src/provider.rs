//! Provider variants and their wire envelopes.
//!
//! Every variant maps the same logical generation request onto its own JSON
//! envelope and knows how to pull the generated text back out of its own
//! response shape. The set is closed: provider ids are resolved to a variant
//! once, at configuration time.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{Result, ScriptError};
use crate::generator::GenerationRequest;

/// A supported text-generation provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    /// OpenAI-compatible envelope, different default endpoint.
    DeepSeek,
    Claude,
    /// Flat `{prompt, ...}` request with a `text`/`content` response field.
    Custom,
}

impl Provider {
    /// Resolve a provider id from configuration. Returns `None` for ids
    /// outside the supported set.
    pub fn parse(id: &str) -> Option<Self> {
        match id {
            "openai" => Some(Self::OpenAi),
            "deepseek" => Some(Self::DeepSeek),
            "claude" => Some(Self::Claude),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::DeepSeek => "deepseek",
            Self::Claude => "claude",
            Self::Custom => "custom",
        }
    }

    /// Default endpoint; the custom provider has none and must be configured.
    pub fn default_endpoint(&self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("https://api.openai.com/v1/chat/completions"),
            Self::DeepSeek => Some("https://api.deepseek.com/v1/chat/completions"),
            Self::Claude => Some("https://api.anthropic.com/v1/messages"),
            Self::Custom => None,
        }
    }

    /// Build the provider-specific request envelope.
    pub(crate) fn request_body(&self, request: &GenerationRequest) -> Value {
        match self {
            Self::OpenAi | Self::DeepSeek => json!({
                "model": request.model,
                "messages": [
                    {"role": "system", "content": request.system},
                    {"role": "user", "content": request.prompt},
                ],
                "temperature": request.temperature,
                "max_tokens": request.max_tokens,
            }),
            Self::Claude => json!({
                "model": request.model,
                "max_tokens": request.max_tokens,
                "messages": [
                    {"role": "user", "content": request.prompt},
                ],
            }),
            Self::Custom => json!({
                "prompt": request.prompt,
                "model": request.model,
                "max_tokens": request.max_tokens,
                "temperature": request.temperature,
            }),
        }
    }

    /// Extract the generated text from the provider-specific response shape.
    ///
    /// A response that parses but lacks the text field is a
    /// [`ScriptError::MalformedResponse`] — never coerced into empty text.
    pub(crate) fn extract_text(&self, body: Value) -> Result<String> {
        let text = match self {
            Self::OpenAi | Self::DeepSeek => {
                let response: ChatResponse = serde_json::from_value(body)
                    .map_err(|e| ScriptError::MalformedResponse(e.to_string()))?;
                response
                    .choices
                    .into_iter()
                    .next()
                    .ok_or_else(|| {
                        ScriptError::MalformedResponse("response has no choices".to_string())
                    })?
                    .message
                    .content
            }
            Self::Claude => {
                let response: ClaudeResponse = serde_json::from_value(body)
                    .map_err(|e| ScriptError::MalformedResponse(e.to_string()))?;
                response
                    .content
                    .into_iter()
                    .next()
                    .ok_or_else(|| {
                        ScriptError::MalformedResponse("response has no content blocks".to_string())
                    })?
                    .text
            }
            Self::Custom => body
                .get("text")
                .or_else(|| body.get("content"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    ScriptError::MalformedResponse(
                        "response carries neither a text nor a content field".to_string(),
                    )
                })?,
        };

        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(ScriptError::MalformedResponse(
                "provider returned empty text".to_string(),
            ));
        }
        Ok(text)
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeBlock>,
}

#[derive(Debug, Deserialize)]
struct ClaudeBlock {
    text: String,
}
