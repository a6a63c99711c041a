//! Configuration loading for the Newscast pipeline.
//!
//! Settings are read from a single YAML file. Credentials can be supplied (or
//! overridden) through environment variables so they stay out of version
//! control; a `.env` file is honored when present.

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// Top-level configuration, one section per pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewscastConfig {
    /// Root directory for generated artifacts.
    pub output_dir: PathBuf,
    pub script: ScriptSettings,
    pub tts: TtsSettings,
    pub avatar: AvatarSettings,
    pub feishu: FeishuSettings,
}

impl Default for NewscastConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            script: ScriptSettings::default(),
            tts: TtsSettings::default(),
            avatar: AvatarSettings::default(),
            feishu: FeishuSettings::default(),
        }
    }
}

impl NewscastConfig {
    /// Load configuration from a YAML file and apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        // Pick up a .env file if one exists; ignore if it doesn't.
        let _ = dotenvy::dotenv();

        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self =
            serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Resolve credentials from the environment, preferring env vars over the
    /// values in the config file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = env::var("NEWSCAST_AI_API_KEY") {
            self.script.api_key = key;
        }
        if let Ok(key) = env::var("DIGITAL_HUMAN_API_KEY") {
            self.avatar.api_key = key;
        }
        if let Ok(secret) = env::var("DIGITAL_HUMAN_API_SECRET") {
            self.avatar.api_secret = secret;
        }
    }
}

/// Text-generation provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptSettings {
    pub enabled: bool,
    /// Provider identifier: `openai`, `deepseek`, `claude` or `custom`.
    pub provider: String,
    pub api_key: String,
    /// Endpoint base; empty means the provider's default endpoint.
    pub api_base: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: "openai".to_string(),
            api_key: String::new(),
            api_base: String::new(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 2000,
            temperature: 0.7,
        }
    }
}

/// Policy for a long synthesis when no audio merge capability is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Substitute the first chunk and flag the artifact as truncated.
    FirstChunk,
    /// Refuse to produce a truncated artifact.
    Fail,
}

/// Speech synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsSettings {
    pub enabled: bool,
    /// Engine identifier: `edge-tts` or `espeak`.
    pub engine: String,
    pub voice: String,
    /// Rate adjustment forwarded to the engine, e.g. `+0%`.
    pub rate: String,
    pub output_format: String,
    pub merge_policy: MergePolicy,
}

impl Default for TtsSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            engine: "edge-tts".to_string(),
            voice: "zh-CN-XiaoxiaoNeural".to_string(),
            rate: "+0%".to_string(),
            output_format: "mp3".to_string(),
            merge_policy: MergePolicy::FirstChunk,
        }
    }
}

/// Talking-head video platform settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarSettings {
    pub enabled: bool,
    /// Platform identifier: `kreadoai` or `dashscope`.
    pub platform: String,
    pub api_key: String,
    pub api_secret: String,
    /// Endpoint base; empty means the platform's default endpoint.
    pub api_base: String,
    /// Local avatar image, uploaded when no pre-registered id is configured.
    pub avatar_image: String,
    /// Pre-registered avatar identifier on the platform.
    pub avatar_id: String,
    /// Fallback avatar identifier when neither an image nor an id is set.
    pub default_avatar_id: String,
    pub video_quality: String,
    pub video_resolution: String,
    pub output_format: String,
    pub poll_interval_secs: u64,
    pub max_wait_secs: u64,
}

impl Default for AvatarSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            platform: "kreadoai".to_string(),
            api_key: String::new(),
            api_secret: String::new(),
            api_base: String::new(),
            avatar_image: String::new(),
            avatar_id: String::new(),
            default_avatar_id: String::new(),
            video_quality: "720p".to_string(),
            video_resolution: "720p".to_string(),
            output_format: "mp4".to_string(),
            poll_interval_secs: 5,
            max_wait_secs: 300,
        }
    }
}

/// Feishu delivery settings.
///
/// The open-platform credentials take precedence over the webhook when all
/// three of `app_id`, `app_secret` and `chat_id` are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeishuSettings {
    pub webhook_url: Option<String>,
    pub app_id: Option<String>,
    pub app_secret: Option<String>,
    pub chat_id: Option<String>,
    /// Public base URL under which audio artifacts are served, used to build
    /// a listen link in webhook messages.
    pub base_url: Option<String>,
    pub proxy_url: Option<String>,
}

impl FeishuSettings {
    /// Whether the open-platform credential set is complete.
    pub fn has_api_credentials(&self) -> bool {
        self.app_id.as_deref().is_some_and(|s| !s.is_empty())
            && self.app_secret.as_deref().is_some_and(|s| !s.is_empty())
            && self.chat_id.as_deref().is_some_and(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_disabled() {
        let config = NewscastConfig::default();
        assert!(!config.script.enabled);
        assert!(!config.tts.enabled);
        assert!(!config.avatar.enabled);
        assert_eq!(config.tts.merge_policy, MergePolicy::FirstChunk);
    }

    #[test]
    fn load_partial_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "output_dir: out\nscript:\n  enabled: true\n  provider: deepseek\n  api_key: k\ntts:\n  merge_policy: fail\n"
        )
        .unwrap();

        let config = NewscastConfig::load(file.path()).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert!(config.script.enabled);
        assert_eq!(config.script.provider, "deepseek");
        // Untouched sections keep their defaults.
        assert_eq!(config.script.model, "gpt-3.5-turbo");
        assert_eq!(config.tts.merge_policy, MergePolicy::Fail);
        assert_eq!(config.avatar.poll_interval_secs, 5);
    }

    #[test]
    fn load_missing_file_fails() {
        let err = NewscastConfig::load("/nonexistent/newscast.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn api_credentials_require_all_three() {
        let mut settings = FeishuSettings {
            app_id: Some("cli_x".into()),
            app_secret: Some("secret".into()),
            ..Default::default()
        };
        assert!(!settings.has_api_credentials());
        settings.chat_id = Some("oc_y".into());
        assert!(settings.has_api_credentials());
    }
}
