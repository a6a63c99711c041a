//! Synthesis backends.
//!
//! A backend turns one chunk of text into one audio file. Both shipped
//! backends shell out to an external synthesizer; availability is probed once
//! when the engine is constructed.

use std::path::Path;

use async_trait::async_trait;
use newscast_core::TtsSettings;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, TtsError};

/// Single-chunk synthesis primitive.
#[async_trait]
pub trait SynthesisBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Per-call text size limit in characters.
    fn max_chunk_chars(&self) -> usize;

    async fn is_available(&self) -> bool;

    /// Synthesize `text` into an audio file at `output`.
    async fn synthesize(&self, text: &str, output: &Path) -> Result<()>;
}

impl std::fmt::Debug for dyn SynthesisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynthesisBackend")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

/// Resolve the backend named in the settings and verify it is installed.
pub async fn backend_for(settings: &TtsSettings) -> Result<Box<dyn SynthesisBackend>> {
    let backend: Box<dyn SynthesisBackend> = match settings.engine.as_str() {
        "edge-tts" => Box::new(EdgeTtsBackend::new(&settings.voice, &settings.rate)),
        "espeak" => Box::new(EspeakBackend::new(&settings.voice)),
        other => {
            return Err(TtsError::EngineUnavailable(format!(
                "unknown engine: {other}"
            )));
        }
    };
    if !backend.is_available().await {
        return Err(TtsError::EngineUnavailable(format!(
            "{} is not installed",
            backend.name()
        )));
    }
    Ok(backend)
}

/// Microsoft Edge neural voices via the `edge-tts` command-line tool.
pub struct EdgeTtsBackend {
    voice: String,
    rate: String,
}

impl EdgeTtsBackend {
    pub fn new(voice: &str, rate: &str) -> Self {
        Self {
            voice: voice.to_string(),
            rate: rate.to_string(),
        }
    }
}

#[async_trait]
impl SynthesisBackend for EdgeTtsBackend {
    fn name(&self) -> &str {
        "edge-tts"
    }

    fn max_chunk_chars(&self) -> usize {
        // Per-call limit of the edge-tts service.
        5000
    }

    async fn is_available(&self) -> bool {
        Command::new("edge-tts")
            .arg("--version")
            .output()
            .await
            .is_ok()
    }

    async fn synthesize(&self, text: &str, output: &Path) -> Result<()> {
        debug!(voice = %self.voice, chars = text.chars().count(), "edge-tts synthesis");
        let result = Command::new("edge-tts")
            .arg("--voice")
            .arg(&self.voice)
            .arg("--rate")
            .arg(&self.rate)
            .arg("--text")
            .arg(text)
            .arg("--write-media")
            .arg(output)
            .output()
            .await?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(TtsError::Synthesis(format!("edge-tts failed: {stderr}")));
        }
        Ok(())
    }
}

/// Offline synthesis through espeak / espeak-ng.
pub struct EspeakBackend {
    voice: String,
}

impl EspeakBackend {
    pub fn new(voice: &str) -> Self {
        Self {
            voice: voice.to_string(),
        }
    }

    /// espeak-ng ships under either binary name depending on the distro.
    async fn command_name() -> Option<&'static str> {
        for candidate in ["espeak", "espeak-ng"] {
            if Command::new(candidate)
                .arg("--version")
                .output()
                .await
                .is_ok()
            {
                return Some(candidate);
            }
        }
        None
    }
}

#[async_trait]
impl SynthesisBackend for EspeakBackend {
    fn name(&self) -> &str {
        "espeak"
    }

    fn max_chunk_chars(&self) -> usize {
        8000
    }

    async fn is_available(&self) -> bool {
        Self::command_name().await.is_some()
    }

    async fn synthesize(&self, text: &str, output: &Path) -> Result<()> {
        let command = Self::command_name()
            .await
            .ok_or_else(|| TtsError::EngineUnavailable("espeak not found".to_string()))?;

        debug!(%command, voice = %self.voice, "espeak synthesis");
        let result = Command::new(command)
            .arg("-v")
            .arg(&self.voice)
            .arg("-w")
            .arg(output)
            .arg(text)
            .output()
            .await?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(TtsError::Synthesis(format!("espeak failed: {stderr}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_engine_is_rejected() {
        let settings = TtsSettings {
            engine: "festival".to_string(),
            ..Default::default()
        };
        let err = backend_for(&settings).await.unwrap_err();
        assert!(matches!(err, TtsError::EngineUnavailable(_)));
    }
}
