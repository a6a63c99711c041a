//! Audio concatenation capability.
//!
//! Merging chunk files needs an external tool (ffmpeg). The capability is
//! probed once at startup and handed to the engine as an explicit dependency;
//! its absence triggers the engine's degraded path rather than a crash.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, TtsError};

/// Capability to concatenate audio files, in order, into one output file.
#[async_trait]
pub trait AudioConcat: Send + Sync {
    async fn concat(&self, inputs: &[PathBuf], output: &Path) -> Result<()>;
}

/// ffmpeg-based concatenation using the concat demuxer with stream copy.
pub struct FfmpegConcat;

impl FfmpegConcat {
    /// Probe for ffmpeg; `None` means the capability is absent.
    pub async fn detect() -> Option<Self> {
        match Command::new("ffmpeg").arg("-version").output().await {
            Ok(_) => Some(Self),
            Err(_) => None,
        }
    }
}

#[async_trait]
impl AudioConcat for FfmpegConcat {
    async fn concat(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
        // The concat demuxer reads input paths from a list file; single
        // quotes inside a path must be escaped as '\'' per ffmpeg's rules.
        let mut list = String::new();
        for input in inputs {
            let escaped = input.display().to_string().replace('\'', r"'\''");
            list.push_str(&format!("file '{escaped}'\n"));
        }
        let list_path = PathBuf::from(format!("{}.list.txt", output.display()));
        fs::write(&list_path, list).await?;

        debug!(inputs = inputs.len(), output = %output.display(), "ffmpeg concat");
        let result = Command::new("ffmpeg")
            .arg("-y")
            .arg("-f")
            .arg("concat")
            .arg("-safe")
            .arg("0")
            .arg("-i")
            .arg(&list_path)
            .arg("-c")
            .arg("copy")
            .arg(output)
            .output()
            .await;

        // The list file is transient either way.
        let _ = fs::remove_file(&list_path).await;

        let result = result?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(TtsError::Synthesis(format!("ffmpeg concat failed: {stderr}")));
        }
        Ok(())
    }
}
