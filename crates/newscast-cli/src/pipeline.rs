//! The stage-by-stage pipeline driver.
//!
//! Stages run to completion in order: generate → synthesize → render →
//! deliver. A stage that is disabled or fails is skipped along with every
//! stage that needs its artifact; a failure never aborts the run. Each stage
//! logs a status line on both success and failure.

use std::fs;
use std::path::{Path, PathBuf};

use newscast_avatar::VideoRenderer;
use newscast_core::{
    NewsDigest, NewscastConfig, ScriptHistory, beijing_now, export_markdown, format_date_cn,
};
use newscast_feishu::{FeishuError, FeishuSender};
use newscast_script::ScriptGenerator;
use newscast_tts::{AudioArtifact, SpeechSynthesizer};
use tracing::{info, warn};

const SCRIPT_FILE_STEM: &str = "口播稿";

/// What each stage produced; `None` means skipped or failed.
#[derive(Debug, Default)]
pub struct PipelineReport {
    pub script_path: Option<PathBuf>,
    pub audio: Option<AudioArtifact>,
    pub video_path: Option<PathBuf>,
    pub delivered: bool,
}

pub struct Pipeline {
    config: NewscastConfig,
}

impl Pipeline {
    pub fn new(config: NewscastConfig) -> Self {
        Self { config }
    }

    /// Run every stage for one digest. Never fails: stage errors downgrade
    /// to skips and are reported in the returned summary.
    pub async fn run(&self, digest: &NewsDigest) -> PipelineReport {
        let mut report = PipelineReport::default();

        let Some(script) = self.generate_script(digest).await else {
            info!("no script produced, nothing further to do");
            return report;
        };

        let run_dir = self
            .config
            .output_dir
            .join(format_date_cn(&beijing_now()))
            .join("script");
        report.script_path = self.persist_script(&script, &run_dir, digest);

        report.audio = self.synthesize_audio(&script, &run_dir).await;
        report.video_path = match &report.audio {
            Some(artifact) => self.render_video(artifact).await,
            None => None,
        };
        report.delivered = self
            .deliver(&script, report.audio.as_ref().map(|a| a.path.as_path()))
            .await;

        report
    }

    async fn generate_script(&self, digest: &NewsDigest) -> Option<String> {
        let generator = match ScriptGenerator::new(self.config.script.clone()) {
            Ok(generator) => generator,
            Err(err) => {
                warn!(%err, "script generation skipped");
                return None;
            }
        };
        match generator.generate_script(digest).await {
            Ok(script) => {
                info!(chars = script.chars().count(), "script generated");
                Some(script)
            }
            Err(err) => {
                warn!(%err, "script generation skipped");
                None
            }
        }
    }

    /// Write the script, record history and export Markdown. All best-effort:
    /// a write failure leaves the in-memory script flowing to later stages.
    fn persist_script(
        &self,
        script: &str,
        run_dir: &Path,
        digest: &NewsDigest,
    ) -> Option<PathBuf> {
        let script_path = run_dir.join(format!("{SCRIPT_FILE_STEM}.txt"));
        if let Err(err) = write_atomically(&script_path, script) {
            warn!(%err, path = %script_path.display(), "failed to write script file");
            return None;
        }
        info!(path = %script_path.display(), "script written");

        let history =
            ScriptHistory::new(self.config.output_dir.join("script_history.json"));
        if let Err(err) = history.record(script, &script_path, digest) {
            warn!(%err, "failed to record script history");
        }
        if let Err(err) = export_markdown(&script_path, None) {
            warn!(%err, "failed to export markdown");
        }
        Some(script_path)
    }

    async fn synthesize_audio(&self, script: &str, run_dir: &Path) -> Option<AudioArtifact> {
        if !self.config.tts.enabled {
            info!("speech synthesis disabled, skipping audio");
            return None;
        }
        let engine = match SpeechSynthesizer::from_settings(&self.config.tts).await {
            Ok(engine) => engine,
            Err(err) => {
                warn!(%err, "speech synthesis skipped");
                return None;
            }
        };

        let audio_path =
            run_dir.join(format!("{SCRIPT_FILE_STEM}.{}", self.config.tts.output_format));
        match engine.synthesize(script, &audio_path).await {
            Ok(artifact) => {
                if artifact.truncated {
                    warn!(
                        chunks = artifact.chunks,
                        "audio artifact is truncated to its first chunk"
                    );
                }
                info!(path = %artifact.path.display(), "audio generated");
                Some(artifact)
            }
            Err(err) => {
                warn!(%err, "speech synthesis skipped");
                None
            }
        }
    }

    async fn render_video(&self, audio: &AudioArtifact) -> Option<PathBuf> {
        if !self.config.avatar.enabled {
            info!("video rendering disabled, skipping video");
            return None;
        }
        let renderer = match VideoRenderer::new(self.config.avatar.clone()) {
            Ok(renderer) => renderer,
            Err(err) => {
                warn!(%err, "video rendering skipped");
                return None;
            }
        };

        let output = audio.path.with_extension(&self.config.avatar.output_format);
        match renderer.render(&audio.path, &output).await {
            Ok(video) => {
                info!(path = %video.path.display(), "video generated");
                Some(video.path)
            }
            Err(err) => {
                warn!(%err, "video rendering skipped");
                None
            }
        }
    }

    async fn deliver(&self, script: &str, audio: Option<&Path>) -> bool {
        let sender = match FeishuSender::new(self.config.feishu.clone()) {
            Ok(sender) => sender,
            Err(err) => {
                warn!(%err, "delivery skipped");
                return false;
            }
        };
        match sender.send_script(script, audio).await {
            Ok(()) => {
                info!("bulletin delivered");
                true
            }
            Err(FeishuError::NotConfigured) => {
                info!("feishu not configured, skipping delivery");
                false
            }
            Err(err) => {
                warn!(%err, "delivery failed");
                false
            }
        }
    }
}

fn write_atomically(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("txt.tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn digest() -> NewsDigest {
        serde_json::from_str(r#"{"stats": [{"word": "央行", "count": 3}]}"#).unwrap()
    }

    #[tokio::test]
    async fn fully_disabled_config_skips_every_stage() {
        let dir = TempDir::new().unwrap();
        let config = NewscastConfig {
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };

        let report = Pipeline::new(config).run(&digest()).await;

        assert!(report.script_path.is_none());
        assert!(report.audio.is_none());
        assert!(report.video_path.is_none());
        assert!(!report.delivered);
        // Nothing was written.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn atomic_write_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("script.txt");
        write_atomically(&path, "早上好").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "早上好");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
