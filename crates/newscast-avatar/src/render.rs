//! The render operation: platform selection and the polling state machine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use newscast_core::AvatarSettings;
use tracing::{info, warn};

use crate::api::{AvatarClient, image_content_type};
use crate::clock::{Clock, SystemClock};
use crate::error::{AvatarError, Result};
use crate::types::{JobState, PollOutcome, VideoJob};

/// A supported video platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    KreadoAi,
    Dashscope,
}

impl Platform {
    pub fn parse(id: &str) -> Option<Self> {
        match id {
            "kreadoai" => Some(Self::KreadoAi),
            "dashscope" => Some(Self::Dashscope),
            _ => None,
        }
    }

    fn default_api_base(self) -> &'static str {
        match self {
            Self::KreadoAi => "https://api.kreadoai.com",
            Self::Dashscope => "https://dashscope.aliyuncs.com",
        }
    }
}

/// The finished video file.
#[derive(Debug, Clone)]
pub struct VideoArtifact {
    pub path: PathBuf,
    pub video_url: String,
    /// Terminal job record; `None` for one-shot platforms.
    pub job: Option<VideoJob>,
}

/// Renders videos against the configured platform.
pub struct VideoRenderer {
    client: AvatarClient,
    settings: AvatarSettings,
    platform: Platform,
    clock: Box<dyn Clock>,
}

impl std::fmt::Debug for VideoRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoRenderer")
            .field("client", &self.client)
            .field("settings", &self.settings)
            .field("platform", &self.platform)
            .finish_non_exhaustive()
    }
}

impl VideoRenderer {
    /// Create a renderer, resolving the platform variant and endpoint once.
    pub fn new(settings: AvatarSettings) -> Result<Self> {
        let platform = Platform::parse(&settings.platform).ok_or_else(|| {
            AvatarError::Config(format!("unsupported platform: {}", settings.platform))
        })?;
        let api_base = if settings.api_base.is_empty() {
            platform.default_api_base().to_string()
        } else {
            settings.api_base.clone()
        };
        let client = AvatarClient::new(settings.clone(), api_base)?;
        Ok(Self {
            client,
            settings,
            platform,
            clock: Box::new(SystemClock),
        })
    }

    /// Replace the clock, letting tests drive the poll loop without real
    /// delay.
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Render `audio` into a video at `output`.
    pub async fn render(&self, audio: &Path, output: &Path) -> Result<VideoArtifact> {
        if !self.settings.enabled {
            return Err(AvatarError::Config(
                "video rendering disabled in configuration".to_string(),
            ));
        }
        if self.settings.api_key.is_empty() {
            return Err(AvatarError::Config("api key not set".to_string()));
        }

        match self.platform {
            Platform::KreadoAi => self.render_kreado(audio, output).await,
            Platform::Dashscope => self.render_dashscope(audio, output).await,
        }
    }

    async fn render_kreado(&self, audio: &Path, output: &Path) -> Result<VideoArtifact> {
        let mut job = VideoJob::new(self.clock.now());

        let audio_asset = match self.client.upload_file(audio, "audio/mpeg", "audio").await {
            Ok(asset) => asset,
            Err(err) => {
                job.advance(JobState::Failed);
                warn!(%err, "audio upload failed");
                return Err(err);
            }
        };

        let avatar_id = if !self.settings.avatar_id.is_empty() {
            self.settings.avatar_id.clone()
        } else if !self.settings.avatar_image.is_empty() {
            let image = Path::new(&self.settings.avatar_image);
            match self
                .client
                .upload_file(image, image_content_type(&self.settings.avatar_image), "image")
                .await
            {
                Ok(asset) => asset.id,
                Err(err) => {
                    job.advance(JobState::Failed);
                    warn!(%err, "avatar image upload failed");
                    return Err(err);
                }
            }
        } else {
            self.settings.default_avatar_id.clone()
        };

        match self.client.create_task(&audio_asset.id, &avatar_id).await {
            Ok(task_id) => {
                info!(%task_id, "video task created");
                job.set_task_id(task_id);
                job.advance(JobState::Queued);
            }
            Err(err) => {
                job.advance(JobState::Failed);
                warn!(%err, "video task creation failed");
                return Err(err);
            }
        }

        let video_url = self.poll(&mut job).await?;
        self.client.download(&video_url, output).await?;
        info!(path = %output.display(), "video generated");

        Ok(VideoArtifact {
            path: output.to_path_buf(),
            video_url,
            job: Some(job),
        })
    }

    /// Poll the task until a terminal status or budget exhaustion.
    ///
    /// A malformed poll response or an unrecognized status counts as a
    /// transport hiccup for that attempt: re-poll on the next interval
    /// rather than abort.
    async fn poll(&self, job: &mut VideoJob) -> Result<String> {
        let interval = Duration::from_secs(self.settings.poll_interval_secs);
        let deadline = self.clock.now() + Duration::from_secs(self.settings.max_wait_secs);
        job.set_deadline(deadline);

        loop {
            if self.clock.now() >= deadline {
                job.advance(JobState::TimedOut);
                return Err(AvatarError::Timeout(self.settings.max_wait_secs));
            }

            match self.client.task_status(job.task_id()).await {
                Ok(status) => match status.outcome() {
                    PollOutcome::Queued => {}
                    PollOutcome::Processing => job.advance(JobState::Processing),
                    PollOutcome::Completed { video_url } => {
                        job.record_result(video_url.clone());
                        job.advance(JobState::Completed);
                        return Ok(video_url);
                    }
                    PollOutcome::Failed(message) => {
                        job.record_error(message.clone());
                        job.advance(JobState::Failed);
                        return Err(AvatarError::JobFailed(message));
                    }
                    PollOutcome::Unrecognized(status) => {
                        warn!(%status, "unrecognized task status, re-polling");
                    }
                },
                Err(err) => warn!(%err, "status poll failed, re-polling"),
            }

            self.clock.sleep(interval).await;
        }
    }

    async fn render_dashscope(&self, audio: &Path, output: &Path) -> Result<VideoArtifact> {
        if self.settings.avatar_image.is_empty() {
            return Err(AvatarError::Config(
                "dashscope requires an avatar_image".to_string(),
            ));
        }

        let image = Path::new(&self.settings.avatar_image);
        let video_url = self.client.dashscope_generate(audio, image).await?;
        self.client.download(&video_url, output).await?;
        info!(path = %output.display(), "video generated");

        Ok(VideoArtifact {
            path: output.to_path_buf(),
            video_url,
            job: None,
        })
    }
}
