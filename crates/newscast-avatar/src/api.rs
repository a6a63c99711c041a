//! HTTP client for the video platforms.

use std::path::Path;
use std::time::Duration;

use newscast_core::AvatarSettings;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use tokio::fs;
use tracing::{debug, info};

use crate::error::{AvatarError, Result};
use crate::types::{CreateData, DashscopeResponse, Envelope, RemoteAsset, StatusData, UploadData};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug)]
pub struct AvatarClient {
    http: Client,
    settings: AvatarSettings,
    api_base: String,
}

impl AvatarClient {
    pub fn new(settings: AvatarSettings, api_base: String) -> Result<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            settings,
            api_base,
        })
    }

    /// Upload a local file, returning the platform-assigned asset.
    pub async fn upload_file(
        &self,
        path: &Path,
        content_type: &str,
        kind: &str,
    ) -> Result<RemoteAsset> {
        let data = fs::read(path).await?;
        info!(path = %path.display(), bytes = data.len(), kind, "uploading file");

        let file_name = path
            .file_name()
            .map_or_else(|| "file".to_string(), |n| n.to_string_lossy().to_string());
        let part = Part::bytes(data)
            .file_name(file_name)
            .mime_str(content_type)
            .map_err(|e| AvatarError::Api(format!("invalid content type: {e}")))?;
        let form = Form::new().part("file", part).text("type", kind.to_string());

        let response = self
            .http
            .post(format!("{}/v1/files/upload", self.api_base))
            .bearer_auth(&self.settings.api_key)
            .multipart(form)
            .send()
            .await?;
        let uploaded: UploadData = self.unwrap_envelope(response, "upload").await?;

        debug!(file_id = %uploaded.file_id, "file uploaded");
        Ok(RemoteAsset {
            id: uploaded.file_id,
        })
    }

    /// Create a rendering task referencing uploaded assets.
    pub async fn create_task(&self, audio_file_id: &str, avatar_id: &str) -> Result<String> {
        let payload = serde_json::json!({
            "audio_file_id": audio_file_id,
            "avatar_id": avatar_id,
            "quality": self.settings.video_quality,
            "format": self.settings.output_format,
        });

        let response = self
            .http
            .post(format!("{}/v1/videos/create", self.api_base))
            .bearer_auth(&self.settings.api_key)
            .json(&payload)
            .send()
            .await?;
        let data: CreateData = self.unwrap_envelope(response, "task creation").await?;

        Ok(data.task_id)
    }

    /// Fetch the current status of a rendering task.
    pub async fn task_status(&self, task_id: &str) -> Result<StatusData> {
        let response = self
            .http
            .get(format!("{}/v1/videos/status/{task_id}", self.api_base))
            .bearer_auth(&self.settings.api_key)
            .send()
            .await?;
        self.unwrap_envelope(response, "status poll").await
    }

    /// One-shot DashScope generation: audio plus avatar image in, video URL out.
    pub async fn dashscope_generate(&self, audio: &Path, image: &Path) -> Result<String> {
        let audio_data = fs::read(audio).await?;
        let image_data = fs::read(image).await?;

        let form = Form::new()
            .part(
                "image",
                Part::bytes(image_data)
                    .file_name("avatar.jpg")
                    .mime_str("image/jpeg")
                    .map_err(|e| AvatarError::Api(format!("invalid content type: {e}")))?,
            )
            .part(
                "audio",
                Part::bytes(audio_data)
                    .file_name("audio.mp3")
                    .mime_str("audio/mpeg")
                    .map_err(|e| AvatarError::Api(format!("invalid content type: {e}")))?,
            )
            .text("model", "wan2.2-s2v")
            .text("resolution", self.settings.video_resolution.clone());

        let response = self
            .http
            .post(format!(
                "{}/api/v1/services/aigc/video-generation/generation",
                self.api_base
            ))
            .bearer_auth(&self.settings.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AvatarError::Api(format!("generation failed: {status} - {body}")));
        }

        let parsed: DashscopeResponse = response
            .json()
            .await
            .map_err(|e| AvatarError::MalformedResponse(e.to_string()))?;
        if parsed.code.as_deref() != Some("Success") {
            return Err(AvatarError::Api(
                parsed
                    .message
                    .unwrap_or_else(|| "generation rejected".to_string()),
            ));
        }
        parsed
            .data
            .map(|d| d.video_url)
            .ok_or_else(|| AvatarError::MalformedResponse("response has no data".to_string()))
    }

    /// Download a result file to `dest`, going through a working path so a
    /// partial download never lands on the final path.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        debug!(url, "downloading result");
        let response = self
            .http
            .get(url)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AvatarError::Api(format!("download failed: {status}")));
        }

        let bytes = response.bytes().await?;
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let tmp = dest.with_extension("download.tmp");
        fs::write(&tmp, &bytes).await?;
        fs::rename(&tmp, dest).await?;

        info!(path = %dest.display(), bytes = bytes.len(), "result downloaded");
        Ok(())
    }

    /// Check HTTP status and the `code` envelope, returning the payload.
    async fn unwrap_envelope<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
        step: &str,
    ) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AvatarError::Api(format!("{step} failed: {status} - {body}")));
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| AvatarError::MalformedResponse(format!("{step}: {e}")))?;
        if envelope.code != 0 {
            return Err(AvatarError::Api(format!(
                "{step} rejected: {}",
                envelope.message.unwrap_or_else(|| "no message".to_string())
            )));
        }
        envelope
            .data
            .ok_or_else(|| AvatarError::MalformedResponse(format!("{step}: response has no data")))
    }
}

/// Content type for an avatar image path.
pub(crate) fn image_content_type(path: &str) -> &'static str {
    let lower = path.to_lowercase();
    if lower.ends_with(".png") {
        "image/png"
    } else if lower.ends_with(".webp") {
        "image/webp"
    } else if lower.ends_with(".gif") {
        "image/gif"
    } else {
        "image/jpeg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_from_extension() {
        assert_eq!(image_content_type("avatar.png"), "image/png");
        assert_eq!(image_content_type("avatar.PNG"), "image/png");
        assert_eq!(image_content_type("avatar.jpg"), "image/jpeg");
        assert_eq!(image_content_type("avatar.jpeg"), "image/jpeg");
        assert_eq!(image_content_type("avatar.webp"), "image/webp");
        assert_eq!(image_content_type("avatar"), "image/jpeg");
    }
}
