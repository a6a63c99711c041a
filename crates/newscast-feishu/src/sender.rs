use std::path::Path;
use std::time::Duration;

use newscast_core::FeishuSettings;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::json;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{FeishuError, FeishuResult};

const OPEN_API_BASE: &str = "https://open.feishu.cn";
const HEADLINE: &str = "📢 **AI财经热点新闻汇总播报**";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Delivers bulletins to a Feishu group.
///
/// The open-platform credentials are preferred when complete; otherwise the
/// webhook is used. Every send is best-effort and at-most-once.
pub struct FeishuSender {
    client: Client,
    settings: FeishuSettings,
    api_base: String,
}

impl FeishuSender {
    pub fn new(settings: FeishuSettings) -> FeishuResult<Self> {
        let mut builder = Client::builder().timeout(REQUEST_TIMEOUT);
        if let Some(proxy_url) = settings.proxy_url.as_deref().filter(|s| !s.is_empty()) {
            let proxy =
                reqwest::Proxy::all(proxy_url).map_err(|e| FeishuError::Proxy(e.to_string()))?;
            builder = builder.proxy(proxy);
        }
        Ok(Self {
            client: builder.build()?,
            settings,
            api_base: OPEN_API_BASE.to_string(),
        })
    }

    /// Override the open-platform endpoint (e.g. for a gateway).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Send the bulletin text and, where the mode supports it, the audio.
    pub async fn send_script(&self, script: &str, audio: Option<&Path>) -> FeishuResult<()> {
        if self.settings.has_api_credentials() {
            self.send_via_api(script, audio).await
        } else if let Some(webhook_url) = self
            .settings
            .webhook_url
            .as_deref()
            .filter(|s| !s.is_empty())
        {
            self.send_via_webhook(webhook_url, script, audio).await
        } else {
            Err(FeishuError::NotConfigured)
        }
    }

    /// Webhook mode: one text message. Webhooks cannot carry files, so the
    /// audio is referenced as a link when a public base URL is configured.
    async fn send_via_webhook(
        &self,
        webhook_url: &str,
        script: &str,
        audio: Option<&Path>,
    ) -> FeishuResult<()> {
        let mut content = format!("{HEADLINE}\n\n{script}");
        if let (Some(audio), Some(base_url)) = (
            audio,
            self.settings.base_url.as_deref().filter(|s| !s.is_empty()),
        ) {
            let link = audio_link(base_url, audio);
            content.push_str(&format!("\n\n🎵 **音频文件**: [点击收听]({link})"));
        }

        let payload = json!({
            "msg_type": "text",
            "content": {"text": content},
        });
        let response = self.client.post(webhook_url).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeishuError::Api {
                status: status.as_u16(),
                body,
            });
        }

        info!("bulletin sent via feishu webhook");
        Ok(())
    }

    /// Open-platform mode: fetch a tenant token, send the text, then upload
    /// and send the audio file.
    async fn send_via_api(&self, script: &str, audio: Option<&Path>) -> FeishuResult<()> {
        let token = self.tenant_token().await?;

        let text = format!("{HEADLINE}\n\n{script}");
        self.send_message(&token, "text", &json!({"text": text}).to_string())
            .await?;
        info!("bulletin text sent via feishu API");

        if let Some(audio) = audio {
            let file_token = self.upload_audio(&token, audio).await?;
            self.send_message(&token, "file", &json!({"file_key": file_token}).to_string())
                .await?;
            info!("bulletin audio sent via feishu API");
        }
        Ok(())
    }

    /// Single fetch-and-use tenant token; no caching or refresh.
    async fn tenant_token(&self) -> FeishuResult<String> {
        let response = self
            .client
            .post(format!(
                "{}/open-apis/auth/v3/tenant_access_token/internal",
                self.api_base
            ))
            .json(&json!({
                "app_id": self.settings.app_id,
                "app_secret": self.settings.app_secret,
            }))
            .send()
            .await?;

        let parsed: TokenResponse = check_status(response).await?;
        if parsed.code != 0 {
            return Err(FeishuError::Rejected(
                parsed.msg.unwrap_or_else(|| "token request failed".to_string()),
            ));
        }
        parsed
            .tenant_access_token
            .ok_or_else(|| FeishuError::Rejected("token response has no token".to_string()))
    }

    async fn send_message(
        &self,
        token: &str,
        msg_type: &str,
        content: &str,
    ) -> FeishuResult<()> {
        let response = self
            .client
            .post(format!(
                "{}/open-apis/im/v1/messages?receive_id_type=chat_id",
                self.api_base
            ))
            .bearer_auth(token)
            .json(&json!({
                "receive_id": self.settings.chat_id,
                "msg_type": msg_type,
                "content": content,
            }))
            .send()
            .await?;

        let parsed: ApiResponse = check_status(response).await?;
        if parsed.code != 0 {
            return Err(FeishuError::Rejected(
                parsed.msg.unwrap_or_else(|| "message send failed".to_string()),
            ));
        }
        Ok(())
    }

    async fn upload_audio(&self, token: &str, audio: &Path) -> FeishuResult<String> {
        let data = fs::read(audio).await?;
        debug!(path = %audio.display(), bytes = data.len(), "uploading audio to feishu");

        let file_name = audio
            .file_name()
            .map_or_else(|| "audio.mp3".to_string(), |n| n.to_string_lossy().to_string());
        let form = Form::new()
            .part(
                "file",
                Part::bytes(data)
                    .file_name(file_name)
                    .mime_str("audio/mpeg")
                    .map_err(FeishuError::Http)?,
            )
            .text("file_type", "stream");

        let response = self
            .client
            .post(format!(
                "{}/open-apis/drive/v1/files/upload_all",
                self.api_base
            ))
            .bearer_auth(token)
            .timeout(UPLOAD_TIMEOUT)
            .multipart(form)
            .send()
            .await?;

        let parsed: UploadResponse = check_status(response).await?;
        if parsed.code != 0 {
            return Err(FeishuError::Rejected(
                parsed.msg.unwrap_or_else(|| "file upload failed".to_string()),
            ));
        }
        parsed
            .data
            .map(|d| d.file_token)
            .ok_or_else(|| FeishuError::Rejected("upload response has no file token".to_string()))
    }
}

/// Build the public listen link, percent-encoding each path segment while
/// keeping the separators.
fn audio_link(base_url: &str, audio: &Path) -> String {
    let relative = audio.display().to_string().replace('\\', "/");
    let encoded: Vec<String> = relative
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!("{}/{}", base_url.trim_end_matches('/'), encoded.join("/"))
}

async fn check_status<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> FeishuResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(FeishuError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json().await?)
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    tenant_access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    data: Option<UploadData>,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    file_token: String,
}
