use thiserror::Error;

/// Result type alias for Feishu delivery.
pub type FeishuResult<T> = std::result::Result<T, FeishuError>;

/// Errors that can occur while delivering to Feishu.
#[derive(Debug, Error)]
pub enum FeishuError {
    /// Neither a webhook URL nor a complete credential set is configured.
    #[error("feishu delivery not configured: set webhook_url or app_id/app_secret/chat_id")]
    NotConfigured,

    /// Transport-level failure (connection, timeout).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Feishu answered with a non-success HTTP status.
    #[error("feishu returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// Feishu answered 200 but rejected the request in its envelope.
    #[error("feishu rejected request: {0}")]
    Rejected(String),

    /// The configured proxy URL is invalid.
    #[error("invalid proxy URL: {0}")]
    Proxy(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
