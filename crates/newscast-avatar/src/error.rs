use thiserror::Error;

/// Result type alias for video rendering.
pub type Result<T> = std::result::Result<T, AvatarError>;

/// Errors that can occur while rendering a video.
#[derive(Debug, Error)]
pub enum AvatarError {
    /// Rendering is disabled or the configuration is incomplete. Raised
    /// before any network attempt.
    #[error("avatar rendering not configured: {0}")]
    Config(String),

    /// Transport-level failure (connection, timeout).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The platform answered with a non-success status or rejected the
    /// request in its envelope.
    #[error("platform API error: {0}")]
    Api(String),

    /// The response arrived but violates the expected shape.
    #[error("malformed platform response: {0}")]
    MalformedResponse(String),

    /// The platform explicitly reported the job as failed.
    #[error("video job failed: {0}")]
    JobFailed(String),

    /// The wait budget ran out while the job was still in flight.
    #[error("video job timed out after {0} seconds")]
    Timeout(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
