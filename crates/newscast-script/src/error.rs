use thiserror::Error;

/// Result type alias for script generation.
pub type Result<T> = std::result::Result<T, ScriptError>;

/// Errors that can occur while generating a script.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// Generation is disabled or the configuration is incomplete. Raised
    /// before any network attempt.
    #[error("script generation not configured: {0}")]
    Config(String),

    /// The provider rejected the credential.
    #[error("provider rejected credentials (HTTP {status})")]
    Auth { status: u16 },

    /// The provider rate-limited the request.
    #[error("provider rate limited the request")]
    RateLimited,

    /// Any other non-success status from the provider.
    #[error("provider returned HTTP {status}: {body}")]
    Service { status: u16, body: String },

    /// The response arrived but lacks the expected text field.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// Transport-level failure (connection, timeout).
    #[error("network error calling provider: {0}")]
    Network(#[from] reqwest::Error),
}
