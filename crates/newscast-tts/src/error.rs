use thiserror::Error;

/// Result type alias for synthesis operations.
pub type Result<T> = std::result::Result<T, TtsError>;

/// Errors that can occur during speech synthesis.
#[derive(Debug, Error)]
pub enum TtsError {
    /// The requested backend is unknown or not installed. Raised at engine
    /// construction, not per call.
    #[error("TTS engine not available: {0}")]
    EngineUnavailable(String),

    /// The input text is empty after markup cleanup.
    #[error("text is empty, nothing to synthesize")]
    EmptyInput,

    /// A chunk failed to synthesize. The whole operation fails rather than
    /// silently omitting a paragraph.
    #[error("synthesis failed: {0}")]
    Synthesis(String),

    /// Multiple chunks were produced but no merge capability is available
    /// and the policy forbids a truncated artifact.
    #[error("audio merge capability unavailable and merge policy is fail")]
    MergeUnavailable,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
