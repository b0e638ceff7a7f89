use thiserror::Error;

/// Failure categories surfaced by the sound-generation collaborator. The
/// batch loop only ever inspects the category; the payload is for log lines.
#[derive(Debug, Error)]
pub enum SfxError {
    #[error("invalid or unauthorized API key: {0}")]
    ApiKey(String),

    #[error("rate limited by the ElevenLabs API: {0}")]
    RateLimit(String),

    #[error("generation parameters rejected: {0}")]
    Parameter(String),

    #[error("sound generation failed: {0}")]
    Generation(String),

    #[error("transport error talking to the ElevenLabs API: {0}")]
    Transport(#[from] reqwest::Error),
}

impl SfxError {
    /// Stable label used to categorize per-item failures in log lines.
    pub fn category(&self) -> &'static str {
        match self {
            SfxError::ApiKey(_) => "API key",
            SfxError::RateLimit(_) => "rate limit",
            SfxError::Parameter(_) => "parameter",
            SfxError::Generation(_) => "generation",
            SfxError::Transport(_) => "transport",
        }
    }

    /// Transient failures worth burning a retry on. Key and parameter
    /// rejections will not get better by asking again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SfxError::RateLimit(_) | SfxError::Generation(_) | SfxError::Transport(_)
        )
    }
}
