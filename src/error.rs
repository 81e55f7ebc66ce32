//! Error types for streaming sessions.

#[derive(Debug, thiserror::Error)]
pub enum PacingError {
    #[error("streaming is not supported for channel '{channel}'")]
    UnsupportedChannel { channel: String },

    #[error("streaming session was cancelled")]
    Cancelled,

    #[error("fragment source failed: {source}")]
    Source {
        #[source]
        source: anyhow::Error,
    },

    #[error("chat surface call failed: {source}")]
    Sink {
        #[source]
        source: anyhow::Error,
    },
}

pub type PacingResult<T> = Result<T, PacingError>;
