use thiserror::Error;

/// Core error type for chatstream.
/// Internally, modules can use `anyhow::Result<T>` for convenience,
/// but public boundaries should expose `CoreResult<T>` with this error.
///
/// Only `Unauthorized`, `Request` and `Transport` end a streaming session;
/// malformed frames never reach this type.
#[derive(Debug, Error)]
pub enum ChatStreamError {
    /// The server rejected the session cookie; the caller must re-authenticate.
    #[error("unauthorized")]
    Unauthorized,

    #[error("request failed with status {status}: {message}")]
    Request { status: u16, message: String },

    /// The connection failed before or while the body was being read.
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid config: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ChatStreamError {
    /// Stable short name used for log fields and telemetry.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Request { .. } => "request",
            Self::Transport(_) => "transport",
            Self::Validation(_) => "validation",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Other(_) => "other",
        }
    }
}

pub type CoreResult<T> = std::result::Result<T, ChatStreamError>;
