use thiserror::Error;

/// Shown whenever the request never reached the backend.
pub const CONNECTIVITY_MESSAGE: &str =
    "Cannot connect to the backend server. Please verify the backend is running and try again.";

/// Failure category of a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    QuotaExceeded,
    Configuration,
    Authentication,
    RateLimited,
    Backend,
    Connectivity,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::QuotaExceeded => "quota_exceeded",
            ErrorKind::Configuration => "configuration",
            ErrorKind::Authentication => "authentication",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::Backend => "backend",
            ErrorKind::Connectivity => "connectivity",
        }
    }
}

/// Error returned by the chat client. Every variant carries the
/// user-facing message, already classified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("{0}")]
    QuotaExceeded(String),

    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    RateLimited(String),

    #[error("{0}")]
    Backend(String),

    #[error("{0}")]
    Connectivity(String),
}

impl ClientError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::QuotaExceeded => Self::QuotaExceeded(message),
            ErrorKind::Configuration => Self::Configuration(message),
            ErrorKind::Authentication => Self::Authentication(message),
            ErrorKind::RateLimited => Self::RateLimited(message),
            ErrorKind::Backend => Self::Backend(message),
            ErrorKind::Connectivity => Self::Connectivity(message),
        }
    }

    pub fn connectivity() -> Self {
        Self::Connectivity(CONNECTIVITY_MESSAGE.to_string())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::QuotaExceeded(_) => ErrorKind::QuotaExceeded,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::RateLimited(_) => ErrorKind::RateLimited,
            Self::Backend(_) => ErrorKind::Backend,
            Self::Connectivity(_) => ErrorKind::Connectivity,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::QuotaExceeded(m)
            | Self::Configuration(m)
            | Self::Authentication(m)
            | Self::RateLimited(m)
            | Self::Backend(m)
            | Self::Connectivity(m) => m,
        }
    }

    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }
}
