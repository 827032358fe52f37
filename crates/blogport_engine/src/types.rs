use thiserror::Error;

/// A failed media download attempt. Recorded on the resource, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == FailureKind::Cancelled
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureKind {
    /// Only http and https candidates are fetched.
    #[error("unsupported url scheme")]
    InvalidUrl,
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("timeout")]
    Timeout,
    #[error("redirect limit exceeded")]
    RedirectLimitExceeded,
    #[error("response too large (max {max_bytes} bytes, got {actual})")]
    TooLarge { max_bytes: u64, actual: u64 },
    #[error("cancelled")]
    Cancelled,
    #[error("io error")]
    Io,
    #[error("network error")]
    Network,
}
