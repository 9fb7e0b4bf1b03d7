use thiserror::Error;

/// Typed failure classes for remote gist-service calls. The sync engine's
/// retry policy keys off these: only transient and rate-limit failures are
/// ever retried.
#[derive(Clone, Debug, Error)]
pub enum RemoteError {
    #[error("unauthorized (token invalid/expired; run `gistling login`)")]
    Unauthorized,

    #[error("gist not found: {0}")]
    NotFound(String),

    #[error("precondition failed: {0} changed remotely since last sync")]
    PreconditionFailed(String),

    #[error("rate limited by remote")]
    RateLimited,

    #[error("transient remote failure: {0}")]
    Transient(String),

    #[error("remote error ({status}): {message}")]
    Unknown { status: u16, message: String },
}

impl RemoteError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::RateLimited)
    }
}
