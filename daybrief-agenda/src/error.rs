//! Error types for the daybrief-agenda crate.
//!
//! Messages are stable and safe to log. Bearer credentials never appear in
//! an error message.

/// Errors that can occur while collecting a schedule.
#[derive(Debug, thiserror::Error)]
pub enum AgendaError {
    /// The provider rejected the credential (HTTP 401/403).
    #[error("credential rejected: {0}")]
    Auth(String),

    /// An HTTP request to a provider failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A provider response could not be interpreted.
    #[error("parse error: {0}")]
    Parse(String),

    /// A container fetch did not finish within its time budget.
    #[error("timed out: {0}")]
    Timeout(String),

    /// Invalid agenda configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl AgendaError {
    /// Returns `true` when the whole credential is dead rather than one
    /// resource being unavailable.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

/// Convenience type alias for daybrief-agenda results.
pub type Result<T> = std::result::Result<T, AgendaError>;
