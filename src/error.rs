//! Error types for the daybrief service.

use crate::channels::traits::DispatchError;

/// Request-scoped failure of one digest request.
///
/// Each variant maps to a stable [`category`](DigestError::category) and a
/// distinct [`user_message`](DigestError::user_message), because each one
/// calls for a different fix by the user.
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    /// No profile matches the user id or sender address.
    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    /// The profile exists but has nowhere to deliver to.
    #[error("profile {0} has no destination address")]
    DestinationNotSet(String),

    /// A calendar action was requested but no credential is on file.
    #[error("profile {0} has no calendar credential")]
    CredentialMissing(String),

    /// The calendar provider rejected the stored credential.
    #[error("calendar credential expired: {0}")]
    AuthExpired(String),

    /// The messaging provider refused the final message.
    #[error("dispatch rejected: {0}")]
    DispatchRejected(#[from] DispatchError),

    /// Aggregation failed for a reason other than the credential.
    #[error("agenda error: {0}")]
    Agenda(String),

    /// Profile store access failed.
    #[error("profile store error: {0}")]
    Store(String),
}

impl DigestError {
    /// Machine-readable category for structured responses.
    pub fn category(&self) -> &'static str {
        match self {
            Self::ProfileNotFound(_) => "profile_not_found",
            Self::DestinationNotSet(_) => "destination_not_set",
            Self::CredentialMissing(_) => "credential_missing",
            Self::AuthExpired(_) => "auth_expired",
            Self::DispatchRejected(_) => "dispatch_rejected",
            Self::Agenda(_) => "agenda_error",
            Self::Store(_) => "store_error",
        }
    }

    /// Message suitable for showing to the end user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::ProfileNotFound(_) => {
                "We couldn't find a daybrief account for this number. Sign up on the dashboard and add your WhatsApp number to get started."
            }
            Self::DestinationNotSet(_) => {
                "Add your WhatsApp number on the dashboard so we know where to send your schedule."
            }
            Self::CredentialMissing(_) => {
                "Your Google Calendar isn't connected yet. Connect it on the dashboard to start receiving your schedule."
            }
            Self::AuthExpired(_) => {
                "Your Google Calendar connection has expired. Sign in again on the dashboard to keep receiving updates."
            }
            Self::DispatchRejected(_) => {
                "The messaging provider refused to deliver your schedule."
            }
            Self::Agenda(_) | Self::Store(_) => {
                "Something went wrong while preparing your schedule. Please try again later."
            }
        }
    }

    /// Provider-supplied detail, when the provider gave one.
    pub fn detail(&self) -> Option<&serde_json::Value> {
        match self {
            Self::DispatchRejected(err) => err.detail.as_ref(),
            _ => None,
        }
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, DigestError>;
