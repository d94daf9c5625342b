//! Shared error types for the services crate.

use thiserror::Error;

use remote::ApiError;

/// Errors surfaced by the session controller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    /// Another operation is already in flight; the caller ignored the busy
    /// indicator.
    #[error("another session operation is already in flight")]
    Busy,

    #[error("no active study session")]
    NoActiveSession,

    #[error("no card is currently presented")]
    NoCurrentCard,

    /// The controller is in `AuthFailed`; the flag must be reset (after the
    /// auth collaborator obtains a new credential) before starting again.
    #[error("authentication failed, sign in again before starting a session")]
    AuthRequired,

    #[error("operation is not valid in the current session state")]
    InvalidState,

    /// The session this operation belonged to was discarded while the call
    /// was in flight; its response was ignored.
    #[error("session ended while the operation was in flight")]
    Stale,

    #[error(transparent)]
    Api(#[from] ApiError),
}
