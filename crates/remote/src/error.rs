//! Error taxonomy for the remote protocol client.

use thiserror::Error;

/// Failure to map a response body onto the internal model.
///
/// Only identity fields fail loudly; everything else degrades to a default
/// in the decoder, so hitting one of these means the response was missing
/// something the engine cannot invent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("response body is not valid JSON")]
    InvalidJson,

    #[error("response body is not a JSON object")]
    NotAnObject,

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{0}` has an unexpected type")]
    UnexpectedType(&'static str),

    #[error("server reported failure: {message}")]
    Rejected { message: String },
}

/// Classified outcome of a remote operation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    /// Malformed URL or parameters. Never retried.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Network-level failure, surfaced on whichever attempt it occurs.
    #[error("network failure: {0}")]
    Transport(#[source] reqwest::Error),

    /// Both attempts were rejected with 401; the credential has been
    /// invalidated and the caller must sign in again.
    #[error("authentication failed, please sign in again")]
    AuthenticationFailed,

    /// Non-2xx status other than 401.
    #[error("server returned status {status}")]
    Server { status: u16 },

    /// The body violated the required-field contract. Carries the raw body
    /// for diagnostics.
    #[error("malformed response: {source}")]
    Decode {
        #[source]
        source: DecodeError,
        body: String,
    },
}

impl ApiError {
    /// True for the terminal authorization failure that forces session
    /// abandonment.
    #[must_use]
    pub fn is_authorization(&self) -> bool {
        matches!(self, ApiError::AuthenticationFailed)
    }
}
