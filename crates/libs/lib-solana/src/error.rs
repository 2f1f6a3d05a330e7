//! # Fetch Error Types
//!
//! Error taxonomy shared by every fetch client. A failed fetch never
//! carries partial data; callers keep their last good value and surface
//! the error kind as a per-source flag.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned by a single fetch operation.
///
/// # Error Variants
///
/// - **Timeout**: the request did not complete within the caller's budget
/// - **Upstream**: the endpoint answered with a non-success status or the
///   transport failed
/// - **Parse**: the endpoint answered but the payload was malformed
/// - **NotFound**: the queried account has no on-chain record (callers
///   treat an unfunded account as balance 0, not as a failure)
#[derive(Debug, Error)]
pub enum FetchError {
    /// Request exceeded its time budget and was aborted.
    #[error("request timed out")]
    Timeout,

    /// Non-success response or transport failure from the endpoint.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// The response body could not be decoded into the expected shape.
    #[error("malformed payload: {0}")]
    Parse(String),

    /// The queried account has no on-chain record.
    #[error("account has no on-chain record")]
    NotFound,
}

/// Flag-friendly classification of a [`FetchError`].
///
/// Stored in per-source state and serialized into the view snapshot, so
/// presentation can distinguish "endpoint unreachable" from "payload
/// malformed" without carrying the full error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FetchErrorKind {
    Timeout,
    Upstream,
    Parse,
    NotFound,
}

impl FetchError {
    /// Classification of this error for per-source flags.
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Timeout => FetchErrorKind::Timeout,
            FetchError::Upstream(_) => FetchErrorKind::Upstream,
            FetchError::Parse(_) => FetchErrorKind::Parse,
            FetchError::NotFound => FetchErrorKind::NotFound,
        }
    }
}
