//! Error types shared by the rate, registry and dispatch components.

use thiserror::Error;

/// Errors surfaced by the core components.
///
/// Upstream errors name the provider and URL that failed so callers never
/// have to guess which side of the aggregate broke.
#[derive(Debug, Error)]
pub enum RateError {
    /// The provider could not be reached or answered with a non-success status.
    #[error("{source_name} is unavailable at {url}: {reason}")]
    UpstreamUnavailable {
        source_name: String,
        url: String,
        reason: String,
    },

    /// The provider answered successfully but the expected field was missing
    /// or was not a number.
    #[error("{source_name} returned a malformed response from {url}: missing numeric field `{field}`")]
    UpstreamMalformed {
        source_name: String,
        url: String,
        field: String,
    },

    /// The provider cannot price the requested asset.
    #[error("{source_name} does not support asset {asset}")]
    UnsupportedAsset { source_name: String, asset: String },

    /// The durable subscriber log could not be read or written.
    #[error("Subscriber storage is unavailable: {0}")]
    StorageUnavailable(String),

    /// Dispatch was requested while the registry is empty.
    #[error("No subscribed email addresses")]
    NoSubscribers,

    /// The address does not look like an email address.
    #[error("Invalid email address: {0:?}")]
    InvalidEmail(String),

    /// The mail API refused the message.
    #[error("Mail transport rejected message to {recipient}: {reason}")]
    MailRejected { recipient: String, reason: String },

    /// The mail API could not be reached.
    #[error("Mail transport is unavailable: {0}")]
    MailUnavailable(String),
}

impl RateError {
    pub(crate) fn storage(context: &str, err: impl std::fmt::Display) -> Self {
        RateError::StorageUnavailable(format!("{context}: {err}"))
    }
}

/// Result type for core operations.
pub type RateResult<T> = Result<T, RateError>;
