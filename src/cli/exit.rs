//! Process exit statuses.
//!
//! Clap exits with 2 on usage errors, so command outcomes start at 3.

use crate::core::RateError;
use std::process::ExitCode;

/// Any failure without a more specific status.
pub const FAILURE: u8 = 1;
/// The address was already subscribed.
pub const ALREADY_SUBSCRIBED: u8 = 3;
/// `send-emails` was requested with nobody subscribed.
pub const NO_SUBSCRIBERS: u8 = 4;
/// An upstream rate source failed or answered with something unusable.
pub const UPSTREAM_FAILED: u8 = 5;
/// The input was rejected: invalid email or unsupported asset.
pub const INVALID_INPUT: u8 = 6;
/// The subscriber log could not be read or written.
pub const STORAGE_FAILED: u8 = 7;
/// The mail service refused or could not be reached.
pub const MAIL_FAILED: u8 = 8;

/// Maps a command failure to its exit status.
pub fn status_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<RateError>() {
        Some(RateError::NoSubscribers) => NO_SUBSCRIBERS,
        Some(RateError::UpstreamUnavailable { .. } | RateError::UpstreamMalformed { .. }) => {
            UPSTREAM_FAILED
        }
        Some(RateError::InvalidEmail(_) | RateError::UnsupportedAsset { .. }) => INVALID_INPUT,
        Some(RateError::StorageUnavailable(_)) => STORAGE_FAILED,
        Some(RateError::MailRejected { .. } | RateError::MailUnavailable(_)) => MAIL_FAILED,
        None => FAILURE,
    }
}

pub fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    ExitCode::from(status_for(err))
}
