//! Subscriber email addresses and their canonical form.

use crate::core::error::{RateError, RateResult};
use std::fmt::Display;

const MAX_EMAIL_LEN: usize = 254;

/// A subscriber's email address in canonical form.
///
/// Canonical form is the input with surrounding whitespace trimmed and every
/// character lower-cased. Two addresses are the same subscriber iff their
/// canonical forms are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    /// Validates and canonicalizes user input.
    pub fn parse(input: &str) -> RateResult<Self> {
        let candidate = input.trim().to_lowercase();
        if is_plausible_email(&candidate) {
            Ok(Self(candidate))
        } else {
            Err(RateError::InvalidEmail(input.to_string()))
        }
    }

    /// Rebuilds an address read back from the durable log.
    ///
    /// Log records were canonicalized when written, so only canonicalization
    /// is reapplied here; syntax is not re-checked.
    pub(crate) fn from_record(record: &str) -> Self {
        Self(record.trim().to_lowercase())
    }
}

fn is_plausible_email(candidate: &str) -> bool {
    if candidate.is_empty() || candidate.len() > MAX_EMAIL_LEN {
        return false;
    }
    if candidate.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }
    let Some((local, domain)) = candidate.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for SubscriberEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonicalizes() {
        let email = SubscriberEmail::parse("  Alice@Example.COM \n").unwrap();
        assert_eq!(email.as_ref(), "alice@example.com");
        assert_eq!(email, SubscriberEmail::parse("alice@example.com").unwrap());
    }

    #[test]
    fn test_parse_rejects_invalid_addresses() {
        for input in [
            "",
            "   ",
            "plainaddress",
            "@example.com",
            "alice@",
            "alice@localhost",
            "alice@@example.com",
            "ali ce@example.com",
            "alice@example.com.",
            "alice@.example.com",
        ] {
            let result = SubscriberEmail::parse(input);
            assert!(
                matches!(result, Err(RateError::InvalidEmail(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_rejects_overlong_address() {
        let input = format!("{}@example.com", "a".repeat(250));
        assert!(SubscriberEmail::parse(&input).is_err());
    }
}
