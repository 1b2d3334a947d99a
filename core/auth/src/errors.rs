// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use thiserror::Error;

/// Why a token was rejected. Variants are listed in the order the checks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidTokenReason {
    /// Empty token, wrong number of segments or undecodable payload
    Format,
    /// First segment is not the token prefix
    Prefix,
    /// HMAC does not match the payload under the configured secret
    Signature,
    /// `expires_at` is not in the future
    Expired,
}

impl InvalidTokenReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidTokenReason::Format => "format",
            InvalidTokenReason::Prefix => "prefix",
            InvalidTokenReason::Signature => "signature",
            InvalidTokenReason::Expired => "expired",
        }
    }
}

impl fmt::Display for InvalidTokenReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    // Configuration
    #[error("config error: {0}")]
    ConfigError(String),

    // Caller input, rejected before any cryptographic work
    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Token lifecycle
    #[error("token invalid ({reason}): {details}")]
    TokenInvalid {
        reason: InvalidTokenReason,
        details: String,
    },

    // Signing
    #[error("signing error: {0}")]
    SigningError(String),

    // Serialization
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl AuthError {
    pub(crate) fn invalid(reason: InvalidTokenReason, details: impl Into<String>) -> Self {
        AuthError::TokenInvalid {
            reason,
            details: details.into(),
        }
    }

    /// The rejection reason, if this error is a token rejection.
    pub fn invalid_token_reason(&self) -> Option<InvalidTokenReason> {
        match self {
            AuthError::TokenInvalid { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_strings() {
        assert_eq!(InvalidTokenReason::Format.to_string(), "format");
        assert_eq!(InvalidTokenReason::Prefix.to_string(), "prefix");
        assert_eq!(InvalidTokenReason::Signature.to_string(), "signature");
        assert_eq!(InvalidTokenReason::Expired.to_string(), "expired");
    }

    #[test]
    fn test_invalid_token_reason_accessor() {
        let err = AuthError::invalid(InvalidTokenReason::Expired, "token has expired");
        assert_eq!(err.invalid_token_reason(), Some(InvalidTokenReason::Expired));
        assert!(err.to_string().contains("expired"));

        let err = AuthError::InvalidInput("device_id is empty".to_string());
        assert_eq!(err.invalid_token_reason(), None);
    }
}
