// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Wire format of device tokens.
//!
//! A token is `token_<payload>_<signature>` where `payload` is the standard
//! base64 encoding of the JSON [`TokenPayload`] and `signature` is the
//! lowercase hex HMAC-SHA256 of the payload segment. The standard alphabet
//! never produces `_`, so the separator cannot appear inside a segment.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::errors::{AuthError, InvalidTokenReason};

type HmacSha256 = Hmac<Sha256>;

/// Literal first segment of every token.
pub const TOKEN_PREFIX: &str = "token";
/// Separator between the three token segments.
pub const TOKEN_SEPARATOR: char = '_';

/// Hex length of an HMAC-SHA256 digest.
const SIGNATURE_HEX_LEN: usize = 64;

/// Claims embedded in a token. Never stored server side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    /// Device the token authorizes updates for
    pub device_id: String,

    /// Creation time (UTC)
    pub issued_at: DateTime<Utc>,

    /// End of validity (UTC)
    pub expires_at: DateTime<Utc>,
}

impl TokenPayload {
    /// Serialize to JSON and base64 encode.
    pub fn encode(&self) -> Result<String, AuthError> {
        let json = serde_json::to_vec(self)?;
        Ok(STANDARD.encode(json))
    }

    /// Decode a payload segment. Any failure is a `format` rejection.
    pub fn decode(segment: &str) -> Result<Self, AuthError> {
        let raw = STANDARD.decode(segment).map_err(|e| {
            AuthError::invalid(
                InvalidTokenReason::Format,
                format!("payload is not valid base64: {}", e),
            )
        })?;

        serde_json::from_slice(&raw).map_err(|e| {
            AuthError::invalid(
                InvalidTokenReason::Format,
                format!("payload is not a valid token payload: {}", e),
            )
        })
    }
}

/// The three segments of a token, borrowed from the token string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenParts<'a> {
    pub prefix: &'a str,
    pub payload: &'a str,
    pub signature: &'a str,
}

impl TokenParts<'_> {
    pub fn check_prefix(&self) -> Result<(), AuthError> {
        if self.prefix != TOKEN_PREFIX {
            return Err(AuthError::invalid(
                InvalidTokenReason::Prefix,
                "invalid token prefix",
            ));
        }
        Ok(())
    }
}

/// Split a token into its segments. Checks only that the token is non-empty
/// and has exactly three segments.
pub fn split_token(token: &str) -> Result<TokenParts<'_>, AuthError> {
    if token.is_empty() {
        return Err(AuthError::invalid(
            InvalidTokenReason::Format,
            "token must be a non-empty string",
        ));
    }

    let mut segments = token.split(TOKEN_SEPARATOR);
    match (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) {
        (Some(prefix), Some(payload), Some(signature), None) => Ok(TokenParts {
            prefix,
            payload,
            signature,
        }),
        _ => Err(AuthError::invalid(
            InvalidTokenReason::Format,
            "token must have exactly 3 segments",
        )),
    }
}

/// Assemble a token from an encoded payload and its signature.
pub fn join_token(payload: &str, signature: &str) -> String {
    format!(
        "{}{}{}{}{}",
        TOKEN_PREFIX, TOKEN_SEPARATOR, payload, TOKEN_SEPARATOR, signature
    )
}

/// HMAC-SHA256 signer over payload segments.
#[derive(Clone)]
pub struct HmacSigner {
    key: Vec<u8>,
}

impl fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacSigner")
            .field("key", &"<redacted>")
            .finish()
    }
}

impl HmacSigner {
    pub fn new(key: impl AsRef<[u8]>) -> Self {
        Self {
            key: key.as_ref().to_vec(),
        }
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(&self.key)
            .map_err(|_| AuthError::SigningError("invalid secret key".to_string()))
    }

    /// Lowercase hex HMAC of `payload`.
    pub fn sign(&self, payload: &str) -> Result<String, AuthError> {
        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Check `signature` against the HMAC of `payload` in constant time.
    pub fn verify(&self, payload: &str, signature: &str) -> Result<(), AuthError> {
        if signature.len() != SIGNATURE_HEX_LEN || !is_lower_hex(signature) {
            return Err(AuthError::invalid(
                InvalidTokenReason::Signature,
                "signature is not a lowercase hex HMAC-SHA256 digest",
            ));
        }

        let expected = hex::decode(signature).map_err(|_| {
            AuthError::invalid(InvalidTokenReason::Signature, "invalid signature encoding")
        })?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&expected).map_err(|_| {
            AuthError::invalid(InvalidTokenReason::Signature, "invalid token signature")
        })
    }
}

fn is_lower_hex(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn payload() -> TokenPayload {
        let issued_at = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        TokenPayload {
            device_id: "device_1".to_string(),
            issued_at,
            expires_at: issued_at + chrono::TimeDelta::hours(24),
        }
    }

    #[test]
    fn test_payload_json_shape() {
        let json: serde_json::Value = serde_json::to_value(payload()).unwrap();
        assert_eq!(json["device_id"], "device_1");
        assert_eq!(json["issued_at"], "2025-01-01T12:00:00Z");
        assert_eq!(json["expires_at"], "2025-01-02T12:00:00Z");
    }

    #[test]
    fn test_payload_encoding_never_contains_separator() {
        let encoded = payload().encode().unwrap();
        assert!(!encoded.contains(TOKEN_SEPARATOR));
        assert_eq!(TokenPayload::decode(&encoded).unwrap(), payload());
    }

    #[test]
    fn test_payload_accepts_offset_timestamps() {
        let json = r#"{"device_id":"d","issued_at":"2025-01-01T12:00:00+00:00","expires_at":"2025-01-02T14:00:00+02:00"}"#;
        let decoded = TokenPayload::decode(&STANDARD.encode(json)).unwrap();
        assert_eq!(decoded.expires_at, payload().expires_at);
    }

    #[test]
    fn test_payload_decode_failures_are_format() {
        let not_base64 = TokenPayload::decode("***").unwrap_err();
        assert_eq!(
            not_base64.invalid_token_reason(),
            Some(InvalidTokenReason::Format)
        );

        let not_json = TokenPayload::decode(&STANDARD.encode("not json")).unwrap_err();
        assert_eq!(
            not_json.invalid_token_reason(),
            Some(InvalidTokenReason::Format)
        );

        let missing_field = TokenPayload::decode(&STANDARD.encode(r#"{"device_id":"d"}"#))
            .unwrap_err();
        assert_eq!(
            missing_field.invalid_token_reason(),
            Some(InvalidTokenReason::Format)
        );
    }

    #[test]
    fn test_split_token() {
        let parts = split_token("token_abc_def").unwrap();
        assert_eq!(parts.prefix, "token");
        assert_eq!(parts.payload, "abc");
        assert_eq!(parts.signature, "def");
        assert!(parts.check_prefix().is_ok());

        for bad in ["", "token", "token_abc", "token_a_b_c"] {
            let err = split_token(bad).unwrap_err();
            assert_eq!(err.invalid_token_reason(), Some(InvalidTokenReason::Format));
        }

        let parts = split_token("bearer_abc_def").unwrap();
        assert_eq!(
            parts.check_prefix().unwrap_err().invalid_token_reason(),
            Some(InvalidTokenReason::Prefix)
        );
    }

    #[test]
    fn test_sign_is_lowercase_hex() {
        let signer = HmacSigner::new("secret");
        let sig = signer.sign("payload").unwrap();
        assert_eq!(sig.len(), SIGNATURE_HEX_LEN);
        assert!(is_lower_hex(&sig));
        assert!(signer.verify("payload", &sig).is_ok());
    }

    #[test]
    fn test_verify_rejects_uppercase_and_truncated() {
        let signer = HmacSigner::new("secret");
        let sig = signer.sign("payload").unwrap();

        let upper = sig.to_uppercase();
        let truncated = &sig[..sig.len() / 2];
        for bad in [upper.as_str(), truncated, "", "zz"] {
            let err = signer.verify("payload", bad).unwrap_err();
            assert_eq!(
                err.invalid_token_reason(),
                Some(InvalidTokenReason::Signature)
            );
        }
    }

    #[test]
    fn test_verify_rejects_other_key() {
        let sig = HmacSigner::new("secret-a").sign("payload").unwrap();
        let err = HmacSigner::new("secret-b")
            .verify("payload", &sig)
            .unwrap_err();
        assert_eq!(
            err.invalid_token_reason(),
            Some(InvalidTokenReason::Signature)
        );
    }

    #[test]
    fn test_signer_debug_redacts_key() {
        let signer = HmacSigner::new("super-secret");
        assert!(!format!("{:?}", signer).contains("super-secret"));
    }
}
