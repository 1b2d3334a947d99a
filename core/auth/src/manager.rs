// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Issue and verify device tokens under a per-installation secret.
//!
//! The manager holds no mutable state: every operation is a pure function of
//! the secret, the token and the current time, so a single instance (or a
//! fresh one per request) can be shared freely across tasks.

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use tracing::{debug, warn};

use crate::codec::{self, HmacSigner, TokenPayload};
use crate::errors::{AuthError, InvalidTokenReason};

/// Default token validity, in hours.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;
/// Default window before expiry in which callers should mint a new token, in hours.
pub const DEFAULT_ROTATION_THRESHOLD_HOURS: i64 = 6;

/// Secrets shorter than this are accepted but logged.
/// 32 bytes (~256 bits) is a reasonable baseline for HMAC-SHA256.
const RECOMMENDED_SECRET_LEN: usize = 32;
/// Raw length of secrets produced by [`generate_secret`].
const GENERATED_SECRET_LEN: usize = 32;

/// A token whose signature and expiry were checked by
/// [`TokenManager::validate_token`]. There is no other way to build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    token: String,
    payload: TokenPayload,
}

impl VerifiedToken {
    pub fn as_str(&self) -> &str {
        &self.token
    }

    pub fn device_id(&self) -> &str {
        &self.payload.device_id
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.payload.expires_at
    }
}

#[derive(Debug, Clone)]
pub struct TokenManager {
    signer: HmacSigner,
    ttl: TimeDelta,
    rotation_threshold: TimeDelta,
}

impl TokenManager {
    pub fn new(secret: &str) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::ConfigError(
                "token secret must be a non-empty string".to_string(),
            ));
        }
        if secret.len() < RECOMMENDED_SECRET_LEN {
            warn!(
                len = secret.len(),
                recommended = RECOMMENDED_SECRET_LEN,
                "token secret is shorter than recommended"
            );
        }

        Ok(Self {
            signer: HmacSigner::new(secret),
            ttl: TimeDelta::hours(DEFAULT_TOKEN_TTL_HOURS),
            rotation_threshold: TimeDelta::hours(DEFAULT_ROTATION_THRESHOLD_HOURS),
        })
    }

    pub fn with_ttl(self, ttl: TimeDelta) -> Self {
        Self { ttl, ..self }
    }

    pub fn with_rotation_threshold(self, rotation_threshold: TimeDelta) -> Self {
        Self {
            rotation_threshold,
            ..self
        }
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    pub fn rotation_threshold(&self) -> TimeDelta {
        self.rotation_threshold
    }

    /// Mint a token for `device_id`, valid for the configured TTL from now.
    pub fn generate_token(&self, device_id: &str) -> Result<String, AuthError> {
        self.generate_token_at(device_id, Utc::now())
    }

    pub fn generate_token_at(
        &self,
        device_id: &str,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        if device_id.is_empty() {
            return Err(AuthError::InvalidInput(
                "device_id must be a non-empty string".to_string(),
            ));
        }

        let payload = TokenPayload {
            device_id: device_id.to_owned(),
            issued_at: now,
            expires_at: now + self.ttl,
        };

        let encoded = payload.encode()?;
        let signature = self.signer.sign(&encoded)?;

        debug!(
            %device_id,
            expires_at = %payload.expires_at,
            "generated token"
        );

        Ok(codec::join_token(&encoded, &signature))
    }

    /// Verify a token and return it in its verified form.
    pub fn validate_token(&self, token: &str) -> Result<VerifiedToken, AuthError> {
        self.validate_token_at(token, Utc::now())
    }

    pub fn validate_token_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<VerifiedToken, AuthError> {
        // Step 1-2: non-empty, three segments
        let parts = codec::split_token(token)?;

        // Step 3: prefix
        parts.check_prefix()?;

        // Step 4: signature. Nothing in the payload is read before this passes.
        self.signer.verify(parts.payload, parts.signature)?;

        // Step 5: payload
        let payload = TokenPayload::decode(parts.payload)?;

        // Step 6: expiry
        if now >= payload.expires_at {
            return Err(AuthError::invalid(
                InvalidTokenReason::Expired,
                format!("token expired at {}", payload.expires_at),
            ));
        }

        debug!(device_id = %payload.device_id, "validated token");

        Ok(VerifiedToken {
            token: token.to_owned(),
            payload,
        })
    }

    /// Whether the token is close enough to expiry that a replacement should be minted.
    pub fn should_rotate_token(&self, token: &VerifiedToken) -> bool {
        self.should_rotate_token_at(token, Utc::now())
    }

    pub fn should_rotate_token_at(&self, token: &VerifiedToken, now: DateTime<Utc>) -> bool {
        let should_rotate = token.expires_at() <= now + self.rotation_threshold;
        if should_rotate {
            debug!(
                device_id = %token.device_id(),
                expires_at = %token.expires_at(),
                "token is near expiration"
            );
        }
        should_rotate
    }

    /// Decode the payload without checking prefix, signature or expiry.
    ///
    /// Only for logging and introspection. Never base an authorization
    /// decision on the result.
    pub fn get_token_info(&self, token: &str) -> Result<TokenPayload, AuthError> {
        let parts = codec::split_token(token)?;
        TokenPayload::decode(parts.payload)
    }
}

/// Generate a fresh random secret, hex encoded.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; GENERATED_SECRET_LEN];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}
