// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! The authorization gate.
//!
//! Two commands: `generate_token` mints a device-bound token for a scope and
//! `update_with_token` checks such a token before forwarding a screenshot
//! update to the [`Updater`]. The scope secret is resolved on every call.

use std::panic::AssertUnwindSafe;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use pushgate_auth::{AuthError, TokenManager};
use pushgate_config::opaque::OpaqueString;

use crate::errors::GateError;
use crate::rejection::reject;
use crate::scope::SecretResolver;
use crate::updater::{ScreenshotUpdate, Updater};

pub const MSG_UPDATE_OK: &str = "Screenshot updated successfully";
pub const MSG_UPDATE_FAILED: &str = "Failed to update screenshot";
pub const MSG_GENERATE_FIELDS: &str = "scope and device_id required";
pub const MSG_UPDATE_FIELDS: &str = "scope, device_id, image_url, and token required";
pub const MSG_WRONG_DEVICE: &str = "Token is not valid for this device";
pub const MSG_INVALID_TOKEN: &str = "Invalid or expired token";
pub const MSG_NO_SECRET: &str = "No token secret configured for this scope";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GenerateTokenRequest {
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
}

impl GenerateTokenRequest {
    pub fn new(scope: &str, device_id: &str) -> Self {
        Self {
            scope: Some(scope.to_string()),
            device_id: Some(device_id.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateTokenResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UpdateWithTokenRequest {
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub token: Option<OpaqueString>,
}

impl UpdateWithTokenRequest {
    pub fn new(scope: &str, device_id: &str, image_url: &str, token: &str) -> Self {
        Self {
            scope: Some(scope.to_string()),
            device_id: Some(device_id.to_string()),
            image_url: Some(image_url.to_string()),
            token: Some(OpaqueString::new(token)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateWithTokenResponse {
    pub success: bool,
    pub message: String,
}

impl UpdateWithTokenResponse {
    fn ok() -> Self {
        Self {
            success: true,
            message: MSG_UPDATE_OK.to_string(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

// Missing and empty fields are treated alike.
fn required(field: Option<&str>) -> Option<&str> {
    field.filter(|v| !v.is_empty())
}

#[derive(Debug)]
pub struct AuthorizationGate<S, U> {
    secrets: S,
    updater: U,
}

impl<S, U> AuthorizationGate<S, U>
where
    S: SecretResolver,
    U: Updater,
{
    pub fn new(secrets: S, updater: U) -> Self {
        Self { secrets, updater }
    }

    pub fn secrets(&self) -> &S {
        &self.secrets
    }

    /// Build the token manager for `scope` from its current secret.
    pub fn token_manager(&self, scope: &str) -> Result<TokenManager, GateError> {
        let Some(config) = self.secrets.resolve(scope) else {
            error!(%scope, "no token secret configured");
            return Err(GateError::Internal(MSG_NO_SECRET.to_string()));
        };
        config.token_manager().map_err(|e| {
            error!(%scope, error = %e, "failed to build token manager");
            GateError::Internal(e.to_string())
        })
    }

    pub fn generate_token(
        &self,
        request: &GenerateTokenRequest,
    ) -> Result<GenerateTokenResponse, GateError> {
        let (Some(scope), Some(device_id)) = (
            required(request.scope.as_deref()),
            required(request.device_id.as_deref()),
        ) else {
            return Err(GateError::InvalidFormat(MSG_GENERATE_FIELDS.to_string()));
        };

        let manager = self.token_manager(scope)?;
        let now = Utc::now();
        let token = manager
            .generate_token_at(device_id, now)
            .map_err(|e| match e {
                AuthError::InvalidInput(msg) => GateError::InvalidFormat(msg),
                e => {
                    error!(%scope, %device_id, error = %e, "failed to generate token");
                    GateError::Internal(e.to_string())
                }
            })?;

        debug!(%scope, %device_id, "generated token");

        Ok(GenerateTokenResponse {
            token,
            expires_at: now + manager.ttl(),
        })
    }

    pub async fn update_with_token(
        &self,
        request: &UpdateWithTokenRequest,
    ) -> Result<UpdateWithTokenResponse, GateError> {
        let (Some(scope), Some(device_id), Some(image_url), Some(token)) = (
            required(request.scope.as_deref()),
            required(request.device_id.as_deref()),
            required(request.image_url.as_deref()),
            required(request.token.as_deref()),
        ) else {
            return Err(GateError::InvalidFormat(MSG_UPDATE_FIELDS.to_string()));
        };

        let manager = self.token_manager(scope)?;

        let verified = match manager.validate_token(token) {
            Ok(verified) => verified,
            Err(AuthError::TokenInvalid { reason, details }) => {
                let code = reject(reason, scope, device_id, &details);
                return Err(GateError::with_code(code, MSG_INVALID_TOKEN));
            }
            Err(e) => {
                error!(%scope, %device_id, error = %e, "token validation failed");
                return Err(GateError::Internal(e.to_string()));
            }
        };

        if verified.device_id() != device_id {
            warn!(
                %scope,
                token_device_id = %verified.device_id(),
                %device_id,
                "token device mismatch"
            );
            return Err(GateError::Unauthorized(MSG_WRONG_DEVICE.to_string()));
        }

        if manager.should_rotate_token(&verified) {
            info!(%scope, %device_id, expires_at = %verified.expires_at(), "token due for rotation");
        }

        let update = ScreenshotUpdate {
            device_id: device_id.to_string(),
            image_url: image_url.to_string(),
            token: OpaqueString::new(verified.as_str()),
            token_expires_at: verified.expires_at(),
            last_updated: Utc::now(),
        };

        let outcome = AssertUnwindSafe(self.updater.update_screenshot(&update))
            .catch_unwind()
            .await;

        let response = match outcome {
            Ok(Ok(true)) => {
                info!(%scope, %device_id, "screenshot updated");
                UpdateWithTokenResponse::ok()
            }
            Ok(Ok(false)) => {
                warn!(%scope, %device_id, "screenshot update failed");
                UpdateWithTokenResponse::failed(MSG_UPDATE_FAILED)
            }
            Ok(Err(e)) => {
                error!(%scope, %device_id, error = %e, "API error updating screenshot");
                UpdateWithTokenResponse::failed(format!("API error: {}", e))
            }
            Err(_) => {
                error!(%scope, %device_id, "updater panicked");
                UpdateWithTokenResponse::failed(MSG_UPDATE_FAILED)
            }
        };

        Ok(response)
    }
}
