// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! The capability that pushes an authorized screenshot to a device.

pub mod http;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use pushgate_config::opaque::OpaqueString;

/// An authorized update, ready to be pushed.
///
/// The token is forwarded so the device can fetch `image_url` with the same
/// bearer credential.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenshotUpdate {
    pub device_id: String,
    pub image_url: String,
    pub token: OpaqueString,
    pub token_expires_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Error, Debug)]
pub enum UpdaterError {
    #[error("invalid API key")]
    InvalidApiKey,
    #[error("plugin {0} not found")]
    PluginNotFound(String),
    #[error("API returned status {status}")]
    Status { status: u16, body: String },
    #[error("connection error: {0}")]
    Connection(String),
    #[error("configuration error: {0}")]
    ConfigError(String),
    #[error("no updater configured")]
    NotConfigured,
}

#[async_trait]
pub trait Updater: Send + Sync {
    /// Push the update. `Ok(false)` means the push was refused without an
    /// error; the gate reports it as an unsuccessful update.
    async fn update_screenshot(&self, update: &ScreenshotUpdate) -> Result<bool, UpdaterError>;
}

#[async_trait]
impl<U: Updater> Updater for Option<U> {
    async fn update_screenshot(&self, update: &ScreenshotUpdate) -> Result<bool, UpdaterError> {
        match self {
            Some(updater) => updater.update_screenshot(update).await,
            None => Err(UpdaterError::NotConfigured),
        }
    }
}

#[async_trait]
impl<U: Updater + ?Sized> Updater for std::sync::Arc<U> {
    async fn update_screenshot(&self, update: &ScreenshotUpdate) -> Result<bool, UpdaterError> {
        (**self).update_screenshot(update).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Accepting;

    #[async_trait]
    impl Updater for Accepting {
        async fn update_screenshot(&self, _: &ScreenshotUpdate) -> Result<bool, UpdaterError> {
            Ok(true)
        }
    }

    fn update() -> ScreenshotUpdate {
        ScreenshotUpdate {
            device_id: "dev1".to_string(),
            image_url: "https://example.com/a.png".to_string(),
            token: OpaqueString::new("token_x_y"),
            token_expires_at: Utc::now(),
            last_updated: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_optional_updater() {
        let none: Option<Accepting> = None;
        assert!(matches!(
            none.update_screenshot(&update()).await,
            Err(UpdaterError::NotConfigured)
        ));
        assert!(Some(Accepting).update_screenshot(&update()).await.unwrap());
    }

    #[test]
    fn test_token_redacted_in_debug() {
        assert!(!format!("{:?}", update()).contains("token_x_y"));
    }
}
