// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Updater backed by the device cloud's plugin-variables endpoint.
//!
//! An update is a `POST {base_url}/custom_plugins/{plugin_uuid}/variables`
//! carrying the merge variables the plugin template renders: the image URL,
//! the bearer token the device uses to fetch it, and its expiry.

use std::time::Duration;

use async_trait::async_trait;
use duration_str::deserialize_duration;
use reqwest::{Client as ReqwestClient, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use url::Url;

use pushgate_config::component::configuration::{Configuration, ConfigurationError};
use pushgate_config::opaque::OpaqueString;

use super::{ScreenshotUpdate, Updater, UpdaterError};

const USER_AGENT: &str = concat!("pushgate/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HttpUpdaterConfig {
    /// API root, e.g. `https://api.example.com/api`
    base_url: String,

    /// Bearer key for the API
    api_key: OpaqueString,

    /// Plugin whose variables receive the update
    plugin_uuid: String,

    /// Request timeout (default: 10s)
    #[serde(
        default = "default_timeout",
        deserialize_with = "deserialize_duration"
    )]
    timeout: Duration,
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

impl HttpUpdaterConfig {
    pub fn new(base_url: &str, api_key: impl Into<OpaqueString>, plugin_uuid: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: api_key.into(),
            plugin_uuid: plugin_uuid.to_string(),
            timeout: default_timeout(),
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn plugin_uuid(&self) -> &str {
        &self.plugin_uuid
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/custom_plugins/{}/variables",
            self.base_url.trim_end_matches('/'),
            self.plugin_uuid
        )
    }
}

impl Configuration for HttpUpdaterConfig {
    type Error = ConfigurationError;

    fn validate(&self) -> Result<(), Self::Error> {
        let url = Url::parse(&self.base_url).map_err(|e| ConfigurationError::InvalidValue {
            field: "base_url".to_string(),
            details: e.to_string(),
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigurationError::InvalidValue {
                field: "base_url".to_string(),
                details: format!("unsupported scheme {}", url.scheme()),
            });
        }
        if self.api_key.is_empty() {
            return Err(ConfigurationError::MissingField("api_key".to_string()));
        }
        if self.plugin_uuid.is_empty() {
            return Err(ConfigurationError::MissingField("plugin_uuid".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(ConfigurationError::InvalidValue {
                field: "timeout".to_string(),
                details: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct VariablesRequest<'a> {
    device_id: &'a str,
    merge_vars: MergeVars<'a>,
}

#[derive(Serialize)]
struct MergeVars<'a> {
    ha_image_url: &'a str,
    ha_auth_token: &'a str,
    ha_token_expires: String,
    last_updated: String,
    device_id: &'a str,
}

impl<'a> From<&'a ScreenshotUpdate> for VariablesRequest<'a> {
    fn from(update: &'a ScreenshotUpdate) -> Self {
        VariablesRequest {
            device_id: &update.device_id,
            merge_vars: MergeVars {
                ha_image_url: &update.image_url,
                ha_auth_token: &update.token,
                ha_token_expires: update.token_expires_at.to_rfc3339(),
                last_updated: update.last_updated.to_rfc3339(),
                device_id: &update.device_id,
            },
        }
    }
}

#[derive(Debug)]
pub struct HttpUpdater {
    config: HttpUpdaterConfig,
    endpoint: String,
    client: ReqwestClient,
}

impl HttpUpdater {
    pub fn new(config: HttpUpdaterConfig) -> Result<Self, UpdaterError> {
        config
            .validate()
            .map_err(|e| UpdaterError::ConfigError(e.to_string()))?;

        let client = ReqwestClient::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                UpdaterError::ConfigError(format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            endpoint: config.endpoint(),
            config,
            client,
        })
    }

    pub fn config(&self) -> &HttpUpdaterConfig {
        &self.config
    }
}

#[async_trait]
impl Updater for HttpUpdater {
    async fn update_screenshot(&self, update: &ScreenshotUpdate) -> Result<bool, UpdaterError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&*self.config.api_key)
            .json(&VariablesRequest::from(update))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if status.is_success() {
            debug!(
                plugin_uuid = %self.config.plugin_uuid,
                device_id = %update.device_id,
                "updated plugin variables"
            );
            return Ok(true);
        }

        let body = response.text().await.unwrap_or_default();
        Err(map_status_error(status, &self.config.plugin_uuid, body))
    }
}

fn map_reqwest_error(e: reqwest::Error) -> UpdaterError {
    error!(error = %e, "failed to reach update endpoint");
    if e.is_timeout() {
        UpdaterError::Connection("request timeout".to_string())
    } else if e.is_connect() {
        UpdaterError::Connection(format!("connection failed: {}", e))
    } else {
        UpdaterError::Connection(format!("HTTP request failed: {}", e))
    }
}

fn map_status_error(status: StatusCode, plugin_uuid: &str, body: String) -> UpdaterError {
    error!(status = status.as_u16(), %plugin_uuid, "failed to update plugin variables");
    match status {
        StatusCode::UNAUTHORIZED => UpdaterError::InvalidApiKey,
        StatusCode::NOT_FOUND => UpdaterError::PluginNotFound(plugin_uuid.to_string()),
        _ => UpdaterError::Status {
            status: status.as_u16(),
            body,
        },
    }
}
