// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0
//
// ConfigLoader reads the configuration file once, resolves placeholders and
// decodes each top-level section lazily. A command that only needs tracing
// and scopes does not fail because the updater section is broken.

use lazy_static::lazy_static;
use std::collections::HashSet;

use serde_yaml::{Mapping, Value};
use thiserror::Error;
use tracing::debug;

use pushgate_config::component::configuration::Configuration;
use pushgate_config::provider::ConfigResolver;
use pushgate_service::{HttpUpdaterConfig, Scopes};
use pushgate_tracing::TracingConfiguration;

#[derive(Error, Debug)]
pub enum ConfigError {
    // File / I/O
    #[error("not found: {0}")]
    NotFound(String),

    // Parsing / structural validity
    #[error("invalid configuration - impossible to parse yaml")]
    InvalidYaml,
    #[error("invalid configuration - key {0} not valid")]
    InvalidKey(String),
    #[error("invalid configuration - {0}")]
    Invalid(String),

    // YAML decoding (typed propagation)
    #[error("yaml parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("invalid configuration - missing scopes")]
    InvalidNoScopes,
    #[error("invalid configuration - placeholder resolution failed: {0}")]
    ResolverError(String),
}

lazy_static! {
    static ref CONFIG_KEYS: HashSet<&'static str> = {
        let mut s = HashSet::new();
        s.insert("tracing");
        s.insert("scopes");
        s.insert("updater");
        s
    };
}

pub struct ConfigLoader {
    root: Value,
    tracing: Option<TracingConfiguration>,
    scopes: Option<Scopes>,
    updater: Option<Option<HttpUpdaterConfig>>,
}

impl std::fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let root_keys = self
            .root
            .as_mapping()
            .map(|m| {
                m.keys()
                    .filter_map(|k| k.as_str())
                    .map(|s| s.to_string())
                    .collect::<Vec<String>>()
            })
            .unwrap_or_default();

        // values are left out, they hold secrets
        f.debug_struct("ConfigLoader")
            .field("root_keys", &root_keys)
            .field("tracing_loaded", &self.tracing.is_some())
            .field("scopes_count", &self.scopes.as_ref().map(|s| s.len()))
            .field("updater_loaded", &self.updater.is_some())
            .finish()
    }
}

impl ConfigLoader {
    pub fn new(file_path: &str) -> Result<Self, ConfigError> {
        let config_str = std::fs::read_to_string(file_path)
            .map_err(|e| ConfigError::NotFound(format!("{}: {}", file_path, e)))?;
        Self::from_yaml(&config_str)
    }

    pub fn from_yaml(config_str: &str) -> Result<Self, ConfigError> {
        let mut root: Value =
            serde_yaml::from_str(config_str).map_err(|_| ConfigError::InvalidYaml)?;

        // an empty file is an empty configuration
        if root.is_null() {
            root = Value::Mapping(Mapping::new());
        }

        let mapping = root.as_mapping().ok_or(ConfigError::InvalidYaml)?;
        for key in mapping.keys() {
            let k = key.as_str().ok_or(ConfigError::InvalidYaml)?;
            if !CONFIG_KEYS.contains(k) {
                return Err(ConfigError::InvalidKey(k.to_string()));
            }
        }

        ConfigResolver::new()
            .resolve(&mut root)
            .map_err(|e| ConfigError::ResolverError(e.to_string()))?;

        Ok(Self {
            root,
            tracing: None,
            scopes: None,
            updater: None,
        })
    }

    pub fn tracing(&mut self) -> Result<&TracingConfiguration, ConfigError> {
        let cfg = match self.tracing.take() {
            Some(cfg) => cfg,
            None => {
                let cfg: TracingConfiguration = match self.root.get("tracing") {
                    Some(v) => serde_yaml::from_value(v.clone())?,
                    None => TracingConfiguration::default(),
                };
                debug!(?cfg, "tracing configuration loaded");
                cfg
            }
        };
        Ok(self.tracing.insert(cfg))
    }

    pub fn scopes(&mut self) -> Result<&Scopes, ConfigError> {
        let scopes = match self.scopes.take() {
            Some(scopes) => scopes,
            None => {
                let value = self
                    .root
                    .get("scopes")
                    .filter(|v| !v.is_null())
                    .ok_or(ConfigError::InvalidNoScopes)?;
                let scopes: Scopes = serde_yaml::from_value(value.clone())?;
                if scopes.is_empty() {
                    return Err(ConfigError::InvalidNoScopes);
                }
                scopes.validate().map_err(|e| {
                    debug!(error = ?e, "scopes configuration validation failed");
                    ConfigError::Invalid(e.to_string())
                })?;

                let names: Vec<_> = scopes.names().collect();
                debug!(count = names.len(), ?names, "scopes configuration loaded");
                scopes
            }
        };
        Ok(self.scopes.insert(scopes))
    }

    /// The updater section is optional. `Ok(None)` when it is absent.
    pub fn updater(&mut self) -> Result<Option<&HttpUpdaterConfig>, ConfigError> {
        let updater = match self.updater.take() {
            Some(updater) => updater,
            None => match self.root.get("updater").filter(|v| !v.is_null()) {
                Some(value) => {
                    let cfg: HttpUpdaterConfig = serde_yaml::from_value(value.clone())?;
                    cfg.validate()
                        .map_err(|e| ConfigError::Invalid(format!("updater: {}", e)))?;
                    debug!(
                        base_url = cfg.base_url(),
                        plugin_uuid = cfg.plugin_uuid(),
                        "updater configuration loaded"
                    );
                    Some(cfg)
                }
                None => {
                    debug!("no updater configured");
                    None
                }
            },
        };
        Ok(self.updater.insert(updater).as_ref())
    }
}
