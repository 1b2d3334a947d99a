// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Scope to secret resolution.
//!
//! A scope is one installation (one configured account). Each scope owns the
//! secret its tokens are signed with. The gate resolves the scope on every
//! command and builds a fresh [`TokenManager`] from it; nothing is cached.

use std::collections::HashMap;
use std::time::Duration;

use chrono::TimeDelta;
use duration_str::deserialize_option_duration;
use serde::Deserialize;

use pushgate_auth::{AuthError, TokenManager};
use pushgate_config::component::configuration::{Configuration, ConfigurationError};
use pushgate_config::opaque::OpaqueString;

/// Looks up the signing configuration of a scope.
pub trait SecretResolver: Send + Sync {
    /// `None` when the scope is unknown or has no secret.
    fn resolve(&self, scope: &str) -> Option<ScopeConfig>;
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ScopeConfig {
    /// HMAC secret for tokens of this scope
    secret: OpaqueString,

    /// Token validity, defaults to 24h
    #[serde(default, deserialize_with = "deserialize_option_duration")]
    token_ttl: Option<Duration>,

    /// Rotation window before expiry, defaults to 6h
    #[serde(default, deserialize_with = "deserialize_option_duration")]
    rotation_threshold: Option<Duration>,
}

impl ScopeConfig {
    pub fn new(secret: impl Into<OpaqueString>) -> Self {
        Self {
            secret: secret.into(),
            token_ttl: None,
            rotation_threshold: None,
        }
    }

    pub fn with_token_ttl(self, token_ttl: Duration) -> Self {
        Self {
            token_ttl: Some(token_ttl),
            ..self
        }
    }

    pub fn with_rotation_threshold(self, rotation_threshold: Duration) -> Self {
        Self {
            rotation_threshold: Some(rotation_threshold),
            ..self
        }
    }

    pub fn secret(&self) -> &OpaqueString {
        &self.secret
    }

    pub fn token_ttl(&self) -> Option<Duration> {
        self.token_ttl
    }

    pub fn rotation_threshold(&self) -> Option<Duration> {
        self.rotation_threshold
    }

    /// Build the token manager for this scope.
    pub fn token_manager(&self) -> Result<TokenManager, AuthError> {
        let mut manager = TokenManager::new(&self.secret)?;
        if let Some(ttl) = self.token_ttl {
            manager = manager.with_ttl(to_time_delta("token_ttl", ttl)?);
        }
        if let Some(threshold) = self.rotation_threshold {
            manager = manager.with_rotation_threshold(to_time_delta("rotation_threshold", threshold)?);
        }
        Ok(manager)
    }
}

fn to_time_delta(field: &str, d: Duration) -> Result<TimeDelta, AuthError> {
    TimeDelta::from_std(d).map_err(|e| AuthError::ConfigError(format!("{}: {}", field, e)))
}

impl Configuration for ScopeConfig {
    type Error = ConfigurationError;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.secret.is_empty() {
            return Err(ConfigurationError::MissingField("secret".to_string()));
        }
        if self.token_ttl == Some(Duration::ZERO) {
            return Err(ConfigurationError::InvalidValue {
                field: "token_ttl".to_string(),
                details: "must be greater than zero".to_string(),
            });
        }
        if let (Some(ttl), Some(threshold)) = (self.token_ttl, self.rotation_threshold) {
            if threshold > ttl {
                return Err(ConfigurationError::InvalidValue {
                    field: "rotation_threshold".to_string(),
                    details: "must not exceed token_ttl".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// All configured scopes, keyed by scope name.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Scopes(HashMap<String, ScopeConfig>);

impl Scopes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scope(mut self, name: &str, config: ScopeConfig) -> Self {
        self.0.insert(name.to_string(), config);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl Configuration for Scopes {
    type Error = ConfigurationError;

    fn validate(&self) -> Result<(), Self::Error> {
        for (name, scope) in &self.0 {
            if name.is_empty() {
                return Err(ConfigurationError::InvalidValue {
                    field: "scopes".to_string(),
                    details: "scope name must not be empty".to_string(),
                });
            }
            scope.validate().map_err(|e| match e {
                ConfigurationError::MissingField(f) => {
                    ConfigurationError::MissingField(format!("scopes.{}.{}", name, f))
                }
                ConfigurationError::InvalidValue { field, details } => {
                    ConfigurationError::InvalidValue {
                        field: format!("scopes.{}.{}", name, field),
                        details,
                    }
                }
            })?;
        }
        Ok(())
    }
}

impl SecretResolver for Scopes {
    fn resolve(&self, scope: &str) -> Option<ScopeConfig> {
        self.0.get(scope).filter(|s| !s.secret.is_empty()).cloned()
    }
}

impl SecretResolver for HashMap<String, String> {
    fn resolve(&self, scope: &str) -> Option<ScopeConfig> {
        self.get(scope)
            .filter(|s| !s.is_empty())
            .map(|s| ScopeConfig::new(s.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pushgate_auth::InvalidTokenReason;

    const SECRET: &str = "abcdefghijklmnopqrstuvwxyz012345";

    #[test]
    fn test_scopes_from_yaml() {
        let yaml = format!(
            "home:\n  secret: {}\nlab:\n  secret: {}\n  token_ttl: 1h\n  rotation_threshold: 15m\n",
            SECRET, SECRET
        );
        let scopes: Scopes = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(scopes.len(), 2);
        assert!(scopes.validate().is_ok());

        let home = scopes.resolve("home").unwrap();
        assert_eq!(home.token_ttl(), None);

        let lab = scopes.resolve("lab").unwrap();
        assert_eq!(lab.token_ttl(), Some(Duration::from_secs(3600)));
        assert_eq!(lab.rotation_threshold(), Some(Duration::from_secs(900)));

        assert!(scopes.resolve("missing").is_none());
    }

    #[test]
    fn test_secret_not_in_debug() {
        let scope = ScopeConfig::new(SECRET);
        assert!(!format!("{:?}", scope).contains(SECRET));
    }

    #[test]
    fn test_validation_errors() {
        let empty = Scopes::new().with_scope("home", ScopeConfig::new(""));
        assert_eq!(
            empty.validate(),
            Err(ConfigurationError::MissingField(
                "scopes.home.secret".to_string()
            ))
        );
        assert!(empty.resolve("home").is_none());

        let zero_ttl = ScopeConfig::new(SECRET).with_token_ttl(Duration::ZERO);
        assert!(zero_ttl.validate().is_err());

        let inverted = ScopeConfig::new(SECRET)
            .with_token_ttl(Duration::from_secs(60))
            .with_rotation_threshold(Duration::from_secs(120));
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_token_manager_uses_overrides() {
        let scope = ScopeConfig::new(SECRET)
            .with_token_ttl(Duration::from_secs(600))
            .with_rotation_threshold(Duration::from_secs(60));
        let manager = scope.token_manager().unwrap();
        assert_eq!(manager.ttl(), TimeDelta::minutes(10));
        assert_eq!(manager.rotation_threshold(), TimeDelta::minutes(1));

        let default = ScopeConfig::new(SECRET).token_manager().unwrap();
        assert_eq!(default.ttl(), TimeDelta::hours(24));
        assert_eq!(default.rotation_threshold(), TimeDelta::hours(6));
    }

    #[test]
    fn test_scopes_isolated() {
        let scopes = Scopes::new()
            .with_scope("a", ScopeConfig::new("secret-a-abcdefghijklmnopqrstuvwxyz"))
            .with_scope("b", ScopeConfig::new("secret-b-abcdefghijklmnopqrstuvwxyz"));

        let a = scopes.resolve("a").unwrap().token_manager().unwrap();
        let b = scopes.resolve("b").unwrap().token_manager().unwrap();
        let token = a.generate_token("dev1").unwrap();
        let err = b.validate_token(&token).unwrap_err();
        assert_eq!(
            err.invalid_token_reason(),
            Some(InvalidTokenReason::Signature)
        );
    }

    #[test]
    fn test_hashmap_resolver() {
        let mut map = HashMap::new();
        map.insert("home".to_string(), SECRET.to_string());
        map.insert("blank".to_string(), String::new());
        assert!(map.resolve("home").is_some());
        assert!(map.resolve("blank").is_none());
        assert!(map.resolve("other").is_none());
    }
}
