// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Resolution of `${env:NAME}` and `${file:PATH}` placeholders in YAML values.

pub mod env;
pub mod file;

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde_yaml::Value;
use thiserror::Error;
use tracing::debug;

use env::EnvConfigProvider;
use file::FileConfigProvider;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("environment variable not set: {0}")]
    EnvVarNotSet(String),
    #[error("unknown config provider: {0}")]
    UnknownProvider(String),
}

pub trait ConfigProvider {
    fn load(&self, key: &str) -> Result<String, ProviderError>;
}

lazy_static! {
    static ref PLACEHOLDER: Regex =
        Regex::new(r"\$\{([a-z]+):([^}]+)\}").expect("placeholder regex must compile");
}

pub struct ConfigResolver {
    providers: HashMap<&'static str, Box<dyn ConfigProvider + Send + Sync>>,
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigResolver {
    pub fn new() -> Self {
        let mut providers: HashMap<&'static str, Box<dyn ConfigProvider + Send + Sync>> =
            HashMap::new();
        providers.insert("env", Box::new(EnvConfigProvider));
        providers.insert("file", Box::new(FileConfigProvider));
        Self { providers }
    }

    /// Replace every placeholder found in string values, recursively.
    pub fn resolve(&self, value: &mut Value) -> Result<(), ProviderError> {
        match value {
            Value::String(s) => {
                if PLACEHOLDER.is_match(s) {
                    *s = self.resolve_str(s)?;
                }
            }
            Value::Sequence(seq) => {
                for v in seq.iter_mut() {
                    self.resolve(v)?;
                }
            }
            Value::Mapping(map) => {
                for (_, v) in map.iter_mut() {
                    self.resolve(v)?;
                }
            }
            Value::Tagged(tagged) => self.resolve(&mut tagged.value)?,
            _ => {}
        }
        Ok(())
    }

    fn resolve_str(&self, input: &str) -> Result<String, ProviderError> {
        let mut out = String::with_capacity(input.len());
        let mut last = 0;

        for caps in PLACEHOLDER.captures_iter(input) {
            let (Some(whole), Some(kind), Some(key)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };

            let provider = self
                .providers
                .get(kind.as_str())
                .ok_or_else(|| ProviderError::UnknownProvider(kind.as_str().to_string()))?;

            debug!(provider = kind.as_str(), "resolving config placeholder");

            out.push_str(&input[last..whole.start()]);
            out.push_str(&provider.load(key.as_str())?);
            last = whole.end();
        }

        out.push_str(&input[last..]);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_resolve_env_and_file() {
        // SAFETY: test-only variable with a unique name
        unsafe { std::env::set_var("PUSHGATE_TEST_RESOLVER_SECRET", "from-env") };

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "from-file").unwrap();

        let yaml = format!(
            "a: ${{env:PUSHGATE_TEST_RESOLVER_SECRET}}\nb:\n  - prefix-${{file:{}}}\nc: 3\n",
            file.path().display()
        );
        let mut value: Value = serde_yaml::from_str(&yaml).unwrap();

        ConfigResolver::new().resolve(&mut value).unwrap();

        assert_eq!(value["a"].as_str(), Some("from-env"));
        assert_eq!(value["b"][0].as_str(), Some("prefix-from-file"));
        assert_eq!(value["c"].as_u64(), Some(3));
    }

    #[test]
    fn test_missing_env_var() {
        let mut value: Value =
            serde_yaml::from_str("a: ${env:PUSHGATE_TEST_RESOLVER_DOES_NOT_EXIST}").unwrap();
        let err = ConfigResolver::new().resolve(&mut value).unwrap_err();
        assert!(matches!(err, ProviderError::EnvVarNotSet(_)));
    }

    #[test]
    fn test_unknown_provider() {
        let mut value: Value = serde_yaml::from_str("a: ${vault:secret}").unwrap();
        let err = ConfigResolver::new().resolve(&mut value).unwrap_err();
        assert!(matches!(err, ProviderError::UnknownProvider(p) if p == "vault"));
    }

    #[test]
    fn test_plain_strings_untouched() {
        let mut value: Value = serde_yaml::from_str("a: plain $ value {}").unwrap();
        ConfigResolver::new().resolve(&mut value).unwrap();
        assert_eq!(value["a"].as_str(), Some("plain $ value {}"));
    }
}
