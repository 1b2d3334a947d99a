// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::BufReader;
use tracing::{debug, info};

use pushgate_auth::codec::split_token;
use pushgate_auth::{TokenPayload, generate_secret};
use pushgate_service::{
    AuthorizationGate, GateError, GenerateTokenRequest, HttpUpdater, Scopes,
    UpdateWithTokenRequest, serve,
};
use pushgate_tracing::TracingConfiguration;

use crate::args::{Args, Command};
use crate::config::ConfigLoader;
use crate::signal;
use crate::version::{self, SEM_VERSION};

pub type Gate = AuthorizationGate<Scopes, Option<HttpUpdater>>;

/// What `inspect-token` prints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenReport {
    pub device_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_rotate: Option<bool>,
}

impl From<TokenPayload> for TokenReport {
    fn from(payload: TokenPayload) -> Self {
        TokenReport {
            device_id: payload.device_id,
            issued_at: payload.issued_at,
            expires_at: payload.expires_at,
            verified: None,
            reason: None,
            should_rotate: None,
        }
    }
}

pub async fn run(args: &Args) -> Result<()> {
    match args.subcommand() {
        Command::Version => version::print_version(),
        Command::GenerateSecret => println!("{}", generate_secret()),
        Command::Serve => {
            let gate = load_gate(args.config())?;
            info!(version = SEM_VERSION, "serving commands on stdin");
            serve_stdio(&gate).await?;
        }
        Command::GenerateToken { scope, device_id } => {
            let gate = load_gate(args.config())?;
            let response = gate
                .generate_token(&GenerateTokenRequest::new(scope, device_id))
                .map_err(gate_error)?;
            print_json(&response)?;
        }
        Command::UpdateWithToken {
            scope,
            device_id,
            image_url,
            token,
        } => {
            let gate = load_gate(args.config())?;
            let request = UpdateWithTokenRequest::new(scope, device_id, image_url, token);
            let response = gate
                .update_with_token(&request)
                .await
                .map_err(gate_error)?;
            print_json(&response)?;
            if !response.success {
                bail!(response.message);
            }
        }
        Command::InspectToken { token, scope } => {
            let report = match scope {
                Some(scope) => inspect_verified(&load_gate(args.config())?, scope, token)?,
                None => {
                    TracingConfiguration::default().setup_tracing_subscriber();
                    inspect(token)?
                }
            };
            print_json(&report)?;
        }
    }
    Ok(())
}

/// Load the configuration, set up tracing and build the gate.
pub fn load_gate(config_path: Option<&str>) -> Result<Gate> {
    let path = config_path
        .context("a configuration file is required (--config or PUSHGATE_CONFIG)")?;
    let mut config = ConfigLoader::new(path).context("failed to load configuration")?;

    config
        .tracing()
        .context("invalid tracing configuration")?
        .setup_tracing_subscriber();
    debug!(?config, %path, "configuration loaded");

    let scopes = config
        .scopes()
        .context("invalid scopes configuration")?
        .clone();
    let updater = config
        .updater()
        .context("invalid updater configuration")?
        .cloned()
        .map(HttpUpdater::new)
        .transpose()
        .context("failed to create updater")?;

    Ok(AuthorizationGate::new(scopes, updater))
}

async fn serve_stdio(gate: &Gate) -> Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    serve(gate, stdin, stdout, signal::shutdown())
        .await
        .context("command server failed")?;
    Ok(())
}

/// Decode a token without checking it.
pub fn inspect(token: &str) -> Result<TokenReport> {
    let parts = split_token(token).context("malformed token")?;
    let payload = TokenPayload::decode(parts.payload).context("malformed token payload")?;
    Ok(payload.into())
}

/// Decode a token and verify it against the secret of `scope`.
pub fn inspect_verified(gate: &Gate, scope: &str, token: &str) -> Result<TokenReport> {
    let manager = gate.token_manager(scope).map_err(gate_error)?;
    let payload = manager
        .get_token_info(token)
        .context("malformed token")?;

    let mut report = TokenReport::from(payload);
    match manager.validate_token(token) {
        Ok(verified) => {
            report.verified = Some(true);
            report.should_rotate = Some(manager.should_rotate_token(&verified));
        }
        Err(e) => {
            report.verified = Some(false);
            report.reason = e.invalid_token_reason().map(|r| r.as_str());
        }
    }
    Ok(report)
}

fn gate_error(e: GateError) -> anyhow::Error {
    anyhow!("{}: {}", e.code(), e)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use pushgate_auth::TokenManager;
    use pushgate_service::SecretResolver;

    fn config_path() -> String {
        concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/config.yaml").to_string()
    }

    #[test]
    fn test_load_gate() {
        let gate = load_gate(Some(&config_path())).unwrap();
        assert!(gate.secrets().resolve("home").is_some());
        assert!(gate.secrets().resolve("lab").is_some());

        assert!(load_gate(None).is_err());
        assert!(load_gate(Some("/nonexistent/pushgate.yaml")).is_err());
    }

    #[test]
    fn test_inspect_verified() {
        let gate = load_gate(Some(&config_path())).unwrap();
        let token = gate
            .generate_token(&GenerateTokenRequest::new("home", "dev1"))
            .unwrap()
            .token;

        let report = inspect_verified(&gate, "home", &token).unwrap();
        assert_eq!(report.device_id, "dev1");
        assert_eq!(report.verified, Some(true));
        assert_eq!(report.should_rotate, Some(false));
        assert_eq!(report.reason, None);

        // signed with the home secret
        let lab = inspect_verified(&gate, "lab", &token).unwrap();
        assert_eq!(lab.verified, Some(false));
        assert_eq!(lab.reason, Some("signature"));

        assert!(inspect_verified(&gate, "unknown", &token).is_err());
    }

    #[test]
    fn test_inspect_expired() {
        let gate = load_gate(Some(&config_path())).unwrap();
        let manager = gate.token_manager("home").unwrap();
        let token = manager
            .generate_token_at("dev1", Utc::now() - TimeDelta::days(2))
            .unwrap();

        let report = inspect_verified(&gate, "home", &token).unwrap();
        assert_eq!(report.verified, Some(false));
        assert_eq!(report.reason, Some("expired"));
        assert_eq!(report.should_rotate, None);
    }

    #[test]
    fn test_inspect_without_secret() {
        let manager = TokenManager::new("some-secret-some-secret-some-secret").unwrap();
        let token = manager.generate_token("dev9").unwrap();

        let report = inspect(&token).unwrap();
        assert_eq!(report.device_id, "dev9");
        assert_eq!(report.verified, None);

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("verified").is_none());
        assert!(json["issued_at"].is_string());

        assert!(inspect("not-a-token").is_err());
    }
}
