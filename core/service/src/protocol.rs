// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! JSON command protocol.
//!
//! One request object per line:
//!
//! ```json
//! {"id": 7, "type": "generate_token", "scope": "home", "device_id": "dev1"}
//! ```
//!
//! Every request gets exactly one reply, `{"id", "type": "result",
//! "success", "result" | "error"}`. Lines that cannot be parsed are answered
//! with an `invalid_format` error and `"id": null`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{ErrorCode, GateError};
use crate::gate::{AuthorizationGate, GenerateTokenRequest, UpdateWithTokenRequest};
use crate::scope::SecretResolver;
use crate::updater::Updater;

const REPLY_TYPE: &str = "result";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    GenerateToken(GenerateTokenRequest),
    UpdateWithToken(UpdateWithTokenRequest),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::GenerateToken(_) => "generate_token",
            Command::UpdateWithToken(_) => "update_with_token",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyError {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub id: Option<u64>,
    #[serde(rename = "type")]
    pub kind: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ReplyError>,
}

impl Reply {
    pub fn result(id: Option<u64>, result: Value) -> Self {
        Reply {
            id,
            kind: REPLY_TYPE.to_string(),
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<u64>, error: &GateError) -> Self {
        Reply {
            id,
            kind: REPLY_TYPE.to_string(),
            success: false,
            result: None,
            error: Some(ReplyError {
                code: error.code(),
                message: error.to_string(),
            }),
        }
    }
}

/// Decode a request line into its id and command.
///
/// The id is recovered even when the command itself is malformed, so the
/// error reply can still be correlated.
pub fn parse_request(line: &str) -> (Option<u64>, Result<Command, GateError>) {
    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            return (
                None,
                Err(GateError::InvalidFormat(format!("invalid JSON: {}", e))),
            );
        }
    };

    let id = value.get("id").and_then(Value::as_u64);
    if id.is_none() {
        return (None, Err(GateError::InvalidFormat("id required".to_string())));
    }

    let command = Command::deserialize(value)
        .map_err(|e| GateError::InvalidFormat(format!("invalid command: {}", e)));
    (id, command)
}

/// Run one request line through the gate and build its reply.
pub async fn handle_line<S, U>(gate: &AuthorizationGate<S, U>, line: &str) -> Reply
where
    S: SecretResolver,
    U: Updater,
{
    let (id, command) = parse_request(line);
    let command = match command {
        Ok(command) => command,
        Err(e) => {
            warn!(?id, error = %e, "rejected request");
            return Reply::error(id, &e);
        }
    };

    debug!(?id, command = command.name(), "handling command");

    let outcome = match &command {
        Command::GenerateToken(request) => gate
            .generate_token(request)
            .and_then(|response| to_value(&response)),
        Command::UpdateWithToken(request) => gate
            .update_with_token(request)
            .await
            .and_then(|response| to_value(&response)),
    };

    match outcome {
        Ok(result) => Reply::result(id, result),
        Err(e) => Reply::error(id, &e),
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, GateError> {
    serde_json::to_value(value).map_err(|e| GateError::Internal(e.to_string()))
}
