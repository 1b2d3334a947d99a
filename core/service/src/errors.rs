// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes visible to callers of the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidFormat,
    Unauthorized,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidFormat => "invalid_format",
            ErrorCode::Unauthorized => "unauthorized",
            ErrorCode::InternalError => "internal_error",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A command rejected by the gate. The message is safe to return to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("{0}")]
    InvalidFormat(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Internal(String),
}

impl GateError {
    pub fn with_code(code: ErrorCode, message: impl Into<String>) -> Self {
        match code {
            ErrorCode::InvalidFormat => GateError::InvalidFormat(message.into()),
            ErrorCode::Unauthorized => GateError::Unauthorized(message.into()),
            ErrorCode::InternalError => GateError::Internal(message.into()),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            GateError::InvalidFormat(_) => ErrorCode::InvalidFormat,
            GateError::Unauthorized(_) => ErrorCode::Unauthorized,
            GateError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip() {
        for code in [
            ErrorCode::InvalidFormat,
            ErrorCode::Unauthorized,
            ErrorCode::InternalError,
        ] {
            assert_eq!(GateError::with_code(code, "x").code(), code);
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }
}
