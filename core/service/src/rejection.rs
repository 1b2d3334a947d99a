// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Mapping from token rejection reasons to log level and external code.

use pushgate_auth::InvalidTokenReason;
use tracing::{Level, info, warn};

use crate::errors::ErrorCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejection {
    pub level: Level,
    pub code: ErrorCode,
}

pub fn rejection_for(reason: InvalidTokenReason) -> Rejection {
    match reason {
        InvalidTokenReason::Format | InvalidTokenReason::Prefix | InvalidTokenReason::Signature => {
            Rejection {
                level: Level::WARN,
                code: ErrorCode::Unauthorized,
            }
        }
        InvalidTokenReason::Expired => Rejection {
            level: Level::INFO,
            code: ErrorCode::Unauthorized,
        },
    }
}

/// Log a rejected token at the level of its reason and return the code to
/// report. The reason and details are never sent back to the caller.
pub(crate) fn reject(
    reason: InvalidTokenReason,
    scope: &str,
    device_id: &str,
    details: &str,
) -> ErrorCode {
    let rejection = rejection_for(reason);
    if rejection.level == Level::WARN {
        warn!(%scope, %device_id, %reason, %details, "rejected token");
    } else {
        info!(%scope, %device_id, %reason, %details, "rejected token");
    }
    rejection.code
}
