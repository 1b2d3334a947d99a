// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

pub mod errors;
pub mod gate;
pub mod protocol;
pub mod rejection;
pub mod scope;
pub mod server;
pub mod updater;

pub use errors::{ErrorCode, GateError, ServiceError};
pub use gate::{
    AuthorizationGate, GenerateTokenRequest, GenerateTokenResponse, UpdateWithTokenRequest,
    UpdateWithTokenResponse,
};
pub use protocol::{Command, Reply, ReplyError, handle_line};
pub use scope::{ScopeConfig, Scopes, SecretResolver};
pub use server::serve;
pub use updater::http::{HttpUpdater, HttpUpdaterConfig};
pub use updater::{ScreenshotUpdate, Updater, UpdaterError};
