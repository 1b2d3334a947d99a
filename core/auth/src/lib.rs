// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

pub mod codec;
pub mod errors;
pub mod manager;

pub use codec::{TOKEN_PREFIX, TOKEN_SEPARATOR, TokenPayload};
pub use errors::{AuthError, InvalidTokenReason};
pub use manager::{TokenManager, VerifiedToken, generate_secret};
