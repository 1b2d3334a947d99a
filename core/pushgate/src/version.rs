// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use std::env::consts::{ARCH, OS};

pub const SEM_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn version_string() -> String {
    format!(
        "pushgate sem={} git={} build={} rust={} platform={}/{}",
        SEM_VERSION,
        git_commit(),
        build_date(),
        rustc_version(),
        OS,
        ARCH
    )
}

pub fn print_version() {
    println!("{}", version_string());
}

fn git_commit() -> &'static str {
    option_env!("PUSHGATE_GIT_COMMIT").unwrap_or("unknown")
}

fn build_date() -> &'static str {
    option_env!("PUSHGATE_BUILD_DATE").unwrap_or("unknown")
}

fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
