// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result};
use clap::Parser;

use pushgate::args::Args;
use pushgate::commands;

fn main() -> Result<()> {
    let args = Args::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("pushgate")
        .enable_all()
        .build()
        .context("failed to build runtime")?;

    let result = runtime.block_on(commands::run(&args));

    // the stdin reader may still be parked in a blocking read
    runtime.shutdown_background();

    result
}
