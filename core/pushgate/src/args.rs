// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use clap::{Parser, Subcommand};

/// Device token issuer and authorization gate
#[derive(Parser, Debug)]
#[command(name = "pushgate", about, long_about = None)]
pub struct Args {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", env = "PUSHGATE_CONFIG", global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Answer JSON commands read line by line from stdin
    Serve,

    /// Mint a token for a device
    GenerateToken {
        #[arg(long)]
        scope: String,
        #[arg(long)]
        device_id: String,
    },

    /// Push a screenshot update authorized by a token
    UpdateWithToken {
        #[arg(long)]
        scope: String,
        #[arg(long)]
        device_id: String,
        #[arg(long)]
        image_url: String,
        #[arg(long)]
        token: String,
    },

    /// Decode a token; with --scope, also verify it
    InspectToken {
        #[arg(long)]
        token: String,
        #[arg(long)]
        scope: Option<String>,
    },

    /// Print a fresh random secret for a scope
    GenerateSecret,

    /// Print version information
    Version,
}

impl Args {
    pub fn config(&self) -> Option<&str> {
        self.config.as_deref()
    }

    pub fn subcommand(&self) -> &Command {
        &self.command
    }
}
