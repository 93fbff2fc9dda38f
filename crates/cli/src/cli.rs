// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line interface.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Port `tapdiff serve` listens on by default.
pub const DEFAULT_SERVE_PORT: u16 = 34444;

/// Capture HTTP traffic and diff it against an API specification
#[derive(Parser, Debug)]
#[command(name = "tapdiff", version)]
pub struct Cli {
    /// Project file (defaults to ./tapdiff.toml)
    #[arg(long, global = true, env = "TAPDIFF_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Debug logging to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a task's command behind the capturing proxy
    Run(RunArgs),

    /// Serve the capture control API
    Serve(ServeArgs),

    /// Diff a capture against the specification and print the results
    Status(StatusArgs),

    /// Load interactions from a JSON file into a new capture
    Import(ImportArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Task name from the project file
    pub task: String,

    /// Diff the capture once the command finishes
    #[arg(long)]
    pub collect_diffs: bool,

    /// Exit 1 when any diff was found. Takes priority over --pass-exit-code
    #[arg(long)]
    pub exit_on_diff: bool,

    /// Exit with the command's exit code
    #[arg(long)]
    pub pass_exit_code: bool,

    /// Shorthand for --collect-diffs --exit-on-diff --pass-exit-code
    #[arg(long)]
    pub ci: bool,

    /// Also serve the control API on this port while the task runs
    #[arg(long, value_name = "PORT")]
    pub serve: Option<u16>,

    /// Proxy port, overriding the task's setting
    #[arg(long)]
    pub port: Option<u16>,
}

impl RunArgs {
    pub fn collect_diffs(&self) -> bool {
        self.collect_diffs || self.exit_on_diff || self.ci
    }

    pub fn exit_on_diff(&self) -> bool {
        self.exit_on_diff || self.ci
    }

    pub fn pass_exit_code(&self) -> bool {
        self.pass_exit_code || self.ci
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, default_value_t = DEFAULT_SERVE_PORT)]
    pub port: u16,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    pub capture_id: String,

    /// Extra ignore patterns, e.g. "OPTIONS *" (repeatable)
    #[arg(long = "ignore", value_name = "PATTERN")]
    pub ignore: Vec<String>,

    /// Print the results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    /// JSON file holding an array of interactions
    pub file: PathBuf,

    /// Id for the new capture (random if omitted)
    #[arg(long)]
    pub capture_id: Option<String>,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
