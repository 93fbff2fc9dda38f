// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tapdiff binary entry point.

use anyhow::Context;
use clap::Parser;

use tapdiff::cli::Cli;
use tapdiff::output::print_error;
use tapdiff::{commands, logging};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let code = match runtime.block_on(commands::execute(cli)) {
        Ok(code) => code,
        Err(e) => {
            print_error(&e);
            1
        }
    };
    runtime.shutdown_timeout(std::time::Duration::from_secs(5));
    std::process::exit(code);
}
