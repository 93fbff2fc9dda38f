// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tapdiff
//!
//! Runs a command behind an intercepting HTTP proxy, records every exchange
//! into a capture, and diffs the capture against an endpoint-level API
//! specification.
//!
//! ```toml
//! # tapdiff.toml
//! specification = "api.json"
//! ignore_requests = ["OPTIONS *", "GET /health"]
//!
//! [tasks.start]
//! command = "npm start"
//! target = "http://localhost:3000"
//! proxy = { port = 4000 }
//! ```

pub mod api_spec;
pub mod cli;
pub mod commands;
pub mod config;
pub mod diff;
pub mod env;
pub mod logging;
pub mod output;
pub mod proxy;
pub mod server;
pub mod stream;
