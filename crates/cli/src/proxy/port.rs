// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Binding the proxy listener, and naming whoever holds the port.

use std::fmt;
use std::process::Stdio;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::process::Command;

use super::ProxyError;

const LSOF_TIMEOUT: Duration = Duration::from_secs(2);

/// The process listening on a port we wanted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blocker {
    pub pid: u32,
    pub command: String,
}

impl fmt::Display for Blocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[pid {}]: {}", self.pid, self.command)
    }
}

/// Bind `host:port`, failing fast if the port is taken.
pub async fn bind(host: &str, port: u16) -> Result<TcpListener, ProxyError> {
    match TcpListener::bind((host, port)).await {
        Ok(listener) => Ok(listener),
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
            let blocker = find_blocker(port).await;
            Err(ProxyError::PortUnavailable { port, blocker })
        }
        Err(source) => Err(ProxyError::Bind {
            address: format!("{host}:{port}"),
            source,
        }),
    }
}

/// Best effort: ask `lsof` who is listening on `port`.
pub async fn find_blocker(port: u16) -> Option<Blocker> {
    let child = Command::new("lsof")
        .args(["-nP", &format!("-iTCP:{port}"), "-sTCP:LISTEN", "-Fpc"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .ok()?;

    let output = tokio::time::timeout(LSOF_TIMEOUT, child.wait_with_output())
        .await
        .ok()?
        .ok()?;
    parse_lsof(&String::from_utf8_lossy(&output.stdout))
}

/// Parse `lsof -F pc` field output: `p<pid>` then `c<command>` lines.
pub fn parse_lsof(output: &str) -> Option<Blocker> {
    let mut pid = None;
    for line in output.lines() {
        if let Some(value) = line.strip_prefix('p') {
            pid = value.trim().parse().ok();
        } else if let Some(command) = line.strip_prefix('c') {
            if let Some(pid) = pid {
                return Some(Blocker {
                    pid,
                    command: command.trim().to_string(),
                });
            }
        }
    }
    None
}

#[cfg(test)]
#[path = "port_tests.rs"]
mod tests;
