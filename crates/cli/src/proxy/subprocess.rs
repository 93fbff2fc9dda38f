// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The user command that runs behind the proxy.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use tokio::process::{Child, Command};

use super::ProxyError;
use crate::env;

/// Shell command plus where to run it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub command: String,
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            cwd: None,
        }
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

/// Variables that point the command at the proxy.
pub fn proxy_env(addr: SocketAddr) -> [(&'static str, String); 3] {
    [
        (env::TAPDIFF_PROXY_HOST, addr.ip().to_string()),
        (env::TAPDIFF_PROXY_PORT, addr.port().to_string()),
        (env::TAPDIFF_PROXY, format!("http://{addr}")),
    ]
}

/// Start `sh -c <command>` with the proxy variables set on the child only.
///
/// Stdio is inherited so the command behaves as if run directly.
pub fn spawn(spec: &CommandSpec, addr: SocketAddr) -> Result<Child, ProxyError> {
    let mut command = Command::new("sh");
    command
        .arg("-c")
        .arg(&spec.command)
        .envs(proxy_env(addr))
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);
    if let Some(cwd) = &spec.cwd {
        command.current_dir(cwd);
    }

    command.spawn().map_err(|source| ProxyError::Spawn {
        command: spec.command.clone(),
        source,
    })
}

/// Numeric exit code. Death by signal maps to `128 + signo` like a shell.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
