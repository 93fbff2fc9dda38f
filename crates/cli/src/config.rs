// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Project configuration (`tapdiff.toml`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::env;

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "tapdiff.toml";
/// Captures directory relative to the project root.
pub const DEFAULT_CAPTURES_DIR: &str = ".tapdiff/captures";
pub const DEFAULT_PROXY_HOST: &str = "127.0.0.1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("No task named '{name}' (available: {})", available.join(", "))]
    UnknownTask { name: String, available: Vec<String> },

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level project configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Project name, shown in summaries
    #[serde(default)]
    pub name: String,

    /// Path to the API specification JSON, relative to this file
    #[serde(default)]
    pub specification: Option<PathBuf>,

    /// Where captures are stored, relative to this file
    #[serde(default)]
    pub captures_dir: Option<PathBuf>,

    /// Request patterns excluded from every diff (`[METHOD ]glob`)
    #[serde(default)]
    pub ignore_requests: Vec<String>,

    #[serde(default)]
    pub tasks: BTreeMap<String, TaskConfig>,

    /// Directory the file was loaded from; relative paths resolve against it
    #[serde(skip)]
    pub root: PathBuf,
}

/// A named way of running the API under capture
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    /// Shell command to run while capturing. Omit to only listen.
    #[serde(default)]
    pub command: Option<String>,

    /// Upstream base URL that origin-form requests are forwarded to
    #[serde(default)]
    pub target: Option<String>,

    #[serde(default)]
    pub proxy: ProxySettings,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProxySettings {
    #[serde(default = "default_proxy_host")]
    pub host: String,

    /// 0 picks any free port
    #[serde(default)]
    pub port: u16,
}

fn default_proxy_host() -> String {
    DEFAULT_PROXY_HOST.to_string()
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            host: default_proxy_host(),
            port: 0,
        }
    }
}

impl ProjectConfig {
    /// Load and validate a project file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: ProjectConfig =
            toml::from_str(&content).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })?;
        config.root = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        config.validate()?;
        Ok(config)
    }

    /// Find the project file: explicit path, then `TAPDIFF_CONFIG`, then
    /// `tapdiff.toml` in the working directory.
    ///
    /// Returns `Ok(None)` only when nothing was asked for and nothing exists.
    pub fn discover(explicit: Option<&Path>) -> Result<Option<Self>, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path).map(Some);
        }
        if let Some(path) = env::config_path() {
            return Self::load(&path).map(Some);
        }
        let default = Path::new(DEFAULT_CONFIG_FILE);
        if default.exists() {
            return Self::load(default).map(Some);
        }
        Ok(None)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, task) in &self.tasks {
            if let Some(target) = &task.target {
                let url = reqwest::Url::parse(target).map_err(|e| {
                    ConfigError::Validation(format!("task '{name}': invalid target {target:?}: {e}"))
                })?;
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(ConfigError::Validation(format!(
                        "task '{name}': target must be http or https, got {target:?}"
                    )));
                }
            }
            if task.command.as_deref().is_some_and(|c| c.trim().is_empty()) {
                return Err(ConfigError::Validation(format!(
                    "task '{name}': command is empty"
                )));
            }
        }
        Ok(())
    }

    pub fn task(&self, name: &str) -> Result<&TaskConfig, ConfigError> {
        self.tasks.get(name).ok_or_else(|| ConfigError::UnknownTask {
            name: name.to_string(),
            available: self.tasks.keys().cloned().collect(),
        })
    }

    /// Captures directory: `TAPDIFF_CAPTURES_DIR`, then the file, then the default.
    pub fn captures_dir(&self) -> PathBuf {
        if let Some(dir) = env::captures_dir() {
            return dir;
        }
        let dir = self
            .captures_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CAPTURES_DIR));
        self.resolve(&dir)
    }

    pub fn specification_path(&self) -> Option<PathBuf> {
        self.specification.as_deref().map(|p| self.resolve(p))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() || self.root.as_os_str().is_empty() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl TaskConfig {
    /// Task settings as recorded in the capture status file.
    pub fn to_metadata(&self, name: &str) -> serde_json::Value {
        serde_json::json!({
            "task": name,
            "command": self.command,
            "target": self.target,
            "proxy": { "host": self.proxy.host, "port": self.proxy.port },
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
