// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Runtime configuration: posting endpoint, board/thread identity, and log level.
//!
//! Loaded from TOML (`POSTCOMPOSER_CONFIG` or `postcomposer.toml` in the working
//! directory), then overridden from `POSTCOMPOSER_*` environment variables.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "POSTCOMPOSER_CONFIG";
/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "postcomposer.toml";

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("base_url must be an http:// or https:// URL, got {0}")]
    InvalidBaseUrl(String),

    #[error("delete_path must contain an {{id}} placeholder, got {0}")]
    InvalidDeletePath(String),

    #[error("board must not be empty")]
    EmptyBoard,

    #[error("timeout_secs must be greater than 0")]
    InvalidTimeout,

    #[error("log_level must be one of: trace, debug, info, warn, error; got {0}")]
    InvalidLogLevel(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Logging level used when `RUST_LOG` is not set.
    pub log_level: String,
    pub server: ServerConfig,
    pub post: PostConfig,
}

/// Where posts are sent and deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub base_url: String,
    pub posting_path: String,
    /// Path template; `{id}` is replaced with the post identifier.
    pub delete_path: String,
    pub timeout_secs: u64,
}

/// Hidden identifying fields plus the default poster name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PostConfig {
    pub board: String,
    /// Thread to reply to; `None` starts a new thread.
    pub thread_id: Option<u64>,
    pub poster: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            server: ServerConfig::default(),
            post: PostConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            posting_path: "/posting/".to_string(),
            delete_path: "/delete/{id}/".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            board: "b".to_string(),
            thread_id: None,
            poster: None,
        }
    }
}

impl Config {
    /// Parse configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid configuration TOML")
    }

    /// Load configuration from `path`; a missing file yields defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// `POSTCOMPOSER_CONFIG` when set, else the working-directory default.
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Apply `POSTCOMPOSER_*` overrides from the process environment.
    ///
    /// Returns one note per override applied or ignored, for logging once tracing is installed.
    pub fn apply_env_overrides(&mut self) -> Vec<String> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup; empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Vec<String> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut notes = Vec::new();

        if let Some(url) = get("POSTCOMPOSER_BASE_URL") {
            notes.push(format!("base_url overridden from environment: {url}"));
            self.server.base_url = url;
        }
        if let Some(board) = get("POSTCOMPOSER_BOARD") {
            notes.push(format!("board overridden from environment: {board}"));
            self.post.board = board;
        }
        if let Some(thread) = get("POSTCOMPOSER_THREAD_ID") {
            match thread.trim().parse::<u64>() {
                Ok(id) => {
                    notes.push(format!("thread_id overridden from environment: {id}"));
                    self.post.thread_id = Some(id);
                }
                Err(_) => notes.push(format!("ignoring non-numeric POSTCOMPOSER_THREAD_ID: {thread}")),
            }
        }
        if let Some(level) = get("POSTCOMPOSER_LOG_LEVEL") {
            notes.push(format!("log_level overridden from environment: {level}"));
            self.log_level = level;
        }
        notes
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_ok = url::Url::parse(&self.server.base_url)
            .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
            .unwrap_or(false);
        if !base_ok {
            return Err(ConfigError::InvalidBaseUrl(self.server.base_url.clone()));
        }

        if !self.server.delete_path.contains("{id}") {
            return Err(ConfigError::InvalidDeletePath(
                self.server.delete_path.clone(),
            ));
        }

        if self.post.board.trim().is_empty() {
            return Err(ConfigError::EmptyBoard);
        }

        if self.server.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.log_level.clone()));
        }

        Ok(())
    }
}
