//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{CtuError, Result};

/// Default ClickUp REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.clickup.com/api/v2";

/// Full client configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub paths: PathsConfig,
    pub defaults: DefaultsConfig,
}

/// Remote service access.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApiConfig {
    /// Personal API token. Required to launch the UI, not to clean the cache.
    pub token: String,
    pub base_url: String,
    /// Per-request timeout; an expired request surfaces as a fetch failure.
    pub request_timeout_ms: u64,
}

/// Persisted resource cache location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    pub dir: PathBuf,
}

/// File locations that are not part of the cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    pub log_file: PathBuf,
}

/// Navigation shortcuts applied at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Workspace id selected automatically once the workspace list loads.
    pub workspace: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            base_url: DEFAULT_API_URL.to_string(),
            request_timeout_ms: 15_000,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("cache"),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                eprintln!(
                    "[CTU-CONFIG] WARNING: HOME not set, falling back to /tmp for config paths"
                );
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        Self {
            config_file: home_dir
                .join(".config")
                .join("clickup-tui")
                .join("config.toml"),
            log_file: PathBuf::from("debug.log"),
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, |name| env::var(name).ok())
    }

    /// Same as [`Config::load`] with an injectable environment lookup.
    pub fn load_with_env<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| CtuError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(CtuError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(lookup)?;
        cfg.normalize();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Request timeout as a [`std::time::Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.api.request_timeout_ms)
    }

    /// Fail with [`CtuError::MissingToken`] when no API token is configured.
    pub fn require_token(&self) -> Result<&str> {
        let token = self.api.token.trim();
        if token.is_empty() {
            return Err(CtuError::MissingToken {
                path: self.paths.config_file.clone(),
            });
        }
        Ok(token)
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut var = |name: &str| lookup(name).filter(|raw| !raw.trim().is_empty());

        if let Some(raw) = var("CLICKUP_TUI_TOKEN") {
            self.api.token = raw;
        }
        if let Some(raw) = var("CLICKUP_TUI_API_URL") {
            self.api.base_url = raw;
        }
        if let Some(raw) = var("CLICKUP_TUI_REQUEST_TIMEOUT_MS") {
            self.api.request_timeout_ms = parse_env_u64("CLICKUP_TUI_REQUEST_TIMEOUT_MS", &raw)?;
        }
        if let Some(raw) = var("CLICKUP_TUI_CACHE_DIR") {
            self.cache.dir = PathBuf::from(raw);
        }
        if let Some(raw) = var("CLICKUP_TUI_LOG_FILE") {
            self.paths.log_file = PathBuf::from(raw);
        }
        if let Some(raw) = var("CLICKUP_TUI_DEFAULT_WORKSPACE") {
            self.defaults.workspace = Some(raw);
        }
        Ok(())
    }

    fn normalize(&mut self) {
        self.api.token = self.api.token.trim().to_string();
        if let Some(stripped) = self.api.base_url.strip_suffix('/') {
            self.api.base_url = stripped.to_string();
        }
        if self
            .defaults
            .workspace
            .as_deref()
            .is_some_and(|id| id.trim().is_empty())
        {
            self.defaults.workspace = None;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.api.request_timeout_ms == 0 {
            return Err(CtuError::InvalidConfig {
                details: "api.request_timeout_ms must be > 0".to_string(),
            });
        }

        let url = self.api.base_url.as_str();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(CtuError::InvalidConfig {
                details: format!("api.base_url must be an http(s) URL, got {url:?}"),
            });
        }

        if self.cache.dir.as_os_str().is_empty() {
            return Err(CtuError::InvalidConfig {
                details: "cache.dir must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

fn parse_env_u64(name: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|error| CtuError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}
