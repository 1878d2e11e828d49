//! CTU-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, CtuError>;

/// Top-level error type for the ClickUp terminal client.
#[derive(Debug, Error)]
pub enum CtuError {
    #[error("[CTU-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[CTU-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[CTU-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error(
        "[CTU-1004] API token is required; generate a personal token in ClickUp \
         (Settings > Apps) and set `api.token` in {path} or CLICKUP_TUI_TOKEN"
    )]
    MissingToken { path: PathBuf },

    #[error("[CTU-2001] transport failure for {endpoint}: {details}")]
    Transport { endpoint: String, details: String },

    #[error("[CTU-2002] request to {endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("[CTU-2003] service returned an error for {endpoint}: {details}")]
    Api { endpoint: String, details: String },

    #[error("[CTU-2004] response decode failure for {context}: {details}")]
    Decode { context: String, details: String },

    #[error("[CTU-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[CTU-3001] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[CTU-3002] channel closed in component {component}")]
    ChannelClosed { component: &'static str },

    #[error("[CTU-3003] request cancelled: {details}")]
    Cancelled { details: String },

    #[error("[CTU-3004] invalid cache key {namespace}/{key}")]
    InvalidCacheKey { namespace: String, key: String },

    #[error("[CTU-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl CtuError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "CTU-1001",
            Self::MissingConfig { .. } => "CTU-1002",
            Self::ConfigParse { .. } => "CTU-1003",
            Self::MissingToken { .. } => "CTU-1004",
            Self::Transport { .. } => "CTU-2001",
            Self::Timeout { .. } => "CTU-2002",
            Self::Api { .. } => "CTU-2003",
            Self::Decode { .. } => "CTU-2004",
            Self::Serialization { .. } => "CTU-2101",
            Self::Io { .. } => "CTU-3001",
            Self::ChannelClosed { .. } => "CTU-3002",
            Self::Cancelled { .. } => "CTU-3003",
            Self::InvalidCacheKey { .. } => "CTU-3004",
            Self::Runtime { .. } => "CTU-3900",
        }
    }

    /// Whether retrying might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. }
                | Self::Timeout { .. }
                | Self::Io { .. }
                | Self::ChannelClosed { .. }
                | Self::Runtime { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Decode failure for a named payload (cache entry, API response body).
    #[must_use]
    pub fn decode(context: impl Into<String>, details: impl ToString) -> Self {
        Self::Decode {
            context: context.into(),
            details: details.to_string(),
        }
    }
}

impl From<serde_json::Error> for CtuError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for CtuError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<reqwest::Error> for CtuError {
    fn from(value: reqwest::Error) -> Self {
        let endpoint = value
            .url()
            .map_or_else(|| "<unknown>".to_string(), |url| url.path().to_string());
        if value.is_timeout() {
            Self::Timeout { endpoint }
        } else if value.is_decode() {
            Self::Decode {
                context: endpoint,
                details: value.to_string(),
            }
        } else {
            Self::Transport {
                endpoint,
                details: value.to_string(),
            }
        }
    }
}
