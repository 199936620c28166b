//! Typed error hierarchy for the epicboard dashboard.
//!
//! Two top-level enums cover the two failure domains:
//! - `FetchError` — tracker API failures (auth, HTTP, transport)
//! - `ConfigError` — local configuration load/store failures

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the remote tracker API.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The token was rejected. Kept distinct from `Api` so a cycle can
    /// surface one re-authentication banner instead of a generic failure
    /// per request.
    #[error("Tracker rejected the API token ({status}): {message}")]
    Auth { status: u16, message: String },

    #[error("Tracker API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl FetchError {
    /// Whether this failure should raise the cycle-wide auth flag.
    pub fn is_auth(&self) -> bool {
        matches!(self, FetchError::Auth { .. })
    }
}

/// Errors from local configuration handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required configuration is absent. The one condition that blocks a
    /// fetch cycle outright; expected on first run.
    #[error("{what} is not configured. Run `epicboard {hint}` first")]
    Missing {
        what: &'static str,
        hint: &'static str,
    },

    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config file at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Legacy file {path} could not be imported: {message}")]
    LegacyImport { path: PathBuf, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
