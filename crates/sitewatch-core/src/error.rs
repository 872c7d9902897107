//! Startup configuration errors.

use std::path::PathBuf;

use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading targets or credentials.
///
/// All of these are fatal: the daemon refuses to start any monitoring
/// loop when one is returned.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingCredentials(Vec<String>),

    #[error("invalid SMTP_PORT value: {0}")]
    InvalidPort(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse targets file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid duration for `{key}`: {value:?}")]
    InvalidDuration { key: String, value: String },

    #[error("invalid target url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("duplicate target url: {0}")]
    DuplicateTarget(String),

    #[error("no targets configured")]
    NoTargets,

    #[error("invalid policy: {0}")]
    InvalidPolicy(String),
}
