//! Notification error types.

use std::path::PathBuf;

use thiserror::Error;

pub type NotifyResult<T> = Result<T, NotifyError>;

/// Errors raised while rendering or delivering an alert.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("failed to read template {path}: {source}")]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("smtp delivery failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}
