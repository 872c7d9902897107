//! Health checker error types.

use std::time::Duration;

use thiserror::Error;

pub type HealthResult<T> = Result<T, HealthError>;

/// Errors constructing the checker's shared components.
#[derive(Debug, Error)]
pub enum HealthError {
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid soft-error phrase set: {0}")]
    Matcher(#[from] regex::Error),
}

/// A probe that could not produce a response.
///
/// Never escapes the check cycle; it is classified as a transport failure.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}
