//! Domain types shared by the sitewatch crates.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Phrases that mark an application-level error page when they appear
/// in a document's head section.
pub const DEFAULT_SOFT_ERROR_PHRASES: &[&str] = &[
    "error",
    "not found",
    "unavailable",
    "nicht erreichbar",
    "nicht gefunden",
];

/// A single monitored endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Probe address; also the target's unique identifier.
    pub url: String,
    /// Healthy cadence and backoff base.
    pub initial_interval: Duration,
    /// Backoff ceiling.
    pub max_interval: Duration,
}

impl Target {
    /// Create a target that takes its intervals from the policy.
    pub fn with_policy(url: impl Into<String>, policy: &Policy) -> Self {
        Self {
            url: url.into(),
            initial_interval: policy.initial_interval,
            max_interval: policy.max_interval,
        }
    }
}

/// Which stage of the check classified a target as down.
///
/// Each kind maps to its own notification template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// HEAD probe returned a status outside `[200, 400)`.
    StatusCode,
    /// Head section contained a soft-error phrase.
    ContentError,
    /// A probe failed at the transport level (timeout, DNS, refused).
    TransportTimeout,
}

impl FailureKind {
    /// Every kind, in pipeline order.
    pub const ALL: [FailureKind; 3] = [
        FailureKind::StatusCode,
        FailureKind::ContentError,
        FailureKind::TransportTimeout,
    ];

    /// Template registry key for this kind.
    pub fn template_key(self) -> &'static str {
        match self {
            FailureKind::StatusCode => "status_code",
            FailureKind::ContentError => "content_error",
            FailureKind::TransportTimeout => "timeout",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.template_key())
    }
}

/// Process-wide scheduling, backoff, and probing parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    /// Default healthy cadence and backoff base for targets.
    pub initial_interval: Duration,
    /// Default backoff ceiling for targets.
    pub max_interval: Duration,
    /// Lower bound of the jittered sleep while a target is up.
    pub healthy_min: Duration,
    /// Upper bound (inclusive) of the jittered sleep while a target is up.
    pub healthy_max: Duration,
    /// Backoff multiplier applied per consecutive failure.
    pub growth_factor: u32,
    /// Failures at or beyond this count update state without notifying.
    pub notify_cap: u32,
    /// Timeout for each HTTP request made by a check.
    pub probe_timeout: Duration,
    /// Delay between starting successive target loops.
    pub start_stagger: Duration,
    /// Upper bound on bytes read while scanning the document head.
    pub max_head_bytes: usize,
    /// Phrases that mark a soft error when found in the document head.
    pub soft_error_phrases: Vec<String>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(300),
            max_interval: Duration::from_secs(3600),
            healthy_min: Duration::from_secs(300),
            healthy_max: Duration::from_secs(600),
            growth_factor: 3,
            notify_cap: 4,
            probe_timeout: Duration::from_secs(10),
            start_stagger: Duration::from_secs(1),
            max_head_bytes: 64 * 1024,
            soft_error_phrases: DEFAULT_SOFT_ERROR_PHRASES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}
