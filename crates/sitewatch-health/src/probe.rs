//! Endpoint probes and the failure classification pipeline.
//!
//! Classification runs in order and stops at the first failure:
//! 1. HEAD status check, healthy iff the status is in `[200, 400)`.
//! 2. Streaming GET of the document head, scanned for soft-error phrases.
//!
//! A transport error at either stage classifies as `TransportTimeout`.

use std::time::Duration;

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use sitewatch_core::{FailureKind, Policy};
use tracing::{debug, warn};

use crate::error::{HealthError, HealthResult, ProbeError};

const HEAD_CLOSE: &[u8] = b"</head>";

/// Result of one full check of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Up {
        status_code: u16,
    },
    Down {
        kind: FailureKind,
        /// Status observed during this check, if any response arrived.
        status_code: Option<u16>,
    },
}

impl Verdict {
    pub fn is_up(&self) -> bool {
        matches!(self, Verdict::Up { .. })
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Verdict::Up { status_code } => Some(*status_code),
            Verdict::Down { status_code, .. } => *status_code,
        }
    }
}

/// Network access used by the classifier.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Issue a lightweight existence probe and return the final status.
    async fn status(&self, url: &str) -> Result<u16, ProbeError>;

    /// Fetch the document up to and including its closing head tag.
    async fn head_section(&self, url: &str) -> Result<String, ProbeError>;
}

/// `Prober` backed by a shared reqwest client.
pub struct HttpProber {
    client: reqwest::Client,
    timeout: Duration,
    max_head_bytes: usize,
}

impl HttpProber {
    pub fn new(policy: &Policy) -> HealthResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(policy.probe_timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(concat!("sitewatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(HealthError::Client)?;
        Ok(Self {
            client,
            timeout: policy.probe_timeout,
            max_head_bytes: policy.max_head_bytes,
        })
    }

    fn map_err(&self, err: reqwest::Error) -> ProbeError {
        if err.is_timeout() {
            ProbeError::Timeout(self.timeout)
        } else {
            ProbeError::Transport(err)
        }
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn status(&self, url: &str) -> Result<u16, ProbeError> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| self.map_err(e))?;
        Ok(response.status().as_u16())
    }

    async fn head_section(&self, url: &str) -> Result<String, ProbeError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_err(e))?;

        let mut buf: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.map_err(e))? {
            // The closing tag may straddle the previous chunk boundary.
            let scan_from = buf.len().saturating_sub(HEAD_CLOSE.len() - 1);
            buf.extend_from_slice(&chunk);

            if let Some(end) = find_head_close(&buf, scan_from) {
                buf.truncate(end);
                break;
            }
            if buf.len() >= self.max_head_bytes {
                debug!(%url, bytes = buf.len(), "no closing head tag within read limit");
                buf.truncate(self.max_head_bytes);
                break;
            }
        }

        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Offset just past the first case-insensitive `</head>` at or after `from`.
fn find_head_close(buf: &[u8], from: usize) -> Option<usize> {
    buf.get(from..)?
        .windows(HEAD_CLOSE.len())
        .position(|w| w.eq_ignore_ascii_case(HEAD_CLOSE))
        .map(|pos| from + pos + HEAD_CLOSE.len())
}

/// Case-insensitive matcher over a fixed phrase set.
#[derive(Debug, Clone)]
pub struct SoftErrorMatcher {
    pattern: Option<Regex>,
}

impl SoftErrorMatcher {
    pub fn new<S: AsRef<str>>(phrases: &[S]) -> HealthResult<Self> {
        let alternatives: Vec<String> = phrases
            .iter()
            .map(|p| p.as_ref().trim())
            .filter(|p| !p.is_empty())
            .map(regex::escape)
            .collect();
        if alternatives.is_empty() {
            return Ok(Self { pattern: None });
        }
        let pattern = RegexBuilder::new(&alternatives.join("|"))
            .case_insensitive(true)
            .build()?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    /// First matching phrase in `text`, as it appears there.
    pub fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.pattern.as_ref()?.find(text).map(|m| m.as_str())
    }
}

/// Probe and classify one target.
pub async fn classify(prober: &dyn Prober, matcher: &SoftErrorMatcher, url: &str) -> Verdict {
    let status_code = match prober.status(url).await {
        Ok(code) if (200..400).contains(&code) => code,
        Ok(code) => {
            warn!(%url, status = code, "status check failed");
            return Verdict::Down {
                kind: FailureKind::StatusCode,
                status_code: Some(code),
            };
        }
        Err(e) => {
            warn!(%url, error = %e, "status probe failed");
            return Verdict::Down {
                kind: FailureKind::TransportTimeout,
                status_code: None,
            };
        }
    };

    match prober.head_section(url).await {
        Ok(head) => match matcher.find(&head) {
            Some(phrase) => {
                warn!(%url, status = status_code, %phrase, "soft error in page head");
                Verdict::Down {
                    kind: FailureKind::ContentError,
                    status_code: Some(status_code),
                }
            }
            None => Verdict::Up { status_code },
        },
        Err(e) => {
            warn!(%url, error = %e, "content probe failed");
            Verdict::Down {
                kind: FailureKind::TransportTimeout,
                status_code: Some(status_code),
            }
        }
    }
}
