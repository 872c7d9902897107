//! sitewatch-health — endpoint probing, outage classification, and the
//! per-target health state machine.
//!
//! # Architecture
//!
//! ```text
//! Supervisor
//!   ├── one TargetMonitor task per target (staggered start)
//!   │   ├── HealthState (failures, backoff, suppression)
//!   │   ├── classify(): HEAD status → head-section scan
//!   │   └── Notifier on failure transitions that pass suppression
//!   └── shared watch::Receiver<bool> shutdown signal
//! ```
//!
//! Backoff grows geometrically from the target's initial interval up to
//! its maximum. Alerts go out only while the backoff is below the maximum
//! and the failure count is below the cap, so a sustained outage produces
//! a short burst of mail and then goes quiet until the target recovers.

pub mod checker;
pub mod error;
pub mod monitor;
pub mod probe;
pub mod supervisor;

#[cfg(test)]
mod testing;

pub use checker::{FailureOutcome, HealthState};
pub use error::{HealthError, HealthResult, ProbeError};
pub use monitor::TargetMonitor;
pub use probe::{classify, HttpProber, Prober, SoftErrorMatcher, Verdict};
pub use supervisor::{probe_all, Supervisor};
