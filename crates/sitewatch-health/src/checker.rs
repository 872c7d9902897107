//! Per-target health state: backoff, notification suppression, and
//! scheduling.
//!
//! A failure recomputes the backoff from the pre-increment failure
//! count, decides whether to notify, and only then bumps the count:
//!
//! ```text
//! interval = min(initial * growth^failures, max)
//! notify   = interval < max && failures < notify_cap
//! failures += 1
//! ```
//!
//! With 300s/3600s, growth 3 and cap 4 an outage yields backoffs of
//! 300, 900, 2700, 3600, ... and alerts only on the first three.

use std::time::Duration;

use rand::Rng;
use sitewatch_core::{Policy, Target};
use tracing::debug;

/// What a recorded failure asks the caller to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureOutcome {
    /// Whether an alert should go out for this failure.
    pub notify: bool,
    /// Backoff before the next check.
    pub interval: Duration,
    /// Failure count before this failure was recorded.
    pub prior_failures: u32,
}

/// Mutable health state for one target.
///
/// Owned by that target's loop and never shared.
#[derive(Debug, Clone)]
pub struct HealthState {
    /// Whether the last classification was a failure.
    is_down: bool,
    /// Failures since the last recovery.
    consecutive_failures: u32,
    /// Sleep before the next check while down.
    current_interval: Duration,
    /// Most recently observed HTTP status, for alert text.
    last_status_code: u16,
    /// Backoff base; restored on recovery.
    initial_interval: Duration,
    /// Backoff ceiling.
    max_interval: Duration,
    /// Jittered healthy sleep, lower bound.
    healthy_min: Duration,
    /// Jittered healthy sleep, upper bound.
    healthy_max: Duration,
    /// Backoff multiplier per consecutive failure.
    growth_factor: u32,
    /// Failures at or beyond this count never notify.
    notify_cap: u32,
}

impl HealthState {
    /// Fresh state for a target: up, no failures, initial interval.
    pub fn new(target: &Target, policy: &Policy) -> Self {
        Self {
            is_down: false,
            consecutive_failures: 0,
            current_interval: target.initial_interval,
            last_status_code: 0,
            initial_interval: target.initial_interval,
            max_interval: target.max_interval,
            healthy_min: policy.healthy_min,
            healthy_max: policy.healthy_max,
            growth_factor: policy.growth_factor,
            notify_cap: policy.notify_cap,
        }
    }

    /// Whether the target is currently considered down.
    pub fn is_down(&self) -> bool {
        self.is_down
    }

    /// Current number of consecutive failures.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Current backoff interval.
    pub fn current_interval(&self) -> Duration {
        self.current_interval
    }

    /// Most recently observed HTTP status (0 if none yet).
    pub fn last_status_code(&self) -> u16 {
        self.last_status_code
    }

    /// Remember the status seen by the latest check.
    pub fn set_last_status_code(&mut self, code: u16) {
        self.last_status_code = code;
    }

    /// Backoff after `failures` prior consecutive failures, clamped to
    /// `[initial_interval, max_interval]`.
    pub fn backoff_for(&self, failures: u32) -> Duration {
        let scaled = self
            .growth_factor
            .checked_pow(failures)
            .and_then(|factor| self.initial_interval.checked_mul(factor))
            .unwrap_or(self.max_interval);
        scaled.clamp(self.initial_interval, self.max_interval)
    }

    /// Record a healthy check. Returns `true` if this was a recovery.
    pub fn record_success(&mut self) -> bool {
        if !self.is_down {
            return false;
        }
        debug!(
            failures = self.consecutive_failures,
            "target recovered, resetting backoff"
        );
        self.is_down = false;
        self.consecutive_failures = 0;
        self.current_interval = self.initial_interval;
        true
    }

    /// Record a classified failure.
    pub fn record_failure(&mut self) -> FailureOutcome {
        let prior_failures = self.consecutive_failures;
        self.is_down = true;
        self.current_interval = self.backoff_for(prior_failures);

        let notify =
            self.current_interval < self.max_interval && prior_failures < self.notify_cap;
        self.consecutive_failures = prior_failures.saturating_add(1);

        FailureOutcome {
            notify,
            interval: self.current_interval,
            prior_failures,
        }
    }

    /// Sleep before the next check: the backoff while down, otherwise a
    /// uniformly drawn delay from the healthy range.
    pub fn next_delay<R: Rng>(&self, rng: &mut R) -> Duration {
        if self.is_down {
            return self.current_interval;
        }
        let min = self.healthy_min.as_millis() as u64;
        let max = self.healthy_max.as_millis() as u64;
        Duration::from_millis(rng.gen_range(min..=max))
    }
}
