//! The per-target check loop.
//!
//! Each cycle: sleep (jittered while up, backoff while down), probe and
//! classify, then apply the recovery or failure transition. Recovery is
//! silent; failures alert until the backoff saturates or the failure cap
//! is reached.

use std::sync::Arc;
use std::time::Duration;

use sitewatch_core::{Policy, Target};
use sitewatch_notify::{Alert, Notifier};
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::checker::HealthState;
use crate::probe::{classify, Prober, SoftErrorMatcher, Verdict};

/// Owns one target's health state and runs its check cycle.
pub struct TargetMonitor {
    target: Target,
    state: HealthState,
    prober: Arc<dyn Prober>,
    matcher: Arc<SoftErrorMatcher>,
    notifier: Arc<Notifier>,
}

impl TargetMonitor {
    pub fn new(
        target: Target,
        policy: &Policy,
        prober: Arc<dyn Prober>,
        matcher: Arc<SoftErrorMatcher>,
        notifier: Arc<Notifier>,
    ) -> Self {
        let state = HealthState::new(&target, policy);
        Self {
            target,
            state,
            prober,
            matcher,
            notifier,
        }
    }

    /// Current health state of the target.
    pub fn state(&self) -> &HealthState {
        &self.state
    }

    /// Run one probe-classify-react cycle without the pre-check sleep.
    pub async fn check_once(&mut self) -> Verdict {
        let verdict = classify(self.prober.as_ref(), &self.matcher, &self.target.url).await;
        self.react(verdict).await;
        verdict
    }

    async fn react(&mut self, verdict: Verdict) {
        if let Some(code) = verdict.status_code() {
            self.state.set_last_status_code(code);
        }

        let kind = match verdict {
            Verdict::Up { .. } => {
                if self.state.record_success() {
                    info!(url = %self.target.url, "target recovered");
                }
                return;
            }
            Verdict::Down { kind, .. } => kind,
        };

        let outcome = self.state.record_failure();
        if !outcome.notify {
            info!(
                url = %self.target.url,
                %kind,
                failures = self.state.consecutive_failures(),
                interval_secs = outcome.interval.as_secs(),
                "target still down, alert suppressed"
            );
            return;
        }

        let alert = Alert {
            url: self.target.url.clone(),
            kind,
            status_code: self.state.last_status_code(),
            interval: outcome.interval,
        };
        if let Err(e) = self.notifier.notify(&alert).await {
            error!(url = %self.target.url, %kind, error = %e, "failed to deliver alert");
        }
    }

    /// Check forever until `shutdown` flips to `true` or its sender drops.
    ///
    /// Shutdown is observed at the top of each cycle and during the
    /// pre-check sleep; a probe or alert already in flight always runs to
    /// completion.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        debug!(url = %self.target.url, "monitor loop starting");

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }

            let delay = self.state.next_delay(&mut rand::thread_rng());
            let state = if self.state.is_down() { "down" } else { "up" };
            info!(
                url = %self.target.url,
                state,
                "next check in {}",
                format_delay(delay)
            );

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => break,
            }

            self.check_once().await;
        }

        debug!(url = %self.target.url, "monitor loop stopped");
    }
}

/// "7m 12s" style rendering for log lines.
fn format_delay(delay: Duration) -> String {
    let secs = delay.as_secs();
    format!("{}m {}s", secs / 60, secs % 60)
}
