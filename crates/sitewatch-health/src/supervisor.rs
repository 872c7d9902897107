//! Supervisor — starts one independent monitor loop per target.

use std::sync::Arc;

use sitewatch_core::{Policy, Target, WatchConfig};
use sitewatch_notify::Notifier;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::HealthResult;
use crate::monitor::TargetMonitor;
use crate::probe::{classify, Prober, SoftErrorMatcher, Verdict};

/// Owns the target set and the shared collaborators.
pub struct Supervisor {
    policy: Policy,
    targets: Vec<Target>,
    prober: Arc<dyn Prober>,
    matcher: Arc<SoftErrorMatcher>,
    notifier: Arc<Notifier>,
}

impl Supervisor {
    pub fn new(
        config: WatchConfig,
        prober: Arc<dyn Prober>,
        notifier: Arc<Notifier>,
    ) -> HealthResult<Self> {
        let matcher = Arc::new(SoftErrorMatcher::new(config.policy.soft_error_phrases.as_slice())?);
        Ok(Self {
            policy: config.policy,
            targets: config.targets,
            prober,
            matcher,
            notifier,
        })
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Start every loop, staggered by `start_stagger`, then wait for all
    /// of them to stop.
    ///
    /// A loop that panics ends only that target's monitoring; the others
    /// keep running. Returns the number of loops that were started.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> usize {
        let mut handles: Vec<(String, JoinHandle<()>)> = Vec::with_capacity(self.targets.len());

        for target in self.targets {
            if !handles.is_empty() && !self.policy.start_stagger.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(self.policy.start_stagger) => {}
                    _ = shutdown.changed() => {}
                }
            }
            if *shutdown.borrow() {
                info!(started = handles.len(), "shutdown requested during startup");
                break;
            }

            let url = target.url.clone();
            let monitor = TargetMonitor::new(
                target,
                &self.policy,
                self.prober.clone(),
                self.matcher.clone(),
                self.notifier.clone(),
            );
            let handle = tokio::spawn(monitor.run(shutdown.clone()));
            info!(%url, "monitoring started");
            handles.push((url, handle));
        }

        let started = handles.len();
        info!(loops = started, "all monitors running");

        for (url, handle) in handles {
            match handle.await {
                Ok(()) => debug!(%url, "monitor loop finished"),
                Err(e) if e.is_panic() => {
                    error!(%url, error = %e, "monitor loop panicked, target no longer monitored")
                }
                Err(e) => warn!(%url, error = %e, "monitor loop cancelled"),
            }
        }

        info!("all monitors stopped");
        started
    }
}

/// Probe and classify every target once, without touching health state
/// or sending alerts.
pub async fn probe_all(
    config: &WatchConfig,
    prober: &dyn Prober,
) -> HealthResult<Vec<(String, Verdict)>> {
    let matcher = SoftErrorMatcher::new(config.policy.soft_error_phrases.as_slice())?;
    let mut verdicts = Vec::with_capacity(config.targets.len());
    for target in &config.targets {
        let verdict = classify(prober, &matcher, &target.url).await;
        verdicts.push((target.url.clone(), verdict));
    }
    Ok(verdicts)
}
