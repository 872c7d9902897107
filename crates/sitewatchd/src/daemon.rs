//! Daemon wiring: credentials, targets, notifier, supervisor, signals.
//!
//! Startup order matters. Credentials are validated before anything
//! else is loaded, so a missing value aborts the process with no loop
//! started.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use sitewatch_core::{MailSettings, WatchConfig};
use sitewatch_health::{probe_all, HttpProber, Supervisor, Verdict};
use sitewatch_notify::{Notifier, SmtpMailer, TemplateRegistry};
use tokio::sync::watch;
use tracing::{info, warn};

/// Validate configuration and assemble the supervisor.
pub(crate) fn build_supervisor<F>(
    targets: &Path,
    templates: Option<&Path>,
    lookup: F,
) -> anyhow::Result<Supervisor>
where
    F: Fn(&str) -> Option<String>,
{
    let settings = MailSettings::from_lookup(lookup)?;
    info!(
        server = %settings.server,
        port = settings.port,
        recipients = settings.recipients.len(),
        "mail credentials loaded"
    );

    let config = WatchConfig::from_file(targets)
        .with_context(|| format!("loading targets from {}", targets.display()))?;
    info!(count = config.targets.len(), "targets loaded");

    let registry = match templates {
        Some(dir) => TemplateRegistry::from_dir(dir)
            .with_context(|| format!("loading templates from {}", dir.display()))?,
        None => TemplateRegistry::new(),
    };
    let mailer = Arc::new(SmtpMailer::from_settings(&settings)?);
    let notifier = Arc::new(Notifier::new(
        registry,
        mailer,
        settings.sender.clone(),
        settings.recipients.clone(),
    ));
    let prober = Arc::new(HttpProber::new(&config.policy)?);

    Ok(Supervisor::new(config, prober, notifier)?)
}

pub(crate) async fn run(
    targets: &Path,
    templates: Option<&Path>,
    env_file: Option<&Path>,
) -> anyhow::Result<()> {
    info!("sitewatch starting");
    load_env_file(env_file)?;

    let supervisor = build_supervisor(targets, templates, |name| std::env::var(name).ok())?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown signal received, loops stop at their next wake-up");
        let _ = shutdown_tx.send(true);
    });

    supervisor.run(shutdown_rx).await;

    info!("sitewatch stopped");
    Ok(())
}

/// Probe every target once. Returns `true` if all are up.
pub(crate) async fn check(targets: &Path) -> anyhow::Result<bool> {
    let config = WatchConfig::from_file(targets)
        .with_context(|| format!("loading targets from {}", targets.display()))?;
    let prober = HttpProber::new(&config.policy)?;

    let mut all_up = true;
    for (url, verdict) in probe_all(&config, &prober).await? {
        println!("{}", describe(&url, &verdict));
        all_up &= verdict.is_up();
    }
    Ok(all_up)
}

fn describe(url: &str, verdict: &Verdict) -> String {
    match verdict {
        Verdict::Up { status_code } => format!("UP    {url} ({status_code})"),
        Verdict::Down {
            kind,
            status_code: Some(code),
        } => format!("DOWN  {url} ({kind}, {code})"),
        Verdict::Down {
            kind,
            status_code: None,
        } => format!("DOWN  {url} ({kind})"),
    }
}

fn load_env_file(path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("loading env file {}", path.display()))?;
        }
        None => {
            if let Err(e) = dotenvy::dotenv() {
                if !e.not_found() {
                    warn!(error = %e, "ignoring unreadable .env file");
                }
            }
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
