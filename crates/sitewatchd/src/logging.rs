//! Log setup: console output plus an optional daily log file.

use std::path::Path;

use clap::ValueEnum;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// File name prefix inside the log directory; the appender adds the date.
pub(crate) const LOG_FILE_PREFIX: &str = "sitewatchd.log";

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Default filter, overridable through `RUST_LOG`.
pub(crate) fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sitewatchd=debug,sitewatch=debug"))
}

/// Build the subscriber. The returned guard flushes the file writer on
/// drop and must outlive all logging.
pub(crate) fn build(
    format: LogFormat,
    log_dir: Option<&Path>,
    filter: EnvFilter,
) -> anyhow::Result<(Box<dyn Subscriber + Send + Sync>, Option<WorkerGuard>)> {
    let mut layers: Vec<BoxedLayer> = Vec::new();
    layers.push(match format {
        LogFormat::Text => tracing_subscriber::fmt::layer().boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
    });

    let guard = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(writer)
                    .boxed(),
            );
            Some(guard)
        }
        None => None,
    };

    let subscriber = Registry::default().with(layers).with(filter);
    Ok((Box::new(subscriber), guard))
}

/// Install the global subscriber.
pub(crate) fn init(format: LogFormat, log_dir: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let (subscriber, guard) = build(format, log_dir, default_filter())?;
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(guard)
}
