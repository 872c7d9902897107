//! sitewatchd — the sitewatch daemon.
//!
//! Probes every configured website on its own adaptive schedule and
//! mails operators when one goes down.
//!
//! # Usage
//!
//! ```text
//! sitewatchd run --targets websites.toml --templates mail/ --log-dir /var/log/sitewatch
//! sitewatchd check --targets websites.toml
//! ```

mod daemon;
mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::LogFormat;

#[derive(Parser)]
#[command(name = "sitewatchd", about = "Website outage monitor", version)]
struct Cli {
    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    /// Also write logs to a daily-rotated file in this directory.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Monitor all targets until SIGINT or SIGTERM.
    Run {
        /// Targets file (TOML).
        #[arg(long, default_value = "websites.toml")]
        targets: PathBuf,

        /// Directory with mail template overrides.
        #[arg(long)]
        templates: Option<PathBuf>,

        /// Load environment variables from this file instead of `./.env`.
        #[arg(long)]
        env_file: Option<PathBuf>,
    },
    /// Probe every target once and report, without sending mail.
    Check {
        /// Targets file (TOML).
        #[arg(long, default_value = "websites.toml")]
        targets: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let guard = logging::init(cli.log_format, cli.log_dir.as_deref())?;

    match cli.command {
        Command::Run {
            targets,
            templates,
            env_file,
        } => daemon::run(&targets, templates.as_deref(), env_file.as_deref()).await,
        Command::Check { targets } => {
            let all_up = daemon::check(&targets).await?;
            if !all_up {
                // process::exit skips destructors; flush the log file first.
                drop(guard);
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
