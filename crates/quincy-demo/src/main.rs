//! Quincy Demo - host application for the crash reporter
//!
//! Registers the reporter the way an application would at startup, waits
//! for the upload of reports left by earlier runs and can then crash on
//! purpose to leave a new report behind:
//!
//! ```text
//! quincy-demo --url https://crashes.example.com/crash_v300.php --crash
//! quincy-demo --url https://crashes.example.com/crash_v300.php
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use quincy_core::{Config, IHostEnvironment, ReportStore, SystemEnvironment};
use quincy_reporter::CrashManager;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "quincy-demo", version, about = "Demo host for the Quincy crash reporter")]
struct Cli {
    /// Use alternate config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Collection endpoint, overriding the configured one
    #[arg(long)]
    url: Option<String>,

    /// Panic after registering
    #[arg(long)]
    crash: bool,

    /// Delete pending reports instead of sending them
    #[arg(long, conflicts_with = "crash")]
    purge: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_default(&config_path);
    if let Some(url) = cli.url {
        config.endpoint.url = url;
    }
    if config.app.package.is_none() {
        config.app.package = Some(env!("CARGO_PKG_NAME").to_string());
        config.app.version = Some(env!("CARGO_PKG_VERSION").to_string());
    }

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    info!(config_path = %config_path.display(), "Loaded configuration");

    if cli.purge {
        let env = SystemEnvironment::new(config.app.clone(), config.reports.dir.clone());
        let dir = env
            .package_info()
            .map(|info| info.files_dir)
            .unwrap_or_else(|_| ReportStore::default_dir());
        let removed = ReportStore::new(dir).delete_all();
        info!(removed, "Purged pending crash reports");
        return Ok(());
    }

    let mut manager = CrashManager::register(config);
    if let Some(e) = manager.upload_error() {
        warn!(error = %e, "Reports will be kept until the endpoint is fixed");
    }

    if let Some(upload) = manager.take_upload() {
        match upload.wait().await {
            Some(summary) => info!(
                delivered = summary.delivered.len(),
                retained = summary.retained.len(),
                "Upload pass finished"
            ),
            None => warn!("Upload pass did not complete"),
        }
    } else {
        info!(dir = %manager.store().dir().display(), "No pending crash reports");
    }

    if cli.crash {
        info!("Crashing on purpose");
        panic!("quincy-demo: deliberate crash");
    }

    Ok(())
}
