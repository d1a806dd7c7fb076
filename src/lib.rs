pub mod cli;
pub mod error;
pub mod host;
pub mod jobs;
pub mod monitor;
pub mod rules;
pub mod settings;
pub mod utils;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use cli::Cli;
use host::HostInfo;
use jobs::{JobSource, LpstatSource, PlatformSource};
use monitor::MonitorController;
use settings::Settings;
use utils::logging::{self, LogSink};

pub use error::{ConfigError, JobError, SourceError};
pub use jobs::PrintJob;
pub use rules::{RuleSet, Warning};

/// Parse flags, validate, then poll until interrupted.
pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    let resolved = Settings::resolve(&cli);
    let format = match &resolved {
        Ok(settings) => settings.output_format,
        Err(_) => cli.output_format.unwrap_or_default(),
    };

    let sink = match logging::init(format) {
        Ok(sink) => sink,
        Err(err) => {
            eprintln!("failed to initialize logging: {err}");
            return ExitCode::FAILURE;
        }
    };

    let settings = match resolved {
        Ok(settings) => settings,
        Err(err) => {
            log::error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    match monitor(settings, &sink).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn monitor(settings: Settings, sink: &LogSink) -> Result<()> {
    let file_guard = sink.attach_file(&settings.log_file).with_context(|| {
        format!("failed to open log file {}", settings.log_file.display())
    })?;

    let source = PlatformSource::detect(LpstatSource::new(settings.command_timeout));
    let rules = settings.rules();

    log::info!("Starting printer activity monitor...");
    log::info!(
        "host {}, source {}, keywords {:?}, watched users {:?}, max pages {}, log file {}",
        HostInfo::detect(),
        source.describe(),
        settings.sensitive_keywords,
        settings.suspicious_users,
        rules.max_pages(),
        file_guard.path().display()
    );

    let mut controller = MonitorController::new();
    controller.start(source, rules, settings.interval)?;

    let signal = tokio::signal::ctrl_c()
        .await
        .context("failed to listen for interrupt signal");

    log::info!("Stopping printer activity monitor.");
    let stopped = shutdown(&mut controller).await;
    file_guard.detach();

    signal?;
    stopped
}

/// Stop the loop and report how many polls ran. Called on every exit path
/// once the controller has started.
async fn shutdown(controller: &mut MonitorController) -> Result<()> {
    let ticks = controller.stop().await?;
    log::info!("Monitor stopped after {ticks} polls");
    Ok(())
}
