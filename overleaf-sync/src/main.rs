use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use overleaf_sync::cli::Cli;
use overleaf_sync::{LastRun, SyncOrchestrator};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failed) => {
            eprintln!("{failed} unit(s) failed to sync");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("sync aborted: {e:#}");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .try_init();
}

/// Returns the number of failed units.
async fn run(cli: Cli) -> anyhow::Result<usize> {
    let marker = (!cli.force_download).then(|| LastRun::new(&cli.last_run_file));
    let mut config = cli.into_config().context("invalid arguments")?;

    if let Some(marker) = &marker {
        marker.apply_cutoff(&mut config).await;
    }

    let started = Utc::now();
    let mut orchestrator = SyncOrchestrator::new(config)?;
    let report = orchestrator.run().await?;

    if let Some(marker) = &marker {
        marker
            .record(&report, started)
            .await
            .with_context(|| format!("cannot write {}", marker.path().display()))?;
    }

    for failure in &report.failures {
        eprintln!("{} {} ({}): {}", failure.kind, failure.name, failure.id, failure.error);
    }
    Ok(report.failed_units())
}
