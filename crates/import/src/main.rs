//! Batch importer for scraper output.
//!
//! Exit codes: `0` when every record reached a non-error outcome, `1` when
//! any record errored or the run was interrupted, `2` when the run could not
//! start (bad input, settings, or database).

mod cli;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gigboard_pipeline::batch::{run_batch, BatchOptions};
use gigboard_pipeline::input::{load_input, SourceBatch};
use gigboard_pipeline::settings::ImportSettings;

use cli::{normalize_args, Cli};

const EXIT_SETUP_FAILURE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gigboard_import=info,gigboard_pipeline=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse_from(normalize_args(std::env::args_os()));

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            let message = format!("{err:#}");
            tracing::error!(error = %message, "Import could not start");
            eprintln!("error: {message}");
            ExitCode::from(EXIT_SETUP_FAILURE)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    let mut settings = ImportSettings::from_env().context("Invalid import settings")?;
    if let Some(concurrency) = cli.concurrency {
        settings.concurrency = usize::from(concurrency);
    }
    let ctx = settings
        .context(cli.source.into())
        .context("Failed to build import context")?;

    let batches = load_input(&cli.input)
        .with_context(|| format!("Failed to read input {}", cli.input.display()))?;
    let records: usize = batches.iter().map(SourceBatch::len).sum();
    tracing::info!(
        input = %cli.input.display(),
        files = batches.len(),
        records,
        dry_run = cli.dry_run,
        "Loaded input"
    );

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = gigboard_db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    gigboard_db::health_check(&pool)
        .await
        .context("Database health check failed")?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received; finishing in-flight records");
                cancel.cancel();
            }
        }
    });

    let options = BatchOptions {
        dry_run: cli.dry_run,
        concurrency: settings.concurrency,
    };
    let report = run_batch(&pool, &ctx, batches, options, cancel).await;

    for line in &report.reports {
        println!("{line}");
    }
    if report.was_cancelled() {
        println!("Interrupted: {} record(s) not started", report.not_started);
    }
    println!("{}", report.summary);

    let code = if report.was_cancelled() {
        1
    } else {
        report.summary.exit_code()
    };
    Ok(u8::try_from(code).unwrap_or(1))
}
