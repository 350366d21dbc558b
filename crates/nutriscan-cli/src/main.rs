#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod display;
mod signal;
mod source;
mod telemetry;

use std::process;
use std::sync::Arc;

use anyhow::Context;
use nutriscan_core::pipeline::{
    OutputSlot, PipelineController, RunOutcome, RunReport, Submission,
};
use nutriscan_core::stream::StreamConsumer;
use nutriscan_gemini::{GeminiClient, GeminiProvider};

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "nutriscan_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "nutriscan_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "nutriscan_cli::config";
pub const TRACING_TARGET_SOURCE: &str = "nutriscan_cli::source";
pub const TRACING_TARGET_OUTPUT: &str = "nutriscan_cli::output";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::debug!(
            target: TRACING_TARGET_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = %error,
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    telemetry::init_tracing()?;
    cli.log();
    cli.validate()?;

    let credentials = cli.credentials()?;
    let client = GeminiClient::new(cli.gemini.clone(), credentials)
        .context("failed to create Gemini client")?;

    let brand = source::load_optional(cli.brand.as_deref()).await?;
    let nutrition = source::load_optional(cli.nutrition.as_deref()).await?;
    let submission = Submission::from_data_uris(brand.as_deref(), nutrition.as_deref())
        .context("failed to decode image")?;

    let slot = OutputSlot::new();
    let writers = display::spawn_writers(&slot, cli.output.clone(), cli.quiet);
    let controller = PipelineController::new(
        StreamConsumer::new(GeminiProvider::new(client)),
        Arc::new(slot.clone()),
    );

    let report = analyze(&controller, submission).await?;
    let output = slot.current();

    drop(controller);
    drop(slot);
    for writer in writers {
        writer.await.context("output writer failed")?;
    }

    tracing::info!(
        target: TRACING_TARGET_SHUTDOWN,
        run_id = %report.run_id,
        state = %report.final_state(),
        fragments = report.fragments,
        render_failures = report.render_failures,
        elapsed_ms = report.elapsed.as_millis(),
        "Analysis finished"
    );

    println!("{}", output.body);

    match report.outcome {
        RunOutcome::Completed => Ok(()),
        RunOutcome::Failed(error) => Err(anyhow::Error::new(error).context("analysis failed")),
        RunOutcome::Cancelled => Err(anyhow::anyhow!("analysis cancelled")),
    }
}

/// Runs the submission, cancelling it on Ctrl+C or SIGTERM.
async fn analyze(controller: &PipelineController, submission: Submission) -> anyhow::Result<RunReport> {
    let handle = controller.submit(submission);
    let wait = handle.wait();
    tokio::pin!(wait);

    tokio::select! {
        biased;

        result = &mut wait => result.context("analysis task failed"),

        () = signal::interrupt_signal() => {
            controller.cancel();
            wait.await.context("analysis task failed")
        }
    }
}
