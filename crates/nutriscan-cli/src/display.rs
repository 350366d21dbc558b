//! Consumers of the output slot: progress lines and the output file.

use std::path::PathBuf;

use nutriscan_core::pipeline::{Output, OutputKind, OutputSlot, PipelineState};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::TRACING_TARGET_OUTPUT;

/// Spawns the tasks that follow the slot until every sender is dropped.
pub fn spawn_writers(slot: &OutputSlot, output: Option<PathBuf>, quiet: bool) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::with_capacity(2);

    if !quiet {
        handles.push(tokio::spawn(report_progress(slot.subscribe())));
    }

    if let Some(path) = output {
        handles.push(tokio::spawn(write_file(slot.subscribe(), path)));
    }

    handles
}

/// Prints state changes and diagnostics to stderr.
async fn report_progress(mut receiver: watch::Receiver<Output>) {
    let mut last_state = PipelineState::Idle;

    while receiver.changed().await.is_ok() {
        let output = receiver.borrow_and_update().clone();
        if let Some(line) = progress_line(last_state, &output) {
            eprintln!("{line}");
        }
        last_state = output.state;
    }
}

/// Overwrites the file with the current body on every change.
async fn write_file(mut receiver: watch::Receiver<Output>, path: PathBuf) {
    while receiver.changed().await.is_ok() {
        let body = receiver.borrow_and_update().body.clone();

        match tokio::fs::write(&path, body.as_bytes()).await {
            Ok(()) => {
                tracing::trace!(
                    target: TRACING_TARGET_OUTPUT,
                    path = %path.display(),
                    len = body.len(),
                    "Output file updated"
                );
            }
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET_OUTPUT,
                    path = %path.display(),
                    error = %error,
                    "Failed to write output file"
                );
            }
        }
    }
}

/// Formats the progress line for an output, if it warrants one.
fn progress_line(previous: PipelineState, output: &Output) -> Option<String> {
    match output.kind {
        OutputKind::Status | OutputKind::Error | OutputKind::Diagnostic => {
            Some(format!("[{}] {}", output.state, output.body))
        }
        OutputKind::Markup if output.state != previous => {
            Some(format!("[{}] {} bytes of markup", output.state, output.body.len()))
        }
        OutputKind::Markup => None,
    }
}

#[cfg(test)]
mod tests {
    use nutriscan_core::pipeline::DisplaySink;

    use super::*;

    fn output(state: PipelineState, kind: OutputKind, body: &str) -> Output {
        Output {
            state,
            kind,
            body: body.to_owned(),
            ..Output::idle()
        }
    }

    #[test]
    fn markup_is_reported_once_per_state() {
        let streaming = output(PipelineState::Streaming, OutputKind::Markup, "<p>a</p>");
        assert!(progress_line(PipelineState::Requesting, &streaming).is_some());
        assert!(progress_line(PipelineState::Streaming, &streaming).is_none());

        let failed = output(PipelineState::Failed, OutputKind::Error, "Error: network error");
        assert_eq!(
            progress_line(PipelineState::Requesting, &failed).as_deref(),
            Some("[failed] Error: network error")
        );
    }

    #[tokio::test]
    async fn file_holds_latest_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.html");
        let slot = OutputSlot::new();
        let handles = spawn_writers(&slot, Some(path.clone()), true);

        slot.publish(output(PipelineState::Streaming, OutputKind::Markup, "<p>a</p>"));
        slot.publish(output(PipelineState::Completed, OutputKind::Markup, "<p>ab</p>"));
        drop(slot);

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<p>ab</p>");
    }
}
