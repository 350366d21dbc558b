//! End-to-end runs of the pipeline against the scripted model.

use std::sync::Arc;

use nutriscan_core::pipeline::messages;
use nutriscan_core::prelude::*;

const PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";
const JPEG: &str = "data:image/jpeg;base64,/9j/4AAQSkZJRgABAQ==";

fn complete_submission() -> Submission {
    Submission::from_data_uris(Some(PNG), Some(JPEG)).unwrap()
}

fn controller(model: MockModel) -> (PipelineController, RecordingSink) {
    let sink = RecordingSink::new();
    let controller = PipelineController::with_model(model, sink.clone());
    (controller, sink)
}

#[tokio::test]
async fn split_heading_renders_once_complete() {
    let (controller, sink) = controller(MockModel::with_fragments(["# Tit", "le\n\nok"]));

    let report = controller.run(complete_submission()).await;

    assert!(report.outcome.is_completed());
    assert_eq!(report.buffer.as_ref(), b"# Title\n\nok");
    assert_eq!(
        report.states,
        vec![
            PipelineState::Idle,
            PipelineState::Validating,
            PipelineState::Requesting,
            PipelineState::Streaming,
            PipelineState::Completed,
        ]
    );

    let last = sink.last().unwrap();
    assert_eq!(last.state, PipelineState::Completed);
    assert_eq!(last.kind, OutputKind::Markup);
    assert!(last.body.contains("<h1>Title</h1>"));
    assert!(last.body.contains("<p>ok</p>"));
    assert!(!controller.is_busy());
}

#[tokio::test]
async fn open_failure_fails_after_requesting() {
    let model = MockModel::failing_open(TransportError::authentication().with_message("API key not valid"));
    let (controller, sink) = controller(model.clone());

    let report = controller.run(complete_submission()).await;

    assert_eq!(
        sink.states(),
        vec![
            PipelineState::Idle,
            PipelineState::Validating,
            PipelineState::Requesting,
            PipelineState::Failed,
        ]
    );
    assert_eq!(report.states, sink.states());
    assert!(matches!(report.outcome.error(), Some(Error::Transport(_))));
    assert!(report.buffer.is_empty());
    assert_eq!(model.open_count(), 1);

    let last = sink.last().unwrap();
    assert_eq!(last.kind, OutputKind::Error);
    assert_eq!(last.body, "Error: authentication failed: API key not valid");
}

#[tokio::test]
async fn missing_image_never_opens_stream() {
    let model = MockModel::with_fragments(["unused"]);
    let (controller, sink) = controller(model.clone());

    for submission in [
        Submission::new(),
        Submission::from_data_uris(Some(PNG), None).unwrap(),
        Submission::from_data_uris(None, Some(JPEG)).unwrap(),
    ] {
        sink.clear();
        let report = controller.run(submission).await;

        assert_eq!(
            sink.states(),
            vec![
                PipelineState::Idle,
                PipelineState::Validating,
                PipelineState::Failed
            ]
        );
        assert!(matches!(
            report.outcome.error(),
            Some(Error::IncompleteSubmission { .. })
        ));
        assert_eq!(report.fragments, 0);
        assert_eq!(sink.last().unwrap().body, messages::INCOMPLETE_SUBMISSION);
    }

    assert_eq!(model.open_count(), 0);
}

#[tokio::test]
async fn buffer_is_concatenation_of_fragments() {
    let text = "## Brand\n\n**Acme** Oat Bar\n\n| Nutrient | Amount |\n|---|---|\n| Sodium | 410 mg · 18% |\n";

    for chunk_size in [1, 2, 3, 7, text.len()] {
        let fragments: Vec<Vec<u8>> = text
            .as_bytes()
            .chunks(chunk_size)
            .map(<[u8]>::to_vec)
            .collect();
        let count = fragments.len();
        let (controller, _) = controller(MockModel::with_fragments(fragments));

        let report = controller.run(complete_submission()).await;

        assert!(report.outcome.is_completed());
        assert_eq!(report.buffer_text(), text, "chunk size {chunk_size}");
        assert_eq!(report.fragments, count);
    }
}

#[tokio::test]
async fn render_failure_recovers_on_next_fragment() {
    let bytes = "Sodium · 18%".as_bytes();
    let split = bytes.iter().position(|b| *b == 0xC2).unwrap() + 1;
    let model = MockModel::new()
        .fragment(bytes[..split].to_vec())
        .fragment(bytes[split..].to_vec());
    let (controller, sink) = controller(model);

    let report = controller.run(complete_submission()).await;

    assert!(report.outcome.is_completed());
    assert_eq!(report.render_failures, 1);
    assert_eq!(report.buffer.as_ref(), bytes);

    let streaming: Vec<Output> = sink
        .outputs()
        .into_iter()
        .filter(|output| output.state == PipelineState::Streaming)
        .collect();
    assert_eq!(streaming.len(), 3);
    assert_eq!(streaming[1].kind, OutputKind::Diagnostic);
    assert!(streaming[1].body.starts_with("An error occurred: "));
    assert_eq!(streaming[2].kind, OutputKind::Markup);
    assert!(streaming[2].body.contains("Sodium · 18%"));
}

#[tokio::test]
async fn chunk_failure_does_not_stop_stream() {
    let model = MockModel::new()
        .fragment("a")
        .chunk_failure(StreamFailure::blocked("SAFETY"))
        .fragment("b");
    let (controller, sink) = controller(model);

    let report = controller.run(complete_submission()).await;

    assert!(report.outcome.is_completed());
    assert_eq!(report.chunk_failures, 1);
    assert_eq!(report.buffer_text(), "ab");
    assert!(
        sink.bodies()
            .contains(&"An error occurred: response chunk blocked: SAFETY".to_owned())
    );
    assert!(sink.last().unwrap().body.contains("<p>ab</p>"));
}

#[tokio::test]
async fn terminal_stream_error_keeps_partial_buffer() {
    let model = MockModel::new()
        .fragment("partial")
        .terminate(TransportError::network().with_message("connection reset"));
    let (controller, sink) = controller(model);

    let report = controller.run(complete_submission()).await;

    assert_eq!(report.final_state(), PipelineState::Failed);
    assert_eq!(report.buffer_text(), "partial");
    assert_eq!(
        sink.last().unwrap().body,
        "Error: network error: connection reset"
    );
}

#[tokio::test]
async fn new_submission_supersedes_run_in_flight() {
    let slow = MockModel::new().fragment("stale").hold_open();
    let sink = RecordingSink::new();
    let controller = PipelineController::new(StreamConsumer::new(slow), Arc::new(sink.clone()));

    let first = controller.submit(complete_submission());
    while !sink.states().contains(&PipelineState::Streaming) || sink.len() < 5 {
        tokio::task::yield_now().await;
    }
    assert!(controller.is_busy());
    assert_eq!(controller.active_run(), Some(first.run_id()));

    let second = controller.submit(Submission::new());
    let first_report = first.wait().await.unwrap();
    let second_report = second.wait().await.unwrap();

    assert!(first_report.outcome.is_cancelled());
    assert_eq!(first_report.buffer_text(), "stale");
    assert_eq!(second_report.final_state(), PipelineState::Failed);

    let outputs = sink.outputs();
    let switch = outputs
        .iter()
        .position(|output| output.run_id == second_report.run_id)
        .unwrap();
    assert!(
        outputs[switch..]
            .iter()
            .all(|output| output.run_id == second_report.run_id)
    );
    assert_eq!(sink.last().unwrap().body, messages::INCOMPLETE_SUBMISSION);
    assert!(!controller.is_busy());
}

#[tokio::test]
async fn cancel_stops_run_without_publishing() {
    let (controller, sink) = controller(MockModel::new().hold_open());

    let handle = controller.submit(complete_submission());
    while !sink.states().contains(&PipelineState::Streaming) {
        tokio::task::yield_now().await;
    }

    let published = sink.len();
    assert!(controller.cancel());
    assert!(!controller.cancel());

    let report = handle.wait().await.unwrap();
    assert!(report.outcome.is_cancelled());
    assert_eq!(sink.len(), published);
    assert!(!controller.is_busy());
}

#[tokio::test]
async fn dropped_run_future_clears_busy_flag() {
    let (controller, sink) = controller(MockModel::new().fragment("partial").hold_open());

    let timed_out = tokio::time::timeout(
        std::time::Duration::from_millis(50),
        controller.run(complete_submission()),
    )
    .await;

    assert!(timed_out.is_err());
    assert!(sink.states().contains(&PipelineState::Streaming));
    assert!(!controller.is_busy());
    assert_eq!(controller.active_run(), None);

    let report = controller.run(Submission::new()).await;
    assert_eq!(report.final_state(), PipelineState::Failed);
    assert!(!controller.is_busy());
}

#[tokio::test]
async fn output_slot_tracks_latest_value() {
    let slot = OutputSlot::new();
    let controller = PipelineController::new(
        StreamConsumer::new(MockModel::with_fragments(["*hi*"])),
        Arc::new(slot.clone()),
    );
    assert_eq!(slot.current().body, messages::IDLE);

    controller.run(complete_submission()).await;

    let current = slot.current();
    assert_eq!(current.state, PipelineState::Completed);
    assert!(current.body.contains("<em>hi</em>"));
}
