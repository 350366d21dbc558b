//! Server-sent event framing and chunk interpretation.
//!
//! The endpoint answers `?alt=sse` requests with `data: <json>` events
//! separated by blank lines. Network reads split events arbitrarily, so
//! [`SseDecoder`] buffers bytes until an event is complete.

use bytes::BytesMut;
use nutriscan_core::stream::StreamFragment;
use nutriscan_core::{Error as CoreError, StreamFailure, TransportError};

use crate::TRACING_TARGET_STREAM;
use crate::wire::{ErrorResponse, GenerateContentResponse};

/// Incremental decoder of a server-sent event body.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: BytesMut,
    data: Vec<String>,
}

impl SseDecoder {
    /// Creates an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds bytes and returns the data of every event completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(end) = self.buffer.iter().position(|b| *b == b'\n') {
            let line = self.buffer.split_to(end + 1);
            let line = trim_line_ending(&line);

            if line.is_empty() {
                if let Some(event) = self.take_event() {
                    events.push(event);
                }
                continue;
            }

            self.on_line(line);
        }
        events
    }

    /// Flushes a trailing event that was not followed by a blank line.
    pub fn finish(&mut self) -> Option<String> {
        if !self.buffer.is_empty() {
            let rest = self.buffer.split_to(self.buffer.len());
            let line = trim_line_ending(&rest);
            if !line.is_empty() {
                self.on_line(line);
            }
        }
        self.take_event()
    }

    fn on_line(&mut self, line: &[u8]) {
        let line = String::from_utf8_lossy(line);
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line.as_ref(), ""),
        };

        if field == "data" {
            self.data.push(value.to_owned());
        }
    }

    fn take_event(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }

        let event = self.data.join("\n");
        self.data.clear();
        Some(event)
    }

    /// Returns true if no partial line or event is pending.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty() && self.data.is_empty()
    }
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Interprets one event payload as a stream item.
///
/// Returns `None` for chunks that carry neither text nor a block reason,
/// such as the final usage-only chunk.
pub fn interpret_event(payload: &str) -> Option<Result<StreamFragment, CoreError>> {
    if let Ok(response) = serde_json::from_str::<ErrorResponse>(payload) {
        let transport = match response.error.code {
            Some(code) => TransportError::from_status(code),
            None => TransportError::service_unavailable(),
        };
        return Some(Err(transport.with_message(response.error.message).into()));
    }

    let chunk = match serde_json::from_str::<GenerateContentResponse>(payload) {
        Ok(chunk) => chunk,
        Err(error) => {
            tracing::warn!(
                target: TRACING_TARGET_STREAM,
                error = %error,
                payload_len = payload.len(),
                "Unparsable response chunk"
            );
            return Some(Err(StreamFailure::malformed_chunk(error.to_string()).into()));
        }
    };

    let text = chunk.text();
    if !text.is_empty() {
        return Some(Ok(StreamFragment::from(text)));
    }

    chunk
        .block_reason()
        .map(|reason| Err(StreamFailure::blocked(reason).into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_split_across_reads() {
        let mut decoder = SseDecoder::new();

        assert!(decoder.push(b"data: {\"a\"").is_empty());
        assert!(decoder.push(b":1}\r\n").is_empty());
        let events = decoder.push(b"\r\ndata: {\"b\":2}\n\n: keep-alive\n\n");

        assert_eq!(events, vec![r#"{"a":1}"#.to_owned(), r#"{"b":2}"#.to_owned()]);
        assert!(decoder.is_empty());
    }

    #[test]
    fn multi_line_data_is_joined() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"event: message\ndata: line one\ndata:line two\n\n");
        assert_eq!(events, vec!["line one\nline two".to_owned()]);
    }

    #[test]
    fn trailing_event_is_flushed() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: last").is_empty());
        assert_eq!(decoder.finish().as_deref(), Some("last"));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn text_chunk_becomes_fragment() {
        let payload = r#"{"candidates":[{"content":{"parts":[{"text":"**Acme**"}],"role":"model"},"index":0}]}"#;
        let item = interpret_event(payload).unwrap().unwrap();
        assert_eq!(item.as_bytes(), b"**Acme**");
    }

    #[test]
    fn blocked_chunk_is_non_fatal() {
        let payload = r#"{"candidates":[{"finishReason":"SAFETY","index":0}]}"#;
        let error = interpret_event(payload).unwrap().unwrap_err();
        assert!(matches!(error, CoreError::Stream(StreamFailure::Blocked { ref reason }) if reason == "SAFETY"));
        assert!(!error.is_terminal());
    }

    #[test]
    fn malformed_chunk_is_non_fatal() {
        let error = interpret_event("{not json").unwrap().unwrap_err();
        assert!(matches!(error, CoreError::Stream(StreamFailure::MalformedChunk { .. })));
    }

    #[test]
    fn error_event_is_terminal() {
        let payload = r#"{"error":{"code":503,"message":"The model is overloaded.","status":"UNAVAILABLE"}}"#;
        let error = interpret_event(payload).unwrap().unwrap_err();
        assert!(error.is_terminal());
        assert_eq!(error.to_string(), "service unavailable: The model is overloaded.");
    }

    #[test]
    fn empty_stop_chunk_is_skipped() {
        let payload = r#"{"candidates":[{"content":{"parts":[{"text":""}]},"finishReason":"STOP"}],"usageMetadata":{}}"#;
        assert!(interpret_event(payload).is_none());
    }
}
