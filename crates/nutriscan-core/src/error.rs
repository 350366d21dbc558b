//! Error taxonomy for the analysis pipeline.
//!
//! Validation and transport errors end a run; [`StreamFailure`]s are scoped to
//! a single fragment and never stop the stream.

use strum::{AsRefStr, IntoStaticStr};
use thiserror::Error;

use crate::request::ImageRole;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced by the analysis pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// The image source produced a data URI that could not be decoded.
    #[error("malformed image: {0}")]
    MalformedImage(String),

    /// One or both images were missing at submission time.
    #[error("incomplete submission: missing {} image", join_roles(.missing))]
    IncompleteSubmission { missing: Vec<ImageRole> },

    /// The generation stream could not be opened or terminated abnormally.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A single fragment could not be rendered.
    #[error(transparent)]
    Stream(#[from] StreamFailure),

    /// The run was superseded by a newer submission or stopped by the caller.
    #[error("run cancelled")]
    Cancelled,
}

impl Error {
    /// Creates a malformed image error.
    pub fn malformed_image(message: impl Into<String>) -> Self {
        Self::MalformedImage(message.into())
    }

    /// Creates an incomplete submission error for the given missing roles.
    pub fn incomplete_submission(missing: impl Into<Vec<ImageRole>>) -> Self {
        Self::IncompleteSubmission {
            missing: missing.into(),
        }
    }

    /// Returns true if the error ends the run it occurred in.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Stream(_))
    }

    /// Returns true if this is a transport error.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

fn join_roles(roles: &[ImageRole]) -> String {
    roles
        .iter()
        .map(AsRef::<str>::as_ref)
        .collect::<Vec<_>>()
        .join(" and ")
}

/// Categories of transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum TransportKind {
    /// The service rejected the credentials.
    Authentication,
    /// The caller exceeded its quota.
    RateLimited,
    /// The connection could not be established or broke.
    Network,
    /// The request or stream timed out.
    Timeout,
    /// The service is temporarily unavailable.
    ServiceUnavailable,
    /// The service rejected the request.
    InvalidRequest,
    /// The service answered with something that is not a generation stream.
    InvalidResponse,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication failed"),
            Self::RateLimited => write!(f, "rate limit exceeded"),
            Self::Network => write!(f, "network error"),
            Self::Timeout => write!(f, "operation timed out"),
            Self::ServiceUnavailable => write!(f, "service unavailable"),
            Self::InvalidRequest => write!(f, "invalid request"),
            Self::InvalidResponse => write!(f, "invalid response"),
        }
    }
}

/// Failure to open, or abnormal termination of, a generation stream.
#[derive(Debug, Error)]
#[error("{kind}{}", message.as_ref().map(|m| format!(": {}", m)).unwrap_or_default())]
pub struct TransportError {
    /// The kind of failure.
    pub kind: TransportKind,
    /// HTTP status code, when the failure came from a response.
    pub status: Option<u16>,
    /// Optional human-readable detail.
    pub message: Option<String>,
    /// Optional source error.
    #[source]
    pub source: Option<BoxedError>,
}

impl TransportError {
    /// Creates a new transport error of the given kind.
    pub fn new(kind: TransportKind) -> Self {
        Self {
            kind,
            status: None,
            message: None,
            source: None,
        }
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds an HTTP status to this error.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Adds a source error to this error.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Creates an authentication error.
    pub fn authentication() -> Self {
        Self::new(TransportKind::Authentication)
    }

    /// Creates a rate limited error.
    pub fn rate_limited() -> Self {
        Self::new(TransportKind::RateLimited)
    }

    /// Creates a network error.
    pub fn network() -> Self {
        Self::new(TransportKind::Network)
    }

    /// Creates a timeout error.
    pub fn timeout() -> Self {
        Self::new(TransportKind::Timeout)
    }

    /// Creates a service unavailable error.
    pub fn service_unavailable() -> Self {
        Self::new(TransportKind::ServiceUnavailable)
    }

    /// Creates an invalid request error.
    pub fn invalid_request() -> Self {
        Self::new(TransportKind::InvalidRequest)
    }

    /// Creates an invalid response error.
    pub fn invalid_response() -> Self {
        Self::new(TransportKind::InvalidResponse)
    }

    /// Maps an HTTP error status to the matching transport error.
    pub fn from_status(status: u16) -> Self {
        let kind = match status {
            401 | 403 => TransportKind::Authentication,
            408 => TransportKind::Timeout,
            429 => TransportKind::RateLimited,
            500..=599 => TransportKind::ServiceUnavailable,
            _ => TransportKind::InvalidRequest,
        };

        Self::new(kind).with_status(status)
    }

    /// Returns the error kind as a string.
    pub fn kind_str(&self) -> &'static str {
        self.kind.into()
    }
}

/// A non-fatal failure scoped to a single fragment.
///
/// The run stays in `Streaming`; the next fragment is a fresh attempt to
/// render the whole buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamFailure {
    /// The buffer ends in the middle of a UTF-8 sequence.
    #[error("incomplete UTF-8 sequence after byte {valid_up_to}")]
    IncompleteUtf8 { valid_up_to: usize },

    /// The buffer contains bytes that are not valid UTF-8.
    #[error("invalid UTF-8 sequence after byte {valid_up_to}")]
    InvalidUtf8 { valid_up_to: usize },

    /// The service withheld the chunk.
    #[error("response chunk blocked: {reason}")]
    Blocked { reason: String },

    /// The chunk payload could not be parsed.
    #[error("malformed response chunk: {message}")]
    MalformedChunk { message: String },

    /// The markup converter rejected the buffer.
    #[error("markup conversion failed: {message}")]
    Conversion { message: String },
}

impl StreamFailure {
    /// Creates a blocked chunk failure.
    pub fn blocked(reason: impl Into<String>) -> Self {
        Self::Blocked {
            reason: reason.into(),
        }
    }

    /// Creates a malformed chunk failure.
    pub fn malformed_chunk(message: impl Into<String>) -> Self {
        Self::MalformedChunk {
            message: message.into(),
        }
    }

    /// Creates a conversion failure.
    pub fn conversion(message: impl Into<String>) -> Self {
        Self::Conversion {
            message: message.into(),
        }
    }

    /// Builds the failure matching a UTF-8 decode error over the buffer.
    pub fn from_utf8_error(error: std::str::Utf8Error) -> Self {
        let valid_up_to = error.valid_up_to();
        match error.error_len() {
            None => Self::IncompleteUtf8 { valid_up_to },
            Some(_) => Self::InvalidUtf8 { valid_up_to },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_status_mapping() {
        assert_eq!(
            TransportError::from_status(401).kind,
            TransportKind::Authentication
        );
        assert_eq!(TransportError::from_status(429).kind, TransportKind::RateLimited);
        assert_eq!(
            TransportError::from_status(503).kind,
            TransportKind::ServiceUnavailable
        );
        assert_eq!(
            TransportError::from_status(400).kind,
            TransportKind::InvalidRequest
        );
        assert_eq!(TransportError::from_status(404).status, Some(404));
    }

    #[test]
    fn transport_display_includes_message() {
        let error = TransportError::authentication().with_message("API key not valid");
        assert_eq!(error.to_string(), "authentication failed: API key not valid");
        assert_eq!(TransportError::network().to_string(), "network error");
        assert_eq!(TransportError::network().kind_str(), "network");
    }

    #[test]
    fn incomplete_submission_lists_roles() {
        let error = Error::incomplete_submission(vec![ImageRole::Brand, ImageRole::Nutrition]);
        assert_eq!(
            error.to_string(),
            "incomplete submission: missing brand and nutrition image"
        );
        assert!(error.is_terminal());
    }

    #[test]
    fn utf8_errors_are_classified() {
        let truncated = [0xE2, 0x82];
        let error = std::str::from_utf8(&truncated).unwrap_err();
        assert_eq!(
            StreamFailure::from_utf8_error(error),
            StreamFailure::IncompleteUtf8 { valid_up_to: 0 }
        );

        let invalid = [b'a', 0xFF, b'b'];
        let error = std::str::from_utf8(&invalid).unwrap_err();
        assert_eq!(
            StreamFailure::from_utf8_error(error),
            StreamFailure::InvalidUtf8 { valid_up_to: 1 }
        );

        assert!(!Error::from(StreamFailure::blocked("SAFETY")).is_terminal());
    }
}
