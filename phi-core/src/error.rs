//! Error types for the de-identification pipeline.
//!
//! No `Display` impl here ever includes input text: errors end up in logs and
//! HTTP responses, and the text is exactly what must not leak.

use thiserror::Error;

use crate::label::EntityLabel;
use crate::pipeline::Deidentified;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, DeidError>;

/// Pipeline-level failure for one input.
#[derive(Debug, Error)]
pub enum DeidError {
    /// Rejected before any recognizer ran.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: &'static str },

    /// A recognizer produced a span that cannot be masked correctly. This is a
    /// bug in the recognizer, so the whole run is aborted.
    #[error(
        "malformed candidate from `{source_name}`: {label} [{start}, {end}) with confidence {confidence} over {text_len} bytes"
    )]
    MalformedCandidate {
        source_name: String,
        label: EntityLabel,
        start: usize,
        end: usize,
        confidence: f64,
        text_len: usize,
    },

    /// A recognizer (typically the external model) failed. The other
    /// recognizers' work is kept in `partial`; the caller decides whether a
    /// partially masked text is acceptable.
    #[error("recognizer `{recognizer}` failed: {source}")]
    ExternalRecognizer {
        recognizer: String,
        #[source]
        source: RecognizerError,
        partial: Box<Deidentified>,
    },
}

impl DeidError {
    /// Short stable name of the error kind, safe to expose to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            DeidError::InvalidInput { .. } => "invalid_input",
            DeidError::MalformedCandidate { .. } => "malformed_candidate",
            DeidError::ExternalRecognizer { .. } => "external_recognizer",
        }
    }

    /// Partial result carried by [`DeidError::ExternalRecognizer`].
    pub fn partial(&self) -> Option<&Deidentified> {
        match self {
            DeidError::ExternalRecognizer { partial, .. } => Some(partial),
            _ => None,
        }
    }
}

/// Failure of a single recognizer's detection call.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RecognizerError {
    #[error("model error: {0}")]
    Model(String),

    #[error("model call timed out")]
    Timeout,

    #[error("model rejected empty input")]
    EmptyInput,
}

impl RecognizerError {
    pub fn kind(&self) -> &'static str {
        match self {
            RecognizerError::Model(_) => "model",
            RecognizerError::Timeout => "timeout",
            RecognizerError::EmptyInput => "empty_input",
        }
    }
}

/// Errors building a [`crate::Deidentifier`] from configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("pattern `{pattern}` of recognizer `{recognizer}` does not compile: {source}")]
    Regex {
        recognizer: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("config file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_message_has_offsets_only() {
        let err = DeidError::MalformedCandidate {
            source_name: "zip".into(),
            label: EntityLabel::UsZip,
            start: 4,
            end: 4,
            confidence: 0.7,
            text_len: 10,
        };
        let msg = err.to_string();
        assert!(msg.contains("US_ZIP [4, 4)"));
        assert_eq!(err.kind(), "malformed_candidate");
    }
}
