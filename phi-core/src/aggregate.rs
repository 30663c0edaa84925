//! # Candidate Aggregation
//!
//! Runs every registered recognizer over the text and concatenates what they
//! propose. This is the single point where candidates from outside the crate
//! are checked:
//!
//! - the span must be non-empty, in bounds and on char boundaries;
//! - the confidence must be a number in `[0, 1]`.
//!
//! A candidate failing either check is a recognizer bug and aborts the run
//! with [`DeidError::MalformedCandidate`]. A recognizer that *fails* (model
//! down, timeout) is different: its failure is recorded and every other
//! recognizer still contributes.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::candidate::Candidate;
use crate::error::{DeidError, RecognizerError};
use crate::offset::is_valid_span;
use crate::recognizer::RecognizerRegistry;

/// A recognizer that could not produce candidates for one input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizerFailure {
    pub recognizer: String,
    /// Stable error kind (`model`, `timeout`, `empty_input`)
    pub kind: String,
    #[serde(skip)]
    pub error: Option<RecognizerError>,
}

/// Everything the recognizers proposed for one text.
#[derive(Debug, Clone, Default)]
pub struct Aggregated {
    pub candidates: Vec<Candidate>,
    pub failures: Vec<RecognizerFailure>,
    /// Candidates dropped for scoring below the threshold
    pub below_threshold: usize,
}

/// Collects and checks candidates from every recognizer in `registry`.
pub fn collect(
    registry: &RecognizerRegistry,
    text: &str,
    score_threshold: f64,
) -> Result<Aggregated, DeidError> {
    let mut out = Aggregated::default();

    for recognizer in registry.iter() {
        match recognizer.detect(text) {
            Ok(candidates) => {
                debug!(
                    recognizer = recognizer.name(),
                    count = candidates.len(),
                    "recognizer finished"
                );
                for candidate in candidates {
                    check(&candidate, text)?;
                    if candidate.confidence < score_threshold {
                        out.below_threshold += 1;
                        continue;
                    }
                    out.candidates.push(candidate);
                }
            }
            Err(error) => {
                warn!(recognizer = recognizer.name(), kind = error.kind(), "recognizer failed");
                out.failures.push(RecognizerFailure {
                    recognizer: recognizer.name().to_string(),
                    kind: error.kind().to_string(),
                    error: Some(error),
                });
            }
        }
    }

    Ok(out)
}

/// Rejects candidates the masking engine could not apply faithfully.
pub fn check(candidate: &Candidate, text: &str) -> Result<(), DeidError> {
    let confidence_ok = (0.0..=1.0).contains(&candidate.confidence);
    if confidence_ok && is_valid_span(text, &candidate.range()) {
        return Ok(());
    }
    Err(DeidError::MalformedCandidate {
        source_name: candidate.source.clone(),
        label: candidate.label,
        start: candidate.start,
        end: candidate.end,
        confidence: candidate.confidence,
        text_len: text.len(),
    })
}
