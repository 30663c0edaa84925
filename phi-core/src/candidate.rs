//! # Candidates, Resolved Spans and Report Entries
//!
//! The three shapes a detection goes through:
//!
//! 1. [`Candidate`]: proposed by one recognizer, may overlap others.
//! 2. [`ResolvedSpan`]: accepted by the conflict resolver; the sequence for
//!    one text is sorted by `start` and pairwise non-overlapping.
//! 3. [`EntityReportEntry`]: what the caller gets back for audit. It keeps the
//!    label and the offsets into the *original* text, never the value itself.
//!
//! All offsets are UTF-8 byte offsets into the input `&str`, half-open
//! (`start..end`), and always fall on char boundaries. See [`crate::offset`]
//! for conversion to character offsets.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::label::EntityLabel;

/// An unconfirmed detection proposed by one recognizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub label: EntityLabel,
    /// Byte offset of the first byte (inclusive)
    pub start: usize,
    /// Byte offset one past the last byte (exclusive)
    pub end: usize,
    /// Recognizer confidence in `[0, 1]`
    pub confidence: f64,
    /// Tie-break weight among equal-confidence candidates
    pub priority: u8,
    /// Name of the recognizer that emitted it
    pub source: String,
}

impl Candidate {
    pub fn new(
        label: EntityLabel,
        range: Range<usize>,
        confidence: f64,
        priority: u8,
        source: impl Into<String>,
    ) -> Self {
        Self {
            label,
            start: range.start,
            end: range.end,
            confidence,
            priority,
            source: source.into(),
        }
    }

    /// Length in bytes. Zero for malformed (reversed or empty) spans.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// `true` if the half-open intervals share at least one byte
    pub fn overlaps(&self, other: &Candidate) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A candidate accepted into the final, non-overlapping output set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSpan {
    pub label: EntityLabel,
    pub start: usize,
    pub end: usize,
    pub confidence: f64,
    pub source: String,
}

impl ResolvedSpan {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn report_entry(&self) -> EntityReportEntry {
        EntityReportEntry {
            label: self.label,
            start: self.start,
            end: self.end,
            score: self.confidence,
        }
    }
}

impl From<Candidate> for ResolvedSpan {
    fn from(c: Candidate) -> Self {
        Self {
            label: c.label,
            start: c.start,
            end: c.end,
            confidence: c.confidence,
            source: c.source,
        }
    }
}

/// One masked entity as it appeared in the original text.
///
/// Deliberately carries no copy of the masked value, so the report can be
/// stored or logged next to the masked text without re-leaking it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityReportEntry {
    pub label: EntityLabel,
    pub start: usize,
    pub end: usize,
    pub score: f64,
}

impl EntityReportEntry {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_is_half_open() {
        let a = Candidate::new(EntityLabel::UsSsn, 0..5, 0.9, 1, "a");
        let b = Candidate::new(EntityLabel::Person, 5..9, 0.9, 1, "b");
        let c = Candidate::new(EntityLabel::Person, 4..6, 0.9, 1, "c");
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(b.overlaps(&c));
    }

    #[test]
    fn test_reversed_span_has_zero_len() {
        let c = Candidate::new(EntityLabel::Url, 8..3, 0.5, 1, "x");
        assert_eq!(c.len(), 0);
        assert!(c.is_empty());
    }

    #[test]
    fn test_report_entry_has_no_value_field() {
        let span = ResolvedSpan::from(Candidate::new(EntityLabel::UsZip, 3..8, 0.7, 40, "zip"));
        let json = serde_json::to_value(span.report_entry()).unwrap();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 4);
        assert!(json.get("text").is_none());
    }
}
