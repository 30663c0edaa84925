//! # Masking Engine
//!
//! Replaces resolved spans with their label tags in one left-to-right pass.
//!
//! ```text
//! original:  "Patient John Doe's MRN is MRN-98453 and ..."
//!                    [8   16)          [26     35)
//! segments:  V("Patient ") M(PERSON) V("'s MRN is ") M(MRN) V(" and ...")
//! masked:    "Patient <PERSON>'s MRN is <MRN> and ..."
//! ```
//!
//! For `n` spans there are always `n + 1` verbatim segments (some possibly
//! empty) interleaved with `n` masked ones, and together they cover every byte
//! of the input exactly once. Tags are inserted literally and never scanned
//! again. Report offsets refer to the original text, not the masked one.

use serde::Serialize;

use crate::candidate::{EntityReportEntry, ResolvedSpan};
use crate::error::{DeidError, Result};
use crate::label::EntityLabel;
use crate::offset::is_valid_span;

/// One piece of the masked output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment<'a> {
    /// Original text, copied unchanged
    Verbatim { text: &'a str, start: usize, end: usize },
    /// An entity replaced by its tag
    Masked { label: EntityLabel, start: usize, end: usize },
}

impl Segment<'_> {
    pub fn original_len(&self) -> usize {
        match self {
            Segment::Verbatim { start, end, .. } | Segment::Masked { start, end, .. } => {
                end - start
            }
        }
    }

    /// Text this segment contributes to the masked output
    pub fn output(&self) -> &str {
        match self {
            Segment::Verbatim { text, .. } => *text,
            Segment::Masked { label, .. } => label.mask_tag(),
        }
    }
}

/// Splits `text` into verbatim and masked segments.
///
/// `spans` must be sorted by `start`, disjoint, and lie on char boundaries
/// inside `text`, which is what the resolver produces. Any other span is
/// reported as [`DeidError::MalformedCandidate`].
pub fn mask_segments<'a>(text: &'a str, spans: &[ResolvedSpan]) -> Result<Vec<Segment<'a>>> {
    let mut segments = Vec::with_capacity(spans.len() * 2 + 1);
    let mut cursor = 0;
    for span in spans {
        if span.start < cursor || !is_valid_span(text, &span.range()) {
            return Err(malformed(span, text.len()));
        }
        segments.push(Segment::Verbatim {
            text: &text[cursor..span.start],
            start: cursor,
            end: span.start,
        });
        segments.push(Segment::Masked {
            label: span.label,
            start: span.start,
            end: span.end,
        });
        cursor = span.end;
    }
    segments.push(Segment::Verbatim {
        text: &text[cursor..],
        start: cursor,
        end: text.len(),
    });
    Ok(segments)
}

fn malformed(span: &ResolvedSpan, text_len: usize) -> DeidError {
    DeidError::MalformedCandidate {
        source_name: span.source.clone(),
        label: span.label,
        start: span.start,
        end: span.end,
        confidence: span.confidence,
        text_len,
    }
}

/// Masked text plus the report of what was masked.
pub fn mask(text: &str, spans: &[ResolvedSpan]) -> Result<(String, Vec<EntityReportEntry>)> {
    let segments = mask_segments(text, spans)?;
    let capacity = segments.iter().map(|s| s.output().len()).sum();
    let mut masked = String::with_capacity(capacity);
    for segment in &segments {
        masked.push_str(segment.output());
    }
    let report = spans.iter().map(ResolvedSpan::report_entry).collect();
    Ok((masked, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::Candidate;

    fn span(label: EntityLabel, range: std::ops::Range<usize>) -> ResolvedSpan {
        ResolvedSpan::from(Candidate::new(label, range, 0.9, 50, "t"))
    }

    #[test]
    fn test_mask_sentence() {
        let text = "Patient John Doe's MRN is MRN-98453 and SSN is 123-45-6789.";
        let spans = vec![
            span(EntityLabel::Person, 8..16),
            span(EntityLabel::MedicalRecordNumber, 26..35),
            span(EntityLabel::UsSsn, 47..58),
        ];
        let (masked, report) = mask(text, &spans).unwrap();
        assert_eq!(masked, "Patient <PERSON>'s MRN is <MRN> and SSN is <SSN>.");
        assert_eq!(report[1].range(), 26..35);
        assert_eq!(&text[report[2].range()], "123-45-6789");
    }

    #[test]
    fn test_segments_cover_input_once() {
        let text = "12345 ab 98765";
        let spans = vec![span(EntityLabel::UsZip, 0..5), span(EntityLabel::UsZip, 9..14)];
        let segments = mask_segments(text, &spans).unwrap();
        assert_eq!(segments.len(), 5);
        let verbatim = segments
            .iter()
            .filter(|s| matches!(s, Segment::Verbatim { .. }))
            .count();
        assert_eq!(verbatim, 3);
        assert_eq!(segments.iter().map(Segment::original_len).sum::<usize>(), text.len());
        // span at the very start and end leave empty verbatim segments
        assert_eq!(segments[0].output(), "");
        assert_eq!(segments[4].output(), "");
    }

    #[test]
    fn test_no_spans_is_identity() {
        let (masked, report) = mask("nothing here", &[]).unwrap();
        assert_eq!(masked, "nothing here");
        assert!(report.is_empty());
    }

    #[test]
    fn test_multibyte_text() {
        let text = "Zoë 12345";
        let (masked, report) = mask(text, &[span(EntityLabel::UsZip, 5..10)]).unwrap();
        assert_eq!(masked, "Zoë <ZIP>");
        assert_eq!(report[0].range(), 5..10);
    }

    #[test]
    fn test_spans_breaking_the_contract_are_errors() {
        let text = "Zoë 12345";
        let unsorted = [span(EntityLabel::UsZip, 5..10), span(EntityLabel::Person, 0..3)];
        let out_of_bounds = [span(EntityLabel::UsZip, 5..12)];
        let mid_char = [span(EntityLabel::Person, 0..3)];
        for spans in [&unsorted[..], &out_of_bounds[..], &mid_char[..]] {
            let err = mask(text, spans).unwrap_err();
            assert_eq!(err.kind(), "malformed_candidate");
        }
    }
}
