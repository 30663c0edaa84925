//! # Conflict Resolution
//!
//! Turns overlapping candidates into a set of disjoint spans. Candidates are
//! ranked, then accepted greedily: a candidate is kept only if it overlaps
//! nothing already kept.
//!
//! ## Ranking
//!
//! | Key          | Order      | Rationale                                  |
//! |--------------|------------|--------------------------------------------|
//! | `confidence` | descending | the surest detection claims the text       |
//! | `priority`   | descending | structured identifiers beat free text      |
//! | length       | descending | the longer reading of the same evidence    |
//! | `start`      | ascending  | leftmost first                             |
//! | `label`      | ascending  | declaration order of [`EntityLabel`]       |
//! | `source`     | ascending  | recognizer name                            |
//!
//! The last two keys make the ranking total, so the output does not depend on
//! the order recognizers were registered in.
//!
//! A losing candidate is dropped whole, never trimmed to the part that does
//! not overlap. Every loser is kept as a [`Rejection`] for the decision trace.
//!
//! [`EntityLabel`]: crate::label::EntityLabel

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::candidate::{Candidate, ResolvedSpan};
use crate::error::DeidError;

/// A candidate that lost to an already accepted span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub candidate: Candidate,
    pub blocked_by: ResolvedSpan,
}

/// Output of [`resolve`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// Sorted by `start`, pairwise disjoint
    pub accepted: Vec<ResolvedSpan>,
    /// In ranking order
    pub rejected: Vec<Rejection>,
}

/// Total ranking order; `Less` means "considered first".
pub fn rank(a: &Candidate, b: &Candidate) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| b.priority.cmp(&a.priority))
        .then_with(|| b.len().cmp(&a.len()))
        .then_with(|| a.start.cmp(&b.start))
        .then_with(|| a.label.cmp(&b.label))
        .then_with(|| a.source.cmp(&b.source))
}

/// Resolves overlaps among `candidates`.
///
/// Empty, reversed or out-of-bounds candidates (`end > text_len`) are
/// reported as [`DeidError::MalformedCandidate`]. Char boundaries are checked
/// by [`crate::aggregate::check`] and again by the masking engine.
pub fn resolve(
    mut candidates: Vec<Candidate>,
    text_len: usize,
) -> Result<Resolution, DeidError> {
    if let Some(bad) = candidates
        .iter()
        .find(|c| c.start >= c.end || c.end > text_len)
    {
        return Err(DeidError::MalformedCandidate {
            source_name: bad.source.clone(),
            label: bad.label,
            start: bad.start,
            end: bad.end,
            confidence: bad.confidence,
            text_len,
        });
    }

    candidates.sort_by(rank);

    // start → accepted span; disjoint, so the closest start before `end` is
    // the only one that can overlap
    let mut accepted: BTreeMap<usize, ResolvedSpan> = BTreeMap::new();
    let mut rejected = Vec::new();

    for candidate in candidates {
        let blocker = accepted
            .range(..candidate.end)
            .next_back()
            .map(|(_, span)| span)
            .filter(|span| span.end > candidate.start);

        match blocker {
            Some(span) => rejected.push(Rejection {
                blocked_by: span.clone(),
                candidate,
            }),
            None => {
                accepted.insert(candidate.start, ResolvedSpan::from(candidate));
            }
        }
    }

    Ok(Resolution {
        accepted: accepted.into_values().collect(),
        rejected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::EntityLabel;

    fn c(
        label: EntityLabel,
        range: std::ops::Range<usize>,
        conf: f64,
        prio: u8,
        source: &str,
    ) -> Candidate {
        Candidate::new(label, range, conf, prio, source)
    }

    #[test]
    fn test_confidence_wins() {
        let r = resolve(
            vec![
                c(EntityLabel::Person, 10..21, 0.6, 10, "model"),
                c(EntityLabel::UsSsn, 10..21, 0.95, 95, "ssn"),
            ],
            30,
        )
        .unwrap();
        assert_eq!(r.accepted.len(), 1);
        assert_eq!(r.accepted[0].label, EntityLabel::UsSsn);
        assert_eq!(r.rejected[0].candidate.label, EntityLabel::Person);
        assert_eq!(r.rejected[0].blocked_by.label, EntityLabel::UsSsn);
    }

    #[test]
    fn test_priority_then_length_break_ties() {
        let r = resolve(
            vec![
                c(EntityLabel::LicensePlate, 0..7, 0.8, 30, "plate"),
                c(EntityLabel::VehicleId, 0..7, 0.8, 85, "vin"),
            ],
            10,
        )
        .unwrap();
        assert_eq!(r.accepted[0].label, EntityLabel::VehicleId);

        let r = resolve(
            vec![
                c(EntityLabel::UsZip, 0..5, 0.7, 40, "a"),
                c(EntityLabel::UsZip, 0..10, 0.7, 40, "b"),
            ],
            10,
        )
        .unwrap();
        assert_eq!(r.accepted[0].range(), 0..10);
    }

    #[test]
    fn test_loser_dropped_whole() {
        let r = resolve(
            vec![
                c(EntityLabel::Url, 0..20, 0.85, 60, "url"),
                c(EntityLabel::EmailAddress, 15..30, 0.95, 70, "email"),
            ],
            30,
        )
        .unwrap();
        assert_eq!(r.accepted.len(), 1);
        assert_eq!(r.accepted[0].range(), 15..30);
    }

    #[test]
    fn test_adjacent_spans_both_kept_and_sorted() {
        let r = resolve(
            vec![
                c(EntityLabel::UsZip, 10..15, 0.7, 40, "zip"),
                c(EntityLabel::Person, 0..10, 0.6, 10, "model"),
                c(EntityLabel::UsSsn, 20..31, 0.95, 95, "ssn"),
            ],
            40,
        )
        .unwrap();
        let starts: Vec<usize> = r.accepted.iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![0, 10, 20]);
        assert!(r.rejected.is_empty());
    }

    #[test]
    fn test_order_independent() {
        let mut cands = vec![
            c(EntityLabel::UsPassport, 0..9, 0.6, 95, "passport"),
            c(EntityLabel::UsSsn, 0..9, 0.6, 95, "ssn"),
        ];
        let first = resolve(cands.clone(), 9).unwrap();
        cands.reverse();
        let second = resolve(cands, 9).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.accepted[0].label, EntityLabel::UsSsn);
    }

    #[test]
    fn test_reversed_candidate_rejected() {
        let err = resolve(vec![c(EntityLabel::Url, 5..5, 0.5, 1, "x")], 10).unwrap_err();
        assert_eq!(err.kind(), "malformed_candidate");
    }

    #[test]
    fn test_out_of_bounds_candidate_rejected() {
        let err = resolve(vec![c(EntityLabel::UsZip, 5..15, 0.7, 40, "zip")], 10).unwrap_err();
        assert!(matches!(err, DeidError::MalformedCandidate { end: 15, text_len: 10, .. }));
    }
}
