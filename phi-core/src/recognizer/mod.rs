//! # Recognizer Registry
//!
//! A recognizer is any value that can look at a text and propose candidates.
//! The registry maps each [`EntityLabel`] to the recognizers able to emit it
//! and keeps them in registration order for the aggregator.
//!
//! ```text
//!            ┌───────────────────────────┐
//!  US_SSN ──►│ PatternRecognizer "ssn"   │
//!  US_ZIP ──►│ PatternRecognizer "zip"   │
//!   ...      │ ...                       │
//!  PERSON ─┐ │                           │
//!  DATE ───┼►│ ModelRecognizer "model"   │
//!  ...   ──┘ └───────────────────────────┘
//! ```
//!
//! Adding a new identifier means registering one more recognizer; the
//! aggregator and the resolver never change.

pub mod builtin;
pub mod pattern;
pub mod validate;

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use crate::candidate::Candidate;
use crate::error::RecognizerError;
use crate::label::EntityLabel;

pub use pattern::{Pattern, PatternRecognizer};

/// Detection capability. Implementations must be pure with respect to the
/// input text and safe to call from several threads at once.
pub trait Recognizer: Send + Sync {
    /// Unique name, used as `Candidate::source`
    fn name(&self) -> &str;

    /// Labels this recognizer can emit
    fn labels(&self) -> Vec<EntityLabel>;

    /// Proposes candidates for `text`.
    fn detect(&self, text: &str) -> Result<Vec<Candidate>, RecognizerError>;
}

/// Read-only set of recognizers, indexed by label.
#[derive(Default, Clone)]
pub struct RecognizerRegistry {
    recognizers: Vec<Arc<dyn Recognizer>>,
    by_label: BTreeMap<EntityLabel, Vec<usize>>,
}

impl RecognizerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a recognizer. A recognizer with the same name replaces the old one.
    pub fn register(&mut self, recognizer: Arc<dyn Recognizer>) {
        if let Some(pos) = self
            .recognizers
            .iter()
            .position(|r| r.name() == recognizer.name())
        {
            info!(recognizer = recognizer.name(), "replacing recognizer");
            self.recognizers[pos] = recognizer;
        } else {
            self.recognizers.push(recognizer);
        }
        self.reindex();
    }

    /// Removes a recognizer by name; returns whether one was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.recognizers.len();
        self.recognizers.retain(|r| r.name() != name);
        let removed = self.recognizers.len() != before;
        if removed {
            self.reindex();
        }
        removed
    }

    fn reindex(&mut self) {
        self.by_label.clear();
        for (i, r) in self.recognizers.iter().enumerate() {
            for label in r.labels() {
                self.by_label.entry(label).or_default().push(i);
            }
        }
    }

    /// Recognizers in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Recognizer>> {
        self.recognizers.iter()
    }

    pub fn for_label(&self, label: EntityLabel) -> Vec<&Arc<dyn Recognizer>> {
        self.by_label
            .get(&label)
            .map(|idx| idx.iter().map(|&i| &self.recognizers[i]).collect())
            .unwrap_or_default()
    }

    /// Labels at least one registered recognizer can emit
    pub fn covered_labels(&self) -> Vec<EntityLabel> {
        self.by_label.keys().copied().collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.recognizers.iter().map(|r| r.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.recognizers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recognizers.is_empty()
    }
}

impl std::fmt::Debug for RecognizerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognizerRegistry")
            .field("recognizers", &self.names())
            .finish()
    }
}
