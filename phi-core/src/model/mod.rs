//! # Model Recognizer Adapter
//!
//! Free-text identifiers (names, places, dates, organizations) come from a
//! statistical entity model. The model speaks its own label set (`PER`,
//! `GPE`, ...); [`ModelRecognizer`] wraps any [`EntityModel`] and turns its
//! output into [`Candidate`]s:
//!
//! | Step            | Rule                                                    |
//! |-----------------|---------------------------------------------------------|
//! | label mapping   | through `ModelConfig::label_map`; unmapped are dropped  |
//! | confidence      | passed through unchanged                                |
//! | min confidence  | entities below `ModelConfig::min_confidence` dropped    |
//! | priority        | `ModelConfig::priority` (10 by default)                 |
//!
//! One call per text, no retries. A model failure is returned as-is; the
//! aggregator decides what it means for the run.

pub mod heuristic;
pub mod stub;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::candidate::Candidate;
use crate::config::ModelConfig;
use crate::error::RecognizerError;
use crate::label::EntityLabel;
use crate::recognizer::Recognizer;

pub use heuristic::HeuristicModel;
pub use stub::{FailingModel, StaticModel};

/// An entity as reported by a model, in the model's own vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeEntity {
    pub label: String,
    pub start: usize,
    pub end: usize,
    pub confidence: f64,
}

impl NativeEntity {
    pub fn new(label: impl Into<String>, start: usize, end: usize, confidence: f64) -> Self {
        Self {
            label: label.into(),
            start,
            end,
            confidence,
        }
    }
}

/// A statistical entity recognizer (NER model, remote service, ...).
pub trait EntityModel: Send + Sync {
    fn name(&self) -> &str;

    /// Byte-offset entities for `text`.
    fn detect(&self, text: &str) -> Result<Vec<NativeEntity>, RecognizerError>;
}

/// Registry names of model adapters start with this, so a model can never
/// shadow a pattern recognizer of the same name.
pub const MODEL_NAME_PREFIX: &str = "model:";

/// Adapts an [`EntityModel`] into a [`Recognizer`].
pub struct ModelRecognizer {
    name: String,
    model: Arc<dyn EntityModel>,
    label_map: BTreeMap<String, EntityLabel>,
    priority: u8,
    min_confidence: f64,
}

impl ModelRecognizer {
    pub fn new(model: Arc<dyn EntityModel>, config: &ModelConfig) -> Self {
        Self {
            name: format!("{MODEL_NAME_PREFIX}{}", model.name()),
            model,
            label_map: config.label_map.clone(),
            priority: config.priority,
            min_confidence: config.min_confidence,
        }
    }

    pub fn map_label(&self, native: &str) -> Option<EntityLabel> {
        self.label_map.get(native).copied()
    }
}

impl std::fmt::Debug for ModelRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRecognizer")
            .field("model", &self.model.name())
            .field("priority", &self.priority)
            .field("min_confidence", &self.min_confidence)
            .finish()
    }
}

impl Recognizer for ModelRecognizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn labels(&self) -> Vec<EntityLabel> {
        let mut labels: Vec<EntityLabel> = self.label_map.values().copied().collect();
        labels.sort();
        labels.dedup();
        labels
    }

    fn detect(&self, text: &str) -> Result<Vec<Candidate>, RecognizerError> {
        let entities = self.model.detect(text)?;
        let total = entities.len();

        let candidates: Vec<Candidate> = entities
            .into_iter()
            .filter_map(|e| {
                let Some(label) = self.map_label(&e.label) else {
                    debug!(
                        model = self.model.name(),
                        native_label = %e.label,
                        "dropping unmapped model label"
                    );
                    return None;
                };
                if e.confidence < self.min_confidence {
                    return None;
                }
                Some(Candidate::new(
                    label,
                    e.start..e.end,
                    e.confidence,
                    self.priority,
                    self.name.as_str(),
                ))
            })
            .collect();

        debug!(
            model = self.model.name(),
            native = total,
            kept = candidates.len(),
            "model entities adapted"
        );
        Ok(candidates)
    }
}
