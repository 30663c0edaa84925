//! # De-identification Pipeline — Orchestrator with Observable Events
//!
//! [`Deidentifier`] wires the stages together:
//!
//! ```text
//! text ─► recognizers ─► aggregate ─► resolve ─► mask ─► Deidentified
//!          (patterns,     (check,      (rank,      (tags)
//!           model)         isolate)     greedy)
//! ```
//!
//! Every stage can report what it decided through [`PipelineEvent`]s sent on
//! an `mpsc` channel, so a client can show why a span was or was not masked.
//! Events carry offsets, labels and scores, never the input text.
//!
//! # Usage
//! - **Sync**: [`Deidentifier::deidentify`] for direct calls.
//! - **Streaming**: [`Deidentifier::deidentify_streaming`] for the decision trace.
//! - **Batch**: [`Deidentifier::deidentify_batch`] runs texts in parallel.

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aggregate::{self, RecognizerFailure};
use crate::candidate::EntityReportEntry;
use crate::config::{DeidConfig, FailurePolicy, ModelKind};
use crate::error::{ConfigError, DeidError, RecognizerError, Result};
use crate::hipaa::{coverage_report, Coverage, CoverageEntry};
use crate::label::EntityLabel;
use crate::masking;
use crate::model::{EntityModel, HeuristicModel, ModelRecognizer};
use crate::recognizer::{builtin, Recognizer, RecognizerRegistry};
use crate::resolver;

/// Result of de-identifying one text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deidentified {
    pub masked_text: String,
    /// Masked entities, in text order, with offsets into the original text
    pub entities: Vec<EntityReportEntry>,
    /// Recognizers that failed on this text; empty for a complete result
    pub failures: Vec<RecognizerFailure>,
    pub processing_ms: u64,
}

impl Deidentified {
    /// Some recognizer failed, so identifiers it covers may be left in clear.
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Decision trace emitted by [`Deidentifier::deidentify_streaming`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PipelineEvent {
    /// A recognizer could not run on this text.
    RecognizerFailed { recognizer: String, kind: String },
    /// All recognizers ran.
    CandidatesCollected {
        total: usize,
        below_threshold: usize,
        recognizers: usize,
    },
    /// A candidate was kept and will be masked.
    SpanAccepted {
        label: EntityLabel,
        start: usize,
        end: usize,
        confidence: f64,
        source: String,
    },
    /// A candidate lost to an overlapping, higher-ranked span.
    SpanRejected {
        label: EntityLabel,
        start: usize,
        end: usize,
        confidence: f64,
        source: String,
        blocked_by: EntityLabel,
        blocked_by_source: String,
    },
    /// Finished; carries the full result.
    Done { result: Deidentified },
    /// Finished with an error. Only the kind and a text-free message.
    Error { kind: String, message: String },
}

/// The de-identification pipeline.
///
/// Built once, then shared read-only (`Arc<Deidentifier>`) across threads.
#[derive(Debug, Clone)]
pub struct Deidentifier {
    config: DeidConfig,
    registry: RecognizerRegistry,
    model_name: Option<String>,
}

impl Deidentifier {
    /// Compiles the built-in patterns and installs the configured model.
    pub fn new(config: DeidConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;

        let mut registry = RecognizerRegistry::new();
        for recognizer in builtin::default_recognizers(&config)? {
            registry.register(Arc::new(recognizer));
        }

        let mut pipeline = Self {
            config,
            registry,
            model_name: None,
        };
        if pipeline.config.model.kind == ModelKind::Heuristic {
            pipeline = pipeline.with_model(Arc::new(HeuristicModel::new()?));
        }

        info!(
            recognizers = pipeline.registry.len(),
            model = pipeline.model_name.as_deref().unwrap_or("none"),
            failure_policy = ?pipeline.config.failure_policy,
            "deidentifier ready"
        );
        pipeline.log_coverage();
        Ok(pipeline)
    }

    /// Installs `model` as the entity model, replacing any previous one.
    pub fn with_model(mut self, model: Arc<dyn EntityModel>) -> Self {
        if let Some(old) = self.model_name.take() {
            self.registry.remove(&old);
        }
        let adapter = ModelRecognizer::new(model, &self.config.model);
        self.model_name = Some(adapter.name().to_string());
        self.registry.register(Arc::new(adapter));
        self
    }

    /// Removes the entity model; only pattern recognizers remain.
    pub fn without_model(mut self) -> Self {
        if let Some(old) = self.model_name.take() {
            self.registry.remove(&old);
        }
        self
    }

    /// Registers an extra recognizer (replaces one with the same name).
    pub fn with_recognizer(mut self, recognizer: Arc<dyn Recognizer>) -> Self {
        self.registry.register(recognizer);
        self
    }

    pub fn config(&self) -> &DeidConfig {
        &self.config
    }

    pub fn registry(&self) -> &RecognizerRegistry {
        &self.registry
    }

    /// Safe Harbor coverage given the registered recognizers.
    pub fn coverage(&self) -> Vec<CoverageEntry> {
        coverage_report(&self.registry.covered_labels())
    }

    fn log_coverage(&self) {
        for entry in self.coverage() {
            match &entry.coverage {
                Coverage::Unsupported(reason) => {
                    warn!(
                        identifier = ?entry.identifier,
                        reason = reason.as_str(),
                        "identifier category not supported"
                    )
                }
                Coverage::Labels(_) if entry.is_inactive() => {
                    warn!(
                        identifier = ?entry.identifier,
                        "no recognizer covers identifier category"
                    )
                }
                Coverage::Labels(_) => {}
            }
        }
    }

    /// Masks every detected identifier in `text`.
    pub fn deidentify(&self, text: &str) -> Result<Deidentified> {
        self.run(text, &mut |_| {})
    }

    /// Like [`deidentify`](Self::deidentify), sending the decision trace on
    /// `tx`. The last event is always `Done` or `Error`.
    pub fn deidentify_streaming(&self, text: &str, tx: mpsc::Sender<PipelineEvent>) {
        let outcome = self.run(text, &mut |event| {
            let _ = tx.send(event);
        });
        let last = match outcome {
            Ok(result) => PipelineEvent::Done { result },
            Err(err) => PipelineEvent::Error {
                kind: err.kind().to_string(),
                message: err.to_string(),
            },
        };
        let _ = tx.send(last);
    }

    /// De-identifies `texts` in parallel, one result per text, in input order.
    pub fn deidentify_batch<S>(&self, texts: &[S]) -> Vec<Result<Deidentified>>
    where
        S: AsRef<str> + Sync,
    {
        texts.par_iter().map(|t| self.deidentify(t.as_ref())).collect()
    }

    fn run(&self, text: &str, emit: &mut dyn FnMut(PipelineEvent)) -> Result<Deidentified> {
        let start = Instant::now();
        if text.is_empty() {
            return Err(DeidError::InvalidInput { reason: "empty text" });
        }

        // === Step 1: candidates from every recognizer ===
        let aggregated = aggregate::collect(&self.registry, text, self.config.score_threshold)?;
        for failure in &aggregated.failures {
            emit(PipelineEvent::RecognizerFailed {
                recognizer: failure.recognizer.clone(),
                kind: failure.kind.clone(),
            });
        }
        emit(PipelineEvent::CandidatesCollected {
            total: aggregated.candidates.len(),
            below_threshold: aggregated.below_threshold,
            recognizers: self.registry.len(),
        });

        // === Step 2: overlap resolution ===
        let resolution = resolver::resolve(aggregated.candidates, text.len())?;
        for span in &resolution.accepted {
            emit(PipelineEvent::SpanAccepted {
                label: span.label,
                start: span.start,
                end: span.end,
                confidence: span.confidence,
                source: span.source.clone(),
            });
        }
        for rejection in &resolution.rejected {
            let c = &rejection.candidate;
            emit(PipelineEvent::SpanRejected {
                label: c.label,
                start: c.start,
                end: c.end,
                confidence: c.confidence,
                source: c.source.clone(),
                blocked_by: rejection.blocked_by.label,
                blocked_by_source: rejection.blocked_by.source.clone(),
            });
        }

        // === Step 3: masking ===
        let (masked_text, entities) = masking::mask(text, &resolution.accepted)?;
        let result = Deidentified {
            masked_text,
            entities,
            failures: aggregated.failures,
            processing_ms: start.elapsed().as_millis() as u64,
        };

        debug!(
            entities = result.entities.len(),
            rejected = resolution.rejected.len(),
            failures = result.failures.len(),
            processing_ms = result.processing_ms,
            "text deidentified"
        );

        let first_failure = result.failures.first().map(|f| {
            let source = f
                .error
                .clone()
                .unwrap_or_else(|| RecognizerError::Model(f.kind.clone()));
            (f.recognizer.clone(), source)
        });
        match (self.config.failure_policy, first_failure) {
            (FailurePolicy::FailClosed, Some((recognizer, source))) => {
                Err(DeidError::ExternalRecognizer {
                    recognizer,
                    source,
                    partial: Box::new(result),
                })
            }
            _ => Ok(result),
        }
    }
}
