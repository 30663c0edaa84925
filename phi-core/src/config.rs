//! # Configuration
//!
//! Every number that decides who wins an overlap lives here, so it can be
//! audited and tuned without touching code. All fields have defaults; a JSON
//! document only needs to name what it changes:
//!
//! ```json
//! {
//!   "failure_policy": "allow_partial",
//!   "overrides": { "LICENSE_PLATE": { "score": 0.4 } },
//!   "disabled": ["US_ZIP"],
//!   "device_id": { "min_len": 8 },
//!   "model": { "kind": "none" }
//! }
//! ```
//!
//! ## Default weights
//!
//! Structured identifiers with checksums or reserved ranges (SSN, ITIN, MRN)
//! get the highest confidence and priority. Loose shapes (ZIP, plates) get the
//! lowest, so that anything more specific claiming the same text wins. The
//! statistical model gets priority 10: it only wins ties against nothing.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::label::EntityLabel;

/// What to do when a recognizer fails on an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Return `Err(ExternalRecognizer)`; the partial result rides along in the error.
    #[default]
    FailClosed,
    /// Return `Ok` with the failures listed in `Deidentified::failures`.
    AllowPartial,
}

/// Replaces the default score and/or priority of one label's recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WeightOverride {
    /// Applied to every pattern of the recognizer
    pub score: Option<f64>,
    pub priority: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthPlanConfig {
    /// Issuer prefixes, matched literally and case-sensitively
    pub prefixes: Vec<String>,
    /// Minimum number of alphanumeric chars after the prefix
    pub min_len: usize,
}

impl Default for HealthPlanConfig {
    fn default() -> Self {
        Self {
            prefixes: vec!["BCBS".into(), "HPN-".into(), "UHC".into()],
            min_len: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceIdConfig {
    pub prefixes: Vec<String>,
    /// Minimum number of identifier chars after the prefix
    pub min_len: usize,
}

impl Default for DeviceIdConfig {
    fn default() -> Self {
        Self {
            prefixes: vec!["SN:".into(), "S/N:".into(), "DeviceID:".into(), "UDI:".into()],
            min_len: 6,
        }
    }
}

/// Which statistical recognizer to install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Built-in gazetteer/rule model ([`crate::model::HeuristicModel`])
    #[default]
    Heuristic,
    /// No model: PERSON/LOCATION/DATE_TIME/ORGANIZATION are not detected
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub kind: ModelKind,
    /// Priority stamped on every model candidate
    pub priority: u8,
    /// Model entities below this confidence are dropped by the adapter
    pub min_confidence: f64,
    /// Native model label → canonical label. Unlisted native labels are dropped.
    pub label_map: BTreeMap<String, EntityLabel>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        let label_map = [
            ("PERSON", EntityLabel::Person),
            ("PER", EntityLabel::Person),
            ("LOCATION", EntityLabel::Location),
            ("LOC", EntityLabel::Location),
            ("GPE", EntityLabel::Location),
            ("FAC", EntityLabel::Location),
            ("ORGANIZATION", EntityLabel::Organization),
            ("ORG", EntityLabel::Organization),
            ("DATE", EntityLabel::DateTime),
            ("TIME", EntityLabel::DateTime),
            ("DATE_TIME", EntityLabel::DateTime),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            kind: ModelKind::default(),
            priority: 10,
            min_confidence: 0.0,
            label_map,
        }
    }
}

/// Full pipeline configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeidConfig {
    pub failure_policy: FailurePolicy,
    /// Candidates scoring below this are dropped before conflict resolution
    pub score_threshold: f64,
    /// Labels whose pattern recognizers are not registered
    pub disabled: Vec<EntityLabel>,
    pub overrides: BTreeMap<EntityLabel, WeightOverride>,
    pub health_plan: HealthPlanConfig,
    pub device_id: DeviceIdConfig,
    pub model: ModelConfig,
}

impl DeidConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: DeidConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn is_enabled(&self, label: EntityLabel) -> bool {
        !self.disabled.contains(&label)
    }

    /// Rejects values that would make candidates malformed or patterns empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);

        if !in_unit(self.score_threshold) {
            return Err(ConfigError::Invalid(format!(
                "score_threshold {} is outside [0, 1]",
                self.score_threshold
            )));
        }
        if !in_unit(self.model.min_confidence) {
            return Err(ConfigError::Invalid(format!(
                "model.min_confidence {} is outside [0, 1]",
                self.model.min_confidence
            )));
        }
        for (label, o) in &self.overrides {
            if let Some(score) = o.score {
                if !in_unit(score) {
                    return Err(ConfigError::Invalid(format!(
                        "override score {score} for {label} is outside [0, 1]"
                    )));
                }
            }
        }
        if self.health_plan.min_len == 0 || self.device_id.min_len == 0 {
            return Err(ConfigError::Invalid("identifier min_len must be at least 1".into()));
        }
        if self.health_plan.prefixes.iter().any(|p| p.is_empty())
            || self.device_id.prefixes.iter().any(|p| p.is_empty())
        {
            return Err(ConfigError::Invalid("identifier prefixes must be non-empty".into()));
        }
        Ok(())
    }
}
