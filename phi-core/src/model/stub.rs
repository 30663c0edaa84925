//! Fixed-output models, for wiring tests and for deployments that feed
//! entities from an upstream annotator.

use crate::error::RecognizerError;
use crate::model::{EntityModel, NativeEntity};

/// Returns the same entities for every text.
#[derive(Debug, Clone)]
pub struct StaticModel {
    name: String,
    entities: Vec<NativeEntity>,
}

impl StaticModel {
    pub fn new(name: impl Into<String>, entities: Vec<NativeEntity>) -> Self {
        Self {
            name: name.into(),
            entities,
        }
    }
}

impl EntityModel for StaticModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn detect(&self, _text: &str) -> Result<Vec<NativeEntity>, RecognizerError> {
        Ok(self.entities.clone())
    }
}

/// Always fails with the given error.
#[derive(Debug, Clone)]
pub struct FailingModel {
    name: String,
    error: RecognizerError,
}

impl FailingModel {
    pub fn new(name: impl Into<String>, error: RecognizerError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }
}

impl EntityModel for FailingModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn detect(&self, _text: &str) -> Result<Vec<NativeEntity>, RecognizerError> {
        Err(self.error.clone())
    }
}
