//! # phi-core — PHI/PII De-identification by Semantic Masking
//!
//! This crate finds personally identifying and protected health information in
//! free text and replaces each occurrence with a tag naming *what* was
//! removed, so the text stays readable for downstream analytics:
//!
//! ```text
//! "Patient John Doe's MRN is MRN-98453 and SSN is 123-45-6789."
//!   ▼
//! "Patient <PERSON>'s MRN is <MRN> and SSN is <SSN>."
//! ```
//!
//! ## System Architecture
//!
//! 1.  **Input**: raw text (`&str`).
//! 2.  **Recognizers** ([`recognizer`], [`model`]): pattern recognizers for
//!     structured identifiers (SSN, MRN, ZIP, VIN, ...) and an entity model
//!     for names, places, organizations and dates. Each proposes [`Candidate`]s.
//! 3.  **Aggregation** ([`aggregate`]): candidates are checked and collected;
//!     a failing recognizer is isolated and reported.
//! 4.  **Conflict resolution** ([`resolver`]): overlapping candidates are
//!     settled by confidence, priority and length.
//! 5.  **Masking** ([`masking`]): one left-to-right pass writes the tags.
//! 6.  **Output**: [`Deidentified`], the masked text plus a report of label and
//!     original offsets per entity (never the value).
//!
//! ## Usage Example
//!
//! ```rust
//! use phi_core::{DeidConfig, Deidentifier};
//!
//! let pipeline = Deidentifier::new(DeidConfig::default()).unwrap();
//! let result = pipeline
//!     .deidentify("Patient John Doe's MRN is MRN-98453 and SSN is 123-45-6789.")
//!     .unwrap();
//!
//! assert_eq!(result.masked_text, "Patient <PERSON>'s MRN is <MRN> and SSN is <SSN>.");
//! for entity in &result.entities {
//!     println!("{} at {}..{} ({:.2})", entity.label, entity.start, entity.end, entity.score);
//! }
//! ```
//!
//! ## Main Modules
//!
//! - [`pipeline`]: orchestrator, streaming decision trace and batch mode.
//! - [`config`]: weights, failure policy and model settings.
//! - [`hipaa`]: Safe Harbor category coverage.
//! - [`offset`]: byte ↔ char offset conversion.

pub mod aggregate;
pub mod candidate;
pub mod config;
pub mod error;
pub mod hipaa;
pub mod label;
pub mod masking;
pub mod model;
pub mod offset;
pub mod pipeline;
pub mod recognizer;
pub mod resolver;
pub mod tokenizer;

pub use candidate::{Candidate, EntityReportEntry, ResolvedSpan};
pub use config::{DeidConfig, FailurePolicy};
pub use error::{ConfigError, DeidError, RecognizerError};
pub use label::EntityLabel;
pub use model::{EntityModel, NativeEntity};
pub use pipeline::{Deidentified, Deidentifier, PipelineEvent};
pub use recognizer::{Recognizer, RecognizerRegistry};
