//! # HIPAA Safe Harbor Coverage
//!
//! The Safe Harbor method (45 CFR §164.514(b)(2)) lists 18 identifier
//! categories. This module maps each one to the labels that cover it, and
//! flags the ones a text pipeline cannot handle so they are never silently
//! assumed to be masked.

use serde::{Deserialize, Serialize};

use crate::label::EntityLabel;

/// The 18 Safe Harbor identifier categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HipaaIdentifier {
    Names,
    GeographicSubdivisions,
    Dates,
    TelephoneNumbers,
    FaxNumbers,
    EmailAddresses,
    SocialSecurityNumbers,
    MedicalRecordNumbers,
    HealthPlanBeneficiaryNumbers,
    AccountNumbers,
    CertificateLicenseNumbers,
    VehicleIdentifiers,
    DeviceIdentifiers,
    WebUrls,
    IpAddresses,
    BiometricIdentifiers,
    FullFacePhotographs,
    OtherUniqueIdentifiers,
}

/// How a category is handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Coverage {
    /// Masked when any of these labels is detected
    Labels(Vec<EntityLabel>),
    /// Out of reach for this pipeline
    Unsupported(String),
}

impl HipaaIdentifier {
    pub fn all() -> [HipaaIdentifier; 18] {
        use HipaaIdentifier::*;
        [
            Names,
            GeographicSubdivisions,
            Dates,
            TelephoneNumbers,
            FaxNumbers,
            EmailAddresses,
            SocialSecurityNumbers,
            MedicalRecordNumbers,
            HealthPlanBeneficiaryNumbers,
            AccountNumbers,
            CertificateLicenseNumbers,
            VehicleIdentifiers,
            DeviceIdentifiers,
            WebUrls,
            IpAddresses,
            BiometricIdentifiers,
            FullFacePhotographs,
            OtherUniqueIdentifiers,
        ]
    }

    pub fn coverage(&self) -> Coverage {
        use EntityLabel as L;
        let labels = |l: &[EntityLabel]| Coverage::Labels(l.to_vec());
        match self {
            HipaaIdentifier::Names => labels(&[L::Person]),
            HipaaIdentifier::GeographicSubdivisions => labels(&[L::Location, L::UsZip]),
            HipaaIdentifier::Dates => labels(&[L::DateTime]),
            HipaaIdentifier::TelephoneNumbers | HipaaIdentifier::FaxNumbers => {
                labels(&[L::PhoneNumber])
            }
            HipaaIdentifier::EmailAddresses => labels(&[L::EmailAddress]),
            HipaaIdentifier::SocialSecurityNumbers => labels(&[L::UsSsn, L::UsItin]),
            HipaaIdentifier::MedicalRecordNumbers => labels(&[L::MedicalRecordNumber]),
            HipaaIdentifier::HealthPlanBeneficiaryNumbers => labels(&[L::HealthPlanId]),
            HipaaIdentifier::AccountNumbers => labels(&[L::AccountNumber]),
            HipaaIdentifier::CertificateLicenseNumbers => {
                labels(&[L::CertificateLicenseNumber, L::UsPassport])
            }
            HipaaIdentifier::VehicleIdentifiers => labels(&[L::VehicleId, L::LicensePlate]),
            HipaaIdentifier::DeviceIdentifiers => labels(&[L::DeviceId]),
            HipaaIdentifier::WebUrls => labels(&[L::Url]),
            HipaaIdentifier::IpAddresses => labels(&[L::IpAddress]),
            HipaaIdentifier::BiometricIdentifiers => {
                Coverage::Unsupported("biometric data is not text".into())
            }
            HipaaIdentifier::FullFacePhotographs => {
                Coverage::Unsupported("images are not processed".into())
            }
            HipaaIdentifier::OtherUniqueIdentifiers => Coverage::Unsupported(
                "no general detector; register a recognizer per code format".into(),
            ),
        }
    }
}

/// Coverage of one category by a configured pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageEntry {
    pub identifier: HipaaIdentifier,
    pub coverage: Coverage,
    /// Labels of `coverage` some registered recognizer can emit
    pub active: Vec<EntityLabel>,
}

impl CoverageEntry {
    /// Supported, but no registered recognizer emits any covering label
    pub fn is_inactive(&self) -> bool {
        matches!(self.coverage, Coverage::Labels(_)) && self.active.is_empty()
    }
}

/// Coverage report for a pipeline able to emit `covered` labels.
pub fn coverage_report(covered: &[EntityLabel]) -> Vec<CoverageEntry> {
    HipaaIdentifier::all()
        .into_iter()
        .map(|identifier| {
            let coverage = identifier.coverage();
            let active = match &coverage {
                Coverage::Labels(labels) => labels
                    .iter()
                    .copied()
                    .filter(|l| covered.contains(l))
                    .collect(),
                Coverage::Unsupported(_) => vec![],
            };
            CoverageEntry {
                identifier,
                coverage,
                active,
            }
        })
        .collect()
}
