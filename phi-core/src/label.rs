//! # Entity Labels and Mask Tags
//!
//! Closed vocabulary of everything the pipeline can redact. Each label maps to
//! exactly one **mask tag**, the literal placeholder written into the output.
//!
//! | Label                        | Tag               | Typical source  |
//! |------------------------------|-------------------|-----------------|
//! | `PERSON`                     | `<PERSON>`        | model           |
//! | `LOCATION`                   | `<LOCATION>`      | model           |
//! | `DATE_TIME`                  | `<DATE>`          | model           |
//! | `ORGANIZATION`               | `<ORGANIZATION>`  | model           |
//! | `US_SSN`                     | `<SSN>`           | pattern         |
//! | `US_PASSPORT`                | `<PASSPORT>`      | pattern         |
//! | `MEDICAL_RECORD_NUMBER`      | `<MRN>`           | pattern         |
//! | `US_ZIP`                     | `<ZIP>`           | pattern         |
//! | `VEHICLE_ID`                 | `<VIN>`           | pattern         |
//! | `LICENSE_PLATE`              | `<LICENSE_PLATE>` | pattern         |
//! | `HEALTH_PLAN_ID`             | `<HPN>`           | pattern         |
//! | `DEVICE_ID`                  | `<DEVICE>`        | pattern         |
//! | `US_ITIN`                    | `<ITIN>`          | pattern         |
//! | `EMAIL_ADDRESS`              | `<EMAIL_ADDRESS>` | pattern         |
//! | `PHONE_NUMBER`               | `<PHONE>`         | pattern         |
//! | `URL`                        | `<URL>`           | pattern         |
//! | `IP_ADDRESS`                 | `<IP_ADDRESS>`    | pattern         |
//! | `ACCOUNT_NUMBER`             | `<ACCOUNT>`       | pattern         |
//! | `CERTIFICATE_LICENSE_NUMBER` | `<LICENSE>`       | pattern         |
//!
//! The tag table is part of the output contract: downstream consumers match on
//! these strings, so they never change once published.

use serde::{Deserialize, Serialize};

/// Entity labels the pipeline can emit.
///
/// The declaration order is also the final tie-break key of the conflict
/// resolver, so new variants go at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityLabel {
    Person,
    Location,
    DateTime,
    Organization,
    UsSsn,
    UsPassport,
    MedicalRecordNumber,
    UsZip,
    VehicleId,
    LicensePlate,
    HealthPlanId,
    DeviceId,
    UsItin,
    EmailAddress,
    PhoneNumber,
    Url,
    IpAddress,
    AccountNumber,
    CertificateLicenseNumber,
}

impl EntityLabel {
    /// Number of labels in the vocabulary
    pub const COUNT: usize = 19;

    /// Every label, in declaration order
    pub fn all() -> [EntityLabel; Self::COUNT] {
        use EntityLabel::*;
        [
            Person,
            Location,
            DateTime,
            Organization,
            UsSsn,
            UsPassport,
            MedicalRecordNumber,
            UsZip,
            VehicleId,
            LicensePlate,
            HealthPlanId,
            DeviceId,
            UsItin,
            EmailAddress,
            PhoneNumber,
            Url,
            IpAddress,
            AccountNumber,
            CertificateLicenseNumber,
        ]
    }

    /// Canonical name (e.g. `"US_SSN"`), identical to the serde form
    pub fn name(&self) -> &'static str {
        match self {
            EntityLabel::Person => "PERSON",
            EntityLabel::Location => "LOCATION",
            EntityLabel::DateTime => "DATE_TIME",
            EntityLabel::Organization => "ORGANIZATION",
            EntityLabel::UsSsn => "US_SSN",
            EntityLabel::UsPassport => "US_PASSPORT",
            EntityLabel::MedicalRecordNumber => "MEDICAL_RECORD_NUMBER",
            EntityLabel::UsZip => "US_ZIP",
            EntityLabel::VehicleId => "VEHICLE_ID",
            EntityLabel::LicensePlate => "LICENSE_PLATE",
            EntityLabel::HealthPlanId => "HEALTH_PLAN_ID",
            EntityLabel::DeviceId => "DEVICE_ID",
            EntityLabel::UsItin => "US_ITIN",
            EntityLabel::EmailAddress => "EMAIL_ADDRESS",
            EntityLabel::PhoneNumber => "PHONE_NUMBER",
            EntityLabel::Url => "URL",
            EntityLabel::IpAddress => "IP_ADDRESS",
            EntityLabel::AccountNumber => "ACCOUNT_NUMBER",
            EntityLabel::CertificateLicenseNumber => "CERTIFICATE_LICENSE_NUMBER",
        }
    }

    /// The mask tag written in place of a span with this label.
    pub fn mask_tag(&self) -> &'static str {
        match self {
            EntityLabel::Person => "<PERSON>",
            EntityLabel::Location => "<LOCATION>",
            EntityLabel::DateTime => "<DATE>",
            EntityLabel::Organization => "<ORGANIZATION>",
            EntityLabel::UsSsn => "<SSN>",
            EntityLabel::UsPassport => "<PASSPORT>",
            EntityLabel::MedicalRecordNumber => "<MRN>",
            EntityLabel::UsZip => "<ZIP>",
            EntityLabel::VehicleId => "<VIN>",
            EntityLabel::LicensePlate => "<LICENSE_PLATE>",
            EntityLabel::HealthPlanId => "<HPN>",
            EntityLabel::DeviceId => "<DEVICE>",
            EntityLabel::UsItin => "<ITIN>",
            EntityLabel::EmailAddress => "<EMAIL_ADDRESS>",
            EntityLabel::PhoneNumber => "<PHONE>",
            EntityLabel::Url => "<URL>",
            EntityLabel::IpAddress => "<IP_ADDRESS>",
            EntityLabel::AccountNumber => "<ACCOUNT>",
            EntityLabel::CertificateLicenseNumber => "<LICENSE>",
        }
    }

    /// Parses the canonical name (e.g. `"MEDICAL_RECORD_NUMBER"`)
    pub fn from_name(s: &str) -> Option<Self> {
        Self::all().into_iter().find(|label| label.name() == s)
    }

    /// Labels produced by the statistical model rather than by patterns.
    pub fn is_model_label(&self) -> bool {
        matches!(
            self,
            EntityLabel::Person
                | EntityLabel::Location
                | EntityLabel::DateTime
                | EntityLabel::Organization
        )
    }
}

impl std::fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Row of the published tag vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagEntry {
    pub label: EntityLabel,
    pub tag: String,
}

/// The full label → tag vocabulary, in declaration order.
pub fn tag_vocabulary() -> Vec<TagEntry> {
    EntityLabel::all()
        .into_iter()
        .map(|label| TagEntry {
            label,
            tag: label.mask_tag().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_label_has_a_distinct_tag() {
        let tags: HashSet<&str> = EntityLabel::all().iter().map(|l| l.mask_tag()).collect();
        assert_eq!(tags.len(), EntityLabel::COUNT);
        for tag in tags {
            assert!(tag.starts_with('<') && tag.ends_with('>'));
        }
    }

    #[test]
    fn test_name_roundtrip() {
        for label in EntityLabel::all() {
            assert_eq!(EntityLabel::from_name(label.name()), Some(label));
        }
        assert_eq!(EntityLabel::from_name("CREDIT_CARD"), None);
    }

    #[test]
    fn test_serde_uses_canonical_names() {
        let json = serde_json::to_string(&EntityLabel::MedicalRecordNumber).unwrap();
        assert_eq!(json, "\"MEDICAL_RECORD_NUMBER\"");
        let back: EntityLabel = serde_json::from_str("\"US_SSN\"").unwrap();
        assert_eq!(back, EntityLabel::UsSsn);
    }

    #[test]
    fn test_published_tags() {
        assert_eq!(EntityLabel::UsSsn.mask_tag(), "<SSN>");
        assert_eq!(EntityLabel::MedicalRecordNumber.mask_tag(), "<MRN>");
        assert_eq!(EntityLabel::DateTime.mask_tag(), "<DATE>");
        assert_eq!(EntityLabel::EmailAddress.mask_tag(), "<EMAIL_ADDRESS>");
    }
}
