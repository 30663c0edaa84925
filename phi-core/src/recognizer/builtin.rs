//! # Built-in Pattern Recognizers
//!
//! One factory per structured identifier. Scores and priorities below are the
//! documented defaults; [`crate::config::DeidConfig::overrides`] replaces them
//! per label.
//!
//! | Recognizer        | Label                        | Score(s)    | Priority |
//! |-------------------|------------------------------|-------------|----------|
//! | `ssn`             | `US_SSN`                     | 0.95 / 0.60 | 95       |
//! | `itin`            | `US_ITIN`                    | 0.95        | 95       |
//! | `passport`        | `US_PASSPORT`                | 0.85 / 0.55 | 90       |
//! | `mrn`             | `MEDICAL_RECORD_NUMBER`      | 0.95        | 90       |
//! | `vin`             | `VEHICLE_ID`                 | 0.85        | 85       |
//! | `account`         | `ACCOUNT_NUMBER`             | 0.90 / 0.80 | 80       |
//! | `health_plan`     | `HEALTH_PLAN_ID`             | 0.90        | 80       |
//! | `device_id`       | `DEVICE_ID`                  | 0.80        | 80       |
//! | `license`         | `CERTIFICATE_LICENSE_NUMBER` | 0.85 / 0.65 | 75       |
//! | `email`           | `EMAIL_ADDRESS`              | 0.95        | 70       |
//! | `url`             | `URL`                        | 0.85 / 0.70 | 60       |
//! | `ip_address`      | `IP_ADDRESS`                 | 0.85 / 0.80 | 60       |
//! | `phone`           | `PHONE_NUMBER`               | 0.75 / 0.40 | 50       |
//! | `zip`             | `US_ZIP`                     | 0.70        | 40       |
//! | `license_plate`   | `LICENSE_PLATE`              | 0.60        | 30       |
//!
//! Digit classes are written `[0-9]`: `\d` in `regex` is Unicode-aware and
//! would accept digits no validator below understands.

use tracing::debug;

use crate::config::DeidConfig;
use crate::error::ConfigError;
use crate::label::EntityLabel;
use crate::recognizer::pattern::{Pattern, PatternRecognizer};
use crate::recognizer::validate;

const URL_TRAILING: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}'];

/// Every enabled built-in recognizer, with configuration overrides applied.
pub fn default_recognizers(
    config: &DeidConfig,
) -> Result<Vec<PatternRecognizer>, ConfigError> {
    let all = vec![
        ssn()?,
        itin()?,
        passport()?,
        mrn()?,
        vin()?,
        account()?,
        health_plan(config)?,
        device_id(config)?,
        license()?,
        email()?,
        url()?,
        ip_address()?,
        phone()?,
        zip()?,
        license_plate()?,
    ];

    let enabled = all
        .into_iter()
        .filter(|r| {
            let on = config.is_enabled(r.label());
            if !on {
                debug!(label = %r.label(), "pattern recognizer disabled by config");
            }
            on
        })
        .map(|r| match config.overrides.get(&r.label()) {
            Some(o) => {
                let r = match o.score {
                    Some(score) => r.with_score(score),
                    None => r,
                };
                match o.priority {
                    Some(priority) => r.with_priority(priority),
                    None => r,
                }
            }
            None => r,
        })
        .collect();
    Ok(enabled)
}

pub fn ssn() -> Result<PatternRecognizer, ConfigError> {
    let name = "ssn";
    Ok(PatternRecognizer::new(
        name,
        EntityLabel::UsSsn,
        95,
        vec![
            Pattern::new(name, "ssn_dashed", r"[0-9]{3}-[0-9]{2}-[0-9]{4}", 0.95)?
                .validator(validate::ssn),
            Pattern::new(name, "ssn_bare", r"[0-9]{9}", 0.60)?.validator(validate::ssn),
        ],
    ))
}

pub fn itin() -> Result<PatternRecognizer, ConfigError> {
    let name = "itin";
    Ok(PatternRecognizer::new(
        name,
        EntityLabel::UsItin,
        95,
        vec![Pattern::new(name, "itin_dashed", r"9[0-9]{2}-[0-9]{2}-[0-9]{4}", 0.95)?
            .validator(validate::itin)],
    ))
}

pub fn passport() -> Result<PatternRecognizer, ConfigError> {
    let name = "passport";
    Ok(PatternRecognizer::new(
        name,
        EntityLabel::UsPassport,
        90,
        vec![
            Pattern::new(name, "passport_letter", r"[A-Z][0-9]{8}", 0.85)?,
            Pattern::new(name, "passport_numeric", r"[0-9]{9}", 0.55)?,
        ],
    ))
}

pub fn mrn() -> Result<PatternRecognizer, ConfigError> {
    let name = "mrn";
    Ok(PatternRecognizer::new(
        name,
        EntityLabel::MedicalRecordNumber,
        90,
        vec![Pattern::new(name, "mrn_dash_5", r"MRN-[0-9]{5}", 0.95)?],
    ))
}

pub fn vin() -> Result<PatternRecognizer, ConfigError> {
    let name = "vin";
    Ok(PatternRecognizer::new(
        name,
        EntityLabel::VehicleId,
        85,
        vec![Pattern::new(name, "vin_17", r"[A-HJ-NPR-Z0-9]{17}", 0.85)?
            .validator(validate::has_digit)],
    ))
}

pub fn account() -> Result<PatternRecognizer, ConfigError> {
    let name = "account";
    Ok(PatternRecognizer::new(
        name,
        EntityLabel::AccountNumber,
        80,
        vec![
            Pattern::new(name, "card_grouped", r"[0-9]{4}(?:[- ][0-9]{4}){3}", 0.90)?
                .validator(validate::luhn),
            Pattern::new(name, "card_amex", r"3[47][0-9]{2}[- ][0-9]{6}[- ][0-9]{5}", 0.90)?
                .validator(validate::luhn),
            Pattern::new(name, "card_compact", r"[0-9]{13,19}", 0.90)?.validator(validate::luhn),
            Pattern::new(
                name,
                "labelled_account",
                r"(?i:acct|account)(?:\s*(?i:no\.?|number|#))?\s*[:#]?\s*([0-9]{6,17})",
                0.80,
            )?
            .group(1),
        ],
    ))
}

pub fn health_plan(config: &DeidConfig) -> Result<PatternRecognizer, ConfigError> {
    let name = "health_plan";
    let prefixes = alternation(&config.health_plan.prefixes);
    let regex = format!(r"(?:{prefixes})[A-Z0-9]{{{},}}", config.health_plan.min_len);
    Ok(PatternRecognizer::new(
        name,
        EntityLabel::HealthPlanId,
        80,
        vec![Pattern::new(name, "prefixed_member_id", &regex, 0.90)?
            .validator(validate::has_digit)],
    ))
}

pub fn device_id(config: &DeidConfig) -> Result<PatternRecognizer, ConfigError> {
    let name = "device_id";
    let prefixes = alternation(&config.device_id.prefixes);
    let rest = config.device_id.min_len.saturating_sub(1);
    let regex = format!(r"(?:{prefixes}) ?[A-Z0-9][A-Z0-9-]{{{rest},}}");
    Ok(PatternRecognizer::new(
        name,
        EntityLabel::DeviceId,
        80,
        vec![Pattern::new(name, "prefixed_serial", &regex, 0.80)?.trim_end(&['-'])],
    ))
}

pub fn license() -> Result<PatternRecognizer, ConfigError> {
    let name = "license";
    Ok(PatternRecognizer::new(
        name,
        EntityLabel::CertificateLicenseNumber,
        75,
        vec![
            Pattern::new(name, "dea_registration", r"[A-Z]{2}[0-9]{7}", 0.85)?
                .validator(validate::dea),
            Pattern::new(name, "driver_license", r"[A-Z][0-9]{7}", 0.65)?,
        ],
    ))
}

pub fn email() -> Result<PatternRecognizer, ConfigError> {
    let name = "email";
    Ok(PatternRecognizer::new(
        name,
        EntityLabel::EmailAddress,
        70,
        vec![Pattern::new(
            name,
            "email",
            r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(?:\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}",
            0.95,
        )?],
    ))
}

pub fn url() -> Result<PatternRecognizer, ConfigError> {
    let name = "url";
    Ok(PatternRecognizer::new(
        name,
        EntityLabel::Url,
        60,
        vec![
            Pattern::new(name, "scheme_url", r#"https?://[^\s<>"']+"#, 0.85)?
                .trim_end(URL_TRAILING),
            Pattern::new(
                name,
                "www_url",
                r#"www\.[A-Za-z0-9\-]+(?:\.[A-Za-z0-9\-]+)+(?:/[^\s<>"']*)?"#,
                0.70,
            )?
            .trim_end(URL_TRAILING),
        ],
    ))
}

pub fn ip_address() -> Result<PatternRecognizer, ConfigError> {
    let name = "ip_address";
    Ok(PatternRecognizer::new(
        name,
        EntityLabel::IpAddress,
        60,
        vec![
            Pattern::new(name, "ipv4", r"[0-9]{1,3}(?:\.[0-9]{1,3}){3}", 0.85)?
                .validator(validate::ipv4),
            Pattern::new(name, "ipv6", r"[0-9A-Fa-f]{1,4}(?::[0-9A-Fa-f]{0,4}){2,7}", 0.80)?
                .validator(validate::ipv6),
        ],
    ))
}

pub fn phone() -> Result<PatternRecognizer, ConfigError> {
    let name = "phone";
    Ok(PatternRecognizer::new(
        name,
        EntityLabel::PhoneNumber,
        50,
        vec![
            Pattern::new(
                name,
                "nanp",
                r"(?:\+?1[-. ]?)?(?:\([0-9]{3}\) ?|[0-9]{3}[-. ])[0-9]{3}[-. ][0-9]{4}",
                0.75,
            )?
            .forbid_after(&['-']),
            // below the bare SSN and passport scores, so a 9-digit reading wins
            Pattern::new(name, "nanp_compact", r"(?:\+?1)?[2-9][0-9]{9}", 0.40)?
                .forbid_before(&['+'])
                .forbid_after(&['-']),
        ],
    ))
}

pub fn zip() -> Result<PatternRecognizer, ConfigError> {
    let name = "zip";
    Ok(PatternRecognizer::new(
        name,
        EntityLabel::UsZip,
        40,
        vec![Pattern::new(name, "zip5_plus4", r"[0-9]{5}(?:-[0-9]{4})?", 0.70)?
            .forbid_before(&['-'])
            .forbid_after(&['-'])],
    ))
}

pub fn license_plate() -> Result<PatternRecognizer, ConfigError> {
    let name = "license_plate";
    Ok(PatternRecognizer::new(
        name,
        EntityLabel::LicensePlate,
        30,
        vec![
            Pattern::new(name, "plate_dashed", r"[A-Z0-9]{3}-[A-Z0-9]{3,4}", 0.60)?
                .validator(validate::has_letter_and_digit),
            Pattern::new(name, "plate_compact", r"[A-Z0-9]{5,8}", 0.60)?
                .validator(validate::has_letter_and_digit),
        ],
    ))
}

fn alternation(prefixes: &[String]) -> String {
    prefixes
        .iter()
        .map(|p| regex::escape(p))
        .collect::<Vec<_>>()
        .join("|")
}
