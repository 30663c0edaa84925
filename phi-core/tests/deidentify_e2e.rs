use std::sync::Arc;

use phi_core::model::{FailingModel, StaticModel};
use phi_core::{DeidConfig, Deidentifier, EntityLabel, NativeEntity, RecognizerError};

const SENTENCE: &str = "Patient John Doe's MRN is MRN-98453 and SSN is 123-45-6789.";

fn patterns_only() -> Deidentifier {
    Deidentifier::new(DeidConfig::default()).unwrap().without_model()
}

fn with_entities(entities: Vec<NativeEntity>) -> Deidentifier {
    patterns_only().with_model(Arc::new(StaticModel::new("ner", entities)))
}

fn labels(result: &phi_core::Deidentified) -> Vec<EntityLabel> {
    result.entities.iter().map(|e| e.label).collect()
}

#[test]
fn masks_patient_sentence() {
    let pipeline = with_entities(vec![NativeEntity::new("PERSON", 8, 16, 0.85)]);
    let result = pipeline.deidentify(SENTENCE).unwrap();

    assert_eq!(result.masked_text, "Patient <PERSON>'s MRN is <MRN> and SSN is <SSN>.");
    assert_eq!(
        labels(&result),
        vec![
            EntityLabel::Person,
            EntityLabel::MedicalRecordNumber,
            EntityLabel::UsSsn
        ]
    );
    let ranges: Vec<_> = result.entities.iter().map(|e| e.range()).collect();
    assert_eq!(ranges, vec![8..16, 26..35, 47..58]);
}

#[test]
fn built_in_model_masks_patient_sentence() {
    let pipeline = Deidentifier::new(DeidConfig::default()).unwrap();
    let result = pipeline.deidentify(SENTENCE).unwrap();
    assert_eq!(result.masked_text, "Patient <PERSON>'s MRN is <MRN> and SSN is <SSN>.");
}

#[test]
fn structured_identifier_beats_model_on_same_span() {
    let text = "Member is 123-45-6789 today";
    let pipeline = with_entities(vec![NativeEntity::new("PER", 10, 21, 0.6)]);
    let result = pipeline.deidentify(text).unwrap();
    assert_eq!(result.masked_text, "Member is <SSN> today");
    assert_eq!(labels(&result), vec![EntityLabel::UsSsn]);
    assert_eq!(result.entities[0].range(), 10..21);
}

#[test]
fn reserved_ssn_area_is_not_an_ssn() {
    let result = patterns_only().deidentify("SSN 000-12-3456 on file").unwrap();
    assert!(!labels(&result).contains(&EntityLabel::UsSsn));
    assert_eq!(result.masked_text, "SSN 000-12-3456 on file");
}

#[test]
fn mrn_requires_exactly_five_digits() {
    let result = patterns_only().deidentify("Chart MRN-984531 reviewed").unwrap();
    assert!(!labels(&result).contains(&EntityLabel::MedicalRecordNumber));

    let result = patterns_only().deidentify("Chart MRN-98453 reviewed").unwrap();
    assert_eq!(result.masked_text, "Chart <MRN> reviewed");
}

#[test]
fn masking_is_idempotent() {
    let pipeline = Deidentifier::new(DeidConfig::default()).unwrap();
    let note = "Dr. Okafor saw Jane Roe on 03/14/2024 at Mayo Clinic. \
                Call (555) 123-4567 or email jroe@example.com. \
                Plan BCBS123456789, device SN:ABC-12345, plate 8ABC123.";
    let first = pipeline.deidentify(note).unwrap();
    let second = pipeline.deidentify(&first.masked_text).unwrap();
    assert_eq!(first.masked_text, second.masked_text);
    assert!(second.entities.is_empty());
}

#[test]
fn report_offsets_refer_to_original_text() {
    // "Jo" grows into <PERSON>, the VIN shrinks into <VIN>
    let text = "Dr. Jo at 90210 with 1GKS1EK01E1234567.";
    let pipeline = Deidentifier::new(DeidConfig::default()).unwrap();
    let result = pipeline.deidentify(text).unwrap();

    assert_eq!(result.masked_text, "Dr. <PERSON> at <ZIP> with <VIN>.");
    let originals: Vec<&str> = result.entities.iter().map(|e| &text[e.range()]).collect();
    assert_eq!(originals, vec!["Jo", "90210", "1GKS1EK01E1234567"]);
}

#[test]
fn original_service_samples() {
    let pipeline = patterns_only();
    let cases = [
        ("Serial number is SN:ABC-12345.", "Serial number is <DEVICE>."),
        ("Found VIN 987ABC654DEF321XY.", "Found VIN <VIN>."),
        ("Her plate is ABC-123.", "Her plate is <LICENSE_PLATE>."),
        ("Member ID is BCBS123456789.", "Member ID is <HPN>."),
        ("ITIN: 942-80-1234.", "ITIN: <ITIN>."),
        ("Email me at patient@example.com.", "Email me at <EMAIL_ADDRESS>."),
        ("Their IP was 192.168.1.1.", "Their IP was <IP_ADDRESS>."),
        ("Call (555) 123-4567 for info.", "Call <PHONE> for info."),
        ("Referred to http://example.com for info.", "Referred to <URL> for info."),
        ("Ship to 90211.", "Ship to <ZIP>."),
    ];
    for (input, expected) in cases {
        assert_eq!(pipeline.deidentify(input).unwrap().masked_text, expected, "{input}");
    }
}

#[test]
fn disabled_label_is_left_in_clear() {
    let config =
        DeidConfig::from_json_str(r#"{"disabled": ["US_ZIP"], "model": {"kind": "none"}}"#)
            .unwrap();
    let pipeline = Deidentifier::new(config).unwrap();
    let result = pipeline.deidentify("Ship to 90211.").unwrap();
    assert_eq!(result.masked_text, "Ship to 90211.");
}

#[test]
fn model_failure_fails_closed_by_default() {
    let pipeline =
        patterns_only().with_model(Arc::new(FailingModel::new("ner", RecognizerError::Timeout)));
    let err = pipeline.deidentify(SENTENCE).unwrap_err();
    assert_eq!(err.kind(), "external_recognizer");
    let partial = err.partial().unwrap();
    assert!(partial.is_partial());
    assert_eq!(partial.failures[0].recognizer, "model:ner");
}

#[test]
fn batch_matches_sequential() {
    let pipeline = Deidentifier::new(DeidConfig::default()).unwrap();
    let texts = vec![SENTENCE.to_string(), "Ship to 90211.".to_string(), "nothing".to_string()];
    let batch = pipeline.deidentify_batch(&texts);
    assert_eq!(batch.len(), texts.len());
    for (text, result) in texts.iter().zip(batch) {
        let parallel = result.unwrap();
        let sequential = pipeline.deidentify(text).unwrap();
        assert_eq!(parallel.masked_text, sequential.masked_text);
        assert_eq!(parallel.entities, sequential.entities);
    }
}

#[test]
fn card_followed_by_expiry_is_masked() {
    let result = patterns_only().deidentify("card 4111 1111 1111 1111 12/25 on file").unwrap();
    assert_eq!(result.masked_text, "card <ACCOUNT> 12/25 on file");
    assert_eq!(result.entities[0].range(), 5..24);
}

#[test]
fn phone_after_short_number_is_masked() {
    let result = patterns_only().deidentify("age 41 555-123-4567 ask").unwrap();
    assert_eq!(result.masked_text, "age 41 <PHONE> ask");
    assert_eq!(labels(&result), vec![EntityLabel::PhoneNumber]);
}

#[test]
fn phone_without_separators_is_masked() {
    let pipeline = patterns_only();
    assert_eq!(
        pipeline.deidentify("Call 5551234567 tomorrow").unwrap().masked_text,
        "Call <PHONE> tomorrow"
    );
    assert_eq!(
        pipeline.deidentify("Call +15551234567 now").unwrap().masked_text,
        "Call <PHONE> now"
    );
    // a bare nine-digit number still reads as an SSN
    assert_eq!(pipeline.deidentify("id 123456789").unwrap().masked_text, "id <SSN>");
}

#[test]
fn model_named_like_a_pattern_recognizer_keeps_it() {
    let pipeline = patterns_only().with_model(Arc::new(StaticModel::new("ssn", vec![])));
    let result = pipeline.deidentify("SSN 123-45-6789").unwrap();
    assert_eq!(result.masked_text, "SSN <SSN>");
}
