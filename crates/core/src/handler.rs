//! Business rules for submitted test result bundles.

use crate::{BundleError, BundleResult};
use fhir::{Bundle, Meta, Patient, UuidIdentifier};
use std::collections::HashSet;

/// Validate a submitted test result bundle and rebuild it for the response.
///
/// Rules, checked in order:
/// 1. the bundle must not already carry an identifier
/// 2. its direct entries must reference exactly one distinct patient (by identifier)
///
/// On success the returned bundle has a freshly generated UUID identifier, `meta.lastUpdated`
/// set to now, and the submitted bundle type and entries. Nothing is returned on failure.
///
/// # Errors
///
/// Returns the [`BundleError`] for the first rule that fails.
pub fn handle_request(bundle: Bundle) -> BundleResult<Bundle> {
    if bundle.identifier.is_some() {
        return Err(BundleError::IdentifierNotAllowed);
    }

    let distinct_patients = bundle
        .find_resources::<Patient>()
        .into_iter()
        .map(|patient| &patient.identifier)
        .collect::<HashSet<_>>()
        .len();

    match distinct_patients {
        0 => return Err(BundleError::MissingPatient),
        1 => {}
        _ => return Err(BundleError::MultiplePatients),
    }

    Ok(Bundle {
        meta: Some(Meta::with_last_updated(None)),
        bundle_type: bundle.bundle_type,
        identifier: Some(UuidIdentifier::generate()),
        entries: bundle.entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fhir::{BundleType, CanonicalUuid, Entry, PatientIdentifier};

    fn patient_entry(full_url: &str, nhs_number: &str) -> Entry {
        Entry::new(
            full_url,
            Patient::new(PatientIdentifier::from_nhs_number(nhs_number)),
        )
    }

    #[test]
    fn rebuilds_valid_bundle() {
        let bundle = Bundle::new(
            BundleType::Transaction,
            Some(vec![patient_entry("patient", "nhs_number")]),
        );

        let before = Utc::now();
        let result = handle_request(bundle.clone()).expect("should accept bundle");
        let after = Utc::now();

        assert_eq!(result.bundle_type, bundle.bundle_type);
        assert_eq!(result.entries, bundle.entries);

        let identifier = result.identifier.expect("identifier is generated");
        assert_eq!(identifier.system(), "https://tools.ietf.org/html/rfc4122");
        let uuid = CanonicalUuid::parse(identifier.value()).expect("canonical uuid");
        assert_eq!(uuid.version(), 4);

        let meta = result.meta.expect("meta is set");
        let last_updated = meta.last_updated.expect("last_updated is set");
        assert!(before <= last_updated && last_updated <= after);
        assert!(meta.version_id.is_none());
    }

    #[test]
    fn generates_a_new_identifier_per_request() {
        let bundle = Bundle::new(
            BundleType::Document,
            Some(vec![patient_entry("patient", "nhs_number")]),
        );

        let first = handle_request(bundle.clone()).expect("first");
        let second = handle_request(bundle).expect("second");

        assert_ne!(first.identifier, second.identifier);
    }

    #[test]
    fn rejects_bundle_with_identifier() {
        let mut bundle = Bundle::new(
            BundleType::Transaction,
            Some(vec![patient_entry("patient", "nhs_number")]),
        );
        bundle.identifier = Some(UuidIdentifier::generate());

        // Same input, same answer: no state carries over between calls.
        for _ in 0..2 {
            let err = handle_request(bundle.clone()).expect_err("should reject identifier");
            assert_eq!(err, BundleError::IdentifierNotAllowed);
            assert_eq!(err.to_string(), "Bundle with identifier is not allowed.");
        }
    }

    #[test]
    fn identifier_rule_is_checked_before_patients() {
        let mut bundle = Bundle::empty(BundleType::Transaction);
        bundle.identifier = Some(UuidIdentifier::generate());

        assert_eq!(
            handle_request(bundle),
            Err(BundleError::IdentifierNotAllowed)
        );
    }

    #[test]
    fn rejects_bundle_without_patients() {
        let cases = [
            Bundle::empty(BundleType::Transaction),
            Bundle::new(BundleType::Transaction, Some(vec![])),
        ];

        for bundle in cases {
            let err = handle_request(bundle).expect_err("should reject");
            assert_eq!(
                err.to_string(),
                "Test Result Bundle must reference at least one Patient resource."
            );
        }
    }

    #[test]
    fn rejects_bundle_with_multiple_patients() {
        let bundle = Bundle::new(
            BundleType::Transaction,
            Some(vec![
                patient_entry("patient1", "nhs_number1"),
                patient_entry("patient2", "nhs_number2"),
            ]),
        );

        let err = handle_request(bundle).expect_err("should reject");
        assert_eq!(
            err.to_string(),
            "Test Result Bundle must not reference more than one Patient resource."
        );
    }

    #[test]
    fn accepts_repeated_references_to_the_same_patient() {
        let bundle = Bundle::new(
            BundleType::Transaction,
            Some(vec![
                patient_entry("patient1", "nhs_number"),
                patient_entry("patient2", "nhs_number"),
            ]),
        );

        let result = handle_request(bundle.clone()).expect("should accept");
        assert_eq!(result.entries, bundle.entries);
    }

    #[test]
    fn ignores_patients_in_nested_bundles() {
        let nested = Bundle::new(
            BundleType::Transaction,
            Some(vec![patient_entry("patient", "nhs_number")]),
        );
        let bundle = Bundle::new(
            BundleType::Document,
            Some(vec![Entry::new("nested", nested)]),
        );

        assert_eq!(handle_request(bundle), Err(BundleError::MissingPatient));
    }
}
