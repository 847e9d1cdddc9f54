//! The polymorphic resource envelope and the resource type registry.
//!
//! A payload that should represent *some* resource is read in two steps:
//! 1. its `resourceType` discriminator is looked up in a [`ResourceRegistry`]
//! 2. the matching [`ResourceDescriptor`] validates the whole payload against that variant's schema
//!
//! The registry is built once at startup (see [`ResourceRegistry::r4`]) and passed by reference
//! afterwards; it is never mutated while requests are being served. Registering the same
//! discriminator twice is rejected when the registry is built.

use crate::bundle::Bundle;
use crate::elements::Meta;
use crate::patient::Patient;
use crate::validation::{FieldPath, Object, Validator};
use crate::{FhirError, FhirResult};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

// ============================================================================
// Resource envelope
// ============================================================================

/// Any resource this service understands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resource {
    Bundle(Bundle),
    Patient(Patient),
}

impl Resource {
    /// Read a resource of any registered type from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if:
    /// - `resourceType` is absent, null or empty ([`FhirError::MissingResourceType`]),
    /// - `resourceType` is not registered ([`FhirError::UnknownResourceType`]),
    /// - the payload does not match the variant's schema ([`FhirError::Validation`], listing
    ///   every issue).
    pub fn from_value(value: &Value, registry: &ResourceRegistry) -> FhirResult<Self> {
        let mut validator = Validator::new(registry);
        let root = FieldPath::root();
        let Some(object) = validator.object(value, &root) else {
            return validator.finish(None);
        };

        let resource_type = discriminator(object)?;
        let descriptor = registry
            .lookup(resource_type)
            .ok_or_else(|| FhirError::UnknownResourceType(resource_type.to_owned()))?;

        let parsed = descriptor.parse(object, &root, &mut validator);
        validator.finish(parsed)
    }

    /// Read a resource of any registered type from JSON text.
    pub fn from_json(text: &str, registry: &ResourceRegistry) -> FhirResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value, registry)
    }

    /// The `resourceType` discriminator of this resource.
    pub fn resource_type(&self) -> &'static str {
        match self {
            Resource::Bundle(_) => Bundle::RESOURCE_TYPE,
            Resource::Patient(_) => Patient::RESOURCE_TYPE,
        }
    }

    pub fn meta(&self) -> Option<&Meta> {
        match self {
            Resource::Bundle(bundle) => bundle.meta.as_ref(),
            Resource::Patient(patient) => patient.meta.as_ref(),
        }
    }

    /// Borrow this resource as variant `T`, if it is one.
    pub fn as_variant<T: ResourceVariant>(&self) -> Option<&T> {
        T::from_resource(self)
    }

    /// Render as JSON text, omitting absent fields.
    pub fn to_json(&self) -> FhirResult<String> {
        serde_json::to_string(self).map_err(FhirError::Serialization)
    }
}

impl Serialize for Resource {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // Each variant writes its own resourceType.
        match self {
            Resource::Bundle(bundle) => bundle.serialize(serializer),
            Resource::Patient(patient) => patient.serialize(serializer),
        }
    }
}

/// Read the `resourceType` discriminator of a payload.
pub(crate) fn discriminator(object: &Object) -> FhirResult<&str> {
    match object.get("resourceType") {
        None | Some(Value::Null) => Err(FhirError::MissingResourceType),
        Some(Value::String(resource_type)) if resource_type.is_empty() => {
            Err(FhirError::MissingResourceType)
        }
        Some(Value::String(resource_type)) => Ok(resource_type),
        Some(other) => Err(FhirError::UnknownResourceType(other.to_string())),
    }
}

// ============================================================================
// Variants
// ============================================================================

/// A concrete resource type that can be registered and dispatched to.
pub trait ResourceVariant: Sized + Into<Resource> {
    /// The discriminator this variant is registered under.
    const RESOURCE_TYPE: &'static str;

    /// Validate `object` against this variant's schema.
    ///
    /// Returns `None` if the variant could not be built; the reason is reported to `validator`.
    fn from_object(
        object: &Object,
        path: &FieldPath,
        validator: &mut Validator<'_>,
    ) -> Option<Self>;

    /// Borrow `resource` as this variant, if it is one.
    fn from_resource(resource: &Resource) -> Option<&Self>;

    /// Read this variant directly from a JSON value.
    ///
    /// A present `resourceType` must equal [`Self::RESOURCE_TYPE`]; an absent one defaults to it.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::Validation`] listing every structural issue, including a different
    /// `resourceType`.
    fn from_value(value: &Value, registry: &ResourceRegistry) -> FhirResult<Self> {
        let mut validator = Validator::new(registry);
        let root = FieldPath::root();
        let Some(object) = validator.object(value, &root) else {
            return validator.finish(None);
        };

        let parsed = Self::from_object(object, &root, &mut validator);
        validator.finish(parsed)
    }

    /// Read this variant directly from JSON text.
    fn from_json(text: &str, registry: &ResourceRegistry) -> FhirResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value, registry)
    }
}

// ============================================================================
// Registry
// ============================================================================

type ParseFn = fn(&Object, &FieldPath, &mut Validator<'_>) -> Option<Resource>;

/// How to read one registered resource type.
#[derive(Clone, Copy)]
pub struct ResourceDescriptor {
    resource_type: &'static str,
    parse: ParseFn,
}

impl ResourceDescriptor {
    /// Describe variant `T`.
    pub fn of<T: ResourceVariant>() -> Self {
        fn parse_variant<T: ResourceVariant>(
            object: &Object,
            path: &FieldPath,
            validator: &mut Validator<'_>,
        ) -> Option<Resource> {
            T::from_object(object, path, validator).map(Into::into)
        }

        Self {
            resource_type: T::RESOURCE_TYPE,
            parse: parse_variant::<T>,
        }
    }

    pub fn resource_type(&self) -> &'static str {
        self.resource_type
    }

    /// Validate `object` against this descriptor's schema.
    pub fn parse(
        &self,
        object: &Object,
        path: &FieldPath,
        validator: &mut Validator<'_>,
    ) -> Option<Resource> {
        (self.parse)(object, path, validator)
    }
}

impl std::fmt::Debug for ResourceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceDescriptor")
            .field("resource_type", &self.resource_type)
            .finish_non_exhaustive()
    }
}

/// Immutable mapping from `resourceType` to [`ResourceDescriptor`].
#[derive(Clone, Debug)]
pub struct ResourceRegistry {
    descriptors: HashMap<&'static str, ResourceDescriptor>,
}

impl ResourceRegistry {
    pub fn builder() -> ResourceRegistryBuilder {
        ResourceRegistryBuilder::default()
    }

    /// The registry of every resource type this service accepts (`Bundle` and `Patient`).
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::DuplicateResourceType`] if two variants share a discriminator.
    pub fn r4() -> FhirResult<Self> {
        Ok(Self::builder()
            .register::<Bundle>()?
            .register::<Patient>()?
            .build())
    }

    pub fn lookup(&self, resource_type: &str) -> Option<&ResourceDescriptor> {
        self.descriptors.get(resource_type)
    }

    /// Registered discriminators, sorted.
    pub fn resource_types(&self) -> Vec<&'static str> {
        let mut types: Vec<_> = self.descriptors.keys().copied().collect();
        types.sort_unstable();
        types
    }
}

/// Collects descriptors before the registry is frozen.
#[derive(Debug, Default)]
pub struct ResourceRegistryBuilder {
    descriptors: HashMap<&'static str, ResourceDescriptor>,
}

impl ResourceRegistryBuilder {
    /// Register variant `T` under its discriminator.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::DuplicateResourceType`] if the discriminator is already registered.
    pub fn register<T: ResourceVariant>(self) -> FhirResult<Self> {
        self.register_descriptor(ResourceDescriptor::of::<T>())
    }

    pub fn register_descriptor(mut self, descriptor: ResourceDescriptor) -> FhirResult<Self> {
        if self.descriptors.contains_key(descriptor.resource_type) {
            return Err(FhirError::DuplicateResourceType(
                descriptor.resource_type.to_owned(),
            ));
        }

        self.descriptors.insert(descriptor.resource_type, descriptor);
        Ok(self)
    }

    pub fn build(self) -> ResourceRegistry {
        ResourceRegistry {
            descriptors: self.descriptors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patient::PatientIdentifier;
    use serde_json::json;

    fn registry() -> ResourceRegistry {
        ResourceRegistry::r4().expect("standard registry")
    }

    #[test]
    fn standard_registry_contains_bundle_and_patient() {
        let registry = registry();

        assert_eq!(registry.resource_types(), vec!["Bundle", "Patient"]);
        assert!(registry.lookup("Bundle").is_some());
        assert!(registry.lookup("Observation").is_none());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let err = ResourceRegistry::builder()
            .register::<Patient>()
            .expect("first registration")
            .register::<Patient>()
            .expect_err("duplicate should be rejected");

        match err {
            FhirError::DuplicateResourceType(resource_type) => assert_eq!(resource_type, "Patient"),
            other => panic!("expected DuplicateResourceType error, got {other:?}"),
        }
    }

    #[test]
    fn dispatches_patient_payload() {
        let value = json!({
            "resourceType": "Patient",
            "identifier": {
                "system": "https://fhir.nhs.uk/Id/nhs-number",
                "value": "123",
            },
        });

        let resource = Resource::from_value(&value, &registry()).expect("should parse patient");
        let patient = resource.as_variant::<Patient>().expect("should be a Patient");

        assert_eq!(resource.resource_type(), "Patient");
        assert_eq!(patient.identifier.value(), "123");
        assert_eq!(patient.identifier.system(), "https://fhir.nhs.uk/Id/nhs-number");
        assert!(resource.as_variant::<Bundle>().is_none());
    }

    #[test]
    fn dispatches_bundle_payload() {
        let value = json!({ "resourceType": "Bundle", "type": "document" });

        let resource = Resource::from_value(&value, &registry()).expect("should parse bundle");
        assert!(matches!(resource, Resource::Bundle(_)));
    }

    #[test]
    fn unknown_resource_type_is_named() {
        let err = Resource::from_json(r#"{"resourceType": "Unknown"}"#, &registry())
            .expect_err("should reject unknown type");

        match &err {
            FhirError::UnknownResourceType(resource_type) => assert_eq!(resource_type, "Unknown"),
            other => panic!("expected UnknownResourceType error, got {other:?}"),
        }
        assert_eq!(err.to_string(), "Unknown resource type: Unknown");
    }

    #[test]
    fn missing_resource_type_is_rejected() {
        for value in [
            json!({}),
            json!({ "resourceType": null }),
            json!({ "resourceType": "" }),
        ] {
            let err = Resource::from_value(&value, &registry()).expect_err("should reject");
            assert_eq!(
                err.to_string(),
                "resourceType is required for Resource validation."
            );
        }
    }

    #[test]
    fn non_object_payload_is_a_validation_error() {
        let err = Resource::from_value(&json!([1, 2, 3]), &registry()).expect_err("should reject");
        match err {
            FhirError::Validation(errors) => assert!(errors.has_issue_at("<root>")),
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = Resource::from_json("invalid json", &registry()).expect_err("should reject");
        assert!(matches!(err, FhirError::InvalidJson(_)));
    }

    #[test]
    fn structural_issues_are_all_reported() {
        let value = json!({
            "resourceType": "Bundle",
            "type": "collection",
            "identifier": { "system": "wrong-system", "value": "x" },
            "entry": [
                { "resource": { "resourceType": "Patient" } },
            ],
        });

        let err = Resource::from_value(&value, &registry()).expect_err("should reject");
        match err {
            FhirError::Validation(errors) => {
                assert!(errors.has_issue_at("type"));
                assert!(errors.has_issue_at("identifier"));
                assert!(errors.has_issue_at("entry[0].fullUrl"));
                assert!(errors.has_issue_at("entry[0].resource.identifier"));
                assert_eq!(errors.len(), 4);
            }
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn variant_rejects_mismatched_resource_type() {
        let value = json!({
            "resourceType": "Bundle",
            "identifier": {
                "system": "https://fhir.nhs.uk/Id/nhs-number",
                "value": "123",
            },
        });

        let err = Patient::from_value(&value, &registry()).expect_err("should reject");
        match err {
            FhirError::Validation(errors) => {
                assert_eq!(errors.len(), 1);
                let issue = &errors.issues()[0];
                assert_eq!(issue.path.to_string(), "resourceType");
                assert_eq!(
                    issue.message,
                    "Resource type mismatch: received 'Bundle', expected 'Patient'."
                );
            }
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn variant_mismatch_is_reported_with_other_issues() {
        let err = Patient::from_value(&json!({ "resourceType": "Bundle" }), &registry())
            .expect_err("should reject");

        match err {
            FhirError::Validation(errors) => {
                assert!(errors.has_issue_at("resourceType"));
                assert!(errors.has_issue_at("identifier"));
                assert_eq!(errors.len(), 2);
            }
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn variant_defaults_absent_resource_type() {
        let value = json!({
            "identifier": {
                "system": "https://fhir.nhs.uk/Id/nhs-number",
                "value": "123",
            },
        });

        let patient = Patient::from_value(&value, &registry()).expect("should parse");
        assert_eq!(patient.identifier, PatientIdentifier::from_nhs_number("123"));
    }

    #[test]
    fn meta_is_read_from_any_variant() {
        let meta = Meta {
            version_id: Some("2".into()),
            last_updated: None,
        };
        let mut patient = Patient::new(PatientIdentifier::from_nhs_number("123"));
        patient.meta = Some(meta.clone());
        let mut bundle = Bundle::empty(crate::bundle::BundleType::Document);
        bundle.meta = Some(meta.clone());

        assert_eq!(Resource::from(patient).meta(), Some(&meta));
        assert_eq!(Resource::from(bundle).meta(), Some(&meta));
        assert!(Resource::from(Bundle::empty(crate::bundle::BundleType::Transaction))
            .meta()
            .is_none());
    }

    #[test]
    fn serialises_with_resource_type() {
        let resource = Resource::Patient(Patient::new(PatientIdentifier::from_nhs_number("123")));

        let json: Value =
            serde_json::from_str(&resource.to_json().expect("serialise")).expect("valid json");
        assert_eq!(
            json,
            json!({
                "resourceType": "Patient",
                "identifier": {
                    "system": "https://fhir.nhs.uk/Id/nhs-number",
                    "value": "123",
                },
            })
        );
    }
}
