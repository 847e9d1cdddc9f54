//! FHIR R4 Patient resource.
//!
//! See <https://hl7.org/fhir/R4/patient.html>. Patients are identified by NHS number; no other
//! demographics are modelled.

use crate::elements::{Identifier, IdentifierSystem, Meta};
use crate::resource::{Resource, ResourceVariant};
use crate::validation::{FieldPath, Object, Validator};
use serde::Serialize;

/// Marker for identifiers in the NHS number namespace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NhsNumber;

impl IdentifierSystem for NhsNumber {
    const SYSTEM: &'static str = "https://fhir.nhs.uk/Id/nhs-number";
}

/// A patient identifier using the NHS number system.
pub type PatientIdentifier = Identifier<NhsNumber>;

impl Identifier<NhsNumber> {
    /// Create a patient identifier from an NHS number.
    pub fn from_nhs_number(nhs_number: impl Into<String>) -> Self {
        Self::new(nhs_number)
    }
}

/// A person receiving care.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Patient {
    pub meta: Option<Meta>,
    pub identifier: PatientIdentifier,
}

impl Patient {
    pub fn new(identifier: PatientIdentifier) -> Self {
        Self {
            meta: None,
            identifier,
        }
    }
}

impl ResourceVariant for Patient {
    const RESOURCE_TYPE: &'static str = "Patient";

    fn from_object(
        object: &Object,
        path: &FieldPath,
        validator: &mut Validator<'_>,
    ) -> Option<Self> {
        validator.expect_resource_type(object, Self::RESOURCE_TYPE, path);

        let meta = validator.optional::<Meta>(object, "meta", path);
        let identifier = validator.required::<PatientIdentifier>(object, "identifier", path);

        Some(Self {
            meta: meta?,
            identifier: identifier?,
        })
    }

    fn from_resource(resource: &Resource) -> Option<&Self> {
        match resource {
            Resource::Patient(patient) => Some(patient),
            _ => None,
        }
    }
}

impl From<Patient> for Resource {
    fn from(patient: Patient) -> Self {
        Resource::Patient(patient)
    }
}

/// Wire view of a patient for serialisation.
#[derive(Serialize)]
struct PatientWire<'a> {
    #[serde(rename = "resourceType")]
    resource_type: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<&'a Meta>,

    identifier: &'a PatientIdentifier,
}

impl Serialize for Patient {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        PatientWire {
            resource_type: Self::RESOURCE_TYPE,
            meta: self.meta.as_ref(),
            identifier: &self.identifier,
        }
        .serialize(serializer)
    }
}
