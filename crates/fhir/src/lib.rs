//! FHIR R4 wire/boundary support for the pathology API.
//!
//! This crate provides **resource models** and the **polymorphic envelope** used to read them
//! from JSON payloads:
//! - elements shared between resources (identifiers, meta)
//! - the `Bundle` and `Patient` resources
//! - a registry mapping each `resourceType` discriminator to its schema
//!
//! This crate focuses on:
//! - structural validation that reports every issue with its field path
//! - serialisation with FHIR's camelCase field names, omitting absent values
//! - typed access to concrete resources once dispatch has happened
//!
//! Business rules about *which* bundles are acceptable live in `pathology-core`.

pub mod bundle;
pub mod elements;
pub mod patient;
pub mod resource;
pub mod validation;

// Re-export resource types
pub use bundle::{Bundle, BundleType, Entry};
pub use patient::{NhsNumber, Patient, PatientIdentifier};
pub use resource::{Resource, ResourceDescriptor, ResourceRegistry, ResourceVariant};

// Re-export elements and validation reporting
pub use elements::{Identifier, IdentifierSystem, Meta, Rfc4122, UuidIdentifier};
pub use validation::{FieldPath, ValidationErrors, ValidationIssue, Validator};

// Re-export CanonicalUuid from pathology_uuid crate
pub use pathology_uuid::CanonicalUuid;

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("resourceType is required for Resource validation.")]
    MissingResourceType,

    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    #[error("Resource type mismatch: received '{received}', expected '{expected}'.")]
    ResourceTypeMismatch {
        received: String,
        expected: &'static str,
    },

    #[error("Identifier system '{received}' does not match expected system '{expected}'.")]
    IdentifierSystemMismatch {
        received: String,
        expected: &'static str,
    },

    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("failed to serialise resource: {0}")]
    Serialization(serde_json::Error),

    #[error("resource type '{0}' is already registered")]
    DuplicateResourceType(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;
