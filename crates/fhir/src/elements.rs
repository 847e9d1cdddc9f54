//! FHIR R4 elements shared between resources.
//!
//! Responsibilities:
//! - `Meta` (see <https://hl7.org/fhir/R4/datatypes.html#Meta>)
//! - `Identifier` (see <https://hl7.org/fhir/R4/datatypes.html#Identifier>), specialised per
//!   namespace so an identifier can only exist with the system its type expects
//!
//! Notes:
//! - Identifiers are immutable once constructed; the system is carried by the type, not stored.

use crate::{FhirError, FhirResult};
use chrono::{DateTime, Utc};
use pathology_uuid::CanonicalUuid;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

// ============================================================================
// Meta
// ============================================================================

/// Resource metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    /// Version of the resource, as assigned by the server that stores it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,

    /// When the resource last changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Meta {
    /// Create a `Meta` stamped with `last_updated`, or with the current UTC time when `None`.
    ///
    /// `version_id` is left unset.
    pub fn with_last_updated(last_updated: Option<DateTime<Utc>>) -> Self {
        Self {
            version_id: None,
            last_updated: Some(last_updated.unwrap_or_else(Utc::now)),
        }
    }
}

// ============================================================================
// Identifier
// ============================================================================

/// The namespace an [`Identifier`] belongs to.
///
/// Implemented by zero-sized marker types; each marker fixes the expected `system` URI.
pub trait IdentifierSystem {
    /// The system URI every identifier of this kind must carry.
    const SYSTEM: &'static str;
}

/// Marker for identifiers in the RFC 4122 UUID namespace.
///
/// Received values are not checked for UUID syntax; only identifiers issued by this service are
/// guaranteed to hold a canonical UUID.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rfc4122;

impl IdentifierSystem for Rfc4122 {
    const SYSTEM: &'static str = "https://tools.ietf.org/html/rfc4122";
}

/// An identifier (`system` + `value`) whose system is fixed by `S`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Identifier<S> {
    value: String,
    system: PhantomData<S>,
}

/// An identifier in the RFC 4122 UUID namespace.
pub type UuidIdentifier = Identifier<Rfc4122>;

impl<S: IdentifierSystem> Identifier<S> {
    /// Create an identifier with the given value in `S`'s namespace.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            system: PhantomData,
        }
    }

    /// Create an identifier from a received `system` and `value` pair.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::IdentifierSystemMismatch`] if `system` is not `S::SYSTEM`.
    pub fn from_parts(system: &str, value: impl Into<String>) -> FhirResult<Self> {
        if system != S::SYSTEM {
            return Err(FhirError::IdentifierSystemMismatch {
                received: system.to_owned(),
                expected: S::SYSTEM,
            });
        }

        Ok(Self::new(value))
    }

    /// The namespace URI.
    pub fn system(&self) -> &'static str {
        S::SYSTEM
    }

    /// The value, unique within [`Self::system`].
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl Identifier<Rfc4122> {
    /// Generate a fresh identifier backed by a random (version 4) UUID.
    pub fn generate() -> Self {
        Self::from_uuid(CanonicalUuid::new())
    }

    /// Create an identifier for a known UUID.
    pub fn from_uuid(uuid: CanonicalUuid) -> Self {
        Self::new(uuid.to_string())
    }
}

impl<S: IdentifierSystem> fmt::Display for Identifier<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", S::SYSTEM, self.value)
    }
}

/// Wire representation shared by every identifier kind.
#[derive(Serialize, Deserialize)]
struct IdentifierWire<'a> {
    system: std::borrow::Cow<'a, str>,
    value: std::borrow::Cow<'a, str>,
}

impl<S: IdentifierSystem> Serialize for Identifier<S> {
    fn serialize<Ser>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error>
    where
        Ser: serde::Serializer,
    {
        IdentifierWire {
            system: S::SYSTEM.into(),
            value: self.value.as_str().into(),
        }
        .serialize(serializer)
    }
}

impl<'de, S: IdentifierSystem> Deserialize<'de> for Identifier<S> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let wire = IdentifierWire::deserialize(deserializer)?;
        Self::from_parts(&wire.system, wire.value.into_owned()).map_err(serde::de::Error::custom)
    }
}
