//! FHIR R4 Bundle resource.
//!
//! See <https://hl7.org/fhir/R4/bundle.html>. Only the fields this service reads or writes are
//! modelled; unknown fields on inbound payloads are ignored.
//!
//! Notes:
//! - `entry[].resource` is polymorphic and dispatched through the [`ResourceRegistry`] in use,
//!   so bundles may nest other bundles.
//! - [`Bundle::find_resources`] only looks at the bundle's *direct* entries.

use crate::elements::{Meta, UuidIdentifier};
use crate::resource::{Resource, ResourceVariant};
use crate::validation::{FieldPath, Object, Validator};
use crate::{FhirError, FhirResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Purpose of a bundle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleType {
    /// A document, with a Composition as its first entry.
    Document,
    /// A set of actions to be processed as a single transaction.
    Transaction,
}

/// A collection of resources.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bundle {
    pub meta: Option<Meta>,
    pub bundle_type: BundleType,
    pub identifier: Option<UuidIdentifier>,
    pub entries: Option<Vec<Entry>>,
}

/// A bundle's container for one resource.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Entry {
    #[serde(rename = "fullUrl")]
    pub full_url: String,

    pub resource: Resource,
}

impl Entry {
    pub fn new(full_url: impl Into<String>, resource: impl Into<Resource>) -> Self {
        Self {
            full_url: full_url.into(),
            resource: resource.into(),
        }
    }

    fn from_value(value: &Value, path: &FieldPath, validator: &mut Validator<'_>) -> Option<Self> {
        let object = validator.object(value, path)?;

        let full_url = validator.required::<String>(object, "fullUrl", path);
        let resource = validator.required_resource(object, "resource", path);

        Some(Self {
            full_url: full_url?,
            resource: resource?,
        })
    }
}

impl Bundle {
    /// Create a bundle with the given entries and no identifier or meta.
    pub fn new(bundle_type: BundleType, entries: Option<Vec<Entry>>) -> Self {
        Self {
            meta: None,
            bundle_type,
            identifier: None,
            entries,
        }
    }

    /// Create a bundle with no entries at all.
    pub fn empty(bundle_type: BundleType) -> Self {
        Self::new(bundle_type, None)
    }

    /// The resources of variant `T` among this bundle's direct entries, in entry order.
    ///
    /// Nested bundles are not searched and duplicates are kept. Returns an empty list if the
    /// bundle has no entries.
    pub fn find_resources<T: ResourceVariant>(&self) -> Vec<&T> {
        self.entries
            .iter()
            .flatten()
            .filter_map(|entry| T::from_resource(&entry.resource))
            .collect()
    }

    /// Render as JSON text, omitting absent fields.
    pub fn to_json(&self) -> FhirResult<String> {
        serde_json::to_string(self).map_err(FhirError::Serialization)
    }
}

impl ResourceVariant for Bundle {
    const RESOURCE_TYPE: &'static str = "Bundle";

    fn from_object(
        object: &Object,
        path: &FieldPath,
        validator: &mut Validator<'_>,
    ) -> Option<Self> {
        validator.expect_resource_type(object, Self::RESOURCE_TYPE, path);

        let meta = validator.optional::<Meta>(object, "meta", path);
        let bundle_type = validator.required::<BundleType>(object, "type", path);
        let identifier = validator.optional::<UuidIdentifier>(object, "identifier", path);
        let entries = validator.optional_list(object, "entry", path, |validator, value, path| {
            Entry::from_value(value, path, validator)
        });

        Some(Self {
            meta: meta?,
            bundle_type: bundle_type?,
            identifier: identifier?,
            entries: entries?,
        })
    }

    fn from_resource(resource: &Resource) -> Option<&Self> {
        match resource {
            Resource::Bundle(bundle) => Some(bundle),
            _ => None,
        }
    }
}

impl From<Bundle> for Resource {
    fn from(bundle: Bundle) -> Self {
        Resource::Bundle(bundle)
    }
}

/// Wire view of a bundle for serialisation.
#[derive(Serialize)]
struct BundleWire<'a> {
    #[serde(rename = "resourceType")]
    resource_type: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<&'a Meta>,

    #[serde(rename = "type")]
    bundle_type: BundleType,

    #[serde(skip_serializing_if = "Option::is_none")]
    identifier: Option<&'a UuidIdentifier>,

    #[serde(rename = "entry", skip_serializing_if = "Option::is_none")]
    entries: Option<&'a [Entry]>,
}

impl Serialize for Bundle {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        BundleWire {
            resource_type: Self::RESOURCE_TYPE,
            meta: self.meta.as_ref(),
            bundle_type: self.bundle_type,
            identifier: self.identifier.as_ref(),
            entries: self.entries.as_deref(),
        }
        .serialize(serializer)
    }
}
