//! Structural validation of JSON payloads against resource schemas.
//!
//! A [`Validator`] walks a `serde_json::Value` on behalf of the resource schemas and keeps going
//! after a field fails, so a single pass reports *every* structural issue. Each issue carries the
//! [`FieldPath`] of the offending field, e.g. `entry[0].resource.identifier`.
//!
//! Leaf elements (identifiers, meta, enums) are deserialised with serde; `serde_path_to_error`
//! extends the path into the element when the failure is nested inside it.

use crate::resource::{discriminator, Resource, ResourceRegistry};
use crate::{FhirError, FhirResult};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;

/// JSON object as handed to resource schemas.
pub type Object = Map<String, Value>;

const FIELD_REQUIRED: &str = "Field required";
const EXPECTED_OBJECT: &str = "Input should be a valid dictionary or object";
const EXPECTED_LIST: &str = "Input should be a valid list";

// ============================================================================
// Paths and issues
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Field(String),
    Index(usize),
}

/// Location of a value inside a payload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<Segment>);

impl FieldPath {
    /// The payload itself.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// The named field of the value at this path.
    pub fn field(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Field(name.to_owned()));
        Self(segments)
    }

    /// The `index`th item of the list at this path.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Index(index));
        Self(segments)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Extend this path with the location reported by `serde_path_to_error`.
    fn join(&self, nested: &serde_path_to_error::Path) -> Self {
        use serde_path_to_error::Segment as Nested;

        let mut segments = self.0.clone();
        for segment in nested.iter() {
            match segment {
                Nested::Seq { index } => segments.push(Segment::Index(*index)),
                Nested::Map { key } => segments.push(Segment::Field(key.clone())),
                Nested::Enum { variant } => segments.push(Segment::Field(variant.clone())),
                Nested::Unknown => {}
            }
        }
        Self(segments)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return write!(f, "<root>");
        }

        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Field(name) if i == 0 => write!(f, "{name}")?,
                Segment::Field(name) => write!(f, ".{name}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// One structural problem found in a payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationIssue {
    pub path: FieldPath,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Every structural issue found while validating a payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationErrors {
    issues: Vec<ValidationIssue>,
}

impl ValidationErrors {
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// True if any issue was reported at exactly `path` (rendered form, e.g. `entry[0].fullUrl`).
    #[cfg(test)]
    pub(crate) fn has_issue_at(&self, path: &str) -> bool {
        self.issues.iter().any(|issue| issue.path.to_string() == path)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.issues.len() == 1 { "issue" } else { "issues" };
        write!(f, "{} validation {noun}", self.issues.len())?;
        for issue in &self.issues {
            write!(f, "; {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

// ============================================================================
// Validator
// ============================================================================

/// Collects issues while resource schemas read a payload.
///
/// Schema functions return `None` for a value they could not build and record why with
/// [`Validator::report`]; callers evaluate every field before combining the results so that one
/// failing field never hides another.
pub struct Validator<'r> {
    registry: &'r ResourceRegistry,
    issues: Vec<ValidationIssue>,
}

impl<'r> Validator<'r> {
    pub fn new(registry: &'r ResourceRegistry) -> Self {
        Self {
            registry,
            issues: Vec::new(),
        }
    }

    /// The registry used to dispatch embedded resources.
    pub fn registry(&self) -> &'r ResourceRegistry {
        self.registry
    }

    /// Record an issue at `path`.
    pub fn report(&mut self, path: &FieldPath, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            path: path.clone(),
            message: message.into(),
        });
    }

    /// Turn the outcome of a validation pass into a result.
    ///
    /// Any recorded issue fails the pass, even if a value was built.
    pub fn finish<T>(self, value: Option<T>) -> FhirResult<T> {
        match value {
            Some(value) if self.issues.is_empty() => Ok(value),
            _ => Err(FhirError::Validation(ValidationErrors {
                issues: self.issues,
            })),
        }
    }

    /// View `value` as a JSON object.
    pub fn object<'v>(&mut self, value: &'v Value, path: &FieldPath) -> Option<&'v Object> {
        let object = value.as_object();
        if object.is_none() {
            self.report(path, EXPECTED_OBJECT);
        }
        object
    }

    /// Read a field that must be present and non-null.
    pub fn required<T: DeserializeOwned>(
        &mut self,
        object: &Object,
        key: &str,
        path: &FieldPath,
    ) -> Option<T> {
        let path = path.field(key);
        match object.get(key) {
            None | Some(Value::Null) => {
                self.report(&path, FIELD_REQUIRED);
                None
            }
            Some(value) => self.element(value, &path),
        }
    }

    /// Read a field that may be absent or null.
    ///
    /// Returns `Some(None)` when absent and `None` when present but invalid.
    pub fn optional<T: DeserializeOwned>(
        &mut self,
        object: &Object,
        key: &str,
        path: &FieldPath,
    ) -> Option<Option<T>> {
        match object.get(key) {
            None | Some(Value::Null) => Some(None),
            Some(value) => self.element(value, &path.field(key)).map(Some),
        }
    }

    /// Read an optional list field, validating every item with `item`.
    pub fn optional_list<T>(
        &mut self,
        object: &Object,
        key: &str,
        path: &FieldPath,
        mut item: impl FnMut(&mut Self, &Value, &FieldPath) -> Option<T>,
    ) -> Option<Option<Vec<T>>> {
        let path = path.field(key);
        let values = match object.get(key) {
            None | Some(Value::Null) => return Some(None),
            Some(Value::Array(values)) => values,
            Some(_) => {
                self.report(&path, EXPECTED_LIST);
                return None;
            }
        };

        let mut items = Vec::with_capacity(values.len());
        let mut complete = true;
        for (index, value) in values.iter().enumerate() {
            match item(self, value, &path.index(index)) {
                Some(parsed) => items.push(parsed),
                None => complete = false,
            }
        }

        complete.then_some(Some(items))
    }

    /// Read a field holding an embedded resource of any registered type.
    pub fn required_resource(
        &mut self,
        object: &Object,
        key: &str,
        path: &FieldPath,
    ) -> Option<Resource> {
        let path = path.field(key);
        match object.get(key) {
            None | Some(Value::Null) => {
                self.report(&path, FIELD_REQUIRED);
                None
            }
            Some(value) => self.resource(value, &path),
        }
    }

    /// Dispatch an embedded resource on its `resourceType` and validate it against that schema.
    pub fn resource(&mut self, value: &Value, path: &FieldPath) -> Option<Resource> {
        let object = self.object(value, path)?;

        let resource_type = match discriminator(object) {
            Ok(resource_type) => resource_type,
            Err(err) => {
                self.report(path, err.to_string());
                return None;
            }
        };

        let registry = self.registry;
        let Some(descriptor) = registry.lookup(resource_type) else {
            let err = FhirError::UnknownResourceType(resource_type.to_owned());
            self.report(path, err.to_string());
            return None;
        };

        descriptor.parse(object, path, self)
    }

    /// Check that a present `resourceType` matches the schema being applied.
    ///
    /// An absent `resourceType` is accepted; the schema supplies its own.
    pub fn expect_resource_type(
        &mut self,
        object: &Object,
        expected: &'static str,
        path: &FieldPath,
    ) {
        let received = match object.get("resourceType") {
            None | Some(Value::Null) => return,
            Some(Value::String(received)) if received == expected => return,
            Some(Value::String(received)) => received.clone(),
            Some(other) => other.to_string(),
        };

        let err = FhirError::ResourceTypeMismatch { received, expected };
        self.report(&path.field("resourceType"), err.to_string());
    }

    fn element<T: DeserializeOwned>(&mut self, value: &Value, path: &FieldPath) -> Option<T> {
        match serde_path_to_error::deserialize::<_, T>(value) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                let path = path.join(err.path());
                self.report(&path, err.into_inner().to_string());
                None
            }
        }
    }
}
