//! The boundary contract shared by every adapter.
//!
//! Adapters hand [`BundleService`] the raw request payload (or its absence) and get back an
//! [`ApiResponse`]; this is the only place where errors are mapped to status codes and bodies.

use crate::constants::{
    CONTENT_TYPE_HEADER, FHIR_JSON_CONTENT_TYPE, INVALID_PAYLOAD_MESSAGE, NOT_FOUND_MESSAGE,
    NO_PAYLOAD_MESSAGE, PROCESSING_ERROR_PREFIX, STATUS_OK_MESSAGE, TEXT_PLAIN_CONTENT_TYPE,
    UNEXPECTED_ERROR_MESSAGE,
};
use crate::handle_request;
use fhir::{Bundle, FhirError, ResourceRegistry, ResourceVariant};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Transport-neutral response: status code, headers and body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, content_type: &str, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: BTreeMap::from([(CONTENT_TYPE_HEADER.to_owned(), content_type.to_owned())]),
            body: body.into(),
        }
    }

    pub fn bad_request(body: impl Into<String>) -> Self {
        Self::new(400, FHIR_JSON_CONTENT_TYPE, body)
    }

    /// The 400 response for payloads that cannot be read.
    pub fn invalid_payload() -> Self {
        Self::bad_request(INVALID_PAYLOAD_MESSAGE)
    }

    /// The 404 response for routes no adapter serves.
    pub fn not_found() -> Self {
        Self::new(404, TEXT_PLAIN_CONTENT_TYPE, NOT_FOUND_MESSAGE)
    }

    /// The 500 response for failures that must not leak detail to the caller.
    pub fn unexpected_error() -> Self {
        Self::new(500, TEXT_PLAIN_CONTENT_TYPE, UNEXPECTED_ERROR_MESSAGE)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE_HEADER).map(String::as_str)
    }
}

/// Handles bundle submissions and status probes.
///
/// Cheap to clone; the resource registry is shared and read-only.
#[derive(Clone, Debug)]
pub struct BundleService {
    registry: Arc<ResourceRegistry>,
}

impl BundleService {
    pub fn new(registry: Arc<ResourceRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Liveness probe. Performs no validation.
    pub fn status(&self) -> ApiResponse {
        ApiResponse::new(200, TEXT_PLAIN_CONTENT_TYPE, STATUS_OK_MESSAGE)
    }

    /// Validate a submitted test result bundle and return the rebuilt bundle.
    ///
    /// - no payload (absent, blank, or JSON without content) → 400 `No payload provided.`
    /// - malformed JSON or a payload that is not a valid Bundle → 400 `Invalid payload provided.`
    ///   (details are logged, not returned)
    /// - business rule violation → 400 with the rule's message
    /// - success → 200 with the rebuilt bundle as FHIR JSON
    pub fn post_bundle(&self, payload: Option<&str>) -> ApiResponse {
        let Some(payload) = payload.filter(|payload| !payload.trim().is_empty()) else {
            return ApiResponse::bad_request(NO_PAYLOAD_MESSAGE);
        };
        tracing::debug!(bytes = payload.len(), "received bundle payload");

        let value: Value = match serde_json::from_str(payload) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(error = %err, "payload is not valid JSON");
                return ApiResponse::invalid_payload();
            }
        };

        if is_without_content(&value) {
            return ApiResponse::bad_request(NO_PAYLOAD_MESSAGE);
        }

        let bundle = match Bundle::from_value(&value, &self.registry) {
            Ok(bundle) => bundle,
            Err(err) => {
                log_parse_failure(&err);
                return ApiResponse::invalid_payload();
            }
        };

        let response = match handle_request(bundle) {
            Ok(response) => response,
            Err(err) => {
                tracing::info!(error = %err, "rejected bundle");
                return ApiResponse::bad_request(format!("{PROCESSING_ERROR_PREFIX}{err}"));
            }
        };

        match response.to_json() {
            Ok(body) => ApiResponse::new(200, FHIR_JSON_CONTENT_TYPE, body),
            Err(err) => {
                tracing::error!(error = %err, "failed to serialise response bundle");
                ApiResponse::unexpected_error()
            }
        }
    }
}

/// JSON that parsed but carries nothing to process: `null`, `false`, zero or an empty value.
fn is_without_content(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(object) => object.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(text) => text.is_empty(),
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
    }
}

fn log_parse_failure(err: &FhirError) {
    match err {
        FhirError::Validation(errors) => {
            tracing::warn!(issues = errors.len(), "payload failed structural validation");
            for issue in errors.issues() {
                tracing::warn!(path = %issue.path, message = %issue.message, "validation issue");
            }
        }
        other => tracing::warn!(error = %other, "payload could not be read as a Bundle"),
    }
}
