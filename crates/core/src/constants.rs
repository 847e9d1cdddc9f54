//! Constants used throughout the pathology core crate.
//!
//! Response bodies and header values are part of the API contract, so they live here rather
//! than inline at each call site.

/// Content type of FHIR JSON responses (and of every 400 response).
pub const FHIR_JSON_CONTENT_TYPE: &str = "application/fhir+json";

/// Content type of the status probe and of unexpected failures.
pub const TEXT_PLAIN_CONTENT_TYPE: &str = "text/plain";

/// Name of the content type header.
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";

/// Body returned when the request carries no payload.
pub const NO_PAYLOAD_MESSAGE: &str = "No payload provided.";

/// Body returned for malformed or structurally invalid payloads.
pub const INVALID_PAYLOAD_MESSAGE: &str = "Invalid payload provided.";

/// Prefix of the body returned when a bundle breaks a business rule.
pub const PROCESSING_ERROR_PREFIX: &str = "Error processing provided bundle. Error: ";

/// Body returned for failures the caller cannot act on.
pub const UNEXPECTED_ERROR_MESSAGE: &str =
    "Sorry, something went wrong while processing the request.";

/// Body returned for routes that do not exist.
pub const NOT_FOUND_MESSAGE: &str = "Not found.";

/// Body of the status probe.
pub const STATUS_OK_MESSAGE: &str = "OK";
