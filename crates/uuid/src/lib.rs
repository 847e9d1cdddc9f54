//! UUID utilities for resource identifiers.
//!
//! Identifiers issued by the pathology API use the RFC 4122 textual form: **36 characters**,
//! lowercase hexadecimal digits split into `8-4-4-4-12` groups by hyphens.
//!
//! This crate provides a small wrapper type ([`CanonicalUuid`]) that *guarantees* that form once
//! constructed, so the FHIR layer never has to re-check an identifier value it built itself.
//!
//! ## Canonical UUID form
//! - Length: 36
//! - Characters: `0-9`, `a-f` and `-` at offsets 8, 13, 18 and 23
//! - Example: `550e8400-e29b-41d4-a716-446655440000`
//!
//! Notes:
//! - This is the value you would get from `Uuid::new_v4().hyphenated().to_string()`.
//! - Externally supplied identifiers must already be canonical. Use [`CanonicalUuid::parse`] to
//!   validate an input string; uppercase, braced, URN or simple (unhyphenated) forms are rejected.

mod service;

// Re-export public types
pub use service::{CanonicalUuid, Uuid};

/// Error type for UUID operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for UUID operations.
pub type UuidResult<T> = Result<T, UuidError>;
