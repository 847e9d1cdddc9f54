//! Internal implementation of the canonical UUID wrapper.

use crate::{UuidError, UuidResult};
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use ::uuid::Uuid;

/// Byte offsets of the hyphens in the canonical textual form.
const HYPHEN_OFFSETS: [usize; 4] = [8, 13, 18, 23];

/// A UUID guaranteed to render in canonical RFC 4122 textual form.
///
/// # When to use this type
/// Use this wrapper whenever you are:
/// - Issuing a new identifier for an outbound resource.
/// - Accepting a UUID string from *outside* the service (request payload, CLI input).
///
/// # Construction
/// - [`CanonicalUuid::new`] generates a random (version 4) UUID.
/// - [`CanonicalUuid::parse`] validates an externally supplied value.
///
/// # Display format
/// Always the 36-character lowercase hyphenated form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CanonicalUuid(Uuid);

impl Default for CanonicalUuid {
    fn default() -> Self {
        Self::new()
    }
}

impl CanonicalUuid {
    /// Generates a new random (version 4) UUID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing [`Uuid`]. Any `Uuid` value can be rendered canonically.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Validates and parses a UUID string that must already be in canonical form.
    ///
    /// This does **not** normalise other common UUID forms (uppercase, simple, braced or URN).
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is not in canonical form.
    pub fn parse(input: &str) -> UuidResult<Self> {
        if !Self::is_canonical(input) {
            return Err(UuidError::InvalidInput(format!(
                "UUID must be 36 lowercase hex characters in 8-4-4-4-12 groups, got: '{}'",
                input
            )));
        }

        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| UuidError::InvalidInput(format!("invalid UUID '{input}': {e}")))
    }

    /// Returns the underlying `uuid::Uuid`.
    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Returns the RFC 4122 version number of this UUID (4 for generated values).
    pub fn version(&self) -> usize {
        self.0.get_version_num()
    }

    /// Returns true if `input` is in canonical form.
    ///
    /// Purely syntactic: exactly 36 bytes, hyphens at the group boundaries and lowercase hex
    /// everywhere else.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 36
            && input.bytes().enumerate().all(|(i, b)| {
                if HYPHEN_OFFSETS.contains(&i) {
                    b == b'-'
                } else {
                    matches!(b, b'0'..=b'9' | b'a'..=b'f')
                }
            })
    }
}

impl fmt::Display for CanonicalUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for CanonicalUuid {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CanonicalUuid::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for CanonicalUuid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for CanonicalUuid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        CanonicalUuid::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_generates_canonical_v4_uuid() {
        let uuid = CanonicalUuid::new();
        let canonical = uuid.to_string();

        assert_eq!(canonical.len(), 36);
        assert!(CanonicalUuid::is_canonical(&canonical));
        assert_eq!(uuid.version(), 4);
    }

    #[test]
    fn test_new_generates_distinct_values() {
        assert_ne!(CanonicalUuid::new(), CanonicalUuid::new());
    }

    #[test]
    fn test_parse_valid_canonical_uuid() {
        let canonical = "12345678-1234-5678-1234-567812345678";
        let parsed = CanonicalUuid::parse(canonical).expect("canonical uuid");

        assert_eq!(parsed.to_string(), canonical);
    }

    #[test]
    fn test_parse_rejects_simple_uuid() {
        let simple = "550e8400e29b41d4a716446655440000";

        match CanonicalUuid::parse(simple) {
            Err(UuidError::InvalidInput(msg)) => {
                assert!(msg.contains("8-4-4-4-12"));
                assert!(msg.contains(simple));
            }
            other => panic!("Expected InvalidInput error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_uppercase_uuid() {
        let uppercase = "550E8400-E29B-41D4-A716-446655440000";
        assert!(CanonicalUuid::parse(uppercase).is_err());
    }

    #[test]
    fn test_parse_rejects_misplaced_hyphens() {
        let misplaced = "550e840-0e29b-41d4-a716-446655440000";
        assert!(!CanonicalUuid::is_canonical(misplaced));
        assert!(CanonicalUuid::parse(misplaced).is_err());
    }

    #[test]
    fn test_from_str_matches_parse() {
        let canonical = "550e8400-e29b-41d4-a716-446655440000";
        let via_from_str: CanonicalUuid = canonical.parse().expect("from_str");

        assert_eq!(
            via_from_str,
            CanonicalUuid::parse(canonical).expect("parse")
        );
    }

    #[test]
    fn test_from_uuid_renders_hyphenated() {
        let uuid = Uuid::parse_str("550E8400E29B41D4A716446655440000").expect("uuid");
        let wrapped = CanonicalUuid::from_uuid(uuid);

        assert_eq!(wrapped.to_string(), "550e8400-e29b-41d4-a716-446655440000");
        assert_eq!(wrapped.uuid(), uuid);
    }

    #[test]
    fn test_serde_uses_canonical_string() {
        let canonical = "550e8400-e29b-41d4-a716-446655440000";
        let uuid = CanonicalUuid::parse(canonical).expect("parse");

        let json = serde_json::to_string(&uuid).expect("serialize");
        assert_eq!(json, format!("\"{canonical}\""));

        let back: CanonicalUuid = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, uuid);

        let rejected = serde_json::from_str::<CanonicalUuid>("\"not-a-uuid\"");
        assert!(rejected.is_err());
    }
}
