//! Identity types for the reader sync protocol.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Hosts address sessions and annotations either by string or by integer key.
/// Both are accepted on the wire and normalized to a string.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Integer(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(text) => text,
            RawId::Integer(n) => n.to_string(),
        }
    }
}

/// Opaque identifier of one host/reader binding.
///
/// Every envelope carries one. Only envelopes matching the active session are
/// acted upon.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Create a SessionId from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create a new random SessionId (UUID v4).
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawId::deserialize(deserializer).map(|raw| Self(raw.into()))
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

/// Host-assigned annotation identifier, stable across sessions.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AnnotationId(String);

impl AnnotationId {
    /// Create an AnnotationId from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for AnnotationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawId::deserialize(deserializer).map(|raw| Self(raw.into()))
    }
}

impl From<String> for AnnotationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for AnnotationId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnnotationId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_random_is_uuid() {
        let id = SessionId::random();
        assert!(uuid::Uuid::parse_str(id.as_str()).is_ok());
        assert_ne!(id, SessionId::random());
    }

    #[test]
    fn session_id_accepts_integer_keys() {
        let id: SessionId = serde_json::from_str("42").unwrap();
        assert_eq!(id.as_str(), "42");

        let id: SessionId = serde_json::from_str("\"item-7\"").unwrap();
        assert_eq!(id, SessionId::from("item-7"));
    }

    #[test]
    fn annotation_id_serializes_as_plain_string() {
        let id = AnnotationId::new("ABCD1234");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"ABCD1234\"");
    }

    #[test]
    fn debug_shows_type() {
        assert_eq!(format!("{:?}", AnnotationId::new("a1")), "AnnotationId(a1)");
        assert_eq!(format!("{}", SessionId::new("s1")), "s1");
    }
}
