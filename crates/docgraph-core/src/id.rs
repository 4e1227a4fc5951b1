//! Document identities.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::document::IDENTITY_FIELD;
use crate::error::Error;

/// Size of a document identity in bytes.
pub const ID_SIZE: usize = 16;

/// A document identity (UUID v4 layout).
///
/// The text form is 32 lowercase hex characters; this is also how an
/// identity is stored inside a document.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id([u8; ID_SIZE]);

impl Id {
    /// Generate a fresh random identity.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().into_bytes())
    }

    /// Wrap raw identity bytes.
    pub fn from_bytes(bytes: [u8; ID_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw identity bytes.
    pub fn as_bytes(&self) -> &[u8; ID_SIZE] {
        &self.0
    }

    /// Parse the text form. Hyphenated UUIDs are accepted as well.
    pub fn parse(text: &str) -> Result<Self, Error> {
        if text.len() == ID_SIZE * 2 {
            let mut bytes = [0u8; ID_SIZE];
            hex::decode_to_slice(text, &mut bytes)
                .map_err(|_| Error::InvalidId(text.to_string()))?;
            return Ok(Self(bytes));
        }
        uuid::Uuid::parse_str(text)
            .map(|u| Self(u.into_bytes()))
            .map_err(|_| Error::InvalidId(text.to_string()))
    }

    /// Read an identity out of a JSON value.
    ///
    /// Accepts a bare identity string or an object carrying one under
    /// [`IDENTITY_FIELD`].
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Self::parse(s).ok(),
            Value::Object(map) => map.get(IDENTITY_FIELD).and_then(Self::from_value_bare),
            _ => None,
        }
    }

    /// Read a bare identity string only.
    pub fn from_value_bare(value: &Value) -> Option<Self> {
        value.as_str().and_then(|s| Self::parse(s).ok())
    }

    /// The JSON representation of this identity.
    pub fn to_value(self) -> Value {
        Value::String(self.to_string())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self)
    }
}

impl FromStr for Id {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Id> for Value {
    fn from(id: Id) -> Self {
        id.to_value()
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_form() {
        let id = Id::generate();
        let text = id.to_string();
        assert_eq!(text.len(), 32);
        assert_eq!(Id::parse(&text).unwrap(), id);
    }

    #[test]
    fn test_hyphenated_uuid() {
        let id = Id::parse("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        assert_eq!(id.to_string(), "67e5504410b1426f9247bb680e5fe0c8");
    }

    #[test]
    fn test_from_value() {
        let id = Id::generate();

        assert_eq!(Id::from_value(&id.to_value()), Some(id));
        assert_eq!(Id::from_value(&json!({ "id": id.to_string(), "name": "x" })), Some(id));
        assert_eq!(Id::from_value(&json!({ "name": "x" })), None);
        assert_eq!(Id::from_value(&json!("not an id")), None);
        assert_eq!(Id::from_value(&json!(42)), None);
    }

    #[test]
    fn test_bare_only() {
        let id = Id::generate();
        assert!(Id::from_value_bare(&json!({ "id": id.to_string() })).is_none());
        assert_eq!(Id::from_value_bare(&id.to_value()), Some(id));
    }

    #[test]
    fn test_invalid() {
        assert!(matches!(Id::parse("zz"), Err(Error::InvalidId(_))));
        assert!(Id::parse(&"g".repeat(32)).is_err());
    }
}
