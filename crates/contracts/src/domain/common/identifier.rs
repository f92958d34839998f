use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Length of the canonical `8-4-4-4-12` form.
const CANONICAL_LEN: usize = 36;
/// Byte offsets of the group separators in the canonical form.
const HYPHENS: [usize; 4] = [8, 13, 18, 23];

/// Caller-supplied identifier string that does not follow the canonical grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid identifier format: '{input}'")]
pub struct InvalidFormat {
    pub input: String,
}

/// Unique key of a batch or an event.
///
/// Internally a 128-bit UUID, externally always the lowercase hyphenated
/// string. Conversion to text is total; conversion from text goes through
/// [`Identifier::parse`] and nothing else, serde included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier(Uuid);

impl Identifier {
    /// Fresh random (v4) identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an untrusted string.
    ///
    /// Only the 32-hex-digit `8-4-4-4-12` grouping is accepted, in either
    /// case. Braced, URN and unhyphenated spellings that `Uuid::parse_str`
    /// would tolerate are rejected.
    pub fn parse(input: &str) -> Result<Self, InvalidFormat> {
        let invalid = || InvalidFormat {
            input: input.to_string(),
        };

        let bytes = input.as_bytes();
        if bytes.len() != CANONICAL_LEN {
            return Err(invalid());
        }
        for (i, b) in bytes.iter().enumerate() {
            let ok = if HYPHENS.contains(&i) {
                *b == b'-'
            } else {
                b.is_ascii_hexdigit()
            };
            if !ok {
                return Err(invalid());
            }
        }

        Uuid::parse_str(input).map(Self).map_err(|_| invalid())
    }

    pub fn value(&self) -> Uuid {
        self.0
    }

    /// Canonical string form, same as `to_string()`.
    pub fn as_string(&self) -> String {
        self.0.hyphenated().to_string()
    }
}

impl Default for Identifier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for Identifier {
    type Err = InvalidFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Identifier::parse(&raw).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_new_is_canonical_lowercase() {
        let id = Identifier::new();
        let s = id.to_string();
        assert_eq!(s.len(), 36);
        assert_eq!(s, s.to_lowercase());
        assert_eq!(Identifier::parse(&s).unwrap(), id);
    }

    #[test]
    fn test_new_does_not_repeat() {
        let ids: HashSet<Identifier> = (0..10_000).map(|_| Identifier::new()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_parse_accepts_uppercase_and_normalizes() {
        let id = Identifier::parse("67E55044-10B1-426F-9247-BB680E5FE0C8").unwrap();
        assert_eq!(id.to_string(), "67e55044-10b1-426f-9247-bb680e5fe0c8");
    }

    #[test]
    fn test_parse_rejects_non_canonical_forms() {
        for input in [
            "not-a-uuid",
            "not-a-valid-id",
            "",
            "67e5504410b1426f9247bb680e5fe0c8",
            "{67e55044-10b1-426f-9247-bb680e5fe0c8}",
            "urn:uuid:67e55044-10b1-426f-9247-bb680e5fe0c8",
            "67e55044-10b1-426f-9247-bb680e5fe0c",
            "67e55044-10b1-426f-9247-bb680e5fe0c8 ",
            "67e55044_10b1_426f_9247_bb680e5fe0c8",
            "g7e55044-10b1-426f-9247-bb680e5fe0c8",
        ] {
            let err = Identifier::parse(input).unwrap_err();
            assert_eq!(err.input, input);
        }
    }

    #[test]
    fn test_serde_uses_canonical_string() {
        let id = Identifier::parse("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"67e55044-10b1-426f-9247-bb680e5fe0c8\"");

        let back: Identifier = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        let bad: Result<Identifier, _> =
            serde_json::from_str("\"67e5504410b1426f9247bb680e5fe0c8\"");
        assert!(bad.is_err());
    }
}
