use std::error::Error;
use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use time::OffsetDateTime;

/// Opaque key for a project or a person.
///
/// Persisted records carry numeric ids while freshly parsed input carries
/// strings, so every id is reduced to one canonical string form on the way in
/// and compared only in that form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier(String);

impl Identifier {
    pub fn canonical(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn from_integer(value: i128) -> Self {
        Self(value.to_string())
    }

    pub fn from_float(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        if value.fract() == 0.0 && value.abs() < 9.0e15 {
            return Some(Self::from_integer(value as i128));
        }
        Some(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for Identifier {
    fn from(value: u64) -> Self {
        Self::from_integer(i128::from(value))
    }
}

impl From<i64> for Identifier {
    fn from(value: i64) -> Self {
        Self::from_integer(i128::from(value))
    }
}

impl From<i32> for Identifier {
    fn from(value: i32) -> Self {
        Self::from_integer(i128::from(value))
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Identifier::canonical(value).ok_or(IdentifierError::Empty)
    }
}

impl Serialize for Identifier {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer
            .deserialize_any(IdentifierVisitor)?
            .ok_or_else(|| de::Error::custom(IdentifierError::Empty))
    }
}

/// For optional id fields: `null` and blank strings read as `None`.
pub fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<Identifier>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(IdentifierVisitor)
}

struct IdentifierVisitor;

impl Visitor<'_> for IdentifierVisitor {
    type Value = Option<Identifier>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or numeric identifier")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Identifier::canonical(value))
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Some(Identifier::from(value)))
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Some(Identifier::from(value)))
    }

    fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Identifier::from_float(value)
            .map(Some)
            .ok_or_else(|| E::custom(IdentifierError::NotFinite))
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierError {
    Empty,
    NotFinite,
}

impl fmt::Display for IdentifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierError::Empty => write!(f, "identifier must not be empty"),
            IdentifierError::NotFinite => write!(f, "numeric identifier must be finite"),
        }
    }
}

impl Error for IdentifierError {}

/// Millisecond wall-clock ids, bumped forward past any id `exists` reports.
pub fn generate_identifier<F>(mut exists: F) -> Identifier
where
    F: FnMut(&Identifier) -> bool,
{
    let mut millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    loop {
        let candidate = Identifier::from_integer(millis);
        if !exists(&candidate) {
            return candidate;
        }
        millis += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashSet};

    use serde::Deserialize;

    use super::{deserialize_optional, generate_identifier, Identifier};

    #[test]
    fn numeric_and_string_origins_compare_equal() {
        let from_number = Identifier::from(1772214122148u64);
        let from_text = Identifier::canonical(" 1772214122148 ").expect("id should parse");
        assert_eq!(from_number, from_text);
        assert_ne!(from_number, Identifier::from(1772214122149u64));
    }

    #[test]
    fn whole_floats_collapse_to_integer_form() {
        assert_eq!(
            Identifier::from_float(42.0).expect("finite").as_str(),
            "42"
        );
        assert_eq!(
            Identifier::from_float(1.5).expect("finite").as_str(),
            "1.5"
        );
        assert!(Identifier::from_float(f64::NAN).is_none());
    }

    #[test]
    fn empty_input_is_not_an_identifier() {
        assert!(Identifier::canonical("").is_none());
        assert!(Identifier::canonical("   ").is_none());
        assert!("".parse::<Identifier>().is_err());
    }

    #[test]
    fn deserializes_numbers_strings_and_map_keys() {
        let ids: Vec<Identifier> =
            serde_json::from_str(r#"[1, "2", 3.0]"#).expect("ids should deserialize");
        assert_eq!(
            ids.iter().map(Identifier::as_str).collect::<Vec<_>>(),
            vec!["1", "2", "3"]
        );

        let keyed: BTreeMap<Identifier, u32> =
            serde_json::from_str(r#"{"7": 1}"#).expect("map keys should deserialize");
        assert!(keyed.contains_key(&Identifier::from(7u64)));

        let text = serde_json::to_string(&Identifier::from(9u64)).expect("serialize");
        assert_eq!(text, "\"9\"");

        assert!(serde_json::from_str::<Identifier>(r#""  ""#).is_err());
        assert!(serde_json::from_str::<Identifier>("null").is_err());
    }

    #[test]
    fn optional_fields_read_blank_and_null_as_absent() {
        #[derive(Deserialize)]
        struct Slot {
            #[serde(default, deserialize_with = "deserialize_optional")]
            id: Option<Identifier>,
        }

        let read = |raw: &str| -> Option<Identifier> {
            serde_json::from_str::<Slot>(raw)
                .expect("slot should deserialize")
                .id
        };
        assert_eq!(read(r#"{"id": 12}"#), Some(Identifier::from(12u64)));
        assert_eq!(read(r#"{"id": " 12 "}"#), Some(Identifier::from(12u64)));
        assert_eq!(read(r#"{"id": 12.0}"#), Some(Identifier::from(12u64)));
        assert_eq!(read(r#"{"id": ""}"#), None);
        assert_eq!(read(r#"{"id": null}"#), None);
        assert_eq!(read("{}"), None);
    }

    #[test]
    fn generated_ids_skip_existing_candidates() {
        let mut taken = HashSet::new();
        let first = generate_identifier(|candidate| taken.contains(candidate));
        taken.insert(first.clone());
        let second = generate_identifier(|candidate| taken.contains(candidate));
        assert_ne!(first, second);
        assert!(second.as_str().chars().all(|ch| ch.is_ascii_digit()));
    }
}
