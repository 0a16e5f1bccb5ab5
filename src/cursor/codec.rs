//! Cursor encoding and decoding

use crate::error::{Error, Result};
use crate::types::JsonValue;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Standard alphabet, accepting tokens with or without trailing padding
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Ordered field → value mapping carried inside a cursor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CursorValues {
    entries: Vec<(String, JsonValue)>,
}

impl CursorValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value, replacing an earlier entry with the same key in place
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Compact JSON object text, keys in insertion order
    pub fn payload(&self) -> String {
        // A map of strings to JSON values always serializes
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl Serialize for CursorValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Encode values into an opaque cursor token
pub fn encode(values: &CursorValues) -> String {
    STANDARD.encode(values.payload())
}

/// Decode a cursor token back into its serialized payload
pub fn decode(token: &str) -> Result<String> {
    let bytes = LENIENT
        .decode(token.trim())
        .map_err(|e| Error::invalid_cursor(format!("not valid base64: {e}")))?;
    String::from_utf8(bytes).map_err(|_| Error::invalid_cursor("payload is not valid UTF-8"))
}

/// Extract the value to compare `field` against from a decoded payload.
///
/// Object payloads must carry `field`. A bare JSON scalar is used as is, and
/// any other text is treated as a string value.
pub fn comparison_value(payload: &str, field: &str) -> Result<JsonValue> {
    match serde_json::from_str::<JsonValue>(payload) {
        Ok(JsonValue::Object(map)) => map.get(field).cloned().ok_or_else(|| {
            Error::invalid_cursor(format!("cursor does not carry a value for '{field}'"))
        }),
        Ok(JsonValue::Array(_) | JsonValue::Null) => Err(Error::invalid_cursor(
            "cursor payload is not a comparable value",
        )),
        Ok(scalar) => Ok(scalar),
        Err(_) => Ok(JsonValue::String(payload.to_string())),
    }
}
