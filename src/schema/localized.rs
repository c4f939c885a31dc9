//! Language-keyed text as returned by the service.

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Language used when no preference is given.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Text keyed by language code, e.g. `{"en": "Frieren", "ja": "葬送のフリーレン"}`.
///
/// The service sends an empty array instead of an empty object for fields
/// with no text, and older endpoints send a list of single-entry objects;
/// both shapes are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LocalizedString(BTreeMap<String, String>);

impl LocalizedString {
    /// Creates a single-language string.
    pub fn new(lang: impl Into<String>, text: impl Into<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(lang.into(), text.into());
        Self(map)
    }

    pub fn get(&self, lang: &str) -> Option<&str> {
        self.0.get(lang).map(String::as_str)
    }

    /// English text if present, otherwise the first available language.
    pub fn preferred(&self) -> Option<&str> {
        self.get(DEFAULT_LANGUAGE)
            .or_else(|| self.0.values().next().map(String::as_str))
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, lang: impl Into<String>, text: impl Into<String>) {
        self.0.insert(lang.into(), text.into());
    }
}

impl fmt::Display for LocalizedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.preferred().unwrap_or_default())
    }
}

impl<'de> Deserialize<'de> for LocalizedString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(LocalizedVisitor)
    }
}

struct LocalizedVisitor;

impl<'de> Visitor<'de> for LocalizedVisitor {
    type Value = LocalizedString;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of language codes to text, or a list of such maps")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut out = BTreeMap::new();
        while let Some((lang, text)) = map.next_entry::<String, String>()? {
            out.insert(lang, text);
        }
        Ok(LocalizedString(out))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut out = BTreeMap::new();
        while let Some(entry) = seq.next_element::<BTreeMap<String, String>>()? {
            out.extend(entry);
        }
        Ok(LocalizedString(out))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(LocalizedString::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_preferred_language() {
        let text: LocalizedString =
            serde_json::from_value(json!({"ja": "葬送のフリーレン", "en": "Frieren"})).unwrap();
        assert_eq!(text.preferred(), Some("Frieren"));
        assert_eq!(text.to_string(), "Frieren");

        let text: LocalizedString = serde_json::from_value(json!({"ja": "ワンピース"})).unwrap();
        assert_eq!(text.preferred(), Some("ワンピース"));
    }

    #[test]
    fn test_empty_array_is_empty() {
        let text: LocalizedString = serde_json::from_value(json!([])).unwrap();
        assert!(text.is_empty());
        assert_eq!(text.to_string(), "");
    }

    #[test]
    fn test_list_of_maps_is_merged() {
        let text: LocalizedString =
            serde_json::from_value(json!([{"en": "Bio"}, {"fr": "Bio FR"}])).unwrap();
        assert_eq!(text.get("en"), Some("Bio"));
        assert_eq!(text.get("fr"), Some("Bio FR"));
    }

    #[test]
    fn test_scalar_is_rejected() {
        assert!(serde_json::from_value::<LocalizedString>(json!("plain")).is_err());
        assert!(serde_json::from_value::<LocalizedString>(json!({"en": 3})).is_err());
    }
}
