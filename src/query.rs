//! Query-string flattening.
//!
//! Logical parameters (scalars, enumerated values, lists and one level of
//! nested maps) are flattened into the bracketed key style the service
//! expects: `key[]` for lists and `key[subkey]` for maps.

use crate::error::QueryError;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Date format the service accepts in query strings.
const QUERY_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Enumerated values that have a declared wire representation.
pub trait WireValue {
    /// The exact string sent to the service.
    fn wire_value(&self) -> &'static str;
}

/// A logical query parameter value before flattening.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    /// Explicitly no value. Dropped unless nulls are kept.
    Null,
    Str(String),
    Int(i64),
    Bool(bool),
    List(Vec<QueryValue>),
    Map(Vec<(String, QueryValue)>),
}

impl QueryValue {
    /// Builds a map value from `(subkey, value)` pairs.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<QueryValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        QueryValue::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Wraps an enumerated value by its wire representation.
    pub fn wire<W: WireValue>(value: &W) -> Self {
        QueryValue::Str(value.wire_value().to_string())
    }

    fn scalar(&self) -> Option<String> {
        match self {
            QueryValue::Str(s) => Some(s.clone()),
            QueryValue::Int(i) => Some(i.to_string()),
            QueryValue::Bool(b) => Some(b.to_string()),
            QueryValue::Null | QueryValue::List(_) | QueryValue::Map(_) => None,
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Str(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Str(value)
    }
}

impl From<&String> for QueryValue {
    fn from(value: &String) -> Self {
        QueryValue::Str(value.clone())
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        QueryValue::Bool(value)
    }
}

macro_rules! int_query_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for QueryValue {
                fn from(value: $ty) -> Self {
                    QueryValue::Int(i64::from(value))
                }
            }
        )*
    };
}

int_query_value!(i8, i16, i32, i64, u8, u16, u32);

impl From<usize> for QueryValue {
    fn from(value: usize) -> Self {
        // Offsets and limits never approach i64::MAX.
        QueryValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<DateTime<Utc>> for QueryValue {
    fn from(value: DateTime<Utc>) -> Self {
        QueryValue::Str(value.format(QUERY_DATE_FORMAT).to_string())
    }
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(QueryValue::Null, Into::into)
    }
}

impl<T: Into<QueryValue>> From<Vec<T>> for QueryValue {
    fn from(value: Vec<T>) -> Self {
        QueryValue::List(value.into_iter().map(Into::into).collect())
    }
}

/// Ordered collection of logical query parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    entries: Vec<(String, QueryValue)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`, replacing any earlier value for it.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder form of [`QueryParams::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Copies every entry of `other` into `self`; `other` wins on conflicts.
    pub fn extend(&mut self, other: QueryParams) {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// A flattened wire value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParam {
    Single(String),
    Multi(Vec<String>),
    /// Explicit "clear this field" marker, sent as an empty value.
    Null,
}

/// Flattened query, ordered by wire key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerializedQuery(BTreeMap<String, QueryParam>);

impl SerializedQuery {
    pub fn get(&self, key: &str) -> Option<&QueryParam> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Wire key/value pairs; list values repeat their key in element order.
    pub fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for (key, param) in &self.0 {
            match param {
                QueryParam::Single(value) => pairs.push((key.clone(), value.clone())),
                QueryParam::Multi(values) => {
                    pairs.extend(values.iter().map(|v| (key.clone(), v.clone())))
                }
                QueryParam::Null => pairs.push((key.clone(), String::new())),
            }
        }
        pairs
    }
}

/// Flattens `params` into wire key/value pairs.
///
/// Nulls (and empty lists) are dropped unless `keep_null` is set, in which
/// case they are sent as [`QueryParam::Null`].
pub fn serialize(params: &QueryParams, keep_null: bool) -> Result<SerializedQuery, QueryError> {
    let mut out = BTreeMap::new();

    for (key, value) in params.iter() {
        match value {
            QueryValue::List(items) => {
                let wire_key = format!("{key}[]");
                let values = flatten_list(key, items)?;
                if !values.is_empty() {
                    out.insert(wire_key, QueryParam::Multi(values));
                } else if keep_null {
                    out.insert(wire_key, QueryParam::Null);
                }
            }
            QueryValue::Map(entries) => {
                for (subkey, subvalue) in entries {
                    let wire_key = format!("{key}[{subkey}]");
                    match subvalue {
                        QueryValue::List(_) | QueryValue::Map(_) => {
                            return Err(QueryError::UnsupportedShape { key: wire_key });
                        }
                        QueryValue::Null => {
                            if keep_null {
                                out.insert(wire_key, QueryParam::Null);
                            }
                        }
                        scalar => {
                            if let Some(s) = scalar.scalar() {
                                out.insert(wire_key, QueryParam::Single(s));
                            }
                        }
                    }
                }
            }
            QueryValue::Null => {
                if keep_null {
                    out.insert(key.to_string(), QueryParam::Null);
                }
            }
            scalar => {
                if let Some(s) = scalar.scalar() {
                    out.insert(key.to_string(), QueryParam::Single(s));
                }
            }
        }
    }

    Ok(SerializedQuery(out))
}

fn flatten_list(key: &str, items: &[QueryValue]) -> Result<Vec<String>, QueryError> {
    let mut values = Vec::with_capacity(items.len());
    for item in items {
        match item {
            QueryValue::List(_) | QueryValue::Map(_) => {
                return Err(QueryError::UnsupportedShape {
                    key: format!("{key}[]"),
                });
            }
            QueryValue::Null => {}
            scalar => values.extend(scalar.scalar()),
        }
    }
    Ok(values)
}
