//! Ordered, multi-valued request parameters and their form encoding.
//!
//! The same encoding is used for query strings (reads) and
//! `application/x-www-form-urlencoded` bodies (writes): each key and each
//! value is escaped on its own, a space becomes `+`, and a key with several
//! values yields one `key=value` pair per value.

use serde_json::{Map, Value};

use crate::error::ApiError;

/// Request parameters keyed by name, each name holding one or more values.
///
/// Keys keep their insertion order and values keep theirs. No validation is
/// done beyond converting values to strings; the API decides what is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, Vec<String>)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Params::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    /// Builder form of [`Params::set_all`].
    pub fn with_all<I, V>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        self.set_all(key, values);
        self
    }

    /// Set `key` to a single value, replacing whatever it held.
    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        self.set_all(key, [value]);
    }

    /// Set `key` to a sequence of values, replacing whatever it held.
    pub fn set_all<I, V>(&mut self, key: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        let key = key.into();
        let values: Vec<String> = values.into_iter().map(|v| v.to_string()).collect();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = values,
            None => self.entries.push((key, values)),
        }
    }

    /// Add one more value under `key`.
    pub fn append(&mut self, key: impl Into<String>, value: impl ToString) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => existing.push(value.to_string()),
            None => self.entries.push((key, vec![value.to_string()])),
        }
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_all(key).first().map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every `(key, value)` pair in encoding order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(k, values)| values.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    /// Encode as `k1=v1&k1=v2&k2=v3`.
    pub fn encode(&self) -> String {
        self.pairs()
            .map(|(k, v)| format!("{}={}", escape_component(k), escape_component(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Parse an encoded query string or form body.
    ///
    /// Repeated keys collect their values in order. A pair without `=`
    /// decodes to an empty value.
    pub fn decode(encoded: &str) -> Result<Self, ApiError> {
        let mut params = Params::new();
        for pair in encoded.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            params.append(unescape_component(key)?, unescape_component(value)?);
        }
        Ok(params)
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: ToString,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.append(k, v);
        }
        params
    }
}

/// Build params from a JSON object. Arrays become repeated values, `null`
/// becomes an empty string and every other scalar uses its JSON text
/// (strings without quotes).
impl From<&Map<String, Value>> for Params {
    fn from(object: &Map<String, Value>) -> Self {
        let mut params = Params::new();
        for (key, value) in object {
            match value {
                Value::Array(items) => params.set_all(key.as_str(), items.iter().map(json_scalar)),
                other => params.set(key.as_str(), json_scalar(other)),
            }
        }
        params
    }
}

fn json_scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Escape one key or value as an HTML form component.
pub fn escape_component(component: &str) -> String {
    urlencoding::encode(component).replace("%20", "+")
}

fn unescape_component(component: &str) -> Result<String, ApiError> {
    urlencoding::decode(&component.replace('+', " "))
        .map(|decoded| decoded.into_owned())
        .map_err(|e| ApiError::Decode(e.to_string()))
}
