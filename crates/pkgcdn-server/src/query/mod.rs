//! Query string handling
//!
//! Each route accepts only its own query keys so that equivalent URLs share
//! one cache entry. Queries are re-serialized with sorted keys.

use std::collections::BTreeMap;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything `encodeURIComponent` escapes
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Decoded query parameters in key order. A repeated key keeps its last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: BTreeMap<String, String>,
}

impl Query {
    pub fn parse(raw: Option<&str>) -> Self {
        let params = raw
            .unwrap_or("")
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((key, value)) => (decode(key), decode(value)),
                None => (decode(pair), String::new()),
            })
            .collect();
        Self { params }
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn has(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.params.remove(key)
    }

    /// Whether every key is in `allowed`
    pub fn only(&self, allowed: &[&str]) -> bool {
        self.params.keys().all(|key| allowed.contains(&key.as_str()))
    }

    /// A copy keeping only the keys in `allowed`
    pub fn retain(&self, allowed: &[&str]) -> Self {
        let params = self
            .params
            .iter()
            .filter(|(key, _)| allowed.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Self { params }
    }

    /// `""` for an empty query, otherwise `?a&b=c` with sorted keys; empty
    /// values are written as the bare key
    pub fn to_search(&self) -> String {
        if self.params.is_empty() {
            return String::new();
        }

        let pairs: Vec<String> = self
            .params
            .iter()
            .map(|(key, value)| {
                let key = utf8_percent_encode(key, COMPONENT);
                if value.is_empty() {
                    key.to_string()
                } else {
                    format!("{}={}", key, utf8_percent_encode(value, COMPONENT))
                }
            })
            .collect();
        format!("?{}", pairs.join("&"))
    }
}

fn decode(component: &str) -> String {
    let spaced = component.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}
