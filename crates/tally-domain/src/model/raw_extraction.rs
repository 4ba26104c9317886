//! Raw cell values as reported by the extraction model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::vocabulary::{is_identity_key, is_known_key};

/// Flat key/value map from the model's JSON object.
///
/// The vocabulary shifts between report layouts, so nothing here is required:
/// every numeric lookup of a missing or unreadable key yields zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawExtraction {
    fields: Map<String, Value>,
}

impl RawExtraction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON value; only objects are accepted
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of keys that belong to the field vocabulary
    pub fn known_key_count(&self) -> usize {
        self.keys().filter(|key| is_known_key(key)).count()
    }

    /// Numeric value of a field (0.0 when absent or unreadable)
    pub fn number(&self, key: &str) -> f64 {
        self.fields.get(key).and_then(read_number).unwrap_or(0.0)
    }

    /// Whole-box count of a field, rounded, never negative
    pub fn count(&self, key: &str) -> u32 {
        let value = self.number(key);
        if value.is_nan() || value <= 0.0 {
            0
        } else if value >= u32::MAX as f64 {
            u32::MAX
        } else {
            value.round() as u32
        }
    }

    /// Sum of counts over several keys, saturating at `u32::MAX`
    pub fn count_sum<'a>(&self, keys: impl IntoIterator<Item = &'a String>) -> u32 {
        keys.into_iter()
            .map(|key| self.count(key))
            .fold(0, u32::saturating_add)
    }

    /// Trimmed, non-empty text field
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.fields.get(key) {
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                if trimmed.is_empty() || trimmed == "-" {
                    None
                } else {
                    Some(trimmed)
                }
            }
            _ => None,
        }
    }

    /// Every non-identity field as a number, for the audit breakdown
    pub fn numeric_fields(&self) -> BTreeMap<String, f64> {
        self.fields
            .iter()
            .filter(|(key, _)| !is_identity_key(key))
            .map(|(key, value)| (key.clone(), read_number(value).unwrap_or(0.0)))
            .collect()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for RawExtraction {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut raw = RawExtraction::new();
        for (key, value) in iter {
            raw.insert(key, value);
        }
        raw
    }
}

/// Read a JSON value as a number. Accepts numbers and numeric strings
/// ("12", " 3 ", "1,204"); everything else is unreadable.
fn read_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
            cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
        }
        _ => None,
    }
}
