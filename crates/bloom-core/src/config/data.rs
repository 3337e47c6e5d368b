use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::error::ConfigError;

/// In-memory configuration tree addressed by dotted key paths.
///
/// `app.locale` walks into the `app` object and reads `locale`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigData {
    #[serde(flatten)]
    values: Map<String, Value>,
}

impl ConfigData {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self { values: Map::new() }
    }

    /// Build from a JSON value. Non-object values yield `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(values) => Some(Self { values }),
            _ => None,
        }
    }

    /// Raw value at `key`
    pub fn value(&self, key: &str) -> Option<&Value> {
        let mut segments = key.split('.');
        let first = segments.next()?;
        let mut current = self.values.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Typed value at `key`; missing keys and type mismatches yield `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.value(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Typed value at `key` with default
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Check if key exists
    pub fn has(&self, key: &str) -> bool {
        self.value(key).is_some()
    }

    /// Set the value at `key`, creating intermediate objects.
    ///
    /// Fails when an intermediate segment already holds a non-object value.
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), ConfigError> {
        let value = serde_json::to_value(value).map_err(|source| ConfigError::SerializationError {
            key: key.to_string(),
            source,
        })?;
        self.set_value(key, value)
    }

    /// Set a raw JSON value at `key`.
    pub fn set_value(&mut self, key: &str, value: Value) -> Result<(), ConfigError> {
        let segments: Vec<&str> = key.split('.').collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(ConfigError::InvalidKey {
                key: key.to_string(),
                reason: "empty path segment".to_string(),
            });
        }

        let (last, parents) = segments
            .split_last()
            .ok_or_else(|| ConfigError::InvalidKey { key: key.to_string(), reason: "empty key".to_string() })?;

        let mut current = &mut self.values;
        for segment in parents {
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            current = match entry {
                Value::Object(map) => map,
                _ => {
                    return Err(ConfigError::InvalidKey {
                        key: key.to_string(),
                        reason: format!("'{}' is not an object", segment),
                    });
                }
            };
        }
        current.insert(last.to_string(), value);
        Ok(())
    }

    /// Remove and return the value at `key`
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let (parents, last) = match key.rsplit_once('.') {
            Some((parents, last)) => (Some(parents), last),
            None => (None, key),
        };
        let target = match parents {
            None => &mut self.values,
            Some(parents) => {
                let mut current = &mut self.values;
                for segment in parents.split('.') {
                    current = current.get_mut(segment)?.as_object_mut()?;
                }
                current
            }
        };
        target.remove(last)
    }

    /// Top-level keys
    pub fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Deep-merge `other` into `self`. Objects merge recursively, anything else from `other` wins.
    pub fn merge(&mut self, other: &ConfigData) {
        for (key, value) in &other.values {
            match self.values.get_mut(key) {
                Some(existing) => merge_values(existing, value.clone()),
                None => {
                    self.values.insert(key.clone(), value.clone());
                }
            }
        }
    }

    /// The whole tree as a JSON value
    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }
}

/// Deep-merge `incoming` into `target`; later values override earlier ones key by key.
pub(crate) fn merge_values(target: &mut Value, incoming: Value) {
    match (target, incoming) {
        (Value::Object(target_map), Value::Object(incoming_map)) => {
            for (key, value) in incoming_map {
                match target_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        target_map.insert(key, value);
                    }
                }
            }
        }
        (target, incoming) => *target = incoming,
    }
}
