use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::value::render;

/// Field holding the unique key of an apple.
pub const NAME_FIELD: &str = "name";

/// A single apple record.
///
/// Records are open JSON objects: `name`, `colors` and `flavors` are the
/// conventional fields, but any other field may be stored alongside them and
/// survives partial updates. Field order follows insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Apple(Map<String, Value>);

impl Apple {
    /// Creates an apple with no fields.
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Creates an apple carrying only a `name`.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::new().with(NAME_FIELD, name.into())
    }

    /// Builder-style setter, mostly useful in tests and fixtures.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Raw `name` value, if the field is present.
    #[must_use]
    pub fn name(&self) -> Option<&Value> {
        self.0.get(NAME_FIELD)
    }

    /// Returns `true` when the `name` field is the string `name`.
    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        matches!(self.name(), Some(Value::String(own)) if own == name)
    }

    /// Human-readable rendering of the name for messages and logs.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name().map_or_else(|| "(unnamed)".to_string(), render)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Inserts or overwrites a field. Existing fields keep their position.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Shallow merge: every field of `partial` overwrites the same field
    /// here, fields absent from `partial` are retained.
    pub fn merge(&mut self, partial: Apple) {
        for (key, value) in partial.0 {
            self.0.insert(key, value);
        }
    }

    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    #[must_use]
    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Apple {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}
