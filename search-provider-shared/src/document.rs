//! Document model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ID_FIELD;

/// An ordered mapping from field name to value.
///
/// Field order is insertion order, which is also the order the search engine
/// returns stored fields in. Multi-valued fields are represented as JSON
/// arrays, matching how Solr renders them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    fields: Map<String, Value>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from an existing map of field values.
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Set a field, replacing any previous value.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a field, returning the previous value if there was one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    /// Append a value to a field, turning it into a multi-valued field.
    pub fn add_value(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let value = value.into();
        match self.fields.entry(name.into()) {
            serde_json::map::Entry::Vacant(entry) => {
                entry.insert(value);
            }
            serde_json::map::Entry::Occupied(mut entry) => match entry.get_mut() {
                Value::Array(values) => values.push(value),
                existing => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
            },
        }
    }

    /// Get the raw value of a field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Get the first value of a field.
    ///
    /// For multi-valued fields this is the first element; for single-valued
    /// fields it is the value itself. An empty array yields `None`.
    pub fn first_value(&self, name: &str) -> Option<&Value> {
        match self.fields.get(name)? {
            Value::Array(values) => values.first(),
            value => Some(value),
        }
    }

    /// Get all values of a field, flattening multi-valued fields.
    pub fn values(&self, name: &str) -> Vec<&Value> {
        match self.fields.get(name) {
            Some(Value::Array(values)) => values.iter().collect(),
            Some(value) => vec![value],
            None => Vec::new(),
        }
    }

    /// The document identifier rendered as a string.
    ///
    /// Numeric identifiers are accepted and rendered without quotes.
    pub fn id(&self) -> Option<String> {
        self.first_value(ID_FIELD).and_then(value_as_string)
    }

    /// Remove a field, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.shift_remove(name)
    }

    /// Check whether the document has the given field.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Iterate over fields in order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the document has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Consume the document, returning the underlying map.
    pub fn into_inner(self) -> Map<String, Value> {
        self.fields
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<Map<String, Value>> for Document {
    fn from(fields: Map<String, Value>) -> Self {
        Self::from_map(fields)
    }
}

/// Render a scalar JSON value as a plain string.
fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
