//! Record definitions
//!
//! A record is a schema-less JSON object plus a system-assigned identifier.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::index::IndexKey;

/// Field name of the record identifier
pub const ID_FIELD: &str = "id";

/// User-supplied record fields
pub type Fields = Map<String, Value>;

/// A stored record
///
/// Serializes flat, e.g. `{"id": "...", "name": "John", "age": 15}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// System-assigned unique identifier
    pub id: String,

    /// Everything else
    #[serde(flatten)]
    pub fields: Fields,
}

impl Record {
    /// Build a record; an `id` among the fields is dropped in favour of `id`
    pub fn new(id: impl Into<String>, mut fields: Fields) -> Self {
        fields.remove(ID_FIELD);
        Self {
            id: id.into(),
            fields,
        }
    }

    /// A user field (never the identifier)
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// A field by name, treating `id` as a field
    pub fn value_of(&self, field: &str) -> Option<Cow<'_, Value>> {
        if field == ID_FIELD {
            Some(Cow::Owned(Value::String(self.id.clone())))
        } else {
            self.fields.get(field).map(Cow::Borrowed)
        }
    }

    /// Index key for `field`, or `None` when the field is absent or null
    pub fn index_key(&self, field: &str) -> Option<IndexKey> {
        if field == ID_FIELD {
            return Some(IndexKey::parse(&self.id));
        }
        match self.fields.get(field) {
            None | Some(Value::Null) => None,
            Some(value) => Some(IndexKey::from_value(value)),
        }
    }

    /// The flat JSON object form
    pub fn to_json(&self) -> Value {
        let mut object = Map::with_capacity(self.fields.len() + 1);
        object.insert(ID_FIELD.to_string(), Value::String(self.id.clone()));
        for (name, value) in &self.fields {
            object.insert(name.clone(), value.clone());
        }
        Value::Object(object)
    }
}
