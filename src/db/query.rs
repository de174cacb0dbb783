//! Query descriptions for `find_all` and `find_in_range`

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::index::IndexKey;

use super::record::Record;

/// Arbitrary record filter
pub type Predicate = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

/// Filter applied by `find_all`
#[derive(Clone, Default)]
pub enum Where {
    /// Every record
    #[default]
    All,

    /// Records whose `key` field equals `value`
    Equals { key: String, value: Value },

    /// Records accepted by a closure
    Predicate(Predicate),
}

impl Where {
    pub fn equals(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Where::Equals {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn predicate<F>(filter: F) -> Self
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        Where::Predicate(Arc::new(filter))
    }

    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Where::All => true,
            Where::Equals { key, value } => record
                .value_of(key)
                .is_some_and(|field| same_value(&field, value)),
            Where::Predicate(filter) => filter(record),
        }
    }

    /// Field named by an equality filter
    pub fn equality_field(&self) -> Option<&str> {
        match self {
            Where::Equals { key, .. } => Some(key.as_str()),
            _ => None,
        }
    }

    /// Cache key for this filter; closures have none and are never cached
    pub fn cache_key(&self) -> Option<String> {
        match self {
            Where::All => Some("all:{}".to_string()),
            Where::Equals { key, value } => {
                Some(format!("all:{}", json!({ "key": key, "value": value })))
            }
            Where::Predicate(_) => None,
        }
    }
}

impl fmt::Debug for Where {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Where::All => f.write_str("All"),
            Where::Equals { key, value } => f
                .debug_struct("Equals")
                .field("key", key)
                .field("value", value)
                .finish(),
            Where::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Which secondary index `find_all` may use
#[derive(Debug, Clone, Default)]
pub struct IndexHint {
    /// Index field; defaults to the equality filter's field
    pub key: Option<String>,

    /// Build the index on demand when it does not exist yet
    pub create: bool,
}

/// Options for `find_all`
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub filter: Where,
    pub index: IndexHint,
}

impl FindOptions {
    /// Match every record
    pub fn all() -> Self {
        Self::default()
    }

    /// Match records whose `key` equals `value`
    pub fn equals(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            filter: Where::equals(key, value),
            index: IndexHint::default(),
        }
    }

    /// Match records accepted by `filter`
    pub fn matching<F>(filter: F) -> Self
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        Self {
            filter: Where::predicate(filter),
            index: IndexHint::default(),
        }
    }

    /// Prefer the index on `key` if it exists
    pub fn use_index(mut self, key: impl Into<String>) -> Self {
        self.index.key = Some(key.into());
        self
    }

    /// Use the index on `key`, creating it first if needed
    pub fn create_index(mut self, key: impl Into<String>) -> Self {
        self.index.key = Some(key.into());
        self.index.create = true;
        self
    }
}

/// Inclusive range condition for `find_in_range`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeQuery {
    pub key: String,
    pub low: Value,
    pub high: Value,
}

impl RangeQuery {
    pub fn new(key: impl Into<String>, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            low: low.into(),
            high: high.into(),
        }
    }

    pub fn low_key(&self) -> IndexKey {
        IndexKey::from_value(&self.low)
    }

    pub fn high_key(&self) -> IndexKey {
        IndexKey::from_value(&self.high)
    }

    /// Whether `record[key]` lies in `[low, high]`
    pub fn contains(&self, record: &Record) -> bool {
        record
            .index_key(&self.key)
            .is_some_and(|k| k >= self.low_key() && k <= self.high_key())
    }

    pub fn cache_key(&self) -> String {
        format!(
            "range:{}:{}:{}",
            self.key,
            bound_text(&self.low),
            bound_text(&self.high)
        )
    }
}

/// JSON equality, except that numbers compare by value (`20 == 20.0`)
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

fn bound_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
