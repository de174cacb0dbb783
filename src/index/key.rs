//! Index key ordering
//!
//! Keys that parse as numbers compare numerically, two non-numeric keys
//! compare lexicographically, and every numeric key sorts before every
//! non-numeric one. The order is total and defines all tree invariants.

use std::cmp::Ordering;
use std::fmt;

use serde_json::Value;

/// A key stored in an ordered index
#[derive(Debug, Clone)]
pub enum IndexKey {
    /// A key that parsed as a finite number
    Number(f64),

    /// Any other key
    Text(String),
}

impl IndexKey {
    /// Classify a raw string key.
    ///
    /// Surrounding whitespace is ignored when looking for a number; the
    /// empty string and non-finite values stay textual.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            if let Ok(n) = trimmed.parse::<f64>() {
                if n.is_finite() {
                    return Self::number(n);
                }
            }
        }
        IndexKey::Text(raw.to_string())
    }

    /// Derive a key from a record field value
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Number(n) => match n.as_f64() {
                Some(f) if f.is_finite() => Self::number(f),
                _ => IndexKey::Text(n.to_string()),
            },
            Value::String(s) => Self::parse(s),
            other => IndexKey::Text(other.to_string()),
        }
    }

    fn number(n: f64) -> Self {
        // -0.0 and 0.0 must be the same key
        IndexKey::Number(if n == 0.0 { 0.0 } else { n })
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, IndexKey::Number(_))
    }
}

impl Ord for IndexKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (IndexKey::Number(a), IndexKey::Number(b)) => a.total_cmp(b),
            (IndexKey::Text(a), IndexKey::Text(b)) => a.cmp(b),
            (IndexKey::Number(_), IndexKey::Text(_)) => Ordering::Less,
            (IndexKey::Text(_), IndexKey::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for IndexKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for IndexKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for IndexKey {}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKey::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            IndexKey::Number(n) => write!(f, "{}", n),
            IndexKey::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for IndexKey {
    fn from(raw: &str) -> Self {
        IndexKey::parse(raw)
    }
}

impl From<String> for IndexKey {
    fn from(raw: String) -> Self {
        IndexKey::parse(&raw)
    }
}

impl From<i64> for IndexKey {
    fn from(n: i64) -> Self {
        IndexKey::number(n as f64)
    }
}

impl From<f64> for IndexKey {
    fn from(n: f64) -> Self {
        if n.is_finite() {
            IndexKey::number(n)
        } else {
            IndexKey::Text(n.to_string())
        }
    }
}

impl From<&Value> for IndexKey {
    fn from(value: &Value) -> Self {
        IndexKey::from_value(value)
    }
}

/// Compare two raw keys under the index ordering
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    IndexKey::parse(a).cmp(&IndexKey::parse(b))
}
