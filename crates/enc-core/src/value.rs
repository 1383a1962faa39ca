//! The dynamically-typed payload carried by classes and parameters.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// An order-preserving string-keyed map of [`Value`]s.
///
/// Ordering is not an invariant the resolver depends on, but an
/// order-preserving map keeps `enc-loader`'s round-trip output stable and
/// diff-friendly.
pub type Map = IndexMap<String, Value>;

/// A tagged variant covering every shape a class or parameter body can take.
///
/// This is the closed analogue of the `interface{}`/`any` maps a JSON or
/// YAML parser hands back: every leaf the loader can produce round-trips
/// through one of these variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Vec<Value>),
    Map(Map),
}

impl Value {
    /// An empty map, the identity element for [`crate::merge`].
    #[must_use]
    pub fn empty_map() -> Self { Value::Map(Map::new()) }

    #[must_use]
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map_mut(&mut self) -> Option<&mut Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(s) => Some(s),
            _ => None,
        }
    }

    /// A sequence of strings, as used by the `nodes` key. Non-string
    /// elements are skipped rather than erroring — coercion is the loader's
    /// job, not the core's.
    #[must_use]
    pub fn as_str_seq(&self) -> Vec<String> {
        self.as_seq()
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .map(ToOwned::to_owned)
            .collect()
    }

    #[must_use]
    pub fn is_null(&self) -> bool { matches!(self, Value::Null) }

    #[must_use]
    pub fn is_empty_map(&self) -> bool { matches!(self, Value::Map(m) if m.is_empty()) }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Value::Str(s.to_owned()) }
}

impl From<String> for Value {
    fn from(s: String) -> Self { Value::Str(s) }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self { Value::Map(m) }
}

impl Default for Value {
    fn default() -> Self { Value::Null }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn as_str_seq_skips_non_strings() {
        let v = Value::Seq(vec![
            Value::Str("a".into()),
            Value::Int(1),
            Value::Str("b".into()),
        ]);
        assert_eq!(v.as_str_seq(), vec!["a".to_owned(), "b".to_owned()]);
    }

    #[test]
    fn empty_map_is_empty() { assert!(Value::empty_map().is_empty_map()); }
}
