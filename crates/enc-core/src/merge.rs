//! The deep-merge algorithm shared by nodegroup composition and the
//! resolver: right-biased at leaves, recursive at mappings.

use crate::value::{Map, Value};

/// Merges `b` on top of `a`.
///
/// For every key present in either operand: a key unique to one side passes
/// through unchanged; a key present in both recurses if both values are
/// maps, and otherwise takes `b`'s value. A top-level `Value::Null` operand
/// is treated as an empty map.
#[must_use]
pub fn merge(a: Value, b: Value) -> Value {
    let a = as_map_or_empty(a);
    let b = as_map_or_empty(b);
    Value::Map(merge_maps(a, b))
}

fn as_map_or_empty(v: Value) -> Map {
    match v {
        Value::Map(m) => m,
        _ => Map::new(),
    }
}

fn merge_maps(mut a: Map, b: Map) -> Map {
    for (k, bv) in b {
        match a.shift_remove(&k) {
            Some(Value::Map(av)) => {
                let bv = match bv {
                    Value::Map(bv) => bv,
                    other => {
                        a.insert(k, other);
                        continue;
                    },
                };
                a.insert(k, Value::Map(merge_maps(av, bv)));
            },
            Some(_) | None => {
                a.insert(k, bv);
            },
        }
    }
    a
}

impl Value {
    /// Method form of [`merge`], for call sites that prefer `a.merged(b)`.
    #[must_use]
    pub fn merged(self, other: Value) -> Value { merge(self, other) }
}


#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::*;

    fn leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::Int),
            "[a-z]{1,6}".prop_map(Value::Str),
        ]
    }

    fn value() -> impl Strategy<Value = Value> {
        leaf().prop_recursive(3, 32, 4, |inner| {
            prop::collection::btree_map("[a-z]{1,4}", inner, 0..4)
                .prop_map(|m| Value::Map(m.into_iter().collect()))
        })
    }

    fn map_value() -> impl Strategy<Value = Value> {
        prop::collection::btree_map("[a-z]{1,4}", value(), 0..6)
            .prop_map(|m| Value::Map(m.into_iter().collect()))
    }

    proptest! {
        #[test]
        fn merge_with_empty_is_identity(a in map_value()) {
            prop_assert_eq!(merge(a.clone(), Value::empty_map()), a.clone());
            prop_assert_eq!(merge(Value::empty_map(), a.clone()), a);
        }

        #[test]
        fn merge_is_idempotent(a in map_value()) {
            prop_assert_eq!(merge(a.clone(), a.clone()), a);
        }

        #[test]
        fn merge_overlays_b_on_top_of_a(a in map_value(), b in map_value()) {
            let merged = merge(a.clone(), b.clone());
            let Value::Map(merged) = &merged else { panic!("merge always yields a Map") };
            let Value::Map(bm) = &b else { unreachable!() };
            for (k, bv) in bm {
                if !matches!(bv, Value::Map(_)) || !matches!(merged.get(k), Some(Value::Map(_))) {
                    prop_assert_eq!(merged.get(k), Some(bv));
                }
            }
        }
    }
}
