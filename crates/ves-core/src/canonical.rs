//! # Canonicalization — RFC 8785 Bytes, Floats Refused
//!
//! Home of `CanonicalBytes`: every byte sequence the workspace hashes is
//! built here and nowhere else.
//!
//! ## Security Invariant
//!
//! The inner `Vec<u8>` is private and `CanonicalBytes::new()` is the sole
//! constructor, so holding a `CanonicalBytes` proves the value went through
//! float rejection and JCS encoding. Digest functions take `&CanonicalBytes`
//! rather than `&[u8]`; handing them ad-hoc serializer output does not
//! compile.
//!
//! ## Canonical Form
//!
//! 1. **No floats anywhere.** Durations and counts are integers, everything
//!    else is a string. Number formatters disagree on float rendering, so a
//!    non-integer number fails canonicalization with the dotted path of the
//!    offending value.
//! 2. **RFC 8785 output.** `serde_jcs` sorts object keys lexicographically
//!    at every depth, keeps array order, and inserts no whitespace.
//! 3. **`null` and absence stay distinct.** The pipeline never drops a
//!    `null` or invents one; callers control absence through their
//!    `Serialize` impls (`skip_serializing_if`).

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalError;

/// Digest-ready bytes: float-free JSON in RFC 8785 form.
///
/// # Invariants
///
/// - Constructed only by [`CanonicalBytes::new()`], which rejects floats.
/// - Keys sorted at every nesting level, compact separators, UTF-8.
///
/// The private field is what turns these from conventions into guarantees.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize any serializable value.
    ///
    /// # Errors
    ///
    /// `CanonicalError::FloatRejected` when a non-integer number appears
    /// anywhere in the tree (the error carries its dotted path), or
    /// `CanonicalError::SerializationFailed` when serde or the JCS encoder
    /// fails.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalError> {
        let value = serde_json::to_value(obj)?;
        reject_floats(&value, &mut Vec::new())?;
        Ok(Self(serde_jcs::to_string(&value)?.into_bytes()))
    }

    /// The canonical byte sequence.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Byte length of the canonical form.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the canonical form is zero bytes long.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn dotted(trail: &[String]) -> String {
    if trail.is_empty() {
        "$".to_string()
    } else {
        trail.join(".")
    }
}

/// Depth-first walk that fails on the first non-integer number.
///
/// `trail` accumulates the dotted path for the error message; array elements
/// contribute their index as a segment. Scalars other than numbers pass
/// untouched.
fn reject_floats(value: &Value, trail: &mut Vec<String>) -> Result<(), CanonicalError> {
    match value {
        Value::Number(n) if !n.is_i64() && !n.is_u64() => Err(CanonicalError::FloatRejected {
            path: dotted(trail),
            value: n.as_f64().unwrap_or(f64::NAN),
        }),
        Value::Object(map) => {
            for (key, child) in map {
                trail.push(key.clone());
                reject_floats(child, trail)?;
                trail.pop();
            }
            Ok(())
        }
        Value::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                trail.push(idx.to_string());
                reject_floats(child, trail)?;
                trail.pop();
            }
            Ok(())
        }
        _ => Ok(()),
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Arbitrary JSON without floats — the domain evidence documents live in.
    fn float_free_json() -> impl Strategy<Value = Value> {
        let scalar = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            "[a-z0-9_ ]{0,40}".prop_map(Value::String),
        ];
        scalar.prop_recursive(3, 48, 6, |node| {
            prop_oneof![
                prop::collection::vec(node.clone(), 0..6).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,12}", node, 0..6)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        /// Float-free input always canonicalizes, to UTF-8 that reparses as JSON.
        #[test]
        fn output_is_parseable_utf8_json(value in float_free_json()) {
            let cb = CanonicalBytes::new(&value).unwrap();
            let text = std::str::from_utf8(cb.as_bytes()).unwrap();
            let reparsed: Result<Value, _> = serde_json::from_str(text);
            prop_assert!(reparsed.is_ok(), "output is not JSON: {:?}", reparsed.err());
        }

        /// Two canonicalizations of one value agree byte for byte.
        #[test]
        fn output_is_deterministic(value in float_free_json()) {
            let first = CanonicalBytes::new(&value).unwrap();
            let second = CanonicalBytes::new(&value).unwrap();
            prop_assert_eq!(first.as_bytes(), second.as_bytes());
        }

        /// Insertion order of object keys cannot reach the output.
        #[test]
        fn key_order_cannot_influence_bytes(
            entries in prop::collection::vec(("[a-z]{1,8}", any::<i64>()), 1..8)
        ) {
            let forward: serde_json::Map<String, Value> = entries
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(*v)))
                .collect();
            let reversed: serde_json::Map<String, Value> = entries
                .iter()
                .rev()
                .map(|(k, v)| (k.clone(), Value::from(*v)))
                .collect();
            let a = CanonicalBytes::new(&Value::Object(forward)).unwrap();
            let b = CanonicalBytes::new(&Value::Object(reversed)).unwrap();
            prop_assert_eq!(a.as_bytes(), b.as_bytes());
        }

        /// Emitted object keys come out strictly ascending.
        #[test]
        fn emitted_keys_ascend(keys in prop::collection::btree_set("[a-z]{1,8}", 2..6)) {
            let map: serde_json::Map<String, Value> = keys
                .iter()
                .enumerate()
                .map(|(i, k)| (k.clone(), Value::from(i as i64)))
                .collect();
            let cb = CanonicalBytes::new(&Value::Object(map)).unwrap();
            let parsed: serde_json::Map<String, Value> =
                serde_json::from_slice(cb.as_bytes()).unwrap();
            let emitted: Vec<&String> = parsed.keys().collect();
            prop_assert!(
                emitted.windows(2).all(|pair| pair[0] < pair[1]),
                "keys out of order: {emitted:?}"
            );
        }

        /// A fractional number anywhere fails canonicalization.
        #[test]
        fn fractional_numbers_always_fail(f in -1e9f64..1e9) {
            prop_assume!(f.fract() != 0.0);
            let result = CanonicalBytes::new(&serde_json::json!({"val": f}));
            prop_assert!(result.is_err());
        }
    }
}
