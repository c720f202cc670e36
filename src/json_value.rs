//! Loosely-typed JSON values
//!
//! Provider payloads sometimes carry fields whose shape is only known at run
//! time (JSON schemas for tools, function-call arguments, response schemas).
//! [`JsonValue`] is a closed sum type for those fields.
//!
//! Decoding tries each variant in the order given by [`DECODE_ORDER`]. The
//! order is significant: integers are attempted before floating point so that
//! whole numbers stay integers, and integers that do not fit an `i64` fall
//! through to [`JsonValue::Double`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{AiProxyError, Result};

/// A value that can represent any JSON document.
///
/// Variant declaration order is the decode-attempt order; keep it in sync
/// with [`DECODE_ORDER`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged, expecting = "JsonValue value cannot be decoded")]
pub enum JsonValue {
    Null,
    String(String),
    Int(i64),
    Double(f64),
    Bool(bool),
    Array(Vec<JsonValue>),
    Object(HashMap<String, JsonValue>),
}

/// Discriminant of a [`JsonValue`], used to describe decode order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonKind {
    Null,
    String,
    Int,
    Double,
    Bool,
    Array,
    Object,
}

/// Order in which candidate variants are attempted while decoding.
pub const DECODE_ORDER: [JsonKind; 7] = [
    JsonKind::Null,
    JsonKind::String,
    JsonKind::Int,
    JsonKind::Double,
    JsonKind::Bool,
    JsonKind::Array,
    JsonKind::Object,
];

impl JsonValue {
    /// Decode a value from JSON bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| AiProxyError::decode_failure(e.to_string(), bytes))
    }

    /// Encode this value as JSON bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| AiProxyError::SerializationError(e.to_string()))
    }

    pub fn kind(&self) -> JsonKind {
        match self {
            Self::Null => JsonKind::Null,
            Self::String(_) => JsonKind::String,
            Self::Int(_) => JsonKind::Int,
            Self::Double(_) => JsonKind::Double,
            Self::Bool(_) => JsonKind::Bool,
            Self::Array(_) => JsonKind::Array,
            Self::Object(_) => JsonKind::Object,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&HashMap<String, JsonValue>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Convert into an untyped `serde_json::Value`.
    ///
    /// `Null` maps to `serde_json::Value::Null`. Non-finite doubles have no
    /// JSON representation and also map to `Null`.
    pub fn to_untyped(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Double(d) => serde_json::Number::from_f64(*d)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Array(items) => {
                serde_json::Value::Array(items.iter().map(Self::to_untyped).collect())
            }
            Self::Object(map) => serde_json::Value::Object(to_untyped_map(map)),
        }
    }
}

/// Project a typed map into a loosely-typed `serde_json` map, for consumers
/// that expect plain dictionaries rather than the closed sum type.
pub fn to_untyped_map(map: &HashMap<String, JsonValue>) -> serde_json::Map<String, serde_json::Value> {
    map.iter()
        .map(|(k, v)| (k.clone(), v.to_untyped()))
        .collect()
}

impl From<serde_json::Value> for JsonValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Array(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<&str> for JsonValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for JsonValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for JsonValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for JsonValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<bool> for JsonValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<JsonValue>> From<Vec<T>> for JsonValue {
    fn from(values: Vec<T>) -> Self {
        Self::Array(values.into_iter().map(Into::into).collect())
    }
}

impl From<HashMap<String, JsonValue>> for JsonValue {
    fn from(map: HashMap<String, JsonValue>) -> Self {
        Self::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn decode_str(s: &str) -> JsonValue {
        JsonValue::decode(s.as_bytes()).unwrap()
    }

    #[test]
    fn test_decode_order_is_pinned() {
        assert_eq!(
            DECODE_ORDER,
            [
                JsonKind::Null,
                JsonKind::String,
                JsonKind::Int,
                JsonKind::Double,
                JsonKind::Bool,
                JsonKind::Array,
                JsonKind::Object,
            ]
        );
    }

    #[test]
    fn test_scalars_pick_expected_variant() {
        assert_eq!(decode_str("null"), JsonValue::Null);
        assert_eq!(decode_str("\"42\""), JsonValue::String("42".into()));
        assert_eq!(decode_str("42"), JsonValue::Int(42));
        assert_eq!(decode_str("-7"), JsonValue::Int(-7));
        assert_eq!(decode_str("42.5"), JsonValue::Double(42.5));
        assert_eq!(decode_str("1.0"), JsonValue::Double(1.0));
        assert_eq!(decode_str("true"), JsonValue::Bool(true));
    }

    #[test]
    fn test_integer_overflow_falls_through_to_double() {
        let value = decode_str("18446744073709551615");
        assert_eq!(value.kind(), JsonKind::Double);
    }

    #[test]
    fn test_nested_structures() {
        let value = decode_str(r#"{"type":"object","properties":{"n":{"type":"integer","minimum":0}},"required":["n"],"strict":true,"extra":null}"#);
        let map = value.as_object().unwrap();
        assert_eq!(map["type"], JsonValue::from("object"));
        assert_eq!(map["strict"], JsonValue::Bool(true));
        assert!(map["extra"].is_null());
        assert_eq!(
            map["required"],
            JsonValue::Array(vec![JsonValue::String("n".into())])
        );
        let props = map["properties"].as_object().unwrap();
        let n = props["n"].as_object().unwrap();
        assert_eq!(n["minimum"], JsonValue::Int(0));
    }

    #[test]
    fn test_invalid_input_is_decode_failure() {
        for input in ["{", "[1,", "tru", "\"unterminated", "", "{\"a\" 1}"] {
            match JsonValue::decode(input.as_bytes()) {
                Err(AiProxyError::DecodeFailure { raw, .. }) => {
                    assert_eq!(raw.as_deref(), Some(input));
                }
                other => panic!("expected decode failure for {input:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_untyped_projection_substitutes_null() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), JsonValue::Null);
        map.insert("b".to_string(), JsonValue::Int(3));
        map.insert(
            "c".to_string(),
            JsonValue::Array(vec![JsonValue::Bool(false), JsonValue::Double(0.5)]),
        );

        let untyped = to_untyped_map(&map);
        assert_eq!(untyped["a"], serde_json::Value::Null);
        assert_eq!(untyped["b"], serde_json::json!(3));
        assert_eq!(untyped["c"], serde_json::json!([false, 0.5]));
    }

    #[test]
    fn test_from_serde_value() {
        let value = JsonValue::from(serde_json::json!({"k": [1, 2.5, "x", null]}));
        assert_eq!(
            value,
            JsonValue::Object(HashMap::from([(
                "k".to_string(),
                JsonValue::Array(vec![
                    JsonValue::Int(1),
                    JsonValue::Double(2.5),
                    JsonValue::String("x".into()),
                    JsonValue::Null,
                ])
            )]))
        );
    }

    fn arb_json() -> impl Strategy<Value = JsonValue> {
        let leaf = prop_oneof![
            Just(JsonValue::Null),
            any::<String>().prop_map(JsonValue::String),
            any::<i64>().prop_map(JsonValue::Int),
            // Finite only: NaN and infinities have no JSON encoding.
            (-1.0e12f64..1.0e12f64).prop_map(JsonValue::Double),
            any::<bool>().prop_map(JsonValue::Bool),
        ];
        leaf.prop_recursive(4, 64, 8, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..8).prop_map(JsonValue::Array),
                prop::collection::hash_map(".*", inner, 0..8).prop_map(JsonValue::Object),
            ]
        })
    }

    /// Equality that tolerates the one accepted lossy case: a double holding
    /// a whole number may come back as an integer.
    fn roughly_equal(original: &JsonValue, decoded: &JsonValue) -> bool {
        match (original, decoded) {
            (JsonValue::Double(d), JsonValue::Int(i)) => *d == *i as f64,
            (JsonValue::Double(a), JsonValue::Double(b)) => a == b,
            (JsonValue::Array(a), JsonValue::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| roughly_equal(x, y))
            }
            (JsonValue::Object(a), JsonValue::Object(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|w| roughly_equal(v, w)))
            }
            (a, b) => a == b,
        }
    }

    proptest! {
        #[test]
        fn prop_encode_decode_round_trip(value in arb_json()) {
            let bytes = value.encode().unwrap();
            let decoded = JsonValue::decode(&bytes).unwrap();
            prop_assert!(roughly_equal(&value, &decoded), "{:?} != {:?}", value, decoded);
        }
    }
}
