#![forbid(unsafe_code)]

//! Dynamically typed values held by the reactive store.
//!
//! Objects are always [`ReactiveObject`]s: converting JSON into a [`Value`]
//! wraps every nested object, so there is no unwrapped object state to
//! observe later. Arrays are plain shared leaves and are not intercepted.
//!
//! # Equality
//!
//! [`Value::strict_eq`] (and `PartialEq`) follows strict-equality rules:
//! primitives compare by value, `NaN` is never equal to itself, and arrays
//! and objects compare by identity.

use std::fmt;
use std::rc::Rc;

use vbind_core::{BindError, Result};

use crate::reactive::object::ReactiveObject;

#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Rc<Vec<Value>>),
    Object(ReactiveObject),
}

impl Value {
    #[must_use]
    pub fn strict_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => Rc::ptr_eq(a, b),
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    #[must_use]
    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Self::Array(Rc::new(items.into_iter().collect()))
    }

    /// `undefined` or `null`.
    #[must_use]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    #[must_use]
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&ReactiveObject> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Snapshot this value (and everything reachable from it) as JSON.
    ///
    /// `undefined` and non-finite numbers become `null`. Fails with
    /// [`BindError::CyclicValue`] if an object contains itself.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        let mut path = Vec::new();
        self.to_json_inner(&mut path)
    }

    fn to_json_inner(&self, path: &mut Vec<usize>) -> Result<serde_json::Value> {
        Ok(match self {
            Self::Undefined | Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => number_to_json(*n),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Array(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(|v| v.to_json_inner(path))
                    .collect::<Result<_>>()?,
            ),
            Self::Object(obj) => {
                let id = obj.identity();
                if path.contains(&id) {
                    return Err(BindError::CyclicValue);
                }
                path.push(id);
                let mut map = serde_json::Map::new();
                for key in obj.keys() {
                    map.insert(key.clone(), obj.get(&key).to_json_inner(path)?);
                }
                path.pop();
                serde_json::Value::Object(map)
            }
        })
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_eq(other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("Undefined"),
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Self::String(s) => f.debug_tuple("String").field(s).finish(),
            Self::Array(items) => f.debug_tuple("Array").field(&items.len()).finish(),
            Self::Object(obj) => fmt::Debug::fmt(obj, f),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return serde_json::Value::from(n as i64);
    }
    serde_json::Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
}

fn write_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_nan() {
        f.write_str("NaN")
    } else if n.is_infinite() {
        f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n == 0.0 {
        f.write_str("0")
    } else if (1e-6..1e21).contains(&n.abs()) {
        write!(f, "{n}")
    } else {
        // Exponent form outside the plain-decimal range, with an explicit
        // sign on the exponent: 1e+21, 1.5e-7.
        let text = format!("{n:e}");
        match text.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => write!(f, "{mantissa}e+{exp}"),
            _ => f.write_str(&text),
        }
    }
}

/// Text coercion used by every updater.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write_number(*n, f),
            Self::String(s) => f.write_str(s),
            Self::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    if !item.is_nullish() {
                        write!(f, "{item}")?;
                    }
                }
                Ok(())
            }
            Self::Object(_) => f.write_str("[object Object]"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<ReactiveObject> for Value {
    fn from(obj: ReactiveObject) -> Self {
        Self::Object(obj)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Array(Rc::new(items))
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        crate::reactive::object::wrap(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn display_matches_text_coercion() {
        assert_eq!(Value::Undefined.to_string(), "undefined");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::from(3).to_string(), "3");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
        assert_eq!(Value::from(-0.0).to_string(), "0");
        assert_eq!(Value::from(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::from(f64::NEG_INFINITY).to_string(), "-Infinity");
        assert_eq!(Value::from("hi").to_string(), "hi");
        assert_eq!(
            Value::array([Value::from(1), Value::Null, Value::from("x")]).to_string(),
            "1,,x"
        );
        assert_eq!(Value::from(json!({"a": 1})).to_string(), "[object Object]");
    }

    #[test]
    fn large_and_tiny_numbers_use_exponent_form() {
        let shown = |n: f64| Value::from(n).to_string();
        assert_eq!(shown(1e21), "1e+21");
        assert_eq!(shown(-2e22), "-2e+22");
        assert_eq!(shown(1e300), "1e+300");
        assert_eq!(shown(1e-7), "1e-7");
        assert_eq!(shown(1.5e-7), "1.5e-7");
        assert_eq!(shown(1e20), "100000000000000000000");
        assert_eq!(shown(0.000001), "0.000001");
        assert_eq!(shown(123456.789), "123456.789");
    }

    #[test]
    fn strict_equality_rules() {
        assert_eq!(Value::from(1), Value::from(1.0));
        assert_ne!(Value::from(1), Value::from("1"));
        assert_ne!(Value::from(f64::NAN), Value::from(f64::NAN));
        assert_ne!(Value::Undefined, Value::Null);

        let arr = Value::array([Value::from(1)]);
        assert_eq!(arr, arr.clone());
        assert_ne!(arr, Value::array([Value::from(1)]));

        let obj = Value::from(json!({"k": "v"}));
        assert_eq!(obj, obj.clone());
        assert_ne!(obj, Value::from(json!({"k": "v"})));
    }

    #[test]
    fn accessors() {
        assert_eq!(Value::from(4).as_f64(), Some(4.0));
        assert_eq!(Value::from("s").as_str(), Some("s"));
        assert_eq!(Value::from(false).as_bool(), Some(false));
        assert!(Value::Null.is_nullish());
        assert!(Value::Undefined.is_nullish());
        assert!(Value::from(json!({})).is_object());
        assert!(Value::from(json!({})).as_object().is_some());
        assert!(Value::from(1).as_object().is_none());
    }

    #[test]
    fn json_snapshot_roundtrips_structure() {
        let source = json!({"user": {"name": "a", "tags": ["x", 1]}, "n": 2.5, "f": null});
        let value = Value::from(source.clone());
        assert_eq!(value.to_json().unwrap(), source);
    }

    #[test]
    fn json_snapshot_detects_cycles() {
        let value = Value::from(json!({"inner": {}}));
        let obj = value.as_object().unwrap().clone();
        obj.set("me", Value::Object(obj.clone())).unwrap();
        assert_eq!(value.to_json(), Err(BindError::CyclicValue));
    }

    #[test]
    fn shared_object_without_cycle_is_not_a_cycle() {
        let value = Value::from(json!({"a": {}, "b": {}}));
        let root = value.as_object().unwrap().clone();
        let shared = Value::from(json!({"x": 1}));
        root.set("a", shared.clone()).unwrap();
        root.set("b", shared).unwrap();
        assert_eq!(
            value.to_json().unwrap(),
            json!({"a": {"x": 1}, "b": {"x": 1}})
        );
    }
}
