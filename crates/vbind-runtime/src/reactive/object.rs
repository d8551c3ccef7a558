#![forbid(unsafe_code)]

//! The reactive store: objects whose every field read and write is
//! intercepted.
//!
//! # Design
//!
//! A [`ReactiveObject`] is a shared map from field name to a slot holding the
//! current [`Value`] and that field's [`Dep`]. Reads made with a [`Tracker`]
//! register the tracked subscriber with the field's `Dep`; writes store the
//! new value and notify the `Dep`.
//!
//! [`wrap`] converts JSON into store values, turning every nested object
//! into a `ReactiveObject`. Because objects only ever exist in wrapped form,
//! assigning an object (including one already reachable from the store)
//! never re-walks it, which keeps self-referential assignments finite.
//!
//! # Invariants
//!
//! 1. Each field owns exactly one `Dep`, created with the field.
//! 2. A write replaces the stored value only if it is not strictly equal to
//!    the old one, but always notifies the field's `Dep`.
//! 3. Writing a missing key creates a new reactive field.
//! 4. No borrow of the object or the slot is held while subscribers run.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use vbind_core::Result;

use super::dep::{Dep, SubscriberId, Tracker};
use crate::value::Value;

struct Field {
    value: RefCell<Value>,
    dep: Dep,
}

impl Field {
    fn new(value: Value) -> Rc<Self> {
        Rc::new(Self {
            value: RefCell::new(value),
            dep: Dep::new(),
        })
    }
}

/// An intercepted object in the reactive store.
///
/// Cloning yields another handle to the same object.
#[derive(Clone, Default)]
pub struct ReactiveObject {
    fields: Rc<RefCell<BTreeMap<String, Rc<Field>>>>,
}

impl ReactiveObject {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap every entry of a JSON map.
    #[must_use]
    pub fn from_map(map: serde_json::Map<String, serde_json::Value>) -> Self {
        let obj = Self::new();
        {
            let mut fields = obj.fields.borrow_mut();
            for (key, json) in map {
                tracing::trace!(field = %key, "wrapping field");
                fields.insert(key, Field::new(wrap(json)));
            }
        }
        obj
    }

    fn field(&self, key: &str) -> Option<Rc<Field>> {
        self.fields.borrow().get(key).cloned()
    }

    /// Read a field without registering any dependency.
    #[must_use]
    pub fn get(&self, key: &str) -> Value {
        self.get_tracked(key, None)
    }

    /// Read a field, registering `tracker` with the field's `Dep` if present.
    ///
    /// Missing fields read as `undefined` and register nothing.
    #[must_use]
    pub fn get_tracked(&self, key: &str, tracker: Option<&Tracker>) -> Value {
        let Some(field) = self.field(key) else {
            return Value::Undefined;
        };
        if let Some(tracker) = tracker {
            field.dep.depend(tracker);
        }
        field.value.borrow().clone()
    }

    /// Write a field and notify its dependents.
    ///
    /// Returns the first error raised by a dependent; every dependent runs
    /// regardless.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let field = match self.field(key) {
            Some(field) => field,
            None => {
                tracing::trace!(field = %key, "adding field");
                let field = Field::new(Value::Undefined);
                self.fields
                    .borrow_mut()
                    .insert(key.to_string(), Rc::clone(&field));
                field
            }
        };
        {
            let mut slot = field.value.borrow_mut();
            if !slot.strict_eq(&value) {
                *slot = value;
            }
        }
        field.dep.notify()
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.borrow().contains_key(key)
    }

    /// Field names in sorted order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.fields.borrow().keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.borrow().is_empty()
    }

    /// Number of subscribers registered on `key` (0 for missing fields).
    #[must_use]
    pub fn subscriber_count(&self, key: &str) -> usize {
        self.field(key).map_or(0, |f| f.dep.len())
    }

    /// Whether `subscriber` is registered on `key`.
    #[must_use]
    pub fn is_tracked_by(&self, key: &str, subscriber: SubscriberId) -> bool {
        self.field(key).is_some_and(|f| f.dep.contains(subscriber))
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.fields, &other.fields)
    }

    /// Stable identity for the lifetime of the object.
    #[must_use]
    pub fn identity(&self) -> usize {
        Rc::as_ptr(&self.fields) as usize
    }
}

impl fmt::Debug for ReactiveObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveObject")
            .field("keys", &self.keys())
            .finish()
    }
}

/// Convert JSON into a store value, wrapping every nested object.
#[must_use]
pub fn wrap(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => Value::array(items.into_iter().map(wrap)),
        serde_json::Value::Object(map) => Value::Object(ReactiveObject::from_map(map)),
    }
}
