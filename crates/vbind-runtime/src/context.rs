#![forbid(unsafe_code)]

//! Name-based access to a store's top-level fields.
//!
//! [`Context`] is what event handlers receive and what the facade delegates
//! to: reads and writes by field name or dotted path, routed through the
//! store's interception so dependents update before the call returns.

use vbind_core::{BindError, Result};

use crate::eval::{Path, get_value, set_value};
use crate::reactive::object::ReactiveObject;
use crate::value::Value;

#[derive(Clone, Debug, Default)]
pub struct Context {
    data: ReactiveObject,
}

impl Context {
    #[must_use]
    pub fn new(data: ReactiveObject) -> Self {
        Self { data }
    }

    #[must_use]
    pub fn data(&self) -> &ReactiveObject {
        &self.data
    }

    /// Read a top-level field; `None` if no such field exists.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.data
            .contains_key(name)
            .then(|| self.data.get(name))
    }

    /// Write an existing top-level field.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        if !self.data.contains_key(name) {
            return Err(BindError::UnknownField {
                name: name.to_string(),
            });
        }
        self.data.set(name, value)
    }

    /// Read a dotted path.
    pub fn get_path(&self, expr: &str) -> Result<Value> {
        get_value(&Path::parse(expr)?, &self.data, None)
    }

    /// Write a dotted path.
    pub fn set_path(&self, expr: &str, value: impl Into<Value>) -> Result<()> {
        set_value(&Path::parse(expr)?, &self.data, value)
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.data.keys()
    }
}
