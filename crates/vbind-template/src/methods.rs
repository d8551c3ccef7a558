#![forbid(unsafe_code)]

//! Named event handlers referenced by event directives.

use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;
use vbind_core::{DomEvent, Result};
use vbind_runtime::Context;

/// A method callable from an event directive.
pub type Handler = Rc<dyn Fn(&Context, &DomEvent) -> Result<()>>;

#[derive(Clone, Default)]
pub struct Methods {
    handlers: AHashMap<String, Handler>,
}

impl Methods {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(
        mut self,
        name: impl Into<String>,
        handler: impl Fn(&Context, &DomEvent) -> Result<()> + 'static,
    ) -> Self {
        self.insert(name, handler);
        self
    }

    pub fn insert(
        &mut self,
        name: impl Into<String>,
        handler: impl Fn(&Context, &DomEvent) -> Result<()> + 'static,
    ) {
        self.handlers.insert(name.into(), Rc::new(handler));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Handler> {
        self.handlers.get(name).cloned()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Handler names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for Methods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Methods")
            .field("names", &self.names())
            .finish()
    }
}
