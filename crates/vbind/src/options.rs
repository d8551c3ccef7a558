#![forbid(unsafe_code)]

//! Construction options for [`Vm`](crate::Vm).

use vbind_core::{DomEvent, NodeId, Result};
use vbind_runtime::Context;
use vbind_template::{Methods, Syntax};

/// Root region of a view model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum El {
    Node(NodeId),
    /// `#id`, `.class`, or a tag name, resolved through the tree.
    Selector(String),
}

impl From<NodeId> for El {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

impl From<&str> for El {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_string())
    }
}

impl From<String> for El {
    fn from(selector: String) -> Self {
        Self::Selector(selector)
    }
}

/// Data, root region, handlers, and syntax for a view model.
///
/// `data` must be a JSON object (or `null` for an empty store). Without an
/// `el`, the data is wrapped but nothing is compiled.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub data: serde_json::Value,
    pub el: Option<El>,
    pub methods: Methods,
    pub syntax: Syntax,
}

impl Options {
    #[must_use]
    pub fn new(data: serde_json::Value) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_el(mut self, el: impl Into<El>) -> Self {
        self.el = Some(el.into());
        self
    }

    #[must_use]
    pub fn with_method(
        mut self,
        name: impl Into<String>,
        handler: impl Fn(&Context, &DomEvent) -> Result<()> + 'static,
    ) -> Self {
        self.methods.insert(name, handler);
        self
    }

    #[must_use]
    pub fn with_methods(mut self, methods: Methods) -> Self {
        self.methods = methods;
        self
    }

    #[must_use]
    pub fn with_syntax(mut self, syntax: Syntax) -> Self {
        self.syntax = syntax;
        self
    }
}
