#![forbid(unsafe_code)]

//! The renderable-tree contract consumed by the template compiler.
//!
//! vbind never owns a view representation. Anything that can classify
//! nodes, enumerate and edit attributes, walk children, attach listeners,
//! and set text/raw content/value properties can host bindings by
//! implementing [`RenderTree`]. [`Document`](crate::dom::Document) is the
//! in-memory implementation shipped with the crate.
//!
//! # Invariants
//!
//! 1. All methods take `&self`; implementations use interior mutability and
//!    must not hold internal borrows while invoking listeners, because a
//!    listener may write data whose watchers mutate the same tree.
//! 2. Unknown node handles are tolerated: queries return empty values and
//!    mutations are no-ops.
//! 3. `detach_children` followed by `attach_children` preserves child order.

use std::fmt;
use std::rc::Rc;

use crate::error::Result;

/// Opaque handle to a node inside a [`RenderTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    #[must_use]
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Node classification as seen by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    /// Off-tree staging container holding detached children.
    Fragment,
}

/// A view-originated event delivered to listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomEvent {
    /// Event name (`"click"`, `"input"`, ...).
    pub name: String,
    /// Node the event was dispatched on.
    pub target: NodeId,
    /// Snapshot of the target's value property at dispatch time.
    pub target_value: String,
}

impl DomEvent {
    #[must_use]
    pub fn new(name: impl Into<String>, target: NodeId) -> Self {
        Self {
            name: name.into(),
            target,
            target_value: String::new(),
        }
    }

    #[must_use]
    pub fn with_target_value(mut self, value: impl Into<String>) -> Self {
        self.target_value = value.into();
        self
    }
}

/// Event listener attached to a node.
pub type Listener = Rc<dyn Fn(&DomEvent) -> Result<()>>;

/// Host view tree operations required to compile and drive bindings.
pub trait RenderTree {
    /// Classify a node; `None` for unknown handles.
    fn kind(&self, node: NodeId) -> Option<NodeKind>;

    fn is_element(&self, node: NodeId) -> bool {
        self.kind(node) == Some(NodeKind::Element)
    }

    fn is_text(&self, node: NodeId) -> bool {
        self.kind(node) == Some(NodeKind::Text)
    }

    /// Attribute name/value pairs in document order.
    fn attributes(&self, node: NodeId) -> Vec<(String, String)>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.attributes(node)
            .into_iter()
            .find_map(|(n, v)| (n == name).then_some(v))
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str);

    fn remove_attribute(&self, node: NodeId, name: &str);

    fn children(&self, node: NodeId) -> Vec<NodeId>;

    fn add_listener(&self, node: NodeId, event: &str, listener: Listener);

    /// Text of a text node, or the concatenated descendant text of an element.
    fn text_content(&self, node: NodeId) -> String;

    /// Replace a text node's data, or an element's children with one text node.
    fn set_text_content(&self, node: NodeId, text: &str);

    /// Replace an element's content with opaque raw markup.
    fn set_raw_content(&self, node: NodeId, raw: &str);

    /// Current value property (form controls).
    fn value(&self, node: NodeId) -> String;

    fn set_value(&self, node: NodeId, value: &str);

    /// Move every child of `node` into a new off-tree fragment and return it.
    fn detach_children(&self, node: NodeId) -> NodeId;

    /// Move every child of `fragment` to the end of `node`.
    fn attach_children(&self, node: NodeId, fragment: NodeId);

    /// Resolve a selector (`#id`, `.class`, or tag name) to the first match.
    fn query(&self, selector: &str) -> Option<NodeId>;
}
