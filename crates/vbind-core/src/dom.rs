#![forbid(unsafe_code)]

//! In-memory [`RenderTree`] implementation.
//!
//! [`Document`] is an arena of nodes behind `Rc<RefCell<..>>`. Cloning a
//! `Document` yields another handle to the same arena, which is how watcher
//! callbacks and listeners reach the tree they mutate.
//!
//! Listeners are invoked with no arena borrow held, so they may freely
//! read and mutate the document (directly or through data watchers).
//!
//! # Failure Modes
//!
//! - Unknown [`NodeId`]: reads return empty values, writes are ignored.
//! - Released [`NodeId`]: children discarded by `set_text_content` or
//!   `set_raw_content`, and fragments emptied by `attach_children`, go back
//!   to the arena's free list. Until reused their handles behave as unknown;
//!   afterwards they name whatever node took the slot.
//! - Listener error: remaining listeners still run; the first error is
//!   returned from [`Document::dispatch`] and the rest are logged.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::Rc;

use crate::error::{BindError, Result};
use crate::tree::{DomEvent, Listener, NodeId, NodeKind, RenderTree};

/// Elements that never have children or a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

#[must_use]
pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

struct NodeData {
    kind: NodeKind,
    /// Tag name for elements, empty otherwise.
    tag: String,
    attrs: Vec<(String, String)>,
    /// Character data for text nodes.
    text: String,
    /// Value property for elements.
    value: String,
    /// Opaque content set through `set_raw_content`; replaces children.
    raw: Option<String>,
    listeners: Vec<(String, Listener)>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Slot is on the free list.
    released: bool,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            tag: String::new(),
            attrs: Vec::new(),
            text: String::new(),
            value: String::new(),
            raw: None,
            listeners: Vec::new(),
            parent: None,
            children: Vec::new(),
            released: false,
        }
    }
}

#[derive(Default)]
struct Arena {
    nodes: Vec<NodeData>,
    free: Vec<NodeId>,
}

impl Arena {
    fn push(&mut self, data: NodeData) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.nodes[id.0] = data;
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(data);
        id
    }

    fn get(&self, node: NodeId) -> Option<&NodeData> {
        self.nodes.get(node.0).filter(|n| !n.released)
    }

    fn get_mut(&mut self, node: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(node.0).filter(|n| !n.released)
    }

    fn live(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Return `node` and its whole subtree to the free list.
    ///
    /// The caller unlinks `node` from its parent first.
    fn release(&mut self, node: NodeId) {
        let Some(data) = self.get_mut(node) else {
            return;
        };
        let children = std::mem::take(&mut data.children);
        let mut slot = NodeData::new(data.kind);
        slot.released = true;
        // Dropping listeners here releases whatever their closures captured.
        *data = slot;
        self.free.push(node);
        for child in children {
            self.release(child);
        }
    }

    fn unlink(&mut self, child: NodeId) {
        let Some(parent) = self.get(child).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|c| *c != child);
        }
        if let Some(c) = self.get_mut(child) {
            c.parent = None;
        }
    }

    /// Discard every child of `node`, releasing their slots.
    fn clear_children(&mut self, node: NodeId) {
        let children = match self.get_mut(node) {
            Some(n) => std::mem::take(&mut n.children),
            None => return,
        };
        for child in children {
            self.release(child);
        }
    }

    /// The sole child of `node` when it is a text node.
    fn only_text_child(&self, node: NodeId) -> Option<NodeId> {
        match self.get(node)?.children.as_slice() {
            [child] if self.get(*child).is_some_and(|c| c.kind == NodeKind::Text) => Some(*child),
            _ => None,
        }
    }

    fn text_of(&self, node: NodeId, out: &mut String) {
        let Some(data) = self.get(node) else {
            return;
        };
        match data.kind {
            NodeKind::Text => out.push_str(&data.text),
            NodeKind::Element | NodeKind::Fragment => {
                if let Some(raw) = &data.raw {
                    out.push_str(raw);
                    return;
                }
                for child in &data.children {
                    self.text_of(*child, out);
                }
            }
        }
    }

    fn matches(&self, node: NodeId, selector: &str) -> bool {
        let Some(data) = self.get(node) else {
            return false;
        };
        if data.kind != NodeKind::Element {
            return false;
        }
        let attr = |name: &str| {
            data.attrs
                .iter()
                .find_map(|(n, v)| (n == name).then_some(v.as_str()))
        };
        if let Some(id) = selector.strip_prefix('#') {
            attr("id") == Some(id)
        } else if let Some(class) = selector.strip_prefix('.') {
            attr("class").is_some_and(|c| c.split_whitespace().any(|t| t == class))
        } else {
            data.tag.eq_ignore_ascii_case(selector)
        }
    }

    fn find(&self, node: NodeId, selector: &str) -> Option<NodeId> {
        if self.matches(node, selector) {
            return Some(node);
        }
        let data = self.get(node)?;
        data.children.iter().find_map(|c| self.find(*c, selector))
    }

    fn write_markup(&self, node: NodeId, out: &mut String) {
        let Some(data) = self.get(node) else {
            return;
        };
        match data.kind {
            NodeKind::Text => escape_text(&data.text, out),
            NodeKind::Fragment => self.write_inner(data, out),
            NodeKind::Element => {
                out.push('<');
                out.push_str(&data.tag);
                for (name, value) in &data.attrs {
                    out.push(' ');
                    out.push_str(name);
                    if !value.is_empty() {
                        out.push_str("=\"");
                        escape_attr(value, out);
                        out.push('"');
                    }
                }
                out.push('>');
                if is_void_element(&data.tag) {
                    return;
                }
                self.write_inner(data, out);
                let _ = write!(out, "</{}>", data.tag);
            }
        }
    }

    fn write_inner(&self, data: &NodeData, out: &mut String) {
        if let Some(raw) = &data.raw {
            out.push_str(raw);
            return;
        }
        for child in &data.children {
            self.write_markup(*child, out);
        }
    }
}

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

/// Shared handle to an in-memory node arena.
#[derive(Clone, Default)]
pub struct Document {
    arena: Rc<RefCell<Arena>>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.arena.borrow().live())
            .finish()
    }
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_element(&self, tag: impl Into<String>) -> NodeId {
        let mut data = NodeData::new(NodeKind::Element);
        data.tag = tag.into();
        self.arena.borrow_mut().push(data)
    }

    pub fn create_text(&self, text: impl Into<String>) -> NodeId {
        let mut data = NodeData::new(NodeKind::Text);
        data.text = text.into();
        self.arena.borrow_mut().push(data)
    }

    pub fn create_fragment(&self) -> NodeId {
        self.arena.borrow_mut().push(NodeData::new(NodeKind::Fragment))
    }

    /// Append `child` to `parent`, first unlinking it from any previous parent.
    pub fn append_child(&self, parent: NodeId, child: NodeId) {
        let mut arena = self.arena.borrow_mut();
        if arena.get(parent).is_none() || arena.get(child).is_none() || parent == child {
            return;
        }
        arena.unlink(child);
        if let Some(p) = arena.get_mut(parent) {
            p.raw = None;
            p.children.push(child);
        }
        if let Some(c) = arena.get_mut(child) {
            c.parent = Some(parent);
        }
    }

    #[must_use]
    pub fn tag(&self, node: NodeId) -> Option<String> {
        let arena = self.arena.borrow();
        arena
            .get(node)
            .filter(|n| n.kind == NodeKind::Element)
            .map(|n| n.tag.clone())
    }

    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.arena.borrow().get(node).and_then(|n| n.parent)
    }

    /// Number of live nodes, attached or not. Released slots are excluded.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.arena.borrow().live()
    }

    #[must_use]
    pub fn listener_count(&self, node: NodeId, event: &str) -> usize {
        self.arena
            .borrow()
            .get(node)
            .map_or(0, |n| n.listeners.iter().filter(|(e, _)| e == event).count())
    }

    /// Outer markup of `node` (inner markup for fragments).
    #[must_use]
    pub fn to_markup(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.arena.borrow().write_markup(node, &mut out);
        out
    }

    /// Markup of `node`'s children only.
    #[must_use]
    pub fn inner_markup(&self, node: NodeId) -> String {
        let arena = self.arena.borrow();
        let mut out = String::new();
        if let Some(data) = arena.get(node) {
            arena.write_inner(data, &mut out);
        }
        out
    }

    /// Deliver `event` to every listener registered on `node` for its name.
    ///
    /// Listeners run in registration order. A failing listener does not stop
    /// the others; the first error is returned once all have run.
    pub fn dispatch_event(&self, node: NodeId, mut event: DomEvent) -> Result<()> {
        let listeners: Vec<Listener> = {
            let arena = self.arena.borrow();
            let Some(data) = arena.get(node) else {
                return Ok(());
            };
            event.target = node;
            event.target_value = data.value.clone();
            data.listeners
                .iter()
                .filter(|(name, _)| *name == event.name)
                .map(|(_, l)| Rc::clone(l))
                .collect()
        };
        let mut first: Option<BindError> = None;
        for listener in listeners {
            if let Err(err) = listener(&event) {
                tracing::warn!(event = %event.name, node = %node, error = %err, "listener failed");
                first.get_or_insert(err);
            }
        }
        first.map_or(Ok(()), Err)
    }

    /// Dispatch a bare event named `name` on `node`.
    pub fn dispatch(&self, node: NodeId, name: &str) -> Result<()> {
        self.dispatch_event(node, DomEvent::new(name, node))
    }

    /// Simulate user input: set the value property, then dispatch `input`.
    pub fn input(&self, node: NodeId, value: &str) -> Result<()> {
        self.set_value(node, value);
        self.dispatch(node, "input")
    }
}

impl RenderTree for Document {
    fn kind(&self, node: NodeId) -> Option<NodeKind> {
        self.arena.borrow().get(node).map(|n| n.kind)
    }

    fn attributes(&self, node: NodeId) -> Vec<(String, String)> {
        self.arena
            .borrow()
            .get(node)
            .map(|n| n.attrs.clone())
            .unwrap_or_default()
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        let mut arena = self.arena.borrow_mut();
        let Some(data) = arena.get_mut(node) else {
            return;
        };
        if data.kind != NodeKind::Element {
            return;
        }
        match data.attrs.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => data.attrs.push((name.to_string(), value.to_string())),
        }
    }

    fn remove_attribute(&self, node: NodeId, name: &str) {
        if let Some(data) = self.arena.borrow_mut().get_mut(node) {
            data.attrs.retain(|(n, _)| n != name);
        }
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.arena
            .borrow()
            .get(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn add_listener(&self, node: NodeId, event: &str, listener: Listener) {
        if let Some(data) = self.arena.borrow_mut().get_mut(node) {
            data.listeners.push((event.to_string(), listener));
        }
    }

    fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.arena.borrow().text_of(node, &mut out);
        out
    }

    fn set_text_content(&self, node: NodeId, text: &str) {
        let kind = self.kind(node);
        match kind {
            Some(NodeKind::Text) => {
                if let Some(data) = self.arena.borrow_mut().get_mut(node) {
                    data.text = text.to_string();
                }
            }
            Some(NodeKind::Element | NodeKind::Fragment) => {
                let mut arena = self.arena.borrow_mut();
                if !text.is_empty()
                    && let Some(child) = arena.only_text_child(node)
                {
                    if let Some(data) = arena.get_mut(child) {
                        data.text = text.to_string();
                    }
                    return;
                }
                arena.clear_children(node);
                if let Some(data) = arena.get_mut(node) {
                    data.raw = None;
                }
                if !text.is_empty() {
                    let mut data = NodeData::new(NodeKind::Text);
                    data.text = text.to_string();
                    data.parent = Some(node);
                    let child = arena.push(data);
                    if let Some(parent) = arena.get_mut(node) {
                        parent.children.push(child);
                    }
                }
            }
            None => {}
        }
    }

    fn set_raw_content(&self, node: NodeId, raw: &str) {
        let mut arena = self.arena.borrow_mut();
        if arena.get(node).is_none_or(|n| n.kind == NodeKind::Text) {
            return;
        }
        arena.clear_children(node);
        if let Some(data) = arena.get_mut(node) {
            data.raw = Some(raw.to_string());
        }
    }

    fn value(&self, node: NodeId) -> String {
        self.arena
            .borrow()
            .get(node)
            .map(|n| n.value.clone())
            .unwrap_or_default()
    }

    fn set_value(&self, node: NodeId, value: &str) {
        if let Some(data) = self.arena.borrow_mut().get_mut(node) {
            data.value = value.to_string();
        }
    }

    fn detach_children(&self, node: NodeId) -> NodeId {
        let fragment = self.create_fragment();
        for child in self.children(node) {
            self.append_child(fragment, child);
        }
        fragment
    }

    fn attach_children(&self, node: NodeId, fragment: NodeId) {
        for child in self.children(fragment) {
            self.append_child(node, child);
        }
        let mut arena = self.arena.borrow_mut();
        let emptied = arena
            .get(fragment)
            .is_some_and(|f| f.kind == NodeKind::Fragment && f.parent.is_none() && f.children.is_empty());
        if emptied {
            arena.release(fragment);
        }
    }

    fn query(&self, selector: &str) -> Option<NodeId> {
        let selector = selector.trim();
        if selector.is_empty() {
            return None;
        }
        let arena = self.arena.borrow();
        (0..arena.nodes.len())
            .map(NodeId)
            .filter(|id| {
                arena
                    .get(*id)
                    .is_some_and(|n| n.parent.is_none() && n.kind != NodeKind::Fragment)
            })
            .find_map(|root| arena.find(root, selector))
    }
}
