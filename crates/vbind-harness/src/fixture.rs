#![forbid(unsafe_code)]

//! Parsed markup fixtures with lookup helpers.

use vbind_core::{Document, NodeId, RenderTree};

use crate::markup::{MarkupError, parse_markup};

/// A [`Document`] built from markup, rooted at its first top-level element.
#[derive(Debug, Clone)]
pub struct Fixture {
    doc: Document,
    root: NodeId,
}

impl Fixture {
    pub fn parse(markup: &str) -> Result<Self, MarkupError> {
        let doc = Document::new();
        let root = parse_markup(&doc, markup)?
            .into_iter()
            .find(|&node| doc.is_element(node))
            .ok_or(MarkupError::NoRoot)?;
        Ok(Self { doc, root })
    }

    #[must_use]
    pub fn doc(&self) -> &Document {
        &self.doc
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// First node matching `selector` (`#id`, `.class`, or tag).
    #[must_use]
    pub fn find(&self, selector: &str) -> Option<NodeId> {
        self.doc.query(selector)
    }

    #[must_use]
    pub fn text(&self, selector: &str) -> Option<String> {
        self.find(selector).map(|node| self.doc.text_content(node))
    }

    #[must_use]
    pub fn attr(&self, selector: &str, name: &str) -> Option<String> {
        self.find(selector)
            .and_then(|node| self.doc.attribute(node, name))
    }

    #[must_use]
    pub fn value(&self, selector: &str) -> Option<String> {
        self.find(selector).map(|node| self.doc.value(node))
    }

    /// Serialised root, including its own tag.
    #[must_use]
    pub fn markup(&self) -> String {
        self.doc.to_markup(self.root)
    }

    /// Serialised children of the root.
    #[must_use]
    pub fn inner(&self) -> String {
        self.doc.inner_markup(self.root)
    }
}
