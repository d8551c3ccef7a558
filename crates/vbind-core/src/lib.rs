#![forbid(unsafe_code)]

//! Core: error taxonomy, the render-tree contract, and an in-memory document.

pub mod dom;
pub mod error;
pub mod tree;

pub use dom::Document;
pub use error::{BindError, Result};
pub use tree::{DomEvent, Listener, NodeId, NodeKind, RenderTree};
