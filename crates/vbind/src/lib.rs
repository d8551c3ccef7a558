#![forbid(unsafe_code)]

//! vbind public facade.
//!
//! ```
//! use serde_json::json;
//! use vbind::prelude::*;
//!
//! let doc = Document::new();
//! let app = doc.create_element("div");
//! let p = doc.create_element("p");
//! let text = doc.create_text("Hello {{ name }}");
//! doc.append_child(app, p);
//! doc.append_child(p, text);
//!
//! let vm = Vm::new(doc.clone(), Options::new(json!({"name": "Ann"})).with_el(app))?;
//! assert_eq!(doc.text_content(p), "Hello Ann");
//!
//! vm.set("name", "Bob")?;
//! assert_eq!(doc.text_content(p), "Hello Bob");
//! # Ok::<(), vbind::BindError>(())
//! ```

pub mod options;
pub mod vm;

pub use options::{El, Options};
pub use vm::Vm;

pub use vbind_core::{BindError, Document, DomEvent, NodeId, RenderTree, Result};
pub use vbind_runtime::{Context, Value};
pub use vbind_template::{CompileStats, Methods, Syntax};

pub mod prelude {
    pub use crate::{
        BindError, Context, Document, DomEvent, El, Methods, NodeId, Options, RenderTree, Result,
        Syntax, Value, Vm,
    };
    pub use vbind_core as core;
    pub use vbind_runtime as runtime;
    pub use vbind_template as template;
}
