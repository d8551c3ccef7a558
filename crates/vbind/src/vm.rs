#![forbid(unsafe_code)]

//! The view model: a reactive store bound to one root region.
//!
//! [`Vm::new`] wraps the data, resolves the root, and compiles it. After
//! construction, writes through [`Vm::set`] (or through any handler's
//! [`Context`]) update every dependent binding before returning.
//!
//! # Failure Modes
//!
//! - `data` not an object: [`BindError::DataNotObject`].
//! - Selector with no match, or a node handle that is not an element:
//!   [`BindError::RootNotFound`].
//! - Any binding error aborts construction; the root is left empty.

use std::fmt;
use std::rc::Rc;

use vbind_core::{BindError, NodeId, NodeKind, RenderTree, Result};
use vbind_runtime::{Context, ReactiveObject, Value};
use vbind_template::{CompileStats, Compiler, Methods, Mounted, Syntax};

use crate::options::{El, Options};

pub struct Vm {
    context: Context,
    tree: Rc<dyn RenderTree>,
    root: Option<NodeId>,
    methods: Methods,
    syntax: Syntax,
    mounted: Option<Mounted>,
}

impl Vm {
    pub fn new(tree: impl RenderTree + 'static, options: Options) -> Result<Self> {
        Self::with_tree(Rc::new(tree), options)
    }

    /// Like [`new`](Self::new) for a tree that is already shared.
    pub fn with_tree(tree: Rc<dyn RenderTree>, options: Options) -> Result<Self> {
        let Options {
            data,
            el,
            methods,
            syntax,
        } = options;
        syntax.validate()?;

        let store = match data {
            serde_json::Value::Object(map) => ReactiveObject::from_map(map),
            serde_json::Value::Null => ReactiveObject::new(),
            _ => return Err(BindError::DataNotObject),
        };
        let context = Context::new(store);

        let root = el.map(|el| resolve_root(tree.as_ref(), &el)).transpose()?;
        let mounted = match root {
            Some(root) => {
                let compiler = Compiler::new(
                    Rc::clone(&tree),
                    context.clone(),
                    methods.clone(),
                    syntax.clone(),
                );
                Some(compiler.mount(root)?)
            }
            None => None,
        };
        tracing::debug!(
            fields = context.data().len(),
            root = ?root,
            watchers = mounted.as_ref().map_or(0, |m| m.scope.len()),
            "vm created"
        );

        Ok(Self {
            context,
            tree,
            root,
            methods,
            syntax,
            mounted,
        })
    }

    /// Read a top-level field; `None` if it does not exist.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.context.get(name)
    }

    /// Write a top-level field; fails with [`BindError::UnknownField`] for
    /// names not present in the data.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.context.set(name, value)
    }

    pub fn get_path(&self, expr: &str) -> Result<Value> {
        self.context.get_path(expr)
    }

    pub fn set_path(&self, expr: &str, value: impl Into<Value>) -> Result<()> {
        self.context.set_path(expr, value)
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.context.keys()
    }

    #[must_use]
    pub fn context(&self) -> &Context {
        &self.context
    }

    #[must_use]
    pub fn data(&self) -> &ReactiveObject {
        self.context.data()
    }

    /// Snapshot of the current data as JSON.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Value::Object(self.context.data().clone()).to_json()
    }

    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    #[must_use]
    pub fn tree(&self) -> &Rc<dyn RenderTree> {
        &self.tree
    }

    #[must_use]
    pub fn methods(&self) -> &Methods {
        &self.methods
    }

    #[must_use]
    pub fn syntax(&self) -> &Syntax {
        &self.syntax
    }

    /// Number of live watchers owned by this view model.
    #[must_use]
    pub fn watcher_count(&self) -> usize {
        self.mounted.as_ref().map_or(0, |m| m.scope.len())
    }

    #[must_use]
    pub fn stats(&self) -> Option<CompileStats> {
        self.mounted.as_ref().map(|m| m.stats)
    }
}

impl fmt::Debug for Vm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vm")
            .field("root", &self.root)
            .field("keys", &self.keys())
            .field("watchers", &self.watcher_count())
            .finish()
    }
}

fn resolve_root(tree: &dyn RenderTree, el: &El) -> Result<NodeId> {
    let (node, selector) = match el {
        El::Node(node) => (Some(*node), node.to_string()),
        El::Selector(selector) => (tree.query(selector), selector.clone()),
    };
    match node {
        Some(node) if tree.kind(node) == Some(NodeKind::Element) => Ok(node),
        _ => Err(BindError::RootNotFound { selector }),
    }
}
