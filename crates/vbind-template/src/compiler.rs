#![forbid(unsafe_code)]

//! Template compiler.
//!
//! Compiling a root node moves its children into an off-tree fragment,
//! walks the fragment depth-first binding every directive attribute and
//! every interpolated text node, then moves the children back under the
//! root. The root's own attributes are not compiled.
//!
//! # Invariants
//!
//! 1. Children of an element carrying a content-replacing directive
//!    (`text`, `html`) are not compiled; the directive owns that content.
//! 2. Directive attributes (including shorthands) are removed from the
//!    element once bound; plain attributes are left untouched.
//! 3. Child order is preserved across detach/compile/reattach.
//!
//! # Failure Modes
//!
//! The first binding error aborts the whole compile. The staged children
//! are not reattached, so the root is left empty, and every watcher created
//! so far is dropped with the failed [`Mounted`] scope.

use std::rc::Rc;
use std::time::Instant;

use vbind_core::{NodeId, NodeKind, RenderTree, Result};
use vbind_runtime::{Context, Interpolation, WatcherScope};

use crate::bindings::{self, BindEnv};
use crate::methods::Methods;
use crate::syntax::Syntax;

/// Counters collected while compiling one root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileStats {
    pub elements: usize,
    pub text_nodes: usize,
    pub directives: usize,
    pub interpolations: usize,
}

/// Result of a successful compile: the watchers keeping the bindings alive.
#[derive(Debug)]
pub struct Mounted {
    pub scope: WatcherScope,
    pub stats: CompileStats,
}

pub struct Compiler {
    tree: Rc<dyn RenderTree>,
    context: Context,
    methods: Methods,
    syntax: Syntax,
}

impl Compiler {
    pub fn new(tree: Rc<dyn RenderTree>, context: Context, methods: Methods, syntax: Syntax) -> Self {
        Self {
            tree,
            context,
            methods,
            syntax,
        }
    }

    #[must_use]
    pub fn syntax(&self) -> &Syntax {
        &self.syntax
    }

    /// Compile everything under `root` and reattach it.
    pub fn mount(&self, root: NodeId) -> Result<Mounted> {
        let started = Instant::now();
        let span = tracing::debug_span!(
            "vbind.compile",
            root = %root,
            directives = tracing::field::Empty,
            watchers = tracing::field::Empty,
            duration_us = tracing::field::Empty
        );
        let _guard = span.enter();

        let mut pass = Pass {
            env: BindEnv {
                tree: &self.tree,
                context: &self.context,
                methods: &self.methods,
                syntax: &self.syntax,
            },
            scope: WatcherScope::new(),
            stats: CompileStats::default(),
        };

        let fragment = self.tree.detach_children(root);
        if let Err(err) = pass.children(fragment) {
            tracing::warn!(root = %root, error = %err, "compile failed");
            return Err(err);
        }
        self.tree.attach_children(root, fragment);

        let Pass { scope, stats, .. } = pass;
        span.record("directives", stats.directives);
        span.record("watchers", scope.len());
        span.record("duration_us", started.elapsed().as_micros() as u64);
        tracing::debug!(
            elements = stats.elements,
            text_nodes = stats.text_nodes,
            interpolations = stats.interpolations,
            "vbind.mounted"
        );
        Ok(Mounted { scope, stats })
    }
}

struct Pass<'a> {
    env: BindEnv<'a>,
    scope: WatcherScope,
    stats: CompileStats,
}

impl Pass<'_> {
    fn children(&mut self, parent: NodeId) -> Result<()> {
        for child in self.env.tree.children(parent) {
            self.node(child)?;
        }
        Ok(())
    }

    fn node(&mut self, node: NodeId) -> Result<()> {
        match self.env.tree.kind(node) {
            Some(NodeKind::Element) => self.element(node),
            Some(NodeKind::Text) => self.text(node),
            Some(NodeKind::Fragment) => self.children(node),
            None => Ok(()),
        }
    }

    fn element(&mut self, node: NodeId) -> Result<()> {
        self.stats.elements += 1;
        let mut owns_content = false;
        for (name, value) in self.env.tree.attributes(node) {
            let Some(directive) = self.env.syntax.classify(&name)? else {
                continue;
            };
            bindings::bind(self.env, &mut self.scope, node, &directive, &value)?;
            self.env.tree.remove_attribute(node, &name);
            self.stats.directives += 1;
            owns_content |= directive.replaces_content();
        }
        if owns_content {
            return Ok(());
        }
        self.children(node)
    }

    fn text(&mut self, node: NodeId) -> Result<()> {
        self.stats.text_nodes += 1;
        let syntax = self.env.syntax;
        let content = self.env.tree.text_content(node);
        if !Interpolation::detect(&content, &syntax.open_delimiter, &syntax.close_delimiter) {
            return Ok(());
        }
        bindings::bind_interpolation(self.env, &mut self.scope, node, &content)?;
        self.stats.interpolations += 1;
        Ok(())
    }
}
