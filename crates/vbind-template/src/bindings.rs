#![forbid(unsafe_code)]

//! Directive bindings: initial render, watcher creation, and view-to-data
//! listeners for each directive kind.
//!
//! Every value directive renders once from current data and registers a
//! watcher whose callback re-applies the matching [`Updater`]. Event
//! directives attach a listener and create no watcher. Two-way bindings
//! additionally listen for `input` and write the node's value back through
//! the store, which notifies every other dependent of the same path.

use std::rc::Rc;

use vbind_core::{BindError, DomEvent, NodeId, RenderTree, Result};
use vbind_runtime::{Context, Interpolation, Path, Value, WatcherScope, set_value};

use crate::directive::Directive;
use crate::methods::Methods;
use crate::syntax::Syntax;

/// Event that carries view-originated edits for two-way bindings.
pub const MODEL_EVENT: &str = "input";

/// How a new value is written into the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Updater {
    Text,
    Html,
    /// Value property; nullish values render as an empty string.
    Model,
    Attr(String),
}

impl Updater {
    pub fn apply(&self, tree: &dyn RenderTree, node: NodeId, value: &Value) {
        match self {
            Self::Text => tree.set_text_content(node, &value.to_string()),
            Self::Html => tree.set_raw_content(node, &value.to_string()),
            Self::Model => {
                let text = if value.is_nullish() {
                    String::new()
                } else {
                    value.to_string()
                };
                tree.set_value(node, &text);
            }
            Self::Attr(name) => tree.set_attribute(node, name, &value.to_string()),
        }
    }
}

/// Everything a binding needs besides the watcher scope.
#[derive(Clone, Copy)]
pub struct BindEnv<'a> {
    pub tree: &'a Rc<dyn RenderTree>,
    pub context: &'a Context,
    pub methods: &'a Methods,
    pub syntax: &'a Syntax,
}

/// Bind one directive occurrence on `node`.
pub fn bind(
    env: BindEnv<'_>,
    scope: &mut WatcherScope,
    node: NodeId,
    directive: &Directive,
    expr: &str,
) -> Result<()> {
    tracing::debug!(node = %node, directive = %directive, expr, "binding directive");
    match directive {
        Directive::Text => {
            let syntax = env.syntax;
            if Interpolation::detect(expr, &syntax.open_delimiter, &syntax.close_delimiter) {
                bind_interpolation(env, scope, node, expr)
            } else {
                bind_path(env, scope, node, expr, Updater::Text)
            }
        }
        Directive::Html => bind_path(env, scope, node, expr, Updater::Html),
        Directive::Model => bind_model(env, scope, node, expr),
        Directive::On { event } => bind_event(env, node, event, expr),
        Directive::Bind { attr } => bind_path(env, scope, node, expr, Updater::Attr(attr.clone())),
    }
}

/// Render `expr` into `node` now and on every change.
pub fn bind_path(
    env: BindEnv<'_>,
    scope: &mut WatcherScope,
    node: NodeId,
    expr: &str,
    updater: Updater,
) -> Result<()> {
    let path = Path::parse(expr)?;
    let tree = Rc::clone(env.tree);
    let on_change = updater.clone();
    let watcher = scope.watch(env.context.data(), path, move |value: &Value| {
        on_change.apply(tree.as_ref(), node, value);
        Ok(())
    })?;
    updater.apply(env.tree.as_ref(), node, &watcher.value());
    Ok(())
}

/// Render an interpolated string into `node`, with one watcher per token.
///
/// Any token change re-renders the whole string.
pub fn bind_interpolation(
    env: BindEnv<'_>,
    scope: &mut WatcherScope,
    node: NodeId,
    template: &str,
) -> Result<()> {
    let syntax = env.syntax;
    let interpolation = Rc::new(Interpolation::parse(
        template,
        &syntax.open_delimiter,
        &syntax.close_delimiter,
    )?);
    for path in interpolation.expressions() {
        let tree = Rc::clone(env.tree);
        let data = env.context.data().clone();
        let render = Rc::clone(&interpolation);
        scope.watch(env.context.data(), path.clone(), move |_: &Value| {
            let text = render.render(&data, None)?;
            tree.set_text_content(node, &text);
            Ok(())
        })?;
    }
    let text = interpolation.render(env.context.data(), None)?;
    env.tree.set_text_content(node, &text);
    Ok(())
}

/// Two-way binding: data drives the value property, `input` events drive data.
pub fn bind_model(
    env: BindEnv<'_>,
    scope: &mut WatcherScope,
    node: NodeId,
    expr: &str,
) -> Result<()> {
    bind_path(env, scope, node, expr, Updater::Model)?;
    let path = Path::parse(expr)?;
    let data = env.context.data().clone();
    env.tree.add_listener(
        node,
        MODEL_EVENT,
        Rc::new(move |event: &DomEvent| set_value(&path, &data, event.target_value.as_str())),
    );
    Ok(())
}

/// Attach the named method as a listener for `event`.
pub fn bind_event(env: BindEnv<'_>, node: NodeId, event: &str, expr: &str) -> Result<()> {
    let name = expr.trim();
    let handler = env
        .methods
        .get(name)
        .ok_or_else(|| BindError::MissingHandler {
            name: name.to_string(),
        })?;
    let context = env.context.clone();
    env.tree.add_listener(
        node,
        event,
        Rc::new(move |ev: &DomEvent| handler(&context, ev)),
    );
    Ok(())
}
