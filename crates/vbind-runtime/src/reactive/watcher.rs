#![forbid(unsafe_code)]

//! Watchers: one path expression bound to one update callback.
//!
//! A [`Watcher`] evaluates its path on construction with its own
//! [`Tracker`], which registers it with every field the path passes
//! through. When any of those fields is written, the watcher re-evaluates
//! (re-tracking, so objects assigned later are observed too) and invokes
//! its callback if the result is not strictly equal to the last observed
//! value.
//!
//! # Invariants
//!
//! 1. The baseline is updated before the callback runs, so the callback
//!    fires exactly once per distinct value transition.
//! 2. Evaluation takes an explicit tracker; there is no ambient "current
//!    watcher" state, so a callback may trigger other watchers freely.
//! 3. Dependencies hold watchers weakly; a watcher lives as long as some
//!    handle (usually a [`WatcherScope`]) owns it.
//!
//! # Failure Modes
//!
//! - Evaluation fails (path through a non-object): the error propagates and
//!   the baseline is left unchanged.
//! - Callback fails: the baseline already reflects the new value; the error
//!   propagates to the write that triggered the update.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use vbind_core::Result;

use super::dep::{SubscriberId, Subscriber, Tracker};
use super::object::ReactiveObject;
use crate::eval::{Path, get_value};
use crate::value::Value;

/// Callback invoked with the new value after a change.
pub type Callback = Box<dyn Fn(&Value) -> Result<()>>;

struct WatcherInner {
    tracker: Tracker,
    data: ReactiveObject,
    expr: Path,
    callback: Callback,
    baseline: RefCell<Value>,
    fired: Cell<u64>,
}

impl WatcherInner {
    fn evaluate(&self) -> Result<Value> {
        get_value(&self.expr, &self.data, Some(&self.tracker))
    }
}

impl Subscriber for WatcherInner {
    fn id(&self) -> SubscriberId {
        self.tracker.id()
    }

    fn update(&self) -> Result<()> {
        let next = self.evaluate()?;
        if self.baseline.borrow().strict_eq(&next) {
            return Ok(());
        }
        self.baseline.replace(next.clone());
        self.fired.set(self.fired.get() + 1);
        tracing::debug!(watcher = %self.tracker.id(), expr = %self.expr, "watcher fired");
        (self.callback)(&next)
    }
}

/// A subscriber binding a path expression to an update callback.
///
/// Cloning yields another handle to the same watcher.
#[derive(Clone)]
pub struct Watcher {
    inner: Rc<WatcherInner>,
}

impl Watcher {
    /// Create a watcher and perform its first (tracked) evaluation.
    ///
    /// The callback is not invoked for the initial value.
    pub fn new(
        data: &ReactiveObject,
        expr: Path,
        callback: impl Fn(&Value) -> Result<()> + 'static,
    ) -> Result<Self> {
        let id = SubscriberId::next();
        let inner = Rc::new_cyclic(|weak: &Weak<WatcherInner>| {
            let subscriber: Weak<dyn Subscriber> = weak.clone();
            WatcherInner {
                tracker: Tracker::new(id, subscriber),
                data: data.clone(),
                expr,
                callback: Box::new(callback),
                baseline: RefCell::new(Value::Undefined),
                fired: Cell::new(0),
            }
        });
        let initial = inner.evaluate()?;
        inner.baseline.replace(initial);
        Ok(Self { inner })
    }

    #[must_use]
    pub fn id(&self) -> SubscriberId {
        self.inner.tracker.id()
    }

    #[must_use]
    pub fn expr(&self) -> &Path {
        &self.inner.expr
    }

    /// Last observed value.
    #[must_use]
    pub fn value(&self) -> Value {
        self.inner.baseline.borrow().clone()
    }

    /// How many times the callback has been invoked.
    #[must_use]
    pub fn fire_count(&self) -> u64 {
        self.inner.fired.get()
    }

    /// Re-evaluate now, as if a dependency had changed.
    pub fn update(&self) -> Result<()> {
        self.inner.update()
    }
}

impl fmt::Debug for Watcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("id", &self.id())
            .field("expr", &self.inner.expr.as_str())
            .field("value", &*self.inner.baseline.borrow())
            .field("fired", &self.inner.fired.get())
            .finish()
    }
}

/// Owns the watchers of a logical scope (a mounted template).
///
/// Dropping the scope (or calling [`clear`](Self::clear)) releases every
/// watcher; dependencies then prune them on their next notification.
#[derive(Default)]
pub struct WatcherScope {
    watchers: Vec<Watcher>,
}

impl WatcherScope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a watcher and keep it alive in this scope.
    pub fn watch(
        &mut self,
        data: &ReactiveObject,
        expr: Path,
        callback: impl Fn(&Value) -> Result<()> + 'static,
    ) -> Result<Watcher> {
        let watcher = Watcher::new(data, expr, callback)?;
        self.watchers.push(watcher.clone());
        Ok(watcher)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.watchers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.watchers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Watcher> {
        self.watchers.iter()
    }

    pub fn clear(&mut self) {
        self.watchers.clear();
    }
}

impl fmt::Debug for WatcherScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatcherScope")
            .field("watchers", &self.watchers.len())
            .finish()
    }
}
