#![forbid(unsafe_code)]

//! Dependency-tracking reactive engine.
//!
//! - [`ReactiveObject`]: an object whose field reads and writes are
//!   intercepted. Tracked reads register the reader; writes notify.
//! - [`Dep`]: the per-field registry of interested subscribers.
//! - [`Watcher`]: binds one path expression to one update callback and
//!   discovers its dependencies by evaluating the path.
//! - [`WatcherScope`]: owns the watchers of a mounted template.
//!
//! # Architecture
//!
//! Everything is single-threaded and synchronous: `Rc<RefCell<..>>` for
//! shared state, `Weak` subscriber references inside each `Dep`. Instead
//! of an ambient "currently evaluating" slot, evaluation receives an
//! explicit [`Tracker`]; the watcher passes its own tracker whenever it
//! evaluates, so nested or re-entrant evaluation cannot misattribute a
//! dependency.
//!
//! # Invariants
//!
//! 1. A write's notifications complete, in registration order, before the
//!    write returns.
//! 2. A subscriber is registered at most once per field.
//! 3. A watcher's callback fires once per distinct value transition under
//!    strict equality.
//! 4. A failing subscriber never prevents the remaining subscribers of the
//!    same field from updating.

pub mod dep;
pub mod object;
pub mod watcher;

pub use dep::{Dep, Subscriber, SubscriberId, Tracker};
pub use object::{ReactiveObject, wrap};
pub use watcher::{Callback, Watcher, WatcherScope};
