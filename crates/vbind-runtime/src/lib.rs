#![forbid(unsafe_code)]

//! Runtime: the reactive store, dependency registry, watchers, and
//! expression evaluation.

pub mod context;
pub mod eval;
pub mod reactive;
pub mod value;

pub use context::Context;
pub use eval::{Interpolation, Part, Path, get_value, set_value};
pub use reactive::{
    Dep, ReactiveObject, Subscriber, SubscriberId, Tracker, Watcher, WatcherScope, wrap,
};
pub use value::Value;
