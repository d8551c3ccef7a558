#![forbid(unsafe_code)]

//! Directive vocabulary, bindings, and the template compiler.
//!
//! [`Syntax`] classifies attribute names into [`Directive`]s, [`bindings`]
//! wires each directive to the reactive store, and [`Compiler`] walks a
//! root's subtree applying both.

pub mod bindings;
pub mod compiler;
pub mod directive;
pub mod methods;
pub mod syntax;

pub use bindings::{BindEnv, MODEL_EVENT, Updater};
pub use compiler::{CompileStats, Compiler, Mounted};
pub use directive::Directive;
pub use methods::{Handler, Methods};
pub use syntax::Syntax;
