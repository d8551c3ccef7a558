#![forbid(unsafe_code)]

//! Error taxonomy shared by every vbind layer.
//!
//! All errors surface synchronously to whatever triggered them: the write
//! that failed to resolve a path, the compile that met a bad directive, or
//! the event dispatch whose handler failed. Nothing is retried internally.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BindError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// A dotted path reached a non-object before its final segment.
    #[error("cannot resolve `{segment}` in `{path}`: parent is not an object")]
    PathResolution { path: String, segment: String },

    #[error("event directive references undefined method `{name}`")]
    MissingHandler { name: String },

    #[error("unrecognized directive `{name}`")]
    UnrecognizedDirective { name: String },

    #[error("directive `{directive}` requires an argument (e.g. `{directive}:name`)")]
    MissingDirectiveArgument { directive: String },

    #[error("invalid expression `{expr}`")]
    InvalidExpression { expr: String },

    #[error("root element not found for selector `{selector}`")]
    RootNotFound { selector: String },

    #[error("unknown data field `{name}`")]
    UnknownField { name: String },

    #[error("data must be an object")]
    DataNotObject,

    #[error("value graph contains a cycle")]
    CyclicValue,

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("handler failed: {message}")]
    Handler { message: String },
}

impl BindError {
    #[must_use]
    pub fn path(path: impl Into<String>, segment: impl Into<String>) -> Self {
        Self::PathResolution {
            path: path.into(),
            segment: segment.into(),
        }
    }

    #[must_use]
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Whether this error was raised while compiling a template (as opposed
    /// to a runtime write or event).
    #[must_use]
    pub fn is_compile_error(&self) -> bool {
        matches!(
            self,
            Self::MissingHandler { .. }
                | Self::UnrecognizedDirective { .. }
                | Self::MissingDirectiveArgument { .. }
                | Self::InvalidExpression { .. }
                | Self::RootNotFound { .. }
        )
    }
}
