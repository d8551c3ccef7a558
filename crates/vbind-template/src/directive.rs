#![forbid(unsafe_code)]

//! The closed set of directive kinds.

use std::fmt;

use vbind_core::{BindError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Text content from a path or an interpolated string.
    Text,
    /// Raw content, set verbatim.
    Html,
    /// Two-way value binding.
    Model,
    /// Event listener calling a named method.
    On { event: String },
    /// Attribute value from a path.
    Bind { attr: String },
}

impl Directive {
    /// Parse a directive kind with its optional `:argument`.
    ///
    /// `attribute` is the full attribute name, used for error reporting.
    pub fn parse(kind: &str, argument: Option<&str>, attribute: &str) -> Result<Self> {
        match kind {
            "text" => Ok(Self::Text),
            "html" => Ok(Self::Html),
            "model" => Ok(Self::Model),
            "on" | "bind" => Self::with_argument(kind, argument.unwrap_or_default(), attribute),
            _ => Err(BindError::UnrecognizedDirective {
                name: attribute.to_string(),
            }),
        }
    }

    pub(crate) fn with_argument(kind: &str, argument: &str, attribute: &str) -> Result<Self> {
        if argument.is_empty() {
            return Err(BindError::MissingDirectiveArgument {
                directive: attribute.to_string(),
            });
        }
        let argument = argument.to_string();
        match kind {
            "on" => Ok(Self::On { event: argument }),
            "bind" => Ok(Self::Bind { attr: argument }),
            _ => Err(BindError::UnrecognizedDirective {
                name: attribute.to_string(),
            }),
        }
    }

    /// Whether the directive replaces the element's children, which are
    /// then not compiled.
    #[must_use]
    pub fn replaces_content(&self) -> bool {
        matches!(self, Self::Text | Self::Html)
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Html => f.write_str("html"),
            Self::Model => f.write_str("model"),
            Self::On { event } => write!(f, "on:{event}"),
            Self::Bind { attr } => write!(f, "bind:{attr}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_kinds() {
        assert_eq!(Directive::parse("text", None, "v-text"), Ok(Directive::Text));
        assert_eq!(
            Directive::parse("on", Some("click"), "v-on:click"),
            Ok(Directive::On {
                event: "click".into()
            })
        );
        // Arguments on argument-less kinds are ignored.
        assert_eq!(
            Directive::parse("html", Some("x"), "v-html:x"),
            Ok(Directive::Html)
        );
    }

    #[test]
    fn parse_unknown_kind_reports_attribute() {
        assert_eq!(
            Directive::parse("show", None, "v-show"),
            Err(BindError::UnrecognizedDirective {
                name: "v-show".into()
            })
        );
    }

    #[test]
    fn display_and_classification() {
        let on = Directive::On {
            event: "click".into(),
        };
        assert_eq!(on.to_string(), "on:click");
        assert!(!on.replaces_content());
        assert!(Directive::Html.replaces_content());
        assert!(
            !Directive::Bind {
                attr: "href".into()
            }
            .replaces_content()
        );
        assert_eq!(Directive::Model.to_string(), "model");
    }
}
