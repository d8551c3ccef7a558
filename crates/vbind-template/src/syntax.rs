#![forbid(unsafe_code)]

//! Template syntax configuration and directive classification.
//!
//! [`Syntax`] decides which attribute names are directives and which
//! delimiters mark interpolation. The defaults are:
//!
//! | Form | Meaning |
//! |---|---|
//! | `v-text="path"` | text content |
//! | `v-html="path"` | raw content |
//! | `v-model="path"` | two-way value binding |
//! | `v-on:event="method"`, `@event="method"` | event handler |
//! | `v-bind:attr="path"`, `:attr="path"` | attribute binding |
//! | `{{ path }}` | interpolation in text |
//!
//! A syntax can be loaded from TOML or JSON; omitted keys keep defaults.
//!
//! ```toml
//! directive_prefix = "x-"
//! event_shorthand = "@"
//! open_delimiter = "[["
//! close_delimiter = "]]"
//! ```

use serde::{Deserialize, Serialize};
use vbind_core::{BindError, Result};

use crate::directive::Directive;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Syntax {
    pub directive_prefix: String,
    /// Shorthand for `<prefix>on:`; `None` disables it.
    pub event_shorthand: Option<String>,
    /// Shorthand for `<prefix>bind:`; `None` disables it.
    pub bind_shorthand: Option<String>,
    pub open_delimiter: String,
    pub close_delimiter: String,
}

impl Default for Syntax {
    fn default() -> Self {
        Self {
            directive_prefix: "v-".to_string(),
            event_shorthand: Some("@".to_string()),
            bind_shorthand: Some(":".to_string()),
            open_delimiter: "{{".to_string(),
            close_delimiter: "}}".to_string(),
        }
    }
}

impl Syntax {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let syntax: Self = toml::from_str(source).map_err(|e| BindError::config(e.to_string()))?;
        syntax.validate()?;
        Ok(syntax)
    }

    pub fn from_json_str(source: &str) -> Result<Self> {
        let syntax: Self =
            serde_json::from_str(source).map_err(|e| BindError::config(e.to_string()))?;
        syntax.validate()?;
        Ok(syntax)
    }

    /// Reject syntaxes that cannot be classified unambiguously.
    pub fn validate(&self) -> Result<()> {
        if self.directive_prefix.is_empty() {
            return Err(BindError::config("directive_prefix must not be empty"));
        }
        if self.open_delimiter.is_empty() || self.close_delimiter.is_empty() {
            return Err(BindError::config("interpolation delimiters must not be empty"));
        }
        let mut prefixes = vec![self.directive_prefix.as_str()];
        for (key, shorthand) in [
            ("event_shorthand", &self.event_shorthand),
            ("bind_shorthand", &self.bind_shorthand),
        ] {
            if let Some(s) = shorthand {
                if s.is_empty() {
                    return Err(BindError::config(format!("{key} must not be empty")));
                }
                prefixes.push(s);
            }
        }
        for (i, a) in prefixes.iter().enumerate() {
            for b in &prefixes[i + 1..] {
                if a.starts_with(b) || b.starts_with(a) {
                    return Err(BindError::config(format!(
                        "attribute prefixes `{a}` and `{b}` overlap"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Classify an attribute name.
    ///
    /// Returns `Ok(None)` for plain attributes. Names carrying a directive
    /// prefix or shorthand must parse into a known [`Directive`]. A bind
    /// target may not itself be a directive name, since the written
    /// attribute would outlive compilation.
    pub fn classify(&self, name: &str) -> Result<Option<Directive>> {
        if let Some(event) = strip(name, self.event_shorthand.as_deref()) {
            return Directive::with_argument("on", event, name).map(Some);
        }
        let directive = if let Some(attr) = strip(name, self.bind_shorthand.as_deref()) {
            Directive::with_argument("bind", attr, name)?
        } else {
            let Some(rest) = name.strip_prefix(self.directive_prefix.as_str()) else {
                return Ok(None);
            };
            let (kind, argument) = match rest.split_once(':') {
                Some((kind, arg)) => (kind, Some(arg)),
                None => (rest, None),
            };
            Directive::parse(kind, argument, name)?
        };
        if let Directive::Bind { attr } = &directive
            && self.is_directive_name(attr)
        {
            return Err(BindError::UnrecognizedDirective {
                name: name.to_string(),
            });
        }
        Ok(Some(directive))
    }

    /// Whether `name` carries the directive prefix or an enabled shorthand.
    #[must_use]
    pub fn is_directive_name(&self, name: &str) -> bool {
        name.starts_with(self.directive_prefix.as_str())
            || strip(name, self.event_shorthand.as_deref()).is_some()
            || strip(name, self.bind_shorthand.as_deref()).is_some()
    }
}

fn strip<'a>(name: &'a str, prefix: Option<&str>) -> Option<&'a str> {
    prefix.and_then(|p| name.strip_prefix(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_vocabulary() {
        let s = Syntax::default();
        assert_eq!(s.classify("v-text").unwrap(), Some(Directive::Text));
        assert_eq!(s.classify("v-html").unwrap(), Some(Directive::Html));
        assert_eq!(s.classify("v-model").unwrap(), Some(Directive::Model));
        assert_eq!(
            s.classify("v-on:click").unwrap(),
            Some(Directive::On {
                event: "click".into()
            })
        );
        assert_eq!(
            s.classify("@input").unwrap(),
            Some(Directive::On {
                event: "input".into()
            })
        );
        assert_eq!(
            s.classify("v-bind:title").unwrap(),
            Some(Directive::Bind {
                attr: "title".into()
            })
        );
        assert_eq!(
            s.classify(":href").unwrap(),
            Some(Directive::Bind {
                attr: "href".into()
            })
        );
        assert_eq!(s.classify("class").unwrap(), None);
        assert_eq!(s.classify("data-v-x").unwrap(), None);
    }

    #[test]
    fn unknown_and_incomplete_directives() {
        let s = Syntax::default();
        assert_eq!(
            s.classify("v-frobnicate"),
            Err(BindError::UnrecognizedDirective {
                name: "v-frobnicate".into()
            })
        );
        assert_eq!(
            s.classify("v-on"),
            Err(BindError::MissingDirectiveArgument {
                directive: "v-on".into()
            })
        );
        assert_eq!(
            s.classify("@"),
            Err(BindError::MissingDirectiveArgument {
                directive: "@".into()
            })
        );
        assert_eq!(
            s.classify("v-bind:"),
            Err(BindError::MissingDirectiveArgument {
                directive: "v-bind:".into()
            })
        );
    }

    #[test]
    fn bind_targets_cannot_be_directives() {
        let s = Syntax::default();
        for name in [":v-text", "v-bind:v-html", ":@click", "v-bind::href"] {
            assert_eq!(
                s.classify(name),
                Err(BindError::UnrecognizedDirective { name: name.into() }),
                "{name}"
            );
        }
        assert!(s.is_directive_name("v-model"));
        assert!(!s.is_directive_name("data-v"));
        assert_eq!(
            s.classify(":data-v").unwrap(),
            Some(Directive::Bind {
                attr: "data-v".into()
            })
        );
    }

    #[test]
    fn disabled_shorthands_are_plain() {
        let s = Syntax {
            event_shorthand: None,
            bind_shorthand: None,
            ..Syntax::default()
        };
        assert_eq!(s.classify("@click").unwrap(), None);
        assert_eq!(s.classify(":href").unwrap(), None);
    }

    #[test]
    fn toml_overrides_keep_defaults() {
        let s = Syntax::from_toml_str(
            r#"
directive_prefix = "x-"
open_delimiter = "[["
close_delimiter = "]]"
"#,
        )
        .unwrap();
        assert_eq!(s.directive_prefix, "x-");
        assert_eq!(s.event_shorthand.as_deref(), Some("@"));
        assert_eq!(s.open_delimiter, "[[");
        assert_eq!(s.classify("x-text").unwrap(), Some(Directive::Text));
        assert_eq!(s.classify("v-text").unwrap(), None);
    }

    #[test]
    fn json_loading_and_unknown_keys() {
        let s = Syntax::from_json_str(r#"{"bind_shorthand": null}"#).unwrap();
        assert_eq!(s.bind_shorthand, None);
        assert!(matches!(
            Syntax::from_json_str(r#"{"prefix": "v-"}"#),
            Err(BindError::InvalidConfig { .. })
        ));
        assert!(matches!(
            Syntax::from_toml_str("directive_prefix = 3"),
            Err(BindError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn validation_rejects_ambiguous_syntax() {
        let empty_prefix = Syntax {
            directive_prefix: String::new(),
            ..Syntax::default()
        };
        assert!(empty_prefix.validate().is_err());

        let overlapping = Syntax {
            event_shorthand: Some("v".into()),
            ..Syntax::default()
        };
        assert!(overlapping.validate().is_err());

        let empty_delims = Syntax {
            close_delimiter: String::new(),
            ..Syntax::default()
        };
        assert!(empty_delims.validate().is_err());

        assert!(Syntax::default().validate().is_ok());
    }
}
