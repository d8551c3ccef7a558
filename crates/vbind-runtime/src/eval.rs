#![forbid(unsafe_code)]

//! Expression evaluation against the reactive store.
//!
//! Expressions are dotted paths (`user.profile.name`) folded left to right
//! from the root object. Interpolated strings embed paths between
//! delimiters (`"Hello {{ user.name }}!"`) and render by substituting the
//! text form of each resolved path.
//!
//! Reads made with a [`Tracker`] register the tracker with every field they
//! pass through, which is how watchers discover their dependencies.
//!
//! # Failure Modes
//!
//! - Empty path or empty segment: [`BindError::InvalidExpression`].
//! - A segment is looked up on a non-object: [`BindError::PathResolution`]
//!   naming that segment. This applies to reads and writes alike; writes
//!   never create intermediate objects.

use std::fmt;
use std::str::FromStr;

use vbind_core::{BindError, Result};

use crate::reactive::dep::Tracker;
use crate::reactive::object::ReactiveObject;
use crate::value::Value;

/// A parsed dotted path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    source: String,
    segments: Vec<String>,
}

impl Path {
    pub fn parse(expr: &str) -> Result<Self> {
        let source = expr.trim();
        let invalid = || BindError::InvalidExpression {
            expr: expr.to_string(),
        };
        if source.is_empty() {
            return Err(invalid());
        }
        let segments: Vec<String> = source.split('.').map(|s| s.trim().to_string()).collect();
        if segments.iter().any(String::is_empty) {
            return Err(invalid());
        }
        Ok(Self {
            source: segments.join("."),
            segments,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// First segment, i.e. the top-level field the path starts from.
    #[must_use]
    pub fn root_field(&self) -> &str {
        &self.segments[0]
    }
}

impl FromStr for Path {
    type Err = BindError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Resolve `path` from `root`, registering `tracker` along the way.
pub fn get_value(path: &Path, root: &ReactiveObject, tracker: Option<&Tracker>) -> Result<Value> {
    let mut current = Value::Object(root.clone());
    for segment in path.segments() {
        current = match &current {
            Value::Object(obj) => obj.get_tracked(segment, tracker),
            _ => return Err(BindError::path(path.as_str(), segment.as_str())),
        };
    }
    Ok(current)
}

/// Assign `value` to the final segment of `path`.
///
/// Intermediate segments are read untracked; the final write goes through
/// the owning object's interception and notifies its dependents.
pub fn set_value(path: &Path, root: &ReactiveObject, value: impl Into<Value>) -> Result<()> {
    let (last, parents) = path
        .segments()
        .split_last()
        .ok_or_else(|| BindError::InvalidExpression {
            expr: path.to_string(),
        })?;
    let mut current = Value::Object(root.clone());
    for segment in parents {
        current = match &current {
            Value::Object(obj) => obj.get(segment),
            _ => return Err(BindError::path(path.as_str(), segment.as_str())),
        };
    }
    match current {
        Value::Object(obj) => obj.set(last, value),
        _ => Err(BindError::path(path.as_str(), last.as_str())),
    }
}

/// One piece of an interpolated string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Literal(String),
    Expr(Path),
}

/// A string with embedded path expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpolation {
    parts: Vec<Part>,
}

impl Interpolation {
    /// Split `source` on `open`/`close` delimiters.
    ///
    /// A token holds at least one character and never spans a line
    /// terminator (`\n`, `\r`, U+2028, U+2029); an
    /// opening delimiter with no valid close is kept as literal text. Empty
    /// delimiters disable interpolation.
    pub fn parse(source: &str, open: &str, close: &str) -> Result<Self> {
        let mut parts = Vec::new();
        let mut literal = String::new();
        if open.is_empty() || close.is_empty() {
            literal.push_str(source);
        } else {
            let mut rest = source;
            while let Some(start) = rest.find(open) {
                let after = &rest[start + open.len()..];
                match token_end(after, close) {
                    Some(end) => {
                        literal.push_str(&rest[..start]);
                        if !literal.is_empty() {
                            parts.push(Part::Literal(std::mem::take(&mut literal)));
                        }
                        parts.push(Part::Expr(Path::parse(&after[..end])?));
                        rest = &after[end + close.len()..];
                    }
                    None => {
                        let skip = start + rest[start..].chars().next().map_or(1, char::len_utf8);
                        literal.push_str(&rest[..skip]);
                        rest = &rest[skip..];
                    }
                }
            }
            literal.push_str(rest);
        }
        if !literal.is_empty() {
            parts.push(Part::Literal(literal));
        }
        Ok(Self { parts })
    }

    /// Whether `source` contains at least one token.
    #[must_use]
    pub fn detect(source: &str, open: &str, close: &str) -> bool {
        if open.is_empty() || close.is_empty() {
            return false;
        }
        let mut rest = source;
        while let Some(start) = rest.find(open) {
            let after = &rest[start + open.len()..];
            if token_end(after, close).is_some() {
                return true;
            }
            let skip = start + rest[start..].chars().next().map_or(1, char::len_utf8);
            rest = &rest[skip..];
        }
        false
    }

    #[must_use]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Paths referenced by the tokens, in order of appearance.
    pub fn expressions(&self) -> impl Iterator<Item = &Path> {
        self.parts.iter().filter_map(|p| match p {
            Part::Expr(path) => Some(path),
            Part::Literal(_) => None,
        })
    }

    #[must_use]
    pub fn is_static(&self) -> bool {
        self.expressions().next().is_none()
    }

    /// Render by resolving every token against `root`.
    pub fn render(&self, root: &ReactiveObject, tracker: Option<&Tracker>) -> Result<String> {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Expr(path) => {
                    let value = get_value(path, root, tracker)?;
                    out.push_str(&value.to_string());
                }
            }
        }
        Ok(out)
    }
}

/// Byte offset of the closing delimiter for a token starting at `after`.
fn token_end(after: &str, close: &str) -> Option<usize> {
    let first = after.chars().next()?;
    if is_line_terminator(first) {
        return None;
    }
    let from = first.len_utf8();
    let end = from + after[from..].find(close)?;
    if after[..end].contains(is_line_terminator) {
        return None;
    }
    Some(end)
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}
