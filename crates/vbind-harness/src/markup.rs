#![forbid(unsafe_code)]

//! A small HTML-ish markup parser for building [`Document`] fixtures.
//!
//! Supported: elements, text, comments (dropped), void elements,
//! self-closing tags, quoted/unquoted/boolean attributes, and the common
//! character references. Whitespace text is kept as-is.
//!
//! Not supported: doctype, CDATA, raw-text elements (`script`, `style`),
//! and implicit tag closing. Markup must be well nested.

use vbind_core::{Document, NodeId, RenderTree, dom::is_void_element};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarkupError {
    #[error("unexpected end of markup at byte {offset}")]
    UnexpectedEof { offset: usize },

    #[error("malformed tag at byte {offset}")]
    MalformedTag { offset: usize },

    #[error("closing tag </{found}> does not match <{expected}> at byte {offset}")]
    Mismatched {
        expected: String,
        found: String,
        offset: usize,
    },

    #[error("closing tag </{name}> has no open element at byte {offset}")]
    UnexpectedClose { name: String, offset: usize },

    #[error("element <{name}> is never closed")]
    Unclosed { name: String },

    #[error("markup has no root element")]
    NoRoot,
}

/// Parse `source` into `doc`, returning the top-level nodes in order.
pub fn parse_markup(doc: &Document, source: &str) -> Result<Vec<NodeId>, MarkupError> {
    let mut parser = Parser {
        doc,
        src: source,
        pos: 0,
        open: Vec::new(),
        roots: Vec::new(),
    };
    parser.run()?;
    Ok(parser.roots)
}

struct Parser<'a> {
    doc: &'a Document,
    src: &'a str,
    pos: usize,
    open: Vec<(NodeId, String)>,
    roots: Vec<NodeId>,
}

impl<'a> Parser<'a> {
    fn run(&mut self) -> Result<(), MarkupError> {
        while self.pos < self.src.len() {
            let src = self.src;
            let rest = &src[self.pos..];
            if let Some(body) = rest.strip_prefix("<!--") {
                let end = body.find("-->").ok_or(MarkupError::UnexpectedEof {
                    offset: self.src.len(),
                })?;
                self.pos += 4 + end + 3;
            } else if rest.starts_with("</") {
                self.close_tag()?;
            } else if rest.starts_with('<') {
                self.open_tag()?;
            } else {
                let end = rest.find('<').unwrap_or(rest.len());
                let node = self.doc.create_text(decode_entities(&rest[..end]));
                self.pos += end;
                self.append(node);
            }
        }
        match self.open.pop() {
            Some((_, name)) => Err(MarkupError::Unclosed { name }),
            None => Ok(()),
        }
    }

    fn append(&mut self, node: NodeId) {
        match self.open.last() {
            Some((parent, _)) => self.doc.append_child(*parent, node),
            None => self.roots.push(node),
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !keep(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.src[start..self.pos]
    }

    fn tag_name(&mut self) -> String {
        self.take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
            .to_string()
    }

    fn close_tag(&mut self) -> Result<(), MarkupError> {
        let offset = self.pos;
        self.pos += 2;
        let found = self.tag_name();
        self.skip_ws();
        if self.peek() != Some('>') {
            return Err(MarkupError::MalformedTag { offset });
        }
        self.pos += 1;
        match self.open.pop() {
            Some((_, expected)) if expected.eq_ignore_ascii_case(&found) => Ok(()),
            Some((_, expected)) => Err(MarkupError::Mismatched {
                expected,
                found,
                offset,
            }),
            None => Err(MarkupError::UnexpectedClose {
                name: found,
                offset,
            }),
        }
    }

    fn open_tag(&mut self) -> Result<(), MarkupError> {
        let offset = self.pos;
        self.pos += 1;
        let name = self.tag_name();
        if name.is_empty() {
            return Err(MarkupError::MalformedTag { offset });
        }
        let element = self.doc.create_element(name.as_str());
        let self_closing = loop {
            self.skip_ws();
            match self.peek() {
                None => {
                    return Err(MarkupError::UnexpectedEof {
                        offset: self.src.len(),
                    });
                }
                Some('>') => {
                    self.pos += 1;
                    break false;
                }
                Some('/') => {
                    if !self.src[self.pos..].starts_with("/>") {
                        return Err(MarkupError::MalformedTag { offset });
                    }
                    self.pos += 2;
                    break true;
                }
                Some(_) => {
                    let (attr, value) = self.attribute(offset)?;
                    self.doc.set_attribute(element, &attr, &value);
                }
            }
        };
        self.append(element);
        if !self_closing && !is_void_element(&name) {
            self.open.push((element, name));
        }
        Ok(())
    }

    fn attribute(&mut self, offset: usize) -> Result<(String, String), MarkupError> {
        let name = self
            .take_while(|c| !c.is_whitespace() && !matches!(c, '=' | '>' | '/' | '"' | '\'' | '<'))
            .to_string();
        if name.is_empty() {
            return Err(MarkupError::MalformedTag { offset });
        }
        self.skip_ws();
        if self.peek() != Some('=') {
            return Ok((name, String::new()));
        }
        self.pos += 1;
        self.skip_ws();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                let src = self.src;
                let body = &src[self.pos + 1..];
                let end = body.find(quote).ok_or(MarkupError::UnexpectedEof {
                    offset: self.src.len(),
                })?;
                let raw = &body[..end];
                self.pos += 1 + end + 1;
                decode_entities(raw)
            }
            Some(_) => {
                let raw = self.take_while(|c| !c.is_whitespace() && c != '>');
                if raw.is_empty() {
                    return Err(MarkupError::MalformedTag { offset });
                }
                decode_entities(raw)
            }
            None => {
                return Err(MarkupError::UnexpectedEof {
                    offset: self.src.len(),
                });
            }
        };
        Ok((name, value))
    }
}

/// Decode named (`&amp;` `&lt;` `&gt;` `&quot;` `&apos;` `&nbsp;`) and
/// numeric character references. Unknown references are kept verbatim.
#[must_use]
pub fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| reference(&rest[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
