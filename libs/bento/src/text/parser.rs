//! Single-pass parser for the text format.
//!
//! The parser is a flat state machine over characters with one pending token.
//! It emits [`Event`]s as structure completes; [`from_str`](super::from_str)
//! assembles those into a tree.

use std::mem;
use std::str::Chars;

use super::value::{Element, ValueError, parse_value};
use crate::attr::Attribute;
use crate::error::{Error, Result};
use crate::kind::Tag;

/// A structural event produced by the [`Parser`].
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A node with this name was opened.
    OpenNode(String),
    /// The innermost open node received an attribute.
    Attribute(Attribute),
    /// The innermost open node was closed.
    CloseNode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Before the root node.
    OutsideNode,
    /// After `{`, expecting the quoted node name.
    BeforeName,
    InName,
    /// Inside a node, expecting attributes, children, or `}`.
    NodeBody,
    /// After `[`, expecting the attribute name.
    BeforeAttrName,
    InAttrName,
    /// In an unquoted attribute name, as in `[count=5]`.
    InAttrNameBare,
    /// Expecting `(` or `=`.
    AfterAttrName,
    InTypeTag,
    /// Expecting `=`.
    AfterTypeTag,
    /// At the start of a value element.
    BeforeValue,
    InValueBare,
    InValueQuoted,
    /// After a quoted element, expecting `,` or `]`.
    AfterValueQuoted,
    /// After the root node closed.
    AfterNode,
}

#[derive(Debug, Clone, Copy)]
struct Pos {
    line: u32,
    column: u32,
}

/// Pieces of the attribute currently being parsed.
#[derive(Debug, Default)]
struct PendingAttribute {
    name: String,
    tag: Option<Tag>,
    elements: Vec<Element>,
}

/// Parses text into a stream of [`Event`]s.
///
/// The input must contain exactly one root node. The iterator ends after the
/// first error.
#[derive(Debug)]
pub struct Parser<'a> {
    chars: Chars<'a>,
    state: State,
    /// Position of the character last consumed.
    pos: Pos,
    /// Where the current attribute started, for value errors.
    attr_pos: Pos,
    token: String,
    escaped: bool,
    depth: usize,
    /// Whether the innermost open node already has a child.
    has_child: bool,
    pending: PendingAttribute,
    done: bool,
}

impl<'a> Parser<'a> {
    /// Creates a parser over the text.
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars(),
            state: State::OutsideNode,
            pos: Pos { line: 1, column: 0 },
            attr_pos: Pos { line: 1, column: 0 },
            token: String::new(),
            escaped: false,
            depth: 0,
            has_child: false,
            pending: PendingAttribute::default(),
            done: false,
        }
    }

    fn error_at(pos: Pos, message: impl Into<String>) -> Error {
        Error::Syntax {
            line: pos.line,
            column: pos.column,
            message: message.into(),
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Self::error_at(self.pos, message)
    }

    fn unexpected(&self, c: char, expected: &str) -> Error {
        self.error(format!("unexpected `{c}`, expected {expected}"))
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.pos.line += 1;
            self.pos.column = 0;
        } else {
            self.pos.column += 1;
        }
        Some(c)
    }

    /// Handles a character inside a quoted string. Returns `true` once the
    /// closing quote is reached.
    fn quoted_char(&mut self, c: char) -> Result<bool> {
        if self.escaped {
            if !matches!(c, '"' | '\\') {
                return Err(self.error(format!("invalid escape sequence `\\{c}`")));
            }
            self.token.push(c);
            self.escaped = false;
            return Ok(false);
        }

        match c {
            '\\' => self.escaped = true,
            '"' => return Ok(true),
            c => self.token.push(c),
        }
        Ok(false)
    }

    fn push_bare_element(&mut self) {
        let text = self.token.trim().to_owned();
        self.token.clear();
        self.pending.elements.push(Element {
            text,
            quoted: false,
        });
    }

    fn finish_attribute(&mut self) -> Result<Event> {
        let pending = mem::take(&mut self.pending);
        let kind = pending.tag.and_then(Tag::kind);
        let value = parse_value(kind, &pending.elements).map_err(|e| match e {
            ValueError::Syntax(msg) => Self::error_at(
                self.attr_pos,
                format!("invalid value for `{}`: {msg}", pending.name),
            ),
            ValueError::Range(msg) => Error::Range(msg),
        })?;

        self.state = State::NodeBody;
        Ok(Event::Attribute(Attribute::new(pending.name, value)))
    }

    fn finish_tag(&mut self) -> Result<()> {
        let code = self.token.trim();
        let tag = Tag::new(code)
            .filter(|t| t.kind().is_some())
            .ok_or_else(|| self.error(format!("unknown kind tag `{code}`")))?;

        self.pending.tag = Some(tag);
        self.token.clear();
        Ok(())
    }

    fn open_node(&mut self) -> Event {
        self.depth += 1;
        self.has_child = false;
        self.state = State::NodeBody;
        Event::OpenNode(mem::take(&mut self.token))
    }

    fn close_node(&mut self) -> Event {
        self.depth -= 1;
        self.has_child = true;
        self.state = if self.depth == 0 {
            State::AfterNode
        } else {
            State::NodeBody
        };
        Event::CloseNode
    }

    /// Advances to the next event, or [`None`] at the end of the input.
    fn next_event(&mut self) -> Result<Option<Event>> {
        while let Some(c) = self.advance() {
            match self.state {
                State::OutsideNode => match c {
                    '{' => self.state = State::BeforeName,
                    c if c.is_whitespace() => {},
                    c => return Err(self.unexpected(c, "`{`")),
                },
                State::BeforeName => match c {
                    '"' => self.state = State::InName,
                    c if c.is_whitespace() => {},
                    c => return Err(self.unexpected(c, "a quoted node name")),
                },
                State::InName => {
                    if self.quoted_char(c)? {
                        return Ok(Some(self.open_node()));
                    }
                },
                State::NodeBody => match c {
                    '[' if self.has_child => {
                        return Err(self.error("attributes must come before child nodes"));
                    },
                    '[' => {
                        self.attr_pos = self.pos;
                        self.state = State::BeforeAttrName;
                    },
                    '{' => self.state = State::BeforeName,
                    '}' => return Ok(Some(self.close_node())),
                    c if c.is_whitespace() => {},
                    c => return Err(self.unexpected(c, "`[`, `{`, or `}`")),
                },
                State::BeforeAttrName => match c {
                    '"' => self.state = State::InAttrName,
                    c if c.is_whitespace() => {},
                    c if is_bare_name_char(c) => {
                        self.token.push(c);
                        self.state = State::InAttrNameBare;
                    },
                    c => return Err(self.unexpected(c, "an attribute name")),
                },
                State::InAttrName => {
                    if self.quoted_char(c)? {
                        self.pending.name = mem::take(&mut self.token);
                        self.state = State::AfterAttrName;
                    }
                },
                State::InAttrNameBare => match c {
                    c if is_bare_name_char(c) => self.token.push(c),
                    c => {
                        self.pending.name = mem::take(&mut self.token);
                        match c {
                            '(' => self.state = State::InTypeTag,
                            '=' => self.state = State::BeforeValue,
                            c if c.is_whitespace() => self.state = State::AfterAttrName,
                            c => return Err(self.unexpected(c, "`(` or `=`")),
                        }
                    },
                },
                State::AfterAttrName => match c {
                    '(' => self.state = State::InTypeTag,
                    '=' => self.state = State::BeforeValue,
                    c if c.is_whitespace() => {},
                    c => return Err(self.unexpected(c, "`(` or `=`")),
                },
                State::InTypeTag => match c {
                    ')' => {
                        self.finish_tag()?;
                        self.state = State::AfterTypeTag;
                    },
                    '\n' | '"' | '=' | ']' => return Err(self.error("unterminated type tag")),
                    c => self.token.push(c),
                },
                State::AfterTypeTag => match c {
                    '=' => self.state = State::BeforeValue,
                    c if c.is_whitespace() => {},
                    c => return Err(self.unexpected(c, "`=`")),
                },
                State::BeforeValue => match c {
                    '"' => self.state = State::InValueQuoted,
                    ',' => self.push_bare_element(),
                    ']' => {
                        self.push_bare_element();
                        return self.finish_attribute().map(Some);
                    },
                    c if c.is_whitespace() => {},
                    c => {
                        self.token.push(c);
                        self.state = State::InValueBare;
                    },
                },
                State::InValueBare => match c {
                    ',' => {
                        self.push_bare_element();
                        self.state = State::BeforeValue;
                    },
                    ']' => {
                        self.push_bare_element();
                        return self.finish_attribute().map(Some);
                    },
                    '"' => return Err(self.error("unexpected `\"` in unquoted value")),
                    c => self.token.push(c),
                },
                State::InValueQuoted => {
                    if self.quoted_char(c)? {
                        let text = mem::take(&mut self.token);
                        self.pending.elements.push(Element { text, quoted: true });
                        self.state = State::AfterValueQuoted;
                    }
                },
                State::AfterValueQuoted => match c {
                    ',' => self.state = State::BeforeValue,
                    ']' => return self.finish_attribute().map(Some),
                    c if c.is_whitespace() => {},
                    c => return Err(self.unexpected(c, "`,` or `]`")),
                },
                State::AfterNode => match c {
                    c if c.is_whitespace() => {},
                    c => return Err(self.unexpected(c, "the end of input after the root node")),
                },
            }
        }

        match self.state {
            State::AfterNode => Ok(None),
            State::OutsideNode => Err(self.error("expected a node, found the end of input")),
            State::InName | State::InAttrName | State::InValueQuoted => {
                Err(self.error("unterminated string"))
            },
            _ => Err(self.error("unexpected end of input")),
        }
    }
}

/// Characters allowed in an unquoted attribute name.
fn is_bare_name_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '"' | '\\' | '(' | ')' | '=' | '[' | ']' | '{' | '}' | ',')
}

impl Iterator for Parser<'_> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let res = self.next_event().transpose();
        if !matches!(res, Some(Ok(_))) {
            self.done = true;
        }
        res
    }
}
