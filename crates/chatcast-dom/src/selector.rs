//! CSS selector engine.
//!
//! Supported grammar: type and `*`, `#id`, `.class`, attribute selectors with
//! `= ~= ^= $= *= |=` (quoted or bare values, optional `i` flag), `:not(...)`,
//! `:first-child`, `:last-child`, `:only-child`, the descendant, child (`>`),
//! next-sibling (`+`) and subsequent-sibling (`~`) combinators, and comma lists.
//!
//! Matching is scoped to one tree: ancestor and sibling walks stop at shadow
//! roots, so a selector never crosses into or out of a shadow tree.

use std::fmt;

use crate::error::SelectorError;
use crate::node::{Document, NodeId};

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Complex>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    compounds: Vec<Compound>,
    /// `combinators[i]` sits between `compounds[i]` and `compounds[i + 1]`.
    combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
    NextSibling,
    SubsequentSibling,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    universal: bool,
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
    pseudos: Vec<Pseudo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrSelector {
    name: String,
    op: AttrOp,
    value: String,
    case_insensitive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals,
    Includes,
    Prefix,
    Suffix,
    Substring,
    DashMatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pseudo {
    FirstChild,
    LastChild,
    OnlyChild,
    Not(Vec<Compound>),
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Err(SelectorError::Empty);
        }
        let mut parser = Parser::new(trimmed);
        let alternatives = parser.selector_list()?;
        Ok(Self {
            source: trimmed.to_string(),
            alternatives,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the element `node` matches any alternative.
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        doc.is_element(node) && self.alternatives.iter().any(|c| c.matches(doc, node))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse(s)
    }
}

// ---- matching ----

impl Complex {
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let last = self.compounds.len() - 1;
        self.compounds[last].matches(doc, node) && self.matches_left(doc, node, last)
    }

    /// `node` matched `compounds[idx]`; check everything to its left.
    fn matches_left(&self, doc: &Document, node: NodeId, idx: usize) -> bool {
        if idx == 0 {
            return true;
        }
        let prev = &self.compounds[idx - 1];
        match self.combinators[idx - 1] {
            Combinator::Child => doc
                .parent_element(node)
                .is_some_and(|p| prev.matches(doc, p) && self.matches_left(doc, p, idx - 1)),
            Combinator::Descendant => {
                let mut current = doc.parent_element(node);
                while let Some(ancestor) = current {
                    if prev.matches(doc, ancestor) && self.matches_left(doc, ancestor, idx - 1) {
                        return true;
                    }
                    current = doc.parent_element(ancestor);
                }
                false
            }
            Combinator::NextSibling => previous_siblings(doc, node)
                .first()
                .is_some_and(|s| prev.matches(doc, *s) && self.matches_left(doc, *s, idx - 1)),
            Combinator::SubsequentSibling => previous_siblings(doc, node)
                .into_iter()
                .any(|s| prev.matches(doc, s) && self.matches_left(doc, s, idx - 1)),
        }
    }
}

/// Element siblings before `node`, nearest first.
fn previous_siblings(doc: &Document, node: NodeId) -> Vec<NodeId> {
    let Some(parent) = doc.parent(node) else {
        return Vec::new();
    };
    let siblings = doc.element_children(parent);
    let pos = siblings.iter().position(|s| *s == node).unwrap_or(0);
    siblings[..pos].iter().rev().copied().collect()
}

impl Compound {
    fn is_empty(&self) -> bool {
        !self.universal
            && self.tag.is_none()
            && self.ids.is_empty()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && self.pseudos.is_empty()
    }

    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some(el) = doc.element(node) else {
            return false;
        };
        if let Some(tag) = &self.tag {
            if &el.tag != tag {
                return false;
            }
        }
        if !self.ids.iter().all(|id| doc.attr(node, "id") == Some(id.as_str())) {
            return false;
        }
        if !self.classes.iter().all(|c| doc.has_class(node, c)) {
            return false;
        }
        if !self.attrs.iter().all(|a| a.matches(doc.attr(node, &a.name))) {
            return false;
        }
        self.pseudos.iter().all(|p| p.matches(doc, node))
    }
}

impl AttrSelector {
    fn matches(&self, actual: Option<&str>) -> bool {
        let Some(actual) = actual else {
            return false;
        };
        if self.op == AttrOp::Exists {
            return true;
        }
        let (actual, expected) = if self.case_insensitive {
            (actual.to_lowercase(), self.value.to_lowercase())
        } else {
            (actual.to_string(), self.value.clone())
        };
        match self.op {
            AttrOp::Exists => true,
            AttrOp::Equals => actual == expected,
            AttrOp::Includes => {
                !expected.is_empty()
                    && !expected.contains(char::is_whitespace)
                    && actual.split_ascii_whitespace().any(|w| w == expected)
            }
            AttrOp::Prefix => !expected.is_empty() && actual.starts_with(&expected),
            AttrOp::Suffix => !expected.is_empty() && actual.ends_with(&expected),
            AttrOp::Substring => !expected.is_empty() && actual.contains(&expected),
            AttrOp::DashMatch => {
                actual == expected || actual.starts_with(&format!("{}-", expected))
            }
        }
    }
}

impl Pseudo {
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        match self {
            Pseudo::FirstChild => {
                doc.parent(node).is_some() && previous_siblings(doc, node).is_empty()
            }
            Pseudo::LastChild => doc
                .parent(node)
                .is_some_and(|p| doc.element_children(p).last() == Some(&node)),
            Pseudo::OnlyChild => doc
                .parent(node)
                .is_some_and(|p| doc.element_children(p).len() == 1),
            Pseudo::Not(list) => !list.iter().any(|c| c.matches(doc, node)),
        }
    }
}

// ---- parsing ----

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn expect(&mut self, c: char) -> Result<(), SelectorError> {
        match self.bump() {
            Some(found) if found == c => Ok(()),
            Some(found) => Err(self.invalid(format!("expected '{}', found '{}'", c, found))),
            None => Err(self.invalid(format!("expected '{}' before end of input", c))),
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> SelectorError {
        SelectorError::invalid(self.source, reason)
    }

    fn selector_list(&mut self) -> Result<Vec<Complex>, SelectorError> {
        let mut list = Vec::new();
        loop {
            list.push(self.complex()?);
            self.skip_ws();
            match self.bump() {
                None => break,
                Some(',') => continue,
                Some(c) => return Err(self.invalid(format!("unexpected '{}'", c))),
            }
        }
        Ok(list)
    }

    fn complex(&mut self) -> Result<Complex, SelectorError> {
        self.skip_ws();
        let first = self.required_compound()?;
        let mut compounds = vec![first];
        let mut combinators = Vec::new();
        loop {
            let had_ws = self.skip_ws();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => Combinator::Child,
                Some('+') => Combinator::NextSibling,
                Some('~') => Combinator::SubsequentSibling,
                Some(_) if had_ws => Combinator::Descendant,
                Some(c) => return Err(self.invalid(format!("unexpected '{}'", c))),
            };
            if combinator != Combinator::Descendant {
                self.pos += 1;
                self.skip_ws();
            }
            combinators.push(combinator);
            compounds.push(self.required_compound()?);
        }
        Ok(Complex {
            compounds,
            combinators,
        })
    }

    fn required_compound(&mut self) -> Result<Compound, SelectorError> {
        let compound = self.compound()?;
        if compound.is_empty() {
            return Err(match self.peek() {
                Some(c) => self.invalid(format!("expected selector, found '{}'", c)),
                None => self.invalid("expected selector before end of input"),
            });
        }
        Ok(compound)
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        if self.peek() == Some('*') {
            self.pos += 1;
            compound.universal = true;
        } else if self.at_ident_start() {
            compound.tag = Some(self.ident()?.to_ascii_lowercase());
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.ids.push(self.ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attrs.push(self.attribute()?);
                }
                Some(':') => {
                    self.pos += 1;
                    compound.pseudos.push(self.pseudo()?);
                }
                _ => break,
            }
        }
        Ok(compound)
    }

    fn at_ident_start(&self) -> bool {
        match self.peek() {
            Some('\\') => true,
            Some('-') => self
                .peek_at(1)
                .is_some_and(|c| c == '-' || c == '\\' || is_name_start(c)),
            Some(c) => is_name_start(c),
            None => false,
        }
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.pos += 1;
                out.push(self.escape()?);
            } else if is_name_char(c) {
                self.pos += 1;
                out.push(c);
            } else {
                break;
            }
        }
        if out.is_empty() {
            return Err(match self.peek() {
                Some(c) => self.invalid(format!("expected identifier, found '{}'", c)),
                None => self.invalid("expected identifier before end of input"),
            });
        }
        Ok(out)
    }

    /// The part after a backslash.
    fn escape(&mut self) -> Result<char, SelectorError> {
        let mut hex = String::new();
        while hex.len() < 6 && self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            hex.push(self.bump().unwrap_or('0'));
        }
        if hex.is_empty() {
            return self
                .bump()
                .ok_or_else(|| self.invalid("dangling escape at end of input"));
        }
        if self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        let code = u32::from_str_radix(&hex, 16).unwrap_or(0xFFFD);
        Ok(char::from_u32(code).filter(|c| *c != '\0').unwrap_or('\u{FFFD}'))
    }

    fn attribute(&mut self) -> Result<AttrSelector, SelectorError> {
        self.skip_ws();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_ws();
        let op = match self.bump() {
            Some(']') => {
                return Ok(AttrSelector {
                    name,
                    op: AttrOp::Exists,
                    value: String::new(),
                    case_insensitive: false,
                })
            }
            Some('=') => AttrOp::Equals,
            Some(c @ ('~' | '^' | '$' | '*' | '|')) => {
                self.expect('=')?;
                match c {
                    '~' => AttrOp::Includes,
                    '^' => AttrOp::Prefix,
                    '$' => AttrOp::Suffix,
                    '*' => AttrOp::Substring,
                    _ => AttrOp::DashMatch,
                }
            }
            Some(c) => return Err(self.invalid(format!("unexpected '{}' in attribute selector", c))),
            None => return Err(self.invalid("unterminated attribute selector")),
        };
        self.skip_ws();
        let value = match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.pos += 1;
                self.quoted(q)?
            }
            _ => self.ident()?,
        };
        self.skip_ws();
        let mut case_insensitive = false;
        if let Some(flag @ ('i' | 'I' | 's' | 'S')) = self.peek() {
            self.pos += 1;
            case_insensitive = flag.eq_ignore_ascii_case(&'i');
            self.skip_ws();
        }
        match self.bump() {
            Some(']') => Ok(AttrSelector {
                name,
                op,
                value,
                case_insensitive,
            }),
            _ => Err(self.invalid("unterminated attribute selector")),
        }
    }

    fn quoted(&mut self, quote: char) -> Result<String, SelectorError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.invalid("unterminated string")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => out.push(self.escape()?),
                Some(c) => out.push(c),
            }
        }
    }

    fn pseudo(&mut self) -> Result<Pseudo, SelectorError> {
        if self.peek() == Some(':') {
            return Err(SelectorError::unsupported(self.source, "pseudo-elements"));
        }
        let name = self.ident()?.to_ascii_lowercase();
        match name.as_str() {
            "first-child" => Ok(Pseudo::FirstChild),
            "last-child" => Ok(Pseudo::LastChild),
            "only-child" => Ok(Pseudo::OnlyChild),
            "not" => {
                self.expect('(')?;
                let mut list = Vec::new();
                loop {
                    self.skip_ws();
                    list.push(self.required_compound()?);
                    self.skip_ws();
                    match self.bump() {
                        Some(',') => continue,
                        Some(')') => break,
                        Some(c) => {
                            return Err(self.invalid(format!("unexpected '{}' in :not()", c)))
                        }
                        None => return Err(self.invalid("unterminated :not()")),
                    }
                }
                Ok(Pseudo::Not(list))
            }
            other => Err(SelectorError::unsupported(self.source, format!(":{}", other))),
        }
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

#[cfg(test)]
#[path = "selector_tests.rs"]
mod tests;
