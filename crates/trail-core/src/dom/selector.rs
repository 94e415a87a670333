//! CSS selector parsing and matching.
//!
//! The grammar (`selector.pest`) covers the subset trails are authored with:
//! type, universal, id, class and attribute selectors, the structural
//! `nth-*`/`first-*`/`last-*` pseudo-classes, descendant and child combinators
//! and selector lists. Anything outside it is a [`SelectorError::Syntax`].

use super::{Dom, NodeId};
use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;
use thiserror::Error;

#[derive(Parser)]
#[grammar = "selector.pest"]
pub struct CssParser;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelectorError {
    #[error("Invalid selector '{selector}': {message}")]
    Syntax { selector: String, message: String },

    #[error("Empty selector")]
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList(pub Vec<ComplexSelector>);

/// Compounds joined by combinators; `combinators[i]` sits between
/// `compounds[i]` and `compounds[i + 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexSelector {
    pub compounds: Vec<CompoundSelector>,
    pub combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompoundSelector {
    /// `None` matches any tag.
    pub tag: Option<String>,
    pub ids: Vec<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<AttrSelector>,
    pub pseudos: Vec<PseudoClass>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttrSelector {
    pub name: String,
    pub matcher: Option<(AttrOp, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrOp {
    Equals,
    Includes,
    Prefix,
    Suffix,
    Substring,
    DashMatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NthKind {
    Child,
    LastChild,
    OfType,
    LastOfType,
}

/// `an+b` position pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nth {
    pub a: i32,
    pub b: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PseudoClass {
    pub kind: NthKind,
    pub nth: Nth,
}

pub fn parse_selector(input: &str) -> Result<SelectorList, SelectorError> {
    if input.trim().is_empty() {
        return Err(SelectorError::Empty);
    }

    let syntax = |message: String| SelectorError::Syntax {
        selector: input.to_string(),
        message,
    };

    let mut pairs = CssParser::parse(Rule::selector_list, input)
        .map_err(|e| syntax(e.variant.message().to_string()))?;
    let list = pairs
        .next()
        .ok_or_else(|| syntax("no selector".to_string()))?;

    let mut selectors = Vec::new();
    for pair in list.into_inner() {
        if pair.as_rule() == Rule::complex {
            selectors.push(parse_complex(pair).map_err(|m| syntax(m))?);
        }
    }
    Ok(SelectorList(selectors))
}

fn parse_complex(pair: Pair<Rule>) -> Result<ComplexSelector, String> {
    let mut compounds = Vec::new();
    let mut combinators = Vec::new();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::compound => compounds.push(parse_compound(inner)?),
            Rule::combinator => {
                let is_child = inner.into_inner().any(|p| p.as_rule() == Rule::child);
                combinators.push(if is_child {
                    Combinator::Child
                } else {
                    Combinator::Descendant
                });
            }
            rule => return Err(format!("unexpected rule {:?}", rule)),
        }
    }

    Ok(ComplexSelector {
        compounds,
        combinators,
    })
}

fn parse_compound(pair: Pair<Rule>) -> Result<CompoundSelector, String> {
    let mut compound = CompoundSelector::default();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::universal => {}
            Rule::type_sel => compound.tag = Some(unescape(inner.as_str()).to_ascii_lowercase()),
            Rule::id_sel => compound.ids.push(unescape(&inner.as_str()[1..])),
            Rule::class_sel => compound.classes.push(unescape(&inner.as_str()[1..])),
            Rule::attr_sel => compound.attributes.push(parse_attr(inner)?),
            Rule::pseudo => parse_pseudo(inner, &mut compound.pseudos)?,
            rule => return Err(format!("unexpected rule {:?}", rule)),
        }
    }

    Ok(compound)
}

fn parse_attr(pair: Pair<Rule>) -> Result<AttrSelector, String> {
    let mut name = String::new();
    let mut op = None;
    let mut value = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::attr_name => name = unescape(inner.as_str()).to_ascii_lowercase(),
            Rule::attr_op => {
                op = Some(match inner.as_str() {
                    "=" => AttrOp::Equals,
                    "~=" => AttrOp::Includes,
                    "^=" => AttrOp::Prefix,
                    "$=" => AttrOp::Suffix,
                    "*=" => AttrOp::Substring,
                    "|=" => AttrOp::DashMatch,
                    other => return Err(format!("unknown attribute operator '{}'", other)),
                })
            }
            Rule::dq_text | Rule::sq_text | Rule::bare_value => {
                value = Some(unescape(inner.as_str()))
            }
            _ => {}
        }
    }

    let matcher = match (op, value) {
        (Some(op), Some(value)) => Some((op, value)),
        (None, None) => None,
        _ => return Err(format!("incomplete attribute selector [{}]", name)),
    };

    Ok(AttrSelector { name, matcher })
}

fn parse_pseudo(pair: Pair<Rule>, out: &mut Vec<PseudoClass>) -> Result<(), String> {
    let first = |kind| PseudoClass {
        kind,
        nth: Nth { a: 0, b: 1 },
    };

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::structural_pseudo => match inner.as_str() {
                "first-child" => out.push(first(NthKind::Child)),
                "last-child" => out.push(first(NthKind::LastChild)),
                "only-child" => {
                    out.push(first(NthKind::Child));
                    out.push(first(NthKind::LastChild));
                }
                "first-of-type" => out.push(first(NthKind::OfType)),
                "last-of-type" => out.push(first(NthKind::LastOfType)),
                other => return Err(format!("unsupported pseudo-class :{}", other)),
            },
            Rule::nth_pseudo => {
                let mut kind = None;
                let mut nth = None;
                for part in inner.into_inner() {
                    match part.as_rule() {
                        Rule::nth_kind => {
                            kind = Some(match part.as_str() {
                                "nth-child" => NthKind::Child,
                                "nth-last-child" => NthKind::LastChild,
                                "nth-of-type" => NthKind::OfType,
                                _ => NthKind::LastOfType,
                            })
                        }
                        Rule::nth_odd => nth = Some(Nth { a: 2, b: 1 }),
                        Rule::nth_even => nth = Some(Nth { a: 2, b: 0 }),
                        Rule::nth_integer => nth = Some(Nth { a: 0, b: parse_int(part.as_str())? }),
                        Rule::nth_formula => nth = Some(parse_formula(part.as_str())?),
                        _ => {}
                    }
                }
                match (kind, nth) {
                    (Some(kind), Some(nth)) => out.push(PseudoClass { kind, nth }),
                    _ => return Err("malformed nth expression".to_string()),
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn parse_int(text: &str) -> Result<i32, String> {
    text.parse::<i32>()
        .map_err(|e| format!("invalid integer '{}': {}", text, e))
}

fn parse_formula(text: &str) -> Result<Nth, String> {
    let compact: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    let (a_part, b_part) = compact
        .split_once('n')
        .ok_or_else(|| format!("invalid nth formula '{}'", text))?;

    let a = match a_part {
        "" | "+" => 1,
        "-" => -1,
        other => parse_int(other)?,
    };
    let b = if b_part.is_empty() {
        0
    } else {
        parse_int(b_part)?
    };
    Ok(Nth { a, b })
}

/// Decode CSS escapes (`\31 `, `\.`) in an identifier or string.
pub fn unescape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        let mut hex = String::new();
        while hex.len() < 6 {
            match chars.peek() {
                Some(h) if h.is_ascii_hexdigit() => {
                    hex.push(*h);
                    chars.next();
                }
                _ => break,
            }
        }

        if hex.is_empty() {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            if chars.peek() == Some(&' ') {
                chars.next();
            }
            let decoded = u32::from_str_radix(&hex, 16)
                .ok()
                .and_then(char::from_u32)
                .filter(|ch| *ch != '\0')
                .unwrap_or('\u{FFFD}');
            out.push(decoded);
        }
    }

    out
}

/// Serialize an identifier the way `CSS.escape` does.
pub fn escape_ident(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());

    for (i, &c) in chars.iter().enumerate() {
        let code = c as u32;
        if c == '\0' {
            out.push('\u{FFFD}');
        } else if (0x1..=0x1F).contains(&code)
            || code == 0x7F
            || (i == 0 && c.is_ascii_digit())
            || (i == 1 && c.is_ascii_digit() && chars[0] == '-')
        {
            out.push_str(&format!("\\{:x} ", code));
        } else if i == 0 && c == '-' && chars.len() == 1 {
            out.push_str("\\-");
        } else if code >= 0x80 || c == '-' || c == '_' || c.is_ascii_alphanumeric() {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }

    out
}

/// Double-quoted attribute value with `"` and `\` escaped.
pub fn quote_attr_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\a "),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

impl SelectorList {
    pub fn matches<D: Dom + ?Sized>(&self, dom: &D, node: NodeId) -> bool {
        self.0.iter().any(|complex| complex.matches(dom, node))
    }
}

impl ComplexSelector {
    pub fn matches<D: Dom + ?Sized>(&self, dom: &D, node: NodeId) -> bool {
        match self.compounds.len() {
            0 => false,
            n => self.matches_from(dom, node, n - 1),
        }
    }

    fn matches_from<D: Dom + ?Sized>(&self, dom: &D, node: NodeId, idx: usize) -> bool {
        if !self.compounds[idx].matches(dom, node) {
            return false;
        }
        if idx == 0 {
            return true;
        }

        match self.combinators[idx - 1] {
            Combinator::Child => dom
                .parent(node)
                .is_some_and(|parent| self.matches_from(dom, parent, idx - 1)),
            Combinator::Descendant => {
                let mut current = dom.parent(node);
                while let Some(ancestor) = current {
                    if self.matches_from(dom, ancestor, idx - 1) {
                        return true;
                    }
                    current = dom.parent(ancestor);
                }
                false
            }
        }
    }
}

impl CompoundSelector {
    pub fn matches<D: Dom + ?Sized>(&self, dom: &D, node: NodeId) -> bool {
        let Some(tag) = dom.tag_name(node) else {
            return false;
        };
        if self.tag.as_ref().is_some_and(|t| *t != tag) {
            return false;
        }

        if !self.ids.is_empty() {
            let id = dom.attribute(node, "id");
            if !self.ids.iter().all(|want| id.as_deref() == Some(want.as_str())) {
                return false;
            }
        }

        if !self.classes.is_empty() {
            let classes = dom.class_list(node);
            if !self.classes.iter().all(|want| classes.contains(want)) {
                return false;
            }
        }

        if !self
            .attributes
            .iter()
            .all(|attr| attr.matches(dom.attribute(node, &attr.name).as_deref()))
        {
            return false;
        }

        self.pseudos.iter().all(|pseudo| pseudo.matches(dom, node))
    }
}

impl AttrSelector {
    fn matches(&self, actual: Option<&str>) -> bool {
        let Some(actual) = actual else {
            return false;
        };
        let Some((op, want)) = &self.matcher else {
            return true;
        };

        match op {
            AttrOp::Equals => actual == want,
            AttrOp::Includes => !want.is_empty() && actual.split_whitespace().any(|w| w == want),
            AttrOp::Prefix => !want.is_empty() && actual.starts_with(want.as_str()),
            AttrOp::Suffix => !want.is_empty() && actual.ends_with(want.as_str()),
            AttrOp::Substring => !want.is_empty() && actual.contains(want.as_str()),
            AttrOp::DashMatch => {
                actual == want || actual.starts_with(&format!("{}-", want))
            }
        }
    }
}

impl Nth {
    pub fn matches(&self, position: usize) -> bool {
        let p = position as i64;
        let a = self.a as i64;
        let b = self.b as i64;
        if a == 0 {
            p == b
        } else {
            let diff = p - b;
            diff % a == 0 && diff / a >= 0
        }
    }
}

impl PseudoClass {
    fn matches<D: Dom + ?Sized>(&self, dom: &D, node: NodeId) -> bool {
        let (same_type, from_end) = match self.kind {
            NthKind::Child => (false, false),
            NthKind::LastChild => (false, true),
            NthKind::OfType => (true, false),
            NthKind::LastOfType => (true, true),
        };
        sibling_position(dom, node, same_type, from_end).is_some_and(|p| self.nth.matches(p))
    }
}

/// 1-based position of `node` among its element siblings.
pub fn sibling_position<D: Dom + ?Sized>(
    dom: &D,
    node: NodeId,
    same_type: bool,
    from_end: bool,
) -> Option<usize> {
    let siblings = match dom.parent(node) {
        Some(parent) => dom.children(parent),
        None => vec![node],
    };
    let tag = dom.tag_name(node);
    let filtered: Vec<NodeId> = siblings
        .into_iter()
        .filter(|s| !same_type || dom.tag_name(*s) == tag)
        .collect();
    let pos = filtered.iter().position(|s| *s == node)?;
    Some(if from_end {
        filtered.len() - pos
    } else {
        pos + 1
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unescape_hex_and_literal() {
        assert_eq!(unescape("\\31 23"), "123");
        assert_eq!(unescape("a\\.b"), "a.b");
        assert_eq!(unescape("plain"), "plain");
    }

    #[test]
    fn test_escape_ident_matches_css_escape() {
        assert_eq!(escape_ident("123"), "\\31 23");
        assert_eq!(escape_ident("-"), "\\-");
        assert_eq!(escape_ident("-1x"), "-\\31 x");
        assert_eq!(escape_ident("a.b:c"), "a\\.b\\:c");
        assert_eq!(escape_ident("save-btn_2"), "save-btn_2");
    }

    #[test]
    fn test_escape_round_trips_through_unescape() {
        for raw in ["123", "a.b", "x:y[z]", "-9", "über"] {
            assert_eq!(unescape(&escape_ident(raw)), raw);
        }
    }

    #[test]
    fn test_parse_formula_variants() {
        assert_eq!(parse_formula("2n+1").unwrap(), Nth { a: 2, b: 1 });
        assert_eq!(parse_formula("-n + 3").unwrap(), Nth { a: -1, b: 3 });
        assert_eq!(parse_formula("n").unwrap(), Nth { a: 1, b: 0 });
    }

    #[test]
    fn test_nth_matching() {
        let odd = Nth { a: 2, b: 1 };
        assert!(odd.matches(1));
        assert!(!odd.matches(2));
        assert!(odd.matches(5));

        let first_three = Nth { a: -1, b: 3 };
        assert!(first_three.matches(3));
        assert!(first_three.matches(1));
        assert!(!first_three.matches(4));

        assert!(Nth { a: 0, b: 2 }.matches(2));
    }
}
