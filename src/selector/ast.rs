//! Selector AST.
//!
//! Pure data produced by the parser. A parsed selector is never mutated;
//! the matcher keys its caches on the address of each sub-selector, so the
//! tree must stay where it was built for as long as a traversal runs.

use std::fmt;

/// A parsed selector term plus the `!` subject marker of its sequence.
///
/// `subject` is carried for compatibility with the surface grammar. Nothing
/// in matching or dispatch reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    pub kind: SelectorKind,
    pub subject: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectorKind {
    /// `Identifier` or `#Identifier`: node type equals the name.
    Identifier(String),
    /// `*`
    Wildcard,
    /// `.consequent`, `.a.b`: the node is reached from its ancestors by this
    /// field chain.
    Field(Vec<String>),
    /// `[path]`, `[path op value]`
    Attribute(Attribute),
    /// `left > right`
    Child {
        left: Box<Selector>,
        right: Box<Selector>,
    },
    /// `left right`
    Descendant {
        left: Box<Selector>,
        right: Box<Selector>,
    },
    /// Adjacent atoms, all of which must match.
    Compound(Vec<Selector>),
    /// Comma-separated alternatives, any of which may match.
    Matches(Vec<Selector>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Dotted accessor into the node, e.g. `["loc", "start", "line"]`.
    pub path: Vec<String>,
    /// `None` tests truthiness of the resolved value.
    pub test: Option<AttributeTest>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeTest {
    pub operator: AttrOp,
    pub value: AttrValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrOp {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl AttrOp {
    pub fn as_str(self) -> &'static str {
        match self {
            AttrOp::Eq => "=",
            AttrOp::NotEq => "!=",
            AttrOp::Lt => "<",
            AttrOp::Le => "<=",
            AttrOp::Gt => ">",
            AttrOp::Ge => ">=",
        }
    }

    /// `=` and `!=` are the only operators that accept `type(...)` and regexes.
    pub fn is_equality(self) -> bool {
        matches!(self, AttrOp::Eq | AttrOp::NotEq)
    }
}

impl fmt::Display for AttrOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Literal(Literal),
    Regex(AttrRegex),
    /// `type(name)`: compared against the resolved value's type name.
    Type(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
}

/// A regular expression compiled once at parse time.
#[derive(Debug, Clone)]
pub struct AttrRegex {
    pub source: String,
    pub flags: String,
    pub regex: fancy_regex::Regex,
}

impl PartialEq for AttrRegex {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.flags == other.flags
    }
}

impl Selector {
    pub fn new(kind: SelectorKind) -> Self {
        Self {
            kind,
            subject: false,
        }
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Self::new(SelectorKind::Identifier(name.into()))
    }

    pub fn wildcard() -> Self {
        Self::new(SelectorKind::Wildcard)
    }

    pub fn child(left: Selector, right: Selector) -> Self {
        Self::new(SelectorKind::Child {
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn descendant(left: Selector, right: Selector) -> Self {
        Self::new(SelectorKind::Descendant {
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// Sub-selectors of the combinator and list variants, in source order.
    pub fn children(&self) -> Vec<&Selector> {
        match &self.kind {
            SelectorKind::Child { left, right } | SelectorKind::Descendant { left, right } => {
                vec![left, right]
            }
            SelectorKind::Compound(items) | SelectorKind::Matches(items) => items.iter().collect(),
            SelectorKind::Identifier(_)
            | SelectorKind::Wildcard
            | SelectorKind::Field(_)
            | SelectorKind::Attribute(_) => Vec::new(),
        }
    }
}

fn write_string_literal(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for ch in s.chars() {
        match ch {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            '\u{8}' => f.write_str("\\b")?,
            '\u{b}' => f.write_str("\\v")?,
            '\u{c}' => f.write_str("\\f")?,
            other => write!(f, "{other}")?,
        }
    }
    f.write_str("\"")
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Literal(Literal::String(s)) => write_string_literal(f, s),
            AttrValue::Literal(Literal::Number(n)) => write!(f, "{n}"),
            AttrValue::Regex(re) => write!(f, "/{}/{}", re.source, re.flags),
            AttrValue::Type(name) => write!(f, "type({name})"),
        }
    }
}

/// Canonical rendering. For parser-built selectors, parsing the output
/// yields an equal selector.
impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.subject {
            f.write_str("!")?;
        }
        match &self.kind {
            SelectorKind::Identifier(name) => f.write_str(name),
            SelectorKind::Wildcard => f.write_str("*"),
            SelectorKind::Field(path) => write!(f, ".{}", path.join(".")),
            SelectorKind::Attribute(attr) => {
                write!(f, "[{}", attr.path.join("."))?;
                if let Some(test) = &attr.test {
                    write!(f, "{}{}", test.operator, test.value)?;
                }
                f.write_str("]")
            }
            SelectorKind::Child { left, right } => write!(f, "{left} > {right}"),
            SelectorKind::Descendant { left, right } => write!(f, "{left} {right}"),
            SelectorKind::Compound(items) => {
                for item in items {
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            SelectorKind::Matches(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_identifier_and_wildcard() {
        assert_eq!(Selector::identifier("Program").to_string(), "Program");
        assert_eq!(Selector::wildcard().to_string(), "*");
    }

    #[test]
    fn test_display_combinators() {
        let sel = Selector::child(
            Selector::descendant(Selector::identifier("A"), Selector::identifier("B")),
            Selector::identifier("C"),
        );
        assert_eq!(sel.to_string(), "A B > C");
    }

    #[test]
    fn test_display_attribute() {
        let sel = Selector::new(SelectorKind::Attribute(Attribute {
            path: vec!["loc".into(), "start".into(), "line".into()],
            test: Some(AttributeTest {
                operator: AttrOp::Ge,
                value: AttrValue::Literal(Literal::Number(10.0)),
            }),
        }));
        assert_eq!(sel.to_string(), "[loc.start.line>=10]");
    }

    #[test]
    fn test_display_escapes_strings() {
        let value = AttrValue::Literal(Literal::String("a\"b\n".into()));
        assert_eq!(value.to_string(), "\"a\\\"b\\n\"");
    }

    #[test]
    fn test_display_subject_and_compound() {
        let mut sel = Selector::new(SelectorKind::Compound(vec![
            Selector::identifier("Identifier"),
            Selector::new(SelectorKind::Field(vec!["id".into()])),
        ]));
        sel.subject = true;
        assert_eq!(sel.to_string(), "!Identifier.id");
    }

    #[test]
    fn test_children_of_leaf_is_empty() {
        assert!(Selector::wildcard().children().is_empty());
        let sel = Selector::child(Selector::identifier("A"), Selector::identifier("B"));
        assert_eq!(sel.children().len(), 2);
    }

    #[test]
    fn test_equality_operators() {
        assert!(AttrOp::Eq.is_equality());
        assert!(AttrOp::NotEq.is_equality());
        assert!(!AttrOp::Lt.is_equality());
        assert!(!AttrOp::Ge.is_equality());
    }
}
