//! Errors surfaced while turning selector text into a [`Selector`](super::Selector).

use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorErrorKind {
    EmptySelector,
    UnexpectedCharacter,
    UnexpectedToken,
    UnexpectedEnd,
    UnterminatedString,
    UnterminatedRegex,
    UnterminatedType,
    InvalidNumber,
    InvalidRegex(String),
    UnknownRegexFlag(char),
}

impl fmt::Display for SelectorErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorErrorKind::EmptySelector => f.write_str("empty selector"),
            SelectorErrorKind::UnexpectedCharacter => f.write_str("unexpected character"),
            SelectorErrorKind::UnexpectedToken => f.write_str("unexpected token"),
            SelectorErrorKind::UnexpectedEnd => f.write_str("unexpected end of selector"),
            SelectorErrorKind::UnterminatedString => f.write_str("unterminated string literal"),
            SelectorErrorKind::UnterminatedRegex => f.write_str("unterminated regular expression"),
            SelectorErrorKind::UnterminatedType => f.write_str("unterminated type(...)"),
            SelectorErrorKind::InvalidNumber => f.write_str("invalid number"),
            SelectorErrorKind::InvalidRegex(msg) => write!(f, "invalid regular expression: {msg}"),
            SelectorErrorKind::UnknownRegexFlag(flag) => {
                write!(f, "unsupported regular expression flag `{flag}`")
            }
        }
    }
}

/// A syntax error in a selector, pointing at the offending byte.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at byte {position}{}", found_suffix(.found))]
pub struct SelectorError {
    pub kind: SelectorErrorKind,
    /// Zero-based byte offset into the selector text.
    pub position: usize,
    /// The offending text, when there is any.
    pub found: Option<String>,
}

fn found_suffix(found: &Option<String>) -> String {
    match found {
        Some(text) => format!(" (found `{text}`)"),
        None => String::new(),
    }
}

impl SelectorError {
    pub(crate) fn new(kind: SelectorErrorKind, position: usize, found: Option<String>) -> Self {
        Self {
            kind,
            position,
            found,
        }
    }

    pub(crate) fn at_char(kind: SelectorErrorKind, position: usize, ch: char) -> Self {
        Self::new(kind, position, Some(ch.to_string()))
    }
}
