//! The selector language: AST, lexer, parser and type hints.

pub mod ast;
pub mod error;
pub mod hint;
pub mod lexer;
pub mod parser;

pub use ast::{AttrOp, AttrRegex, AttrValue, Attribute, AttributeTest, Literal, Selector, SelectorKind};
pub use error::{SelectorError, SelectorErrorKind};
pub use hint::{TypeHint, type_hint};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{Parser, parse};
