//! Selector parser.
//!
//! Recursive descent over the token stream produced by the lexer:
//!
//! ```text
//! selectors := selector (',' selector)*
//! selector  := sequence (('>' | ' ') sequence)*      left-associative
//! sequence  := '!'? atom+
//! atom      := '*' | '#'? name | '[' attribute ']' | '.' name ('.' name)*
//! attribute := path ((eqOp (type | regex)) | (op (string | number | path)))?
//! ```

use super::ast::{
    AttrOp, AttrRegex, AttrValue, Attribute, AttributeTest, Literal, Selector, SelectorKind,
};
use super::error::{SelectorError, SelectorErrorKind};
use super::lexer::{Lexer, Token, TokenKind};

/// Parse selector text into a [`Selector`].
pub fn parse(input: &str) -> Result<Selector, SelectorError> {
    let tokens = Lexer::new(input).tokenize()?;
    Parser::new(tokens, input.len()).parse()
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Byte length of the source, reported for errors at end of input.
    end: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>, end: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            end,
        }
    }

    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(tok)
    }

    fn skip_whitespace(&mut self) -> bool {
        let mut skipped = false;
        while self.peek() == Some(&TokenKind::Whitespace) {
            self.pos += 1;
            skipped = true;
        }
        skipped
    }

    /// Error for whatever sits at the cursor: the token, or end of input.
    fn unexpected(&self) -> SelectorError {
        match self.tokens.get(self.pos) {
            Some(tok) => SelectorError::new(
                SelectorErrorKind::UnexpectedToken,
                tok.pos,
                Some(describe(&tok.kind)),
            ),
            None => SelectorError::new(SelectorErrorKind::UnexpectedEnd, self.end, None),
        }
    }

    fn expect_name(&mut self) -> Result<String, SelectorError> {
        match self.peek() {
            Some(TokenKind::Name(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected()),
        }
    }

    pub fn parse(&mut self) -> Result<Selector, SelectorError> {
        self.skip_whitespace();
        if self.peek().is_none() {
            return Err(SelectorError::new(
                SelectorErrorKind::EmptySelector,
                0,
                None,
            ));
        }
        let selector = self.parse_selectors()?;
        self.skip_whitespace();
        if self.peek().is_some() {
            return Err(self.unexpected());
        }
        Ok(selector)
    }

    fn parse_selectors(&mut self) -> Result<Selector, SelectorError> {
        let mut alternatives = vec![self.parse_selector()?];

        loop {
            let save = self.pos;
            self.skip_whitespace();
            if self.peek() != Some(&TokenKind::Comma) {
                self.pos = save;
                break;
            }
            self.advance();
            self.skip_whitespace();
            alternatives.push(self.parse_selector()?);
        }

        if alternatives.len() == 1 {
            Ok(alternatives.remove(0))
        } else {
            Ok(Selector::new(SelectorKind::Matches(alternatives)))
        }
    }

    fn parse_selector(&mut self) -> Result<Selector, SelectorError> {
        let mut left = self.parse_sequence()?;

        loop {
            let save = self.pos;
            let had_space = self.skip_whitespace();
            match self.peek() {
                Some(TokenKind::Gt) => {
                    self.advance();
                    self.skip_whitespace();
                    let right = self.parse_sequence()?;
                    left = Selector::child(left, right);
                }
                Some(kind) if had_space && starts_sequence(kind) => {
                    let right = self.parse_sequence()?;
                    left = Selector::descendant(left, right);
                }
                _ => {
                    self.pos = save;
                    break;
                }
            }
        }

        Ok(left)
    }

    fn parse_sequence(&mut self) -> Result<Selector, SelectorError> {
        let subject = if self.peek() == Some(&TokenKind::Bang) {
            self.advance();
            true
        } else {
            false
        };

        let mut atoms = Vec::new();
        while self.peek().is_some_and(starts_atom) {
            atoms.push(self.parse_atom()?);
        }

        let mut selector = match atoms.len() {
            0 => return Err(self.unexpected()),
            1 => atoms.remove(0),
            _ => Selector::new(SelectorKind::Compound(atoms)),
        };
        selector.subject = subject;
        Ok(selector)
    }

    fn parse_atom(&mut self) -> Result<Selector, SelectorError> {
        let Some(kind) = self.peek().cloned() else {
            return Err(self.unexpected());
        };

        match kind {
            TokenKind::Star => {
                self.advance();
                Ok(Selector::wildcard())
            }
            TokenKind::Hash => {
                self.advance();
                Ok(Selector::identifier(self.expect_name()?))
            }
            TokenKind::Name(name) => {
                self.advance();
                Ok(Selector::identifier(name))
            }
            TokenKind::Dot => {
                let path = self.parse_dotted_path()?;
                Ok(Selector::new(SelectorKind::Field(path)))
            }
            TokenKind::LBracket => {
                self.advance();
                let attribute = self.parse_attribute()?;
                Ok(Selector::new(SelectorKind::Attribute(attribute)))
            }
            _ => Err(self.unexpected()),
        }
    }

    /// `.name(.name)*`. The leading dot is consumed here.
    fn parse_dotted_path(&mut self) -> Result<Vec<String>, SelectorError> {
        let mut path = Vec::new();
        while self.peek() == Some(&TokenKind::Dot) {
            self.advance();
            path.push(self.expect_name()?);
        }
        Ok(path)
    }

    /// `name(.name)*`
    fn parse_name_path(&mut self) -> Result<Vec<String>, SelectorError> {
        let mut path = vec![self.expect_name()?];
        path.extend(self.parse_dotted_path()?);
        Ok(path)
    }

    fn parse_attribute(&mut self) -> Result<Attribute, SelectorError> {
        let path = self.parse_name_path()?;

        let test = match self.peek() {
            Some(TokenKind::RBracket) => None,
            Some(TokenKind::Op(op)) => {
                let operator = *op;
                self.advance();
                let value = self.parse_attribute_value(operator)?;
                Some(AttributeTest { operator, value })
            }
            _ => return Err(self.unexpected()),
        };

        if self.peek() != Some(&TokenKind::RBracket) {
            return Err(self.unexpected());
        }
        self.advance();

        Ok(Attribute { path, test })
    }

    fn parse_attribute_value(&mut self, operator: AttrOp) -> Result<AttrValue, SelectorError> {
        let Some(tok) = self.tokens.get(self.pos).cloned() else {
            return Err(self.unexpected());
        };

        match tok.kind {
            TokenKind::StringLiteral(s) => {
                self.advance();
                Ok(AttrValue::Literal(Literal::String(s)))
            }
            TokenKind::Number(n) => {
                self.advance();
                Ok(AttrValue::Literal(Literal::Number(n)))
            }
            TokenKind::Name(_) => {
                let path = self.parse_name_path()?;
                Ok(AttrValue::Literal(Literal::String(path.join("."))))
            }
            TokenKind::Type(name) if operator.is_equality() => {
                self.advance();
                Ok(AttrValue::Type(name))
            }
            TokenKind::Regex { source, flags } if operator.is_equality() => {
                let regex = compile_regex(&source, &flags, tok.pos)?;
                self.advance();
                Ok(AttrValue::Regex(regex))
            }
            _ => Err(self.unexpected()),
        }
    }
}

fn compile_regex(source: &str, flags: &str, pos: usize) -> Result<AttrRegex, SelectorError> {
    let mut inline = String::new();
    for flag in flags.chars() {
        match flag {
            'i' | 'm' | 's' => inline.push(flag),
            // Matching is always Unicode-aware.
            'u' => {}
            other => {
                return Err(SelectorError::new(
                    SelectorErrorKind::UnknownRegexFlag(other),
                    pos,
                    Some(format!("/{source}/{flags}")),
                ));
            }
        }
    }

    let pattern = if inline.is_empty() {
        source.to_string()
    } else {
        format!("(?{inline}){source}")
    };

    let regex = fancy_regex::Regex::new(&pattern).map_err(|e| {
        SelectorError::new(
            SelectorErrorKind::InvalidRegex(e.to_string()),
            pos,
            Some(format!("/{source}/{flags}")),
        )
    })?;

    Ok(AttrRegex {
        source: source.to_string(),
        flags: flags.to_string(),
        regex,
    })
}

fn starts_atom(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Star | TokenKind::Hash | TokenKind::Name(_) | TokenKind::Dot | TokenKind::LBracket
    )
}

fn starts_sequence(kind: &TokenKind) -> bool {
    *kind == TokenKind::Bang || starts_atom(kind)
}

/// Short source-like rendering of a token for error messages.
fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Whitespace => " ".to_string(),
        TokenKind::Comma => ",".to_string(),
        TokenKind::Gt => ">".to_string(),
        TokenKind::Bang => "!".to_string(),
        TokenKind::Star => "*".to_string(),
        TokenKind::Hash => "#".to_string(),
        TokenKind::Dot => ".".to_string(),
        TokenKind::LBracket => "[".to_string(),
        TokenKind::RBracket => "]".to_string(),
        TokenKind::Name(name) => name.clone(),
        TokenKind::Op(op) => op.to_string(),
        TokenKind::StringLiteral(s) => format!("{s:?}"),
        TokenKind::Number(n) => n.to_string(),
        TokenKind::Regex { source, flags } => format!("/{source}/{flags}"),
        TokenKind::Type(name) => format!("type({name})"),
    }
}
