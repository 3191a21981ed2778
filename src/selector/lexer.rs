//! Selector lexer.
//!
//! Tokenizes selector strings like `FunctionDeclaration > Identifier[name=/^_/]`.
//! Whitespace is significant between compound selectors (it is the
//! descendant combinator) and insignificant inside `[...]`, so the lexer
//! tracks which of the three contexts it is in.

use super::ast::AttrOp;
use super::error::{SelectorError, SelectorErrorKind};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// A run of whitespace outside brackets.
    Whitespace,
    Comma,
    Gt,
    Bang,
    Star,
    Hash,
    Dot,
    LBracket,
    RBracket,
    Name(String),
    Op(AttrOp),
    StringLiteral(String),
    Number(f64),
    Regex { source: String, flags: String },
    Type(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first character of the token.
    pub pos: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Selector,
    Attribute,
    AttributeValue,
}

pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    mode: Mode,
}

const RESERVED: &str = " [],():#!=><~+.";

pub(crate) fn is_name_char(ch: char) -> bool {
    !ch.is_whitespace() && !RESERVED.contains(ch)
}

fn is_space(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r')
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            mode: Mode::Selector,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn read_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            self.pos += ch.len_utf8();
        }
        &self.input[start..self.pos]
    }

    fn skip_spaces(&mut self) {
        self.read_while(is_space);
    }

    fn unexpected(&self, ch: char) -> SelectorError {
        SelectorError::at_char(SelectorErrorKind::UnexpectedCharacter, self.pos, ch)
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, SelectorError> {
        let mut tokens = Vec::new();

        loop {
            if self.mode != Mode::Selector {
                self.skip_spaces();
            }
            let start = self.pos;
            let Some(ch) = self.peek() else { break };

            let kind = match self.mode {
                Mode::Selector => self.lex_selector(ch)?,
                Mode::Attribute => self.lex_attribute(ch)?,
                Mode::AttributeValue => {
                    self.mode = Mode::Attribute;
                    self.lex_value(ch)?
                }
            };
            tokens.push(Token { kind, pos: start });
        }

        Ok(tokens)
    }

    fn lex_selector(&mut self, ch: char) -> Result<TokenKind, SelectorError> {
        let kind = match ch {
            _ if is_space(ch) => {
                self.skip_spaces();
                return Ok(TokenKind::Whitespace);
            }
            ',' => TokenKind::Comma,
            '>' => TokenKind::Gt,
            '!' => TokenKind::Bang,
            '*' => TokenKind::Star,
            '#' => TokenKind::Hash,
            '.' => TokenKind::Dot,
            '[' => {
                self.mode = Mode::Attribute;
                TokenKind::LBracket
            }
            _ if is_name_char(ch) => {
                return Ok(TokenKind::Name(self.read_while(is_name_char).to_string()));
            }
            _ => return Err(self.unexpected(ch)),
        };
        self.advance();
        Ok(kind)
    }

    fn lex_attribute(&mut self, ch: char) -> Result<TokenKind, SelectorError> {
        match ch {
            ']' => {
                self.advance();
                self.mode = Mode::Selector;
                Ok(TokenKind::RBracket)
            }
            '.' => {
                self.advance();
                Ok(TokenKind::Dot)
            }
            '=' | '!' | '<' | '>' => {
                let op = self.lex_operator(ch)?;
                self.mode = Mode::AttributeValue;
                Ok(TokenKind::Op(op))
            }
            _ if is_name_char(ch) => Ok(TokenKind::Name(self.read_while(is_name_char).to_string())),
            _ => Err(self.unexpected(ch)),
        }
    }

    fn lex_operator(&mut self, ch: char) -> Result<AttrOp, SelectorError> {
        let followed_by_eq = self.peek_nth(1) == Some('=');
        let op = match (ch, followed_by_eq) {
            ('=', _) => AttrOp::Eq,
            ('!', true) => AttrOp::NotEq,
            ('<', true) => AttrOp::Le,
            ('<', false) => AttrOp::Lt,
            ('>', true) => AttrOp::Ge,
            ('>', false) => AttrOp::Gt,
            _ => return Err(self.unexpected(ch)),
        };
        self.advance();
        if op != AttrOp::Eq && followed_by_eq {
            self.advance();
        }
        Ok(op)
    }

    fn lex_value(&mut self, ch: char) -> Result<TokenKind, SelectorError> {
        match ch {
            '"' | '\'' => self.lex_string(ch),
            '/' => self.lex_regex(),
            _ if self.rest().starts_with("type(") => self.lex_type(),
            // Digits running on into name characters (`1abc`, `2-3`) are a
            // bareword, not a number followed by junk.
            _ if self.at_number() && !(is_name_char(ch) && self.number_runs_into_name()) => {
                self.lex_number()
            }
            _ if is_name_char(ch) => Ok(TokenKind::Name(self.read_while(is_name_char).to_string())),
            _ => Err(self.unexpected(ch)),
        }
    }

    fn number_runs_into_name(&self) -> bool {
        self.input[self.number_end()..]
            .chars()
            .next()
            .is_some_and(is_name_char)
    }

    fn at_number(&self) -> bool {
        let mut chars = self.rest().chars();
        let mut ch = chars.next();
        if ch == Some('-') {
            ch = chars.next();
        }
        match ch {
            Some(c) if c.is_ascii_digit() => true,
            Some('.') => chars.next().is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        }
    }

    /// Byte offset just past `-? [0-9]* "."? [0-9]+` starting here.
    fn number_end(&self) -> usize {
        let bytes = self.rest().as_bytes();
        let digits_from = |mut i: usize| {
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            i
        };
        let mut end = usize::from(bytes.first() == Some(&b'-'));
        end = digits_from(end);
        if bytes.get(end) == Some(&b'.') && bytes.get(end + 1).is_some_and(u8::is_ascii_digit) {
            end = digits_from(end + 1);
        }
        self.pos + end
    }

    fn lex_number(&mut self) -> Result<TokenKind, SelectorError> {
        let start = self.pos;
        self.pos = self.number_end();
        let text = &self.input[start..self.pos];
        text.parse::<f64>().map(TokenKind::Number).map_err(|_| {
            SelectorError::new(SelectorErrorKind::InvalidNumber, start, Some(text.to_string()))
        })
    }

    fn lex_string(&mut self, quote: char) -> Result<TokenKind, SelectorError> {
        let start = self.pos;
        self.advance();
        let mut value = String::new();
        loop {
            match self.advance() {
                None => {
                    return Err(SelectorError::new(
                        SelectorErrorKind::UnterminatedString,
                        start,
                        None,
                    ));
                }
                Some(c) if c == quote => break,
                Some('\\') => {
                    let Some(escaped) = self.advance() else {
                        return Err(SelectorError::new(
                            SelectorErrorKind::UnterminatedString,
                            start,
                            None,
                        ));
                    };
                    value.push(unescape(escaped));
                }
                Some(c) => value.push(c),
            }
        }
        Ok(TokenKind::StringLiteral(value))
    }

    fn lex_regex(&mut self) -> Result<TokenKind, SelectorError> {
        let start = self.pos;
        self.advance();
        let body_start = self.pos;
        let mut escaped = false;
        loop {
            match self.peek() {
                None => {
                    return Err(SelectorError::new(
                        SelectorErrorKind::UnterminatedRegex,
                        start,
                        None,
                    ));
                }
                Some('/') if !escaped => break,
                Some(c) => {
                    escaped = c == '\\' && !escaped;
                    self.advance();
                }
            }
        }
        let source = self.input[body_start..self.pos].to_string();
        self.advance();
        if source.is_empty() {
            return Err(SelectorError::new(
                SelectorErrorKind::InvalidRegex("empty pattern".to_string()),
                start,
                Some("//".to_string()),
            ));
        }
        let flags = self.read_while(|c| c.is_ascii_alphabetic()).to_string();
        Ok(TokenKind::Regex { source, flags })
    }

    fn lex_type(&mut self) -> Result<TokenKind, SelectorError> {
        let start = self.pos;
        self.pos += "type(".len();
        let inner = self.read_while(|c| c != ')');
        if self.advance() != Some(')') {
            return Err(SelectorError::new(
                SelectorErrorKind::UnterminatedType,
                start,
                None,
            ));
        }
        let name = inner.trim();
        if name.is_empty() || name.contains(is_space) {
            return Err(SelectorError::new(
                SelectorErrorKind::UnexpectedToken,
                start,
                Some(format!("type({inner})")),
            ));
        }
        Ok(TokenKind::Type(name.to_string()))
    }
}

fn unescape(ch: char) -> char {
    match ch {
        'b' => '\u{8}',
        'f' => '\u{c}',
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'v' => '\u{b}',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn name(s: &str) -> TokenKind {
        TokenKind::Name(s.to_string())
    }

    #[test]
    fn test_lexer_basic() {
        assert_eq!(
            kinds("FunctionDeclaration > Identifier"),
            vec![
                name("FunctionDeclaration"),
                TokenKind::Whitespace,
                TokenKind::Gt,
                TokenKind::Whitespace,
                name("Identifier"),
            ]
        );
    }

    #[test]
    fn test_lexer_collapses_whitespace_runs() {
        assert_eq!(
            kinds("A \t\n B"),
            vec![name("A"), TokenKind::Whitespace, name("B")]
        );
    }

    #[test]
    fn test_lexer_positions() {
        let tokens = Lexer::new("A, *").tokenize().unwrap();
        let positions: Vec<usize> = tokens.iter().map(|t| t.pos).collect();
        assert_eq!(positions, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_lexer_field_and_subject() {
        assert_eq!(
            kinds("!#Identifier.id.name"),
            vec![
                TokenKind::Bang,
                TokenKind::Hash,
                name("Identifier"),
                TokenKind::Dot,
                name("id"),
                TokenKind::Dot,
                name("name"),
            ]
        );
    }

    #[test]
    fn test_lexer_attribute_ignores_inner_whitespace() {
        assert_eq!(
            kinds("[ count >= 2 ]"),
            vec![
                TokenKind::LBracket,
                name("count"),
                TokenKind::Op(AttrOp::Ge),
                TokenKind::Number(2.0),
                TokenKind::RBracket,
            ]
        );
    }

    #[test]
    fn test_lexer_all_operators() {
        for (input, op) in [
            ("[a=1]", AttrOp::Eq),
            ("[a!=1]", AttrOp::NotEq),
            ("[a<1]", AttrOp::Lt),
            ("[a<=1]", AttrOp::Le),
            ("[a>1]", AttrOp::Gt),
            ("[a>=1]", AttrOp::Ge),
        ] {
            assert_eq!(kinds(input)[2], TokenKind::Op(op), "Failed for input: {input}");
        }
    }

    #[test]
    fn test_lexer_string_escapes() {
        assert_eq!(
            kinds(r#"[name="a\"b\n\q"]"#)[3],
            TokenKind::StringLiteral("a\"b\nq".to_string())
        );
        assert_eq!(
            kinds("[name='x y']")[3],
            TokenKind::StringLiteral("x y".to_string())
        );
    }

    #[test]
    fn test_lexer_regex_with_flags() {
        assert_eq!(
            kinds(r"[name=/^foo\/bar/i]")[3],
            TokenKind::Regex {
                source: r"^foo\/bar".to_string(),
                flags: "i".to_string(),
            }
        );
    }

    #[test]
    fn test_lexer_type_value() {
        assert_eq!(
            kinds("[value=type( string )]")[3],
            TokenKind::Type("string".to_string())
        );
    }

    #[test]
    fn test_lexer_numbers() {
        assert_eq!(kinds("[a>.5]")[3], TokenKind::Number(0.5));
        assert_eq!(kinds("[a>-3]")[3], TokenKind::Number(-3.0));
        assert_eq!(kinds("[a>12.25]")[3], TokenKind::Number(12.25));
    }

    #[test]
    fn test_lexer_digits_running_into_a_name_are_a_bareword() {
        assert_eq!(kinds("[name=1abc]")[3], name("1abc"));
        assert_eq!(kinds("[name=2-3]")[3], name("2-3"));
        assert_eq!(kinds("[name=-1x]")[3], name("-1x"));
        assert_eq!(kinds("[name=7 ]")[3], TokenKind::Number(7.0));
        assert_eq!(kinds("[name=-7]")[3], TokenKind::Number(-7.0));
    }

    #[test]
    fn test_lexer_bareword_path_value() {
        assert_eq!(
            kinds("[kind=var.x]"),
            vec![
                TokenKind::LBracket,
                name("kind"),
                TokenKind::Op(AttrOp::Eq),
                name("var"),
                TokenKind::Dot,
                name("x"),
                TokenKind::RBracket,
            ]
        );
    }

    #[test]
    fn test_lexer_star_then_name() {
        assert_eq!(kinds("*"), vec![TokenKind::Star]);
        assert_eq!(kinds("A*"), vec![name("A*")]);
    }

    #[test]
    fn test_lexer_rejects_reserved_characters() {
        for (input, pos) in [("A ~ B", 2), ("A + B", 2), ("A:first", 1), ("(A)", 0)] {
            let err = Lexer::new(input).tokenize().unwrap_err();
            assert_eq!(err.kind, SelectorErrorKind::UnexpectedCharacter, "{input}");
            assert_eq!(err.position, pos, "{input}");
        }
    }

    #[test]
    fn test_lexer_unterminated_literals() {
        let err = Lexer::new("[a=\"abc]").tokenize().unwrap_err();
        assert_eq!(err.kind, SelectorErrorKind::UnterminatedString);
        assert_eq!(err.position, 3);

        let err = Lexer::new("[a=/abc]").tokenize().unwrap_err();
        assert_eq!(err.kind, SelectorErrorKind::UnterminatedRegex);

        let err = Lexer::new("[a=type(abc]").tokenize().unwrap_err();
        assert_eq!(err.kind, SelectorErrorKind::UnterminatedType);
    }

    #[test]
    fn test_lexer_lone_bang_in_attribute() {
        let err = Lexer::new("[a!b]").tokenize().unwrap_err();
        assert_eq!(err.kind, SelectorErrorKind::UnexpectedCharacter);
        assert_eq!(err.position, 2);
    }

    #[test]
    fn test_lexer_multibyte_positions() {
        let tokens = Lexer::new("é > B").tokenize().unwrap();
        assert_eq!(tokens[0].kind, name("é"));
        assert_eq!(tokens[2].pos, 3);
    }
}
