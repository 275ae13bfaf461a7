//! Formula tokenizer
//!
//! Produces a flat token list with byte spans. Keywords are not
//! distinguished here; the parser matches identifier text
//! case-insensitively so a symbol named like a keyword stays a keyword.

use crate::error::{DisplayError, Result};

/// Byte range of a token in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    String(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Squared,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Question,
    Colon,
    Assign,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
}

impl TokenKind {
    /// Human-readable rendering for error messages
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Number(n) => format!("number {}", n),
            TokenKind::String(s) => format!("string '{}'", s),
            TokenKind::Ident(name) => format!("'{}'", name),
            TokenKind::Plus => "'+'".into(),
            TokenKind::Minus => "'-'".into(),
            TokenKind::Star => "'*'".into(),
            TokenKind::Slash => "'/'".into(),
            TokenKind::Percent => "'%'".into(),
            TokenKind::Caret => "'^'".into(),
            TokenKind::Squared => "'²'".into(),
            TokenKind::LParen => "'('".into(),
            TokenKind::RParen => "')'".into(),
            TokenKind::LBracket => "'['".into(),
            TokenKind::RBracket => "']'".into(),
            TokenKind::Comma => "','".into(),
            TokenKind::Semicolon => "';'".into(),
            TokenKind::Question => "'?'".into(),
            TokenKind::Colon => "':'".into(),
            TokenKind::Assign => "'='".into(),
            TokenKind::EqEq => "'=='".into(),
            TokenKind::NotEq => "'!='".into(),
            TokenKind::Lt => "'<'".into(),
            TokenKind::Le => "'<='".into(),
            TokenKind::Gt => "'>'".into(),
            TokenKind::Ge => "'>='".into(),
            TokenKind::AndAnd => "'&&'".into(),
            TokenKind::OrOr => "'||'".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// Split `source` into tokens
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut lexer = Lexer {
        source,
        chars: source.char_indices().peekable(),
        tokens: Vec::new(),
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn run(&mut self) -> Result<()> {
        while let Some((start, ch)) = self.chars.next() {
            if ch.is_whitespace() {
                continue;
            }

            let kind = match ch {
                '+' => TokenKind::Plus,
                '-' => TokenKind::Minus,
                '*' => TokenKind::Star,
                '/' => TokenKind::Slash,
                '%' => TokenKind::Percent,
                '^' => TokenKind::Caret,
                '²' => TokenKind::Squared,
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                '[' => TokenKind::LBracket,
                ']' => TokenKind::RBracket,
                ',' => TokenKind::Comma,
                ';' => TokenKind::Semicolon,
                '?' => TokenKind::Question,
                ':' => TokenKind::Colon,
                '=' => {
                    if self.eat('=') {
                        TokenKind::EqEq
                    } else {
                        TokenKind::Assign
                    }
                }
                '!' => {
                    if self.eat('=') {
                        TokenKind::NotEq
                    } else {
                        return Err(DisplayError::syntax(
                            self.source,
                            start,
                            "unexpected '!' (did you mean '!='?)",
                        ));
                    }
                }
                '<' => {
                    if self.eat('=') {
                        TokenKind::Le
                    } else if self.eat('>') {
                        TokenKind::NotEq
                    } else {
                        TokenKind::Lt
                    }
                }
                '>' => {
                    if self.eat('=') {
                        TokenKind::Ge
                    } else {
                        TokenKind::Gt
                    }
                }
                '&' => {
                    if self.eat('&') {
                        TokenKind::AndAnd
                    } else {
                        return Err(DisplayError::syntax(
                            self.source,
                            start,
                            "unexpected '&' (did you mean '&&'?)",
                        ));
                    }
                }
                '|' => {
                    if self.eat('|') {
                        TokenKind::OrOr
                    } else {
                        return Err(DisplayError::syntax(
                            self.source,
                            start,
                            "unexpected '|' (did you mean '||'?)",
                        ));
                    }
                }
                '\'' | '"' => self.string(start, ch)?,
                c if c.is_ascii_digit() => self.number(start)?,
                '.' if self.peek_is(|c| c.is_ascii_digit()) => self.number(start)?,
                c if c.is_alphabetic() || c == '_' => self.ident(start),
                other => {
                    return Err(DisplayError::syntax(
                        self.source,
                        start,
                        format!("unexpected character '{}'", other),
                    ));
                }
            };

            let end = self.position();
            self.tokens.push(Token {
                kind,
                span: Span { start, end },
            });
        }
        Ok(())
    }

    /// Byte offset of the next unread character
    fn position(&mut self) -> usize {
        self.chars
            .peek()
            .map(|(idx, _)| *idx)
            .unwrap_or(self.source.len())
    }

    fn peek_is(&mut self, pred: impl Fn(char) -> bool) -> bool {
        self.chars.peek().is_some_and(|(_, c)| pred(*c))
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek_is(|c| c == expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn string(&mut self, start: usize, quote: char) -> Result<TokenKind> {
        let mut value = String::new();
        loop {
            match self.chars.next() {
                None => {
                    return Err(DisplayError::syntax(
                        self.source,
                        start,
                        "unterminated string literal",
                    ));
                }
                Some((_, c)) if c == quote => return Ok(TokenKind::String(value)),
                Some((idx, '\\')) => match self.chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, 'r')) => value.push('\r'),
                    Some((_, c @ ('\\' | '\'' | '"'))) => value.push(c),
                    Some((_, other)) => {
                        return Err(DisplayError::syntax(
                            self.source,
                            idx,
                            format!("unknown escape sequence '\\{}'", other),
                        ));
                    }
                    None => {
                        return Err(DisplayError::syntax(
                            self.source,
                            start,
                            "unterminated string literal",
                        ));
                    }
                },
                Some((_, c)) => value.push(c),
            }
        }
    }

    fn number(&mut self, start: usize) -> Result<TokenKind> {
        while self.peek_is(|c| c.is_ascii_digit() || c == '.') {
            self.chars.next();
        }
        // Exponent only when a digit follows, so `2e` stays "2" then symbol "e"
        if self.peek_is(|c| c == 'e' || c == 'E') {
            let source = self.source;
            let pos = self.position();
            let mut after = source[pos..].chars().skip(1);
            let exponent_follows = match after.next() {
                Some('+') | Some('-') => after.next().is_some_and(|c| c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if exponent_follows {
                self.chars.next();
                if self.peek_is(|c| c == '+' || c == '-') {
                    self.chars.next();
                }
                while self.peek_is(|c| c.is_ascii_digit()) {
                    self.chars.next();
                }
            }
        }
        let source = self.source;
        let end = self.position();
        let text = &source[start..end];
        text.parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| DisplayError::syntax(source, start, format!("invalid number '{}'", text)))
    }

    fn ident(&mut self, start: usize) -> TokenKind {
        while self.peek_is(|c| c.is_alphabetic() || c.is_ascii_digit() || c == '_' || c == '.') {
            self.chars.next();
        }
        let end = self.position();
        TokenKind::Ident(self.source[start..end].to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("<> <= >= == != && || = ²"),
            vec![
                TokenKind::NotEq,
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::AndAnd,
                TokenKind::OrOr,
                TokenKind::Assign,
                TokenKind::Squared,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("3 .5 1.25e2 2e"),
            vec![
                TokenKind::Number(3.0),
                TokenKind::Number(0.5),
                TokenKind::Number(125.0),
                TokenKind::Number(2.0),
                TokenKind::Ident("e".into()),
            ]
        );
    }

    #[test]
    fn test_invalid_number() {
        let err = tokenize("1.2.3").unwrap_err();
        assert!(err.is_syntax());
    }

    #[test]
    fn test_strings_both_quotes() {
        assert_eq!(
            kinds(r#"'a b' "it\'s" 'say "hi"'"#),
            vec![
                TokenKind::String("a b".into()),
                TokenKind::String("it's".into()),
                TokenKind::String("say \"hi\"".into()),
            ]
        );
    }

    #[test]
    fn test_unterminated_string_reports_start() {
        match tokenize("1 + 'abc").unwrap_err() {
            DisplayError::Syntax { offset, column, .. } => {
                assert_eq!(offset, 4);
                assert_eq!(column, 5);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_identifier_with_dots() {
        assert_eq!(
            kinds("Battery.Voltage_2"),
            vec![TokenKind::Ident("Battery.Voltage_2".into())]
        );
    }

    #[test]
    fn test_spans_after_multibyte_char() {
        let tokens = tokenize("x² + 1").unwrap();
        assert_eq!(tokens[1].span, Span { start: 1, end: 3 });
        assert_eq!(tokens[2].span.start, 4);
    }

    #[test]
    fn test_unexpected_character() {
        assert!(tokenize("a # b").unwrap_err().is_syntax());
        assert!(tokenize("a & b").unwrap_err().is_syntax());
    }
}
