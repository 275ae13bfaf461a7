//! Recursive-descent formula parser
//!
//! Precedence, lowest first: assignment (legacy only, right-associative),
//! conditional (`?:` and `if/then/else`), `or`, `and`, equality,
//! relational, additive, multiplicative, power (right-associative),
//! prefix unary, postfix (`%`, `²`), primary.

use crate::error::{DisplayError, Result};
use crate::formula::ast::{BinaryOp, Dialect, Expr, Formula, LogicalOp, UnaryOp};
use crate::formula::functions;
use crate::formula::lexer::{tokenize, Token, TokenKind};

/// Default bound on expression nesting
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Parser settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    pub dialect: Dialect,
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }
}

/// Parse `source` in the given dialect with default limits
pub fn parse(source: &str, dialect: Dialect) -> Result<Formula> {
    parse_with(source, &ParseOptions::new(dialect))
}

/// Parse `source` with explicit options
pub fn parse_with(source: &str, options: &ParseOptions) -> Result<Formula> {
    let mut tokens = tokenize(source)?;

    // Displays mark formula PV names with a leading '='
    if options.dialect == Dialect::Simplified
        && matches!(tokens.first(), Some(Token { kind: TokenKind::Assign, .. }))
    {
        tokens.remove(0);
    }

    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
        dialect: options.dialect,
        depth: 0,
        max_depth: options.max_depth,
    };
    let statements = parser.formula()?;
    Ok(Formula {
        dialect: options.dialect,
        statements,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    And,
    Or,
    Equals,
    If,
    Then,
    Else,
    True,
    False,
}

fn keyword(kind: &TokenKind) -> Option<Keyword> {
    match kind {
        TokenKind::Ident(text) => keyword_text(text),
        _ => None,
    }
}

fn keyword_text(text: &str) -> Option<Keyword> {
    let kw = match text.to_ascii_lowercase().as_str() {
        "and" => Keyword::And,
        "or" => Keyword::Or,
        "equals" => Keyword::Equals,
        "if" => Keyword::If,
        "then" => Keyword::Then,
        "else" => Keyword::Else,
        "true" => Keyword::True,
        "false" => Keyword::False,
        _ => return None,
    };
    Some(kw)
}

/// Whether a token can begin an operand; decides postfix vs binary `%`
fn starts_operand(kind: &TokenKind) -> bool {
    match kind {
        TokenKind::Number(_) | TokenKind::String(_) | TokenKind::LParen | TokenKind::LBracket => {
            true
        }
        TokenKind::Ident(_) => !matches!(
            keyword(kind),
            Some(Keyword::And | Keyword::Or | Keyword::Equals | Keyword::Then | Keyword::Else)
        ),
        _ => false,
    }
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    dialect: Dialect,
    depth: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn peek_at(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| &t.kind)
    }

    fn peek_keyword(&self) -> Option<Keyword> {
        self.peek().and_then(keyword)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn at(&self, kind: &TokenKind) -> bool {
        self.peek() == Some(kind)
    }

    /// Offset of the current token, or end of input
    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|t| t.span.start)
            .unwrap_or(self.source.len())
    }

    fn error_here(&self, message: impl Into<String>) -> DisplayError {
        DisplayError::syntax(self.source, self.offset(), message)
    }

    fn unexpected(&self) -> DisplayError {
        match self.peek() {
            Some(kind) => self.error_here(format!("unexpected {}", kind.describe())),
            None => self.error_here("unexpected end of formula"),
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<()> {
        if self.at(&kind) {
            self.pos += 1;
            Ok(())
        } else {
            let found = self
                .peek()
                .map(|k| k.describe())
                .unwrap_or_else(|| "end of formula".to_string());
            Err(self.error_here(format!("expected {}, found {}", kind.describe(), found)))
        }
    }

    fn expect_keyword(&mut self, expected: Keyword, spelling: &str) -> Result<()> {
        if self.peek_keyword() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error_here(format!("expected '{}'", spelling)))
        }
    }

    /// Take one nesting level, failing past `max_depth`
    fn deepen(&mut self) -> Result<()> {
        if self.depth >= self.max_depth {
            return Err(self.error_here(format!(
                "expression nested deeper than {} levels",
                self.max_depth
            )));
        }
        self.depth += 1;
        Ok(())
    }

    /// Run `f` one nesting level deeper
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.deepen()?;
        let result = f(self);
        self.depth -= 1;
        result
    }

    // ===== Grammar rules =====

    fn formula(&mut self) -> Result<Vec<Expr>> {
        if self.tokens.is_empty() {
            return Err(DisplayError::syntax(self.source, 0, "empty formula"));
        }

        let mut statements = Vec::new();
        loop {
            statements.push(self.expression()?);
            match self.peek() {
                None => break,
                Some(TokenKind::Semicolon) if self.dialect == Dialect::Legacy => {
                    self.pos += 1;
                    // A trailing ';' is allowed
                    if self.peek().is_none() {
                        break;
                    }
                }
                Some(TokenKind::Semicolon) => {
                    return Err(self.error_here(
                        "multiple statements are only allowed in the legacy dialect",
                    ));
                }
                Some(_) => return Err(self.unexpected()),
            }
        }
        Ok(statements)
    }

    fn expression(&mut self) -> Result<Expr> {
        self.nested(|p| p.assignment())
    }

    fn assignment(&mut self) -> Result<Expr> {
        let target_offset = self.offset();
        let expr = self.conditional()?;
        if !self.at(&TokenKind::Assign) {
            return Ok(expr);
        }
        if self.dialect != Dialect::Legacy {
            return Err(self.error_here("assignment is only allowed in the legacy dialect"));
        }
        let Expr::Symbol { name } = expr else {
            return Err(DisplayError::syntax(
                self.source,
                target_offset,
                "invalid assignment target",
            ));
        };
        self.pos += 1;
        let value = self.nested(|p| p.assignment())?;
        Ok(Expr::Assignment {
            target: name,
            value: Box::new(value),
        })
    }

    fn conditional(&mut self) -> Result<Expr> {
        if self.peek_keyword() == Some(Keyword::If) {
            return self.if_then_else();
        }

        let test = self.logic_or()?;
        if !self.at(&TokenKind::Question) {
            return Ok(test);
        }
        self.pos += 1;
        let consequent = self.expression()?;
        let alternate = if self.at(&TokenKind::Colon) {
            self.pos += 1;
            Some(Box::new(self.expression()?))
        } else {
            None
        };
        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate,
        })
    }

    fn if_then_else(&mut self) -> Result<Expr> {
        self.expect_keyword(Keyword::If, "if")?;
        let test = self.expression()?;
        self.expect_keyword(Keyword::Then, "then")?;
        let consequent = self.expression()?;
        let alternate = if self.peek_keyword() == Some(Keyword::Else) {
            self.pos += 1;
            Some(Box::new(self.expression()?))
        } else {
            None
        };
        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate,
        })
    }

    fn logic_or(&mut self) -> Result<Expr> {
        let entry = self.depth;
        let mut left = self.logic_and()?;
        while self.at(&TokenKind::OrOr) || self.peek_keyword() == Some(Keyword::Or) {
            self.pos += 1;
            self.deepen()?;
            let right = self.logic_and()?;
            left = Expr::logical(LogicalOp::Or, left, right);
        }
        self.depth = entry;
        Ok(left)
    }

    fn logic_and(&mut self) -> Result<Expr> {
        let entry = self.depth;
        let mut left = self.equality()?;
        while self.at(&TokenKind::AndAnd) || self.peek_keyword() == Some(Keyword::And) {
            self.pos += 1;
            self.deepen()?;
            let right = self.equality()?;
            left = Expr::logical(LogicalOp::And, left, right);
        }
        self.depth = entry;
        Ok(left)
    }

    fn equality(&mut self) -> Result<Expr> {
        let entry = self.depth;
        let mut left = self.relational()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::EqEq) => BinaryOp::Eq,
                Some(TokenKind::NotEq) => BinaryOp::Ne,
                _ if self.peek_keyword() == Some(Keyword::Equals) => BinaryOp::Eq,
                _ => break,
            };
            self.pos += 1;
            self.deepen()?;
            let right = self.relational()?;
            left = Expr::binary(op, left, right);
        }
        self.depth = entry;
        Ok(left)
    }

    fn relational(&mut self) -> Result<Expr> {
        let entry = self.depth;
        let mut left = self.additive()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::Lt) => BinaryOp::Lt,
                Some(TokenKind::Le) => BinaryOp::Le,
                Some(TokenKind::Gt) => BinaryOp::Gt,
                Some(TokenKind::Ge) => BinaryOp::Ge,
                _ => break,
            };
            self.pos += 1;
            self.deepen()?;
            let right = self.additive()?;
            left = Expr::binary(op, left, right);
        }
        self.depth = entry;
        Ok(left)
    }

    fn additive(&mut self) -> Result<Expr> {
        let entry = self.depth;
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            self.deepen()?;
            let right = self.multiplicative()?;
            left = Expr::binary(op, left, right);
        }
        self.depth = entry;
        Ok(left)
    }

    fn multiplicative(&mut self) -> Result<Expr> {
        let entry = self.depth;
        let mut left = self.power()?;
        loop {
            // Postfix '%' was already consumed by `postfix`, so any '%' here is modulo
            let op = match self.peek() {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                Some(TokenKind::Percent) => BinaryOp::Mod,
                _ => break,
            };
            self.pos += 1;
            self.deepen()?;
            let right = self.power()?;
            left = Expr::binary(op, left, right);
        }
        self.depth = entry;
        Ok(left)
    }

    fn power(&mut self) -> Result<Expr> {
        let base = self.unary()?;
        if !self.at(&TokenKind::Caret) {
            return Ok(base);
        }
        self.pos += 1;
        let exponent = self.nested(|p| p.power())?;
        Ok(Expr::binary(BinaryOp::Pow, base, exponent))
    }

    fn unary(&mut self) -> Result<Expr> {
        let op = match self.peek() {
            Some(TokenKind::Minus) => UnaryOp::Minus,
            Some(TokenKind::Plus) => UnaryOp::Plus,
            _ => return self.postfix(),
        };
        self.pos += 1;
        let operand = self.nested(|p| p.unary())?;
        Ok(Expr::unary(op, operand))
    }

    fn postfix(&mut self) -> Result<Expr> {
        let entry = self.depth;
        let mut expr = self.primary()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::Squared) => UnaryOp::Square,
                Some(TokenKind::Percent) if !self.peek_at(1).is_some_and(starts_operand) => {
                    UnaryOp::Percent
                }
                _ => break,
            };
            self.deepen()?;
            self.pos += 1;
            expr = Expr::unary(op, expr);
        }
        self.depth = entry;
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr> {
        let offset = self.offset();
        let Some(token) = self.advance() else {
            return Err(self.error_here("unexpected end of formula"));
        };

        match token.kind {
            TokenKind::Number(value) => Ok(Expr::Number { value }),
            TokenKind::String(value) => Ok(Expr::String { value }),
            TokenKind::LParen => {
                let inner = self.expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::LBracket => {
                let inner = self.expression()?;
                self.expect(TokenKind::RBracket)?;
                Ok(Expr::unary(UnaryOp::Abs, inner))
            }
            TokenKind::Ident(name) => self.identifier(name, offset),
            other => Err(DisplayError::syntax(
                self.source,
                offset,
                format!("unexpected {}", other.describe()),
            )),
        }
    }

    fn identifier(&mut self, name: String, offset: usize) -> Result<Expr> {
        match keyword_text(&name) {
            Some(Keyword::True) => Ok(Expr::Boolean { value: true }),
            Some(Keyword::False) => Ok(Expr::Boolean { value: false }),
            Some(Keyword::If) => {
                self.pos -= 1;
                self.nested(|p| p.if_then_else())
            }
            Some(_) => Err(DisplayError::syntax(
                self.source,
                offset,
                format!("unexpected keyword '{}'", name),
            )),
            None if self.at(&TokenKind::LParen) => self.call(name, offset),
            None => Ok(Expr::Symbol { name }),
        }
    }

    fn call(&mut self, callee: String, offset: usize) -> Result<Expr> {
        self.expect(TokenKind::LParen)?;
        let mut arguments = Vec::new();
        if !self.at(&TokenKind::RParen) {
            loop {
                arguments.push(self.expression()?);
                if self.at(&TokenKind::Comma) {
                    self.pos += 1;
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;

        if functions::is_accessor(&callee) {
            let well_formed = matches!(
                arguments.as_slice(),
                [Expr::String { .. }] | [Expr::Symbol { .. }]
            );
            if !well_formed {
                return Err(DisplayError::syntax(
                    self.source,
                    offset,
                    format!("{} expects a single string or symbol argument", callee),
                ));
            }
        }

        Ok(Expr::Call { callee, arguments })
    }
}
