//! Formula syntax tree
//!
//! The tree is produced once by the parser and never mutated afterwards;
//! evaluators share it behind an `Arc`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Grammar variant a formula is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Statement lists with assignment; bare symbols are display-local path names
    Legacy,
    /// A single expression; bare symbols are canonical identifiers
    #[default]
    Simplified,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Legacy => f.write_str("legacy"),
            Dialect::Simplified => f.write_str("simplified"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    /// Prefix `-`
    Minus,
    /// Prefix `+`
    Plus,
    /// `[expr]`
    Abs,
    /// Postfix `%`, divides by 100
    Percent,
    /// Postfix `²`
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "^",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogicalOp {
    And,
    Or,
}

/// One expression node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Expr {
    Number {
        value: f64,
    },
    String {
        value: String,
    },
    Boolean {
        value: bool,
    },
    /// Named parameter, path name or assigned local
    Symbol {
        name: String,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Option<Box<Expr>>,
    },
    Call {
        callee: String,
        arguments: Vec<Expr>,
    },
    Assignment {
        target: String,
        value: Box<Expr>,
    },
}

impl Expr {
    pub(crate) fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub(crate) fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub(crate) fn logical(op: LogicalOp, left: Expr, right: Expr) -> Self {
        Expr::Logical {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Visit this node and every descendant, parents before children,
    /// left to right, including both branches of conditionals
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Expr)) {
        visit(self);
        match self {
            Expr::Number { .. }
            | Expr::String { .. }
            | Expr::Boolean { .. }
            | Expr::Symbol { .. } => {}
            Expr::Unary { operand, .. } => operand.walk(visit),
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                left.walk(visit);
                right.walk(visit);
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                test.walk(visit);
                consequent.walk(visit);
                if let Some(alternate) = alternate {
                    alternate.walk(visit);
                }
            }
            Expr::Call { arguments, .. } => {
                for argument in arguments {
                    argument.walk(visit);
                }
            }
            Expr::Assignment { value, .. } => value.walk(visit),
        }
    }
}

/// A parsed formula: one statement in the simplified dialect, one or more in legacy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Formula {
    pub dialect: Dialect,
    pub statements: Vec<Expr>,
}

impl Formula {
    /// Walk every statement in order
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Expr)) {
        for statement in &self.statements {
            statement.walk(visit);
        }
    }
}
