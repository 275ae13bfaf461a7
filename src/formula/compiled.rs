//! Formula evaluator
//!
//! A [`CompiledFormula`] owns a shared, immutable syntax tree plus the
//! mutable environment it is evaluated against: the binding table (path
//! names and data-source statuses) and the symbols assigned by legacy
//! statements. Value updates only touch the environment; the tree is
//! parsed once.

use crate::error::{DisplayError, Result};
use crate::formula::ast::{BinaryOp, Dialect, Expr, Formula, LogicalOp, UnaryOp};
use crate::formula::bindings::BindingTable;
use crate::formula::functions::{self, Builtin};
use crate::formula::parser::{parse_with, ParseOptions};
use crate::types::{DataSourceStatus, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

/// A parsed formula together with its evaluation environment
#[derive(Debug, Clone)]
pub struct CompiledFormula {
    source: String,
    formula: Arc<Formula>,
    bindings: BindingTable,
    /// Symbols bound by assignment, persisted across executions
    locals: HashMap<String, Value>,
}

impl CompiledFormula {
    /// Parse `source` in `dialect` with default limits
    pub fn compile(source: &str, dialect: Dialect) -> Result<Self> {
        Self::compile_with(source, &ParseOptions::new(dialect))
    }

    /// Parse `source` with explicit parser options
    pub fn compile_with(source: &str, options: &ParseOptions) -> Result<Self> {
        let formula = parse_with(source, options)?;
        Ok(Self::from_formula(source, Arc::new(formula)))
    }

    /// Wrap an already parsed (possibly shared) formula
    pub fn from_formula(source: impl Into<String>, formula: Arc<Formula>) -> Self {
        Self {
            source: source.into(),
            formula,
            bindings: BindingTable::new(),
            locals: HashMap::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    pub fn dialect(&self) -> Dialect {
        self.formula.dialect
    }

    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    /// Value currently bound to an assigned symbol
    pub fn local(&self, name: &str) -> Option<&Value> {
        self.locals.get(name)
    }

    /// Map a display-local path name to a canonical identifier (last write wins)
    pub fn register_data_source_mapping(
        &mut self,
        path_name: impl Into<String>,
        canonical: impl Into<String>,
    ) {
        self.bindings.register_mapping(path_name, canonical);
    }

    /// Record the latest status of a canonical identifier
    pub fn update_data_source(&mut self, canonical: &str, status: DataSourceStatus) {
        tracing::trace!("Data source update {} = {}", canonical, status.value);
        self.bindings.update(canonical, status);
    }

    /// Reset the environment: received statuses and assigned symbols.
    /// Path name mappings are kept.
    pub fn clear_state(&mut self) {
        self.bindings.clear_statuses();
        self.locals.clear();
    }

    /// Evaluate against the current environment.
    ///
    /// Evaluation errors are logged and yield `Value::Undefined`.
    pub fn execute(&mut self) -> Value {
        match self.try_execute() {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Formula '{}' evaluation failed: {}", self.source, e);
                Value::Undefined
            }
        }
    }

    /// Evaluate against the current environment, returning evaluation errors
    pub fn try_execute(&mut self) -> Result<Value> {
        let mut evaluation = Evaluation {
            dialect: self.formula.dialect,
            bindings: &self.bindings,
            locals: &mut self.locals,
        };
        let mut result = Value::Undefined;
        for statement in &self.formula.statements {
            result = evaluation.eval(statement)?;
        }
        Ok(result)
    }

    /// Canonical identifiers referenced anywhere in the formula, in order of
    /// first occurrence, including references on branches that may never run
    pub fn get_parameters(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for name in self.data_source_reads() {
            match canonical_for(self.formula.dialect, &self.bindings, name) {
                Some(canonical) => {
                    if !ids.iter().any(|id| id == canonical) {
                        ids.push(canonical.to_string());
                    }
                }
                None => tracing::debug!(
                    "Formula '{}' references unmapped path name {}",
                    self.source,
                    name
                ),
            }
        }
        ids
    }

    /// Fail on the first path name that has no registered mapping
    pub fn check_references(&self) -> Result<()> {
        if self.formula.dialect != Dialect::Legacy {
            return Ok(());
        }
        match self
            .data_source_reads()
            .into_iter()
            .find(|name| self.bindings.resolve(name).is_none())
        {
            Some(name) => Err(DisplayError::UnresolvedReference(name.to_string())),
            None => Ok(()),
        }
    }

    /// Names read from the environment's data sources, in evaluation order
    fn data_source_reads(&self) -> Vec<&str> {
        let mut bound = Vec::new();
        let mut reads = Vec::new();
        for statement in &self.formula.statements {
            collect_reads(statement, &mut bound, &mut reads);
        }
        reads
    }
}

/// Walk `expr` in evaluation order. A bare symbol read after an assignment
/// to it is a local; accessor arguments always name a data source.
fn collect_reads<'f>(expr: &'f Expr, bound: &mut Vec<&'f str>, reads: &mut Vec<&'f str>) {
    match expr {
        Expr::Number { .. } | Expr::String { .. } | Expr::Boolean { .. } => {}
        Expr::Symbol { name } => {
            if !bound.contains(&name.as_str()) {
                reads.push(name);
            }
        }
        Expr::Unary { operand, .. } => collect_reads(operand, bound, reads),
        Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
            collect_reads(left, bound, reads);
            collect_reads(right, bound, reads);
        }
        Expr::Conditional {
            test,
            consequent,
            alternate,
        } => {
            collect_reads(test, bound, reads);
            collect_reads(consequent, bound, reads);
            if let Some(alternate) = alternate {
                collect_reads(alternate, bound, reads);
            }
        }
        Expr::Call { callee, arguments } if functions::is_accessor(callee) => {
            match arguments.as_slice() {
                [Expr::String { value }] => reads.push(value),
                [Expr::Symbol { name }] => reads.push(name),
                _ => {}
            }
        }
        Expr::Call { arguments, .. } => {
            for argument in arguments {
                collect_reads(argument, bound, reads);
            }
        }
        Expr::Assignment { target, value } => {
            collect_reads(value, bound, reads);
            if !bound.contains(&target.as_str()) {
                bound.push(target);
            }
        }
    }
}

/// How a referenced name maps to a canonical identifier in each dialect
fn canonical_for<'a>(
    dialect: Dialect,
    bindings: &'a BindingTable,
    name: &'a str,
) -> Option<&'a str> {
    match dialect {
        Dialect::Legacy => bindings.resolve(name),
        Dialect::Simplified => Some(bindings.resolve_or_self(name)),
    }
}

/// One evaluation pass
struct Evaluation<'a> {
    dialect: Dialect,
    bindings: &'a BindingTable,
    locals: &'a mut HashMap<String, Value>,
}

impl<'a> Evaluation<'a> {
    fn eval(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Number { value } => Ok(Value::Number(*value)),
            Expr::String { value } => Ok(Value::String(value.clone())),
            Expr::Boolean { value } => Ok(Value::Boolean(*value)),
            Expr::Symbol { name } => Ok(self.symbol(name)),
            Expr::Unary { op, operand } => {
                let operand = self.eval(operand)?;
                Ok(apply_unary(*op, &operand))
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                Ok(apply_binary(*op, &left, &right))
            }
            Expr::Logical { op, left, right } => {
                let left = self.eval(left)?;
                match (op, left.is_truthy()) {
                    (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(left),
                    _ => self.eval(right),
                }
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test)?.is_truthy() {
                    self.eval(consequent)
                } else {
                    match alternate {
                        Some(alternate) => self.eval(alternate),
                        None => Ok(Value::Null),
                    }
                }
            }
            Expr::Call { callee, arguments } => self.call(callee, arguments),
            Expr::Assignment { target, value } => {
                let value = self.eval(value)?;
                self.locals.insert(target.clone(), value.clone());
                Ok(value)
            }
        }
    }

    fn symbol(&self, name: &str) -> Value {
        if let Some(value) = self.locals.get(name) {
            return value.clone();
        }
        self.data_source_value(name)
    }

    fn status(&self, name: &str) -> Option<&'a DataSourceStatus> {
        let bindings: &'a BindingTable = self.bindings;
        match canonical_for(self.dialect, bindings, name) {
            Some(canonical) => bindings.status(canonical),
            None => {
                tracing::debug!("{}", DisplayError::UnresolvedReference(name.to_string()));
                None
            }
        }
    }

    fn data_source_value(&self, name: &str) -> Value {
        self.status(name)
            .map(|status| Value::from(&status.value))
            .unwrap_or(Value::Undefined)
    }

    fn call(&mut self, callee: &str, arguments: &[Expr]) -> Result<Value> {
        let Some(builtin) = functions::lookup(callee) else {
            return Err(DisplayError::UnsupportedOperation(format!(
                "unknown function '{}'",
                callee
            )));
        };

        match builtin {
            Builtin::Math(math) => {
                let [argument] = arguments else {
                    return Err(DisplayError::UnsupportedOperation(format!(
                        "{}/{}",
                        callee,
                        arguments.len()
                    )));
                };
                let x = self.eval(argument)?.to_number();
                Ok(Value::Number(math.apply(x)))
            }
            Builtin::ParameterValue => {
                let name = accessor_argument(callee, arguments)?;
                Ok(self.data_source_value(name))
            }
            Builtin::ParameterAcquisitionStatus => {
                let name = accessor_argument(callee, arguments)?;
                Ok(match self.status(name) {
                    Some(status) => status
                        .acquisition_status
                        .map(|s| Value::String(s.as_str().to_string()))
                        .unwrap_or(Value::Null),
                    None => Value::Undefined,
                })
            }
            Builtin::Print => {
                let mut parts = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    parts.push(self.eval(argument)?.to_display_string());
                }
                tracing::info!("{}", parts.join(" "));
                Ok(Value::Undefined)
            }
        }
    }
}

fn accessor_argument<'e>(callee: &str, arguments: &'e [Expr]) -> Result<&'e str> {
    match arguments {
        [Expr::String { value }] => Ok(value),
        [Expr::Symbol { name }] => Ok(name),
        _ => Err(DisplayError::UnsupportedOperation(format!(
            "{} expects a single string or symbol argument",
            callee
        ))),
    }
}

fn apply_unary(op: UnaryOp, operand: &Value) -> Value {
    let x = operand.to_number();
    Value::Number(match op {
        UnaryOp::Minus => -x,
        UnaryOp::Plus => x,
        UnaryOp::Abs => x.abs(),
        UnaryOp::Percent => x / 100.0,
        UnaryOp::Square => x * x,
    })
}

fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::Add => {
            if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
                let mut joined = left.to_display_string();
                joined.push_str(&right.to_display_string());
                Value::String(joined)
            } else {
                Value::Number(left.to_number() + right.to_number())
            }
        }
        BinaryOp::Sub => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Mul => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Div => Value::Number(left.to_number() / right.to_number()),
        // Remainder takes the sign of the dividend
        BinaryOp::Mod => Value::Number(left.to_number() % right.to_number()),
        BinaryOp::Pow => Value::Number(pow(left.to_number(), right.to_number())),
        BinaryOp::Eq => Value::Boolean(left.strict_eq(right)),
        BinaryOp::Ne => Value::Boolean(!left.strict_eq(right)),
        BinaryOp::Lt => Value::Boolean(matches!(compare(left, right), Some(Ordering::Less))),
        BinaryOp::Le => Value::Boolean(matches!(
            compare(left, right),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOp::Gt => Value::Boolean(matches!(compare(left, right), Some(Ordering::Greater))),
        BinaryOp::Ge => Value::Boolean(matches!(
            compare(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        )),
    }
}

/// Strings compare lexicographically, everything else numerically (NaN unordered)
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    }
}

/// `powf` with the host's NaN rules: a NaN exponent or `(±1)^±∞` is NaN
fn pow(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        f64::NAN
    } else {
        base.powf(exponent)
    }
}
