//! Core value types for displaykit
//!
//! This module contains the values that cross the boundary between the
//! host (telemetry subscriptions), the binding table and the evaluator.
//!
//! # Main Types
//!
//! - [`Scalar`] - A telemetry value as delivered: number, boolean or string
//! - [`AcquisitionStatus`] - Quality flag accompanying a telemetry value
//! - [`DataSourceStatus`] - Latest known value + acquisition status of a data source
//! - [`Value`] - Result of evaluating a formula (a scalar, `null` or `undefined`)
//!
//! # Coercion
//!
//! [`Value`] is the single place where permissive arithmetic coercion lives.
//! Operators in the evaluator never inspect variants directly; they go
//! through [`Value::to_number`], [`Value::to_display_string`],
//! [`Value::is_truthy`] and [`Value::strict_eq`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// A telemetry value as delivered by the subscription layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// IEEE-754 double; no integer/float distinction is surfaced
    Number(f64),
    Boolean(bool),
    String(String),
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(value as f64)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Boolean(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(n) => f.write_str(&format_number(*n)),
            Scalar::Boolean(b) => write!(f, "{}", b),
            Scalar::String(s) => f.write_str(s),
        }
    }
}

/// Quality flag accompanying a telemetry value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AcquisitionStatus {
    /// Value was received and is current
    #[default]
    Acquired,
    /// No value has been received yet
    NotReceived,
    /// Value was received but failed validation
    Invalid,
    /// Value was received but is older than its expiry period
    Expired,
}

impl AcquisitionStatus {
    /// Wire name of the status, as exposed to formulas
    pub fn as_str(&self) -> &'static str {
        match self {
            AcquisitionStatus::Acquired => "ACQUIRED",
            AcquisitionStatus::NotReceived => "NOT_RECEIVED",
            AcquisitionStatus::Invalid => "INVALID",
            AcquisitionStatus::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for AcquisitionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latest known state of one data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceStatus {
    pub value: Scalar,
    /// Absent when the delivery carried a value only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acquisition_status: Option<AcquisitionStatus>,
}

impl DataSourceStatus {
    /// Status with a value and no acquisition information
    pub fn new(value: impl Into<Scalar>) -> Self {
        Self {
            value: value.into(),
            acquisition_status: None,
        }
    }

    /// Status with both value and acquisition status
    pub fn with_status(value: impl Into<Scalar>, status: AcquisitionStatus) -> Self {
        Self {
            value: value.into(),
            acquisition_status: Some(status),
        }
    }
}

/// Result of evaluating a formula expression
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(untagged)]
pub enum Value {
    /// No value: unresolved reference, failed evaluation or side-effect-only call
    #[default]
    Undefined,
    /// Explicit absence: a conditional without alternate whose test was falsy
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
}

impl From<Scalar> for Value {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Number(n) => Value::Number(n),
            Scalar::Boolean(b) => Value::Boolean(b),
            Scalar::String(s) => Value::String(s),
        }
    }
}

impl From<&Scalar> for Value {
    fn from(value: &Scalar) -> Self {
        Value::from(value.clone())
    }
}

impl Value {
    /// Convert back to a scalar (`None` for `null` and `undefined`)
    pub fn to_scalar(&self) -> Option<Scalar> {
        match self {
            Value::Undefined | Value::Null => None,
            Value::Boolean(b) => Some(Scalar::Boolean(*b)),
            Value::Number(n) => Some(Scalar::Number(*n)),
            Value::String(s) => Some(Scalar::String(s.clone())),
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view, if this value is a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Name of the variant, used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
        }
    }

    /// Truthiness: `false`, `0`, `NaN`, `""`, `null` and `undefined` are falsy
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
        }
    }

    /// Numeric coercion used by every arithmetic operator
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(true) => 1.0,
            Value::Boolean(false) => 0.0,
            Value::Number(n) => *n,
            Value::String(s) => parse_numeric_string(s),
        }
    }

    /// String coercion used by `+` when either operand is a string
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
        }
    }

    /// Equality without coercion: different variants are never equal
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

/// Format a number the way the dashboard host prints it
/// (integral values without a fractional part, `NaN`, `Infinity`)
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == 0.0 {
        // -0 prints as 0
        "0".to_string()
    } else {
        format!("{}", n)
    }
}

/// Parse a string operand: blank is 0, malformed is NaN
fn parse_numeric_string(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16)
            .map(|v| v as f64)
            .unwrap_or(f64::NAN);
    }
    // Rust accepts "inf"/"nan" spellings that telemetry strings must not turn into numbers
    if trimmed
        .chars()
        .any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E')
    {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_from_json() {
        let n: Scalar = serde_json::from_str("5").unwrap();
        let b: Scalar = serde_json::from_str("true").unwrap();
        let s: Scalar = serde_json::from_str("\"ON\"").unwrap();
        assert_eq!(n, Scalar::Number(5.0));
        assert_eq!(b, Scalar::Boolean(true));
        assert_eq!(s, Scalar::String("ON".to_string()));
    }

    #[test]
    fn test_acquisition_status_wire_names() {
        let json = serde_json::to_string(&AcquisitionStatus::NotReceived).unwrap();
        assert_eq!(json, "\"NOT_RECEIVED\"");
        assert_eq!(AcquisitionStatus::Expired.to_string(), "EXPIRED");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Undefined.is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(!Value::String(String::new()).is_truthy());
        assert!(Value::Number(-1.0).is_truthy());
        assert!(Value::String("0".into()).is_truthy());
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(Value::Boolean(true).to_number(), 1.0);
        assert_eq!(Value::Null.to_number(), 0.0);
        assert!(Value::Undefined.to_number().is_nan());
        assert_eq!(Value::String(" 42 ".into()).to_number(), 42.0);
        assert_eq!(Value::String("".into()).to_number(), 0.0);
        assert_eq!(Value::String("0x10".into()).to_number(), 16.0);
        assert!(Value::String("inf".into()).to_number().is_nan());
        assert!(Value::String("ON".into()).to_number().is_nan());
        assert_eq!(Value::String("1e3".into()).to_number(), 1000.0);
    }

    #[test]
    fn test_strict_equality() {
        assert!(Value::Number(1.0).strict_eq(&Value::Number(1.0)));
        assert!(!Value::Number(1.0).strict_eq(&Value::String("1".into())));
        assert!(!Value::Boolean(true).strict_eq(&Value::Number(1.0)));
        assert!(!Value::Number(f64::NAN).strict_eq(&Value::Number(f64::NAN)));
        assert!(Value::Null.strict_eq(&Value::Null));
        assert!(!Value::Null.strict_eq(&Value::Undefined));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(11.0), "11");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
    }
}
