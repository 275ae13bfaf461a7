//! Display formula engine
//!
//! Formulas are small expressions attached to display widgets. They come in
//! two dialects:
//!
//! - **Legacy**: `;`-separated statements with assignments; bare symbols are
//!   display-local path names that must be mapped to canonical identifiers
//! - **Simplified**: a single expression, optionally prefixed with `=`;
//!   bare symbols and accessor arguments are canonical identifiers unless a
//!   mapping says otherwise
//!
//! ## Functions
//!
//! - Math (one argument): `abs acos asin atan cbrt ceil cos cosh exp floor
//!   log log10 signum/sign sin sinh sqrt tan tanh toDegrees toRadians`
//! - `parameterValue(id)` - current value of a data source
//! - `parameterAcquisitionStatus(id)` - `ACQUIRED`, `NOT_RECEIVED`, `INVALID`
//!   or `EXPIRED`
//! - `print(args...)` - logs its arguments, evaluates to `undefined`
//!
//! ## Example
//!
//! ```
//! use displaykit::formula::{CompiledFormula, Dialect};
//! use displaykit::types::{DataSourceStatus, Value};
//!
//! let mut formula = CompiledFormula::compile("=parameterValue('X') * 2", Dialect::Simplified)?;
//! assert_eq!(formula.get_parameters(), vec!["X"]);
//!
//! formula.update_data_source("X", DataSourceStatus::new(5.0));
//! assert_eq!(formula.execute(), Value::Number(10.0));
//! # Ok::<(), displaykit::error::DisplayError>(())
//! ```

pub mod ast;
pub mod bindings;
pub mod cache;
pub mod compiled;
pub mod display;
pub mod functions;
pub mod lexer;
pub mod parser;

pub use ast::{BinaryOp, Dialect, Expr, Formula, LogicalOp, UnaryOp};
pub use bindings::BindingTable;
pub use cache::FormulaCache;
pub use compiled::CompiledFormula;
pub use display::{is_formula_pv, DisplayFormulas};
pub use parser::{parse, parse_with, ParseOptions, DEFAULT_MAX_DEPTH};
