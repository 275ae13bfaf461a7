//! # displaykit: display formulas and realtime/archive buffers
//!
//! The data core behind telemetry dashboard widgets:
//!
//! - **Formulas**: a small expression language (legacy and simplified
//!   dialects) compiled once and re-evaluated whenever one of the data
//!   sources it references delivers a new value
//! - **Buffers**: merge archive pages with realtime pushes into one
//!   newest-first, de-duplicated view for tables and plots
//!
//! Everything here is synchronous and single-owner: the host hands in
//! already-resolved values and pulls snapshots on its render tick.
//!
//! ## Configuration
//!
//! [`config::EngineConfig`] is read from `engine.toml` in the platform
//! config directory under `displaykit`.
//!
//! ## Example
//!
//! ```
//! use displaykit::buffer::{BufferEntry, RealtimeArchiveBuffer};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Row { id: u32, t: i64 }
//!
//! impl BufferEntry for Row {
//!     type Key = u32;
//!     type Order = i64;
//!     fn key(&self) -> u32 { self.id }
//!     fn order(&self) -> i64 { self.t }
//! }
//!
//! let mut buffer = RealtimeArchiveBuffer::new(100, 80)?;
//! buffer.add_archive_data(vec![Row { id: 1, t: 10 }, Row { id: 2, t: 5 }]);
//! buffer.add_realtime(Row { id: 1, t: 12 });
//! assert_eq!(buffer.snapshot(), vec![Row { id: 1, t: 12 }, Row { id: 2, t: 5 }]);
//! # Ok::<(), displaykit::error::DisplayError>(())
//! ```

pub mod buffer;
pub mod config;
pub mod error;
pub mod formula;
pub mod types;

pub use error::{DisplayError, Result, ResultExt};
pub use formula::{CompiledFormula, Dialect, DisplayFormulas, Formula};
pub use types::{AcquisitionStatus, DataSourceStatus, Scalar, Value};
