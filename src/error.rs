//! Error handling for displaykit
//!
//! This module defines the error taxonomy shared by the formula engine,
//! the buffers and the configuration layer, plus a Result alias.
//!
//! - [`DisplayError::Syntax`] - malformed formula, raised by the parser
//! - [`DisplayError::UnsupportedOperation`] - unknown function or bad call,
//!   raised during evaluation
//! - [`DisplayError::UnresolvedReference`] - path name with no mapping

use thiserror::Error;

/// Main error type for displaykit operations
#[derive(Error, Debug)]
pub enum DisplayError {
    /// A formula could not be parsed
    #[error("Syntax error at line {line}, column {column}: {message}")]
    Syntax {
        message: String,
        /// Byte offset into the formula source
        offset: usize,
        line: usize,
        column: usize,
    },

    /// Evaluation reached a function or call shape the engine does not support
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// A display-local path name has no registered canonical identifier
    #[error("Unresolved reference: {0}")]
    UnresolvedReference(String),

    /// Errors related to configuration loading/saving/validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<DisplayError>,
    },
}

impl DisplayError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        DisplayError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Build a syntax error at a byte offset of `source`
    pub fn syntax(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let (line, column) = line_column(source, offset);
        DisplayError::Syntax {
            message: message.into(),
            offset,
            line,
            column,
        }
    }

    /// Whether this error (or the error it wraps) is a syntax error
    pub fn is_syntax(&self) -> bool {
        match self {
            DisplayError::Syntax { .. } => true,
            DisplayError::WithContext { source, .. } => source.is_syntax(),
            _ => false,
        }
    }
}

/// 1-based line and column (in characters) of a byte offset
fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for (idx, ch) in source.char_indices() {
        if idx >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

/// Result type alias for displaykit operations
pub type Result<T> = std::result::Result<T, DisplayError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
