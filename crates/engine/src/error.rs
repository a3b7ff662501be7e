//! Mutation-time error categories.

use thiserror::Error;

/// Errors raised by sheet operations before any mutation takes effect.
///
/// A rejected operation leaves the sheet exactly as it was; the caller may
/// retry with corrected input. Evaluation failures are not errors at this
/// level; they surface in-band as [`crate::value::Value::Error`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SheetError {
    /// A position argument lies outside the valid grid.
    #[error("invalid cell position")]
    InvalidPosition,

    /// The expression after the formula sign is not parseable.
    #[error("formula syntax error: {0}")]
    FormulaSyntax(String),

    /// Installing the formula would make the reference graph cyclic.
    #[error("circular dependency")]
    CircularDependency,
}
