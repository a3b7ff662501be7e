//! Cell evaluation results.
//!
//! A [`Value`] is what a cell reads as: a finite number, a string, or an
//! in-band [`FormulaError`]. Evaluation failures are first-class results,
//! never panics or `Err` at the sheet API boundary.

use serde::{Deserialize, Serialize};

/// Category of a formula evaluation failure.
///
/// Equality is on category alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormulaError {
    /// A reference points outside the valid grid.
    Ref,
    /// A referenced cell holds text that is not a number.
    Value,
    /// Division by zero or any other non-finite arithmetic result.
    Arithmetic,
}

impl FormulaError {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormulaError::Ref => "#REF!",
            FormulaError::Value => "#VALUE!",
            FormulaError::Arithmetic => "#ARITHM!",
        }
    }
}

impl std::fmt::Display for FormulaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The observable value of a cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Number(f64),
    Text(String),
    Error(FormulaError),
}

impl Default for Value {
    fn default() -> Self {
        Value::Text(String::new())
    }
}

impl Value {
    /// Coerce to a number the way formula evaluation sees referenced cells.
    ///
    /// Empty strings count as 0 (an empty cell reads as the empty string).
    /// Other text must parse as a finite number, with trailing whitespace
    /// tolerated; anything else is a `#VALUE!` error. Errors propagate.
    pub fn to_number(&self) -> Result<f64, FormulaError> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Text(s) if s.is_empty() => Ok(0.0),
            Value::Text(s) => match s.trim_end().parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(n),
                _ => Err(FormulaError::Value),
            },
            Value::Error(e) => Err(*e),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }
}

impl std::fmt::Display for Value {
    /// Numbers use the default `f64` formatting; errors print their token.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
            Value::Error(e) => write!(f, "{}", e),
        }
    }
}
