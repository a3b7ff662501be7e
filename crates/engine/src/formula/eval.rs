// Formula evaluator - walks the AST against the read side of a sheet

use crate::position::Position;
use crate::value::{FormulaError, Value};

use super::parser::{Expr, Op, UnaryOp};

/// Read-side access to cell values during evaluation.
///
/// Missing cells read as the empty string, which numeric coercion treats
/// as 0.
pub trait CellValueLookup {
    fn value_at(&self, pos: Position) -> Value;
}

/// Evaluate an expression.
///
/// Errors are in-band results, not failures of the engine: invalid
/// references yield `#REF!`, non-numeric text in a referenced cell yields
/// `#VALUE!`, and any arithmetic step that leaves the finite range
/// (division by zero included) yields `#ARITHM!`.
pub fn evaluate(expr: &Expr, lookup: &impl CellValueLookup) -> Result<f64, FormulaError> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::CellRef { pos, .. } => {
            if !pos.is_valid() {
                return Err(FormulaError::Ref);
            }
            lookup.value_at(*pos).to_number()
        }
        Expr::UnaryOp { op, operand } => {
            let v = evaluate(operand, lookup)?;
            Ok(match op {
                UnaryOp::Plus => v,
                UnaryOp::Minus => -v,
            })
        }
        Expr::BinaryOp { op, left, right } => {
            let l = evaluate(left, lookup)?;
            let r = evaluate(right, lookup)?;
            let v = match op {
                Op::Add => l + r,
                Op::Sub => l - r,
                Op::Mul => l * r,
                Op::Div => l / r,
            };
            if v.is_finite() {
                Ok(v)
            } else {
                Err(FormulaError::Arithmetic)
            }
        }
    }
}
