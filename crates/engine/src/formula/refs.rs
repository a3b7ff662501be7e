//! Reference extraction from the formula AST.

use crate::position::Position;

use super::parser::Expr;

/// Collect every cell reference in `expr`, in source order.
///
/// The result may contain duplicates and the invalid-position sentinel;
/// the sheet filters through `Position::is_valid` and sorts before wiring
/// graph edges.
pub fn extract_positions(expr: &Expr) -> Vec<Position> {
    let mut refs = Vec::new();
    collect(expr, &mut refs);
    refs
}

fn collect(expr: &Expr, refs: &mut Vec<Position>) {
    match expr {
        Expr::Number(_) => {}
        Expr::CellRef { pos, .. } => refs.push(*pos),
        Expr::UnaryOp { operand, .. } => collect(operand, refs),
        Expr::BinaryOp { left, right, .. } => {
            collect(left, refs);
            collect(right, refs);
        }
    }
}
