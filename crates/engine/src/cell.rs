//! Cell content variants and the per-cell node.
//!
//! A cell holds one of three content kinds. Formula cells additionally carry
//! a memoised value and the sorted list of positions their formula reads;
//! the sheet owns the inverse (dependent) edges.

use std::cell::RefCell;

use crate::formula::{CellValueLookup, Formula};
use crate::position::Position;
use crate::value::{FormulaError, Value};

/// Leading character marking formula text.
pub const FORMULA_SIGN: char = '=';
/// Leading character suppressing interpretation of a text cell.
pub const ESCAPE_SIGN: char = '\'';

/// What a cell contains.
#[derive(Debug, Clone)]
pub enum CellContent {
    Empty,
    Text(String),
    Formula(Formula),
}

impl CellContent {
    /// Decide the content kind for raw input text.
    ///
    /// Empty input installs `Empty`; a formula sign followed by at least one
    /// character parses as a formula (a parser rejection propagates as the
    /// reason string); everything else is text, a lone `"="` included.
    pub fn from_input(text: &str) -> Result<CellContent, String> {
        if text.is_empty() {
            return Ok(CellContent::Empty);
        }
        if let Some(tail) = text.strip_prefix(FORMULA_SIGN) {
            if !tail.is_empty() {
                return Formula::parse(tail).map(CellContent::Formula);
            }
        }
        Ok(CellContent::Text(text.to_string()))
    }

    /// The editable text form: what the user typed, modulo canonical formula
    /// reprinting.
    pub fn text(&self) -> String {
        match self {
            CellContent::Empty => String::new(),
            CellContent::Text(s) => s.clone(),
            CellContent::Formula(f) => format!("{}{}", FORMULA_SIGN, f.expression()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellContent::Empty)
    }
}

impl Default for CellContent {
    fn default() -> Self {
        CellContent::Empty
    }
}

/// A single cell: content, memo cache, and outbound references.
///
/// The cache is interior-mutable so reads memoise through a shared sheet
/// borrow; the engine is single-threaded by contract.
#[derive(Debug, Clone, Default)]
pub struct Cell {
    content: CellContent,
    cache: RefCell<Option<Value>>,
    refs: Vec<Position>,
}

impl Cell {
    /// A fresh empty cell, as materialised for referenced-but-unset positions.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &CellContent {
        &self.content
    }

    /// The editable text form of this cell's content.
    pub fn text(&self) -> String {
        self.content.text()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// The positions this cell's formula reads: sorted ascending,
    /// deduplicated, empty for non-formula content.
    pub fn referenced_cells(&self) -> &[Position] {
        &self.refs
    }

    /// Swap in new content and references.
    ///
    /// The sheet has already validated acyclicity and rewired graph edges;
    /// the stale memo survives until the caller's invalidation sweep clears
    /// it.
    pub(crate) fn set(&mut self, content: CellContent, refs: Vec<Position>) {
        self.content = content;
        self.refs = refs;
    }

    /// The cell's observable value.
    ///
    /// Empty cells read as the empty string. Text cells strip a single
    /// leading escape sign and never reinterpret the rest. Formula cells
    /// return the memoised value when present, otherwise evaluate through
    /// `lookup`, memoise, and return; a non-finite result is coerced to
    /// `#ARITHM!` before it becomes observable.
    pub fn value(&self, lookup: &impl CellValueLookup) -> Value {
        let formula = match &self.content {
            CellContent::Empty => return Value::Text(String::new()),
            CellContent::Text(s) => {
                let stripped = s.strip_prefix(ESCAPE_SIGN).unwrap_or(s);
                return Value::Text(stripped.to_string());
            }
            CellContent::Formula(f) => f,
        };

        if let Some(cached) = &*self.cache.borrow() {
            return cached.clone();
        }

        let value = match formula.evaluate(lookup) {
            Ok(n) if n.is_finite() => Value::Number(n),
            Ok(_) => Value::Error(FormulaError::Arithmetic),
            Err(e) => Value::Error(e),
        };
        *self.cache.borrow_mut() = Some(value.clone());
        value
    }

    /// Drop the memoised value. The sheet drives the recursive sweep over
    /// dependents.
    pub(crate) fn invalidate(&self) {
        *self.cache.borrow_mut() = None;
    }

    /// True when a memoised value is present. Only formula cells ever cache.
    pub fn is_cached(&self) -> bool {
        self.cache.borrow().is_some()
    }
}
