//! The sheet: sparse cell store and mutation entry point.
//!
//! All graph traversal goes through the sheet; cells never hold owning
//! references to each other. Mutations follow a fail-before-mutating
//! discipline: parse, cycle-check, and only then touch the store, so a
//! rejected call leaves every observable bit as it was.

use std::io::{self, Write};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::cell::{Cell, CellContent};
use crate::dep_graph::DepGraph;
use crate::error::SheetError;
use crate::formula::CellValueLookup;
use crate::position::{Position, Size};
use crate::value::Value;

/// A sparse two-dimensional grid of cells.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    cells: FxHashMap<Position, Cell>,
    deps: DepGraph,
    print_size: Size,
}

impl CellValueLookup for Sheet {
    /// Missing cells read as the empty string; formula evaluation coerces
    /// that to 0.
    fn value_at(&self, pos: Position) -> Value {
        match self.cells.get(&pos) {
            Some(cell) => cell.value(self),
            None => Value::default(),
        }
    }
}

impl Sheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `text` at `pos`.
    ///
    /// The pipeline is: validate the position; decide the content kind
    /// (parsing the formula tail if any); reject self-references and cycles
    /// against the current graph; materialise referenced cells; swap the
    /// content in; rewire edges; invalidate the dependent sub-graph;
    /// recompute the printable size. Every failure happens before the first
    /// mutation.
    pub fn set_cell(&mut self, pos: Position, text: &str) -> Result<(), SheetError> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition);
        }

        let content = CellContent::from_input(text).map_err(SheetError::FormulaSyntax)?;

        let new_refs = match &content {
            CellContent::Formula(f) => {
                let mut refs: Vec<Position> = f
                    .references()
                    .into_iter()
                    .filter(|p| p.is_valid())
                    .collect();
                refs.sort_unstable();
                refs.dedup();
                refs
            }
            _ => Vec::new(),
        };

        // Self-references and longer cycles alike are caught against the
        // graph as it stands; the new edges are not yet installed.
        if self.deps.creates_cycle(pos, &new_refs) {
            return Err(SheetError::CircularDependency);
        }

        for &referenced in &new_refs {
            self.cells.entry(referenced).or_insert_with(Cell::empty);
        }

        self.deps.replace_edges(pos, &new_refs);
        let cell = self.cells.entry(pos).or_insert_with(Cell::empty);
        cell.set(content, new_refs);

        self.invalidate_from(pos);
        self.update_print_size();
        log::debug!("set {}", pos);
        Ok(())
    }

    /// The cell at `pos`, if it exists and is not the empty sentinel.
    ///
    /// Auto-materialised empty cells are observable only through their graph
    /// participation, never through this handle. Never mutates the store.
    pub fn cell(&self, pos: Position) -> Result<Option<&Cell>, SheetError> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition);
        }
        Ok(self.cells.get(&pos).filter(|cell| !cell.is_empty()))
    }

    /// Remove the cell at `pos`.
    ///
    /// Outbound edges are dropped; inbound edges survive, and dependents
    /// read the missing cell as empty on their next evaluation. The
    /// invalidation cascade fires through them.
    pub fn clear_cell(&mut self, pos: Position) -> Result<(), SheetError> {
        if !pos.is_valid() {
            return Err(SheetError::InvalidPosition);
        }
        if self.cells.remove(&pos).is_some() {
            self.deps.clear_cell(pos);
            self.invalidate_from(pos);
            self.update_print_size();
            log::debug!("clear {}", pos);
        }
        Ok(())
    }

    /// True when at least one formula cell reads `pos`.
    pub fn is_referenced(&self, pos: Position) -> bool {
        self.deps.is_referenced(pos)
    }

    /// The smallest rectangle anchored at `A1` covering every cell with
    /// non-empty content, or `(0, 0)` when there is none.
    pub fn printable_size(&self) -> Size {
        self.print_size
    }

    /// Print computed values, TAB-separated within rows, one `\n` per row.
    ///
    /// Strings are emitted verbatim, numbers with the default formatting,
    /// errors as their token. Missing and empty cells contribute nothing.
    pub fn print_values<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.print_with(out, |cell| cell.value(self).to_string())
    }

    /// Print editable texts with the same layout as [`Sheet::print_values`].
    pub fn print_texts<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.print_with(out, |cell| cell.text())
    }

    fn print_with<W: Write>(
        &self,
        out: &mut W,
        render: impl Fn(&Cell) -> String,
    ) -> io::Result<()> {
        for row in 0..self.print_size.rows {
            for col in 0..self.print_size.cols {
                if col > 0 {
                    out.write_all(b"\t")?;
                }
                if let Some(cell) = self.cells.get(&Position::new(row, col)) {
                    if !cell.is_empty() {
                        out.write_all(render(cell).as_bytes())?;
                    }
                }
            }
            out.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Drop the memo of the cell at `start` and of every transitive
    /// dependent. The visited set keeps diamond-shaped dependents from being
    /// walked twice; the graph is acyclic, so the sweep terminates.
    fn invalidate_from(&self, start: Position) {
        let mut visited = FxHashSet::default();
        let mut stack = vec![start];

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(cell) = self.cells.get(&current) {
                cell.invalidate();
            }
            stack.extend(self.deps.dependents(current));
        }
        log::trace!("invalidated {} cells from {}", visited.len(), start);
    }

    /// Rescan occupied positions for the printable extremum.
    fn update_print_size(&mut self) {
        let mut size = Size::default();
        for (pos, cell) in &self.cells {
            if cell.is_empty() {
                continue;
            }
            size.rows = size.rows.max(pos.row + 1);
            size.cols = size.cols.max(pos.col + 1);
        }
        self.print_size = size;
    }
}
