//! Dependency graph for formula cells.
//!
//! Tracks references (positions a formula reads) and dependents (formula
//! cells that read a given position) for edge rewiring, invalidation
//! sweeps, and the pre-commit cycle check.
//!
//! # Edge Direction
//!
//! ```text
//! B reads A  ⇒  refs[B] contains A  and  deps[A] contains B
//! ```
//!
//! # Invariants
//!
//! 1. **Bidirectional consistency:** A ∈ refs[B] iff B ∈ deps[A].
//! 2. **No dangling entries:** empty sets are removed, not stored.
//! 3. **No duplicate edges:** set semantics enforced by `FxHashSet`.
//! 4. **Acyclic:** guaranteed by the sheet running [`DepGraph::creates_cycle`]
//!    before every edge installation.
//!
//! The graph is keyed by position, not by cell ownership: a cleared cell's
//! inbound edges survive, and its dependents simply read the missing cell
//! as empty.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::position::Position;

#[derive(Default, Debug, Clone)]
pub struct DepGraph {
    /// For each formula cell, the positions it reads.
    refs: FxHashMap<Position, FxHashSet<Position>>,

    /// For each referenced position, the formula cells that read it.
    deps: FxHashMap<Position, FxHashSet<Position>>,
}

impl DepGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// The positions `cell` reads (outbound edges).
    pub fn references(&self, cell: Position) -> impl Iterator<Item = Position> + '_ {
        self.refs
            .get(&cell)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    /// The formula cells that read `cell` (inbound edges).
    pub fn dependents(&self, cell: Position) -> impl Iterator<Item = Position> + '_ {
        self.deps
            .get(&cell)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    /// True when at least one formula reads `cell`.
    pub fn is_referenced(&self, cell: Position) -> bool {
        self.deps.contains_key(&cell)
    }

    /// Replace all outbound edges of `cell` atomically.
    ///
    /// Removes `cell` from the dependent sets of its old references, then
    /// inserts it into the dependent sets of the new ones. Pass an empty
    /// slice to clear (the cell stops being a formula cell).
    pub fn replace_edges(&mut self, cell: Position, new_refs: &[Position]) {
        if let Some(old_refs) = self.refs.remove(&cell) {
            for referenced in old_refs {
                if let Some(deps) = self.deps.get_mut(&referenced) {
                    deps.remove(&cell);
                    if deps.is_empty() {
                        self.deps.remove(&referenced);
                    }
                }
            }
        }

        if new_refs.is_empty() {
            return;
        }

        for &referenced in new_refs {
            self.deps.entry(referenced).or_default().insert(cell);
        }
        self.refs.insert(cell, new_refs.iter().copied().collect());
    }

    /// Clear all outbound edges of `cell`.
    pub fn clear_cell(&mut self, cell: Position) {
        self.replace_edges(cell, &[]);
    }

    /// Would wiring `target → new_refs` make the graph cyclic?
    ///
    /// Runs against the current graph, before any edge is installed: a
    /// depth-first walk from each proposed reference follows outbound
    /// reference edges and looks for `target`. Self-references are caught by
    /// the same check. A visited set keeps the walk linear over diamonds.
    pub fn creates_cycle(&self, target: Position, new_refs: &[Position]) -> bool {
        let mut visited = FxHashSet::default();
        let mut stack: Vec<Position> = new_refs.to_vec();

        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(refs) = self.refs.get(&current) {
                stack.extend(refs.iter().copied());
            }
        }

        false
    }

    /// Check all invariants. Panics if any are violated.
    ///
    /// Only available in test builds.
    #[cfg(test)]
    pub fn assert_consistent(&self) {
        for (cell, refs) in &self.refs {
            for referenced in refs {
                assert!(
                    self.deps
                        .get(referenced)
                        .is_some_and(|d| d.contains(cell)),
                    "missing dependent edge: {:?} should list {:?}",
                    referenced,
                    cell
                );
            }
        }

        for (cell, deps) in &self.deps {
            for dependent in deps {
                assert!(
                    self.refs
                        .get(dependent)
                        .is_some_and(|r| r.contains(cell)),
                    "missing reference edge: {:?} should list {:?}",
                    dependent,
                    cell
                );
            }
        }

        for (cell, refs) in &self.refs {
            assert!(!refs.is_empty(), "empty refs set stored for {:?}", cell);
        }
        for (cell, deps) in &self.deps {
            assert!(!deps.is_empty(), "empty deps set stored for {:?}", cell);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(label: &str) -> Position {
        let p = Position::from_a1(label);
        assert!(p.is_valid());
        p
    }

    #[test]
    fn test_empty_graph() {
        let graph = DepGraph::new();

        assert_eq!(graph.references(pos("A1")).count(), 0);
        assert_eq!(graph.dependents(pos("A1")).count(), 0);
        assert!(!graph.is_referenced(pos("A1")));

        graph.assert_consistent();
    }

    #[test]
    fn test_single_edge() {
        // B1 = A1
        let mut graph = DepGraph::new();
        graph.replace_edges(pos("B1"), &[pos("A1")]);
        graph.assert_consistent();

        assert_eq!(graph.references(pos("B1")).collect::<Vec<_>>(), vec![pos("A1")]);
        assert_eq!(graph.dependents(pos("A1")).collect::<Vec<_>>(), vec![pos("B1")]);
        assert!(graph.is_referenced(pos("A1")));
        assert!(!graph.is_referenced(pos("B1")));
    }

    #[test]
    fn test_multiple_references() {
        // C1 = A1 + B1
        let mut graph = DepGraph::new();
        graph.replace_edges(pos("C1"), &[pos("A1"), pos("B1")]);
        graph.assert_consistent();

        let mut refs: Vec<_> = graph.references(pos("C1")).collect();
        refs.sort();
        assert_eq!(refs, vec![pos("A1"), pos("B1")]);

        assert_eq!(graph.dependents(pos("A1")).collect::<Vec<_>>(), vec![pos("C1")]);
        assert_eq!(graph.dependents(pos("B1")).collect::<Vec<_>>(), vec![pos("C1")]);
    }

    #[test]
    fn test_rewiring_drops_stale_edges() {
        // B1 = A1, then B1 = A2
        let mut graph = DepGraph::new();
        graph.replace_edges(pos("B1"), &[pos("A1")]);
        graph.replace_edges(pos("B1"), &[pos("A2")]);
        graph.assert_consistent();

        assert_eq!(graph.references(pos("B1")).collect::<Vec<_>>(), vec![pos("A2")]);
        assert_eq!(graph.dependents(pos("A1")).count(), 0);
        assert_eq!(graph.dependents(pos("A2")).collect::<Vec<_>>(), vec![pos("B1")]);
        assert!(!graph.is_referenced(pos("A1")));
    }

    #[test]
    fn test_clear_cell() {
        let mut graph = DepGraph::new();
        graph.replace_edges(pos("B1"), &[pos("A1")]);
        graph.clear_cell(pos("B1"));
        graph.assert_consistent();

        assert_eq!(graph.references(pos("B1")).count(), 0);
        assert_eq!(graph.dependents(pos("A1")).count(), 0);
    }

    #[test]
    fn test_clearing_keeps_inbound_edges() {
        // B1 = A1; clearing A1 leaves B1's edge intact.
        let mut graph = DepGraph::new();
        graph.replace_edges(pos("B1"), &[pos("A1")]);
        graph.clear_cell(pos("A1"));
        graph.assert_consistent();

        assert_eq!(graph.dependents(pos("A1")).collect::<Vec<_>>(), vec![pos("B1")]);
    }

    #[test]
    fn test_diamond() {
        //     A1
        //    /  \
        //   B1   C1
        //    \  /
        //     D1
        let mut graph = DepGraph::new();
        graph.replace_edges(pos("B1"), &[pos("A1")]);
        graph.replace_edges(pos("C1"), &[pos("A1")]);
        graph.replace_edges(pos("D1"), &[pos("B1"), pos("C1")]);
        graph.assert_consistent();

        let mut deps: Vec<_> = graph.dependents(pos("A1")).collect();
        deps.sort();
        assert_eq!(deps, vec![pos("B1"), pos("C1")]);
    }

    #[test]
    fn test_self_reference_is_cycle() {
        let graph = DepGraph::new();
        assert!(graph.creates_cycle(pos("A1"), &[pos("A1")]));
    }

    #[test]
    fn test_two_cell_cycle() {
        // A1 = B1, then proposing B1 = A1
        let mut graph = DepGraph::new();
        graph.replace_edges(pos("A1"), &[pos("B1")]);

        assert!(graph.creates_cycle(pos("B1"), &[pos("A1")]));
    }

    #[test]
    fn test_indirect_cycle() {
        // A1 = B1, B1 = C1, then proposing C1 = A1
        let mut graph = DepGraph::new();
        graph.replace_edges(pos("A1"), &[pos("B1")]);
        graph.replace_edges(pos("B1"), &[pos("C1")]);

        assert!(graph.creates_cycle(pos("C1"), &[pos("A1")]));
    }

    #[test]
    fn test_no_cycle_in_valid_graph() {
        let mut graph = DepGraph::new();
        graph.replace_edges(pos("B1"), &[pos("A1")]);
        graph.replace_edges(pos("C1"), &[pos("B1")]);

        assert!(!graph.creates_cycle(pos("D1"), &[pos("C1")]));
        // Re-pointing an existing formula away from the chain is fine too.
        assert!(!graph.creates_cycle(pos("B1"), &[pos("D1")]));
    }

    #[test]
    fn test_cycle_check_does_not_mutate() {
        let mut graph = DepGraph::new();
        graph.replace_edges(pos("A1"), &[pos("B1")]);

        assert!(graph.creates_cycle(pos("B1"), &[pos("A1")]));
        graph.assert_consistent();
        assert_eq!(graph.references(pos("B1")).count(), 0);
        assert_eq!(graph.references(pos("A1")).collect::<Vec<_>>(), vec![pos("B1")]);
    }

    #[test]
    fn test_cycle_check_over_diamond_terminates() {
        // Diamond plus a long tail; the visited set must keep this linear.
        let mut graph = DepGraph::new();
        graph.replace_edges(pos("B1"), &[pos("A1")]);
        graph.replace_edges(pos("C1"), &[pos("A1")]);
        graph.replace_edges(pos("D1"), &[pos("B1"), pos("C1")]);
        for row in 1..100 {
            let upper = Position::new(row - 1, 3);
            let lower = Position::new(row, 3);
            graph.replace_edges(lower, &[upper]);
        }

        assert!(!graph.creates_cycle(pos("A1"), &[pos("E1")]));
        assert!(graph.creates_cycle(pos("A1"), &[Position::new(99, 3)]));
    }
}
