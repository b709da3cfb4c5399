use std::collections::BTreeMap;

use crate::cell::{Cell, GridPos};
use crate::error::{GridError, Result};
use crate::role::{Role, RoleId};

/// A classified table grid.
///
/// Invariant I1: every coordinate `(r, c)` with `0 <= r < row_count` and
/// `0 <= c < col_count` is covered by exactly one cell rectangle. The
/// invariant must hold before and after every structural mutation;
/// [`Table::verify_coverage`] reports the first offending coordinate.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Table {
    pub row_count: usize,
    pub col_count: usize,
    /// Cells keyed by origin. Origins are unique per cell.
    pub cells: BTreeMap<GridPos, Cell>,
    /// Ordered cell origins per role id, maintained incrementally by the
    /// mutation primitives. Recomputed from scratch only at classification.
    pub role_index: BTreeMap<RoleId, Vec<GridPos>>,
}

impl Table {
    pub fn new(row_count: usize, col_count: usize) -> Self {
        Self {
            row_count,
            col_count,
            cells: BTreeMap::new(),
            role_index: BTreeMap::new(),
        }
    }

    /// Register a cell in the grid and the role index.
    pub fn insert_cell(&mut self, cell: Cell) {
        let origin = cell.origin;
        let role_id = cell.role_id.clone();
        self.cells.insert(origin, cell);
        let entry = self.role_index.entry(role_id).or_default();
        let at = entry.partition_point(|p| *p < origin);
        if entry.get(at) != Some(&origin) {
            entry.insert(at, origin);
        }
    }

    /// Remove the cell at `origin` from the grid and the role index.
    pub fn remove_cell(&mut self, origin: GridPos) -> Option<Cell> {
        let cell = self.cells.remove(&origin)?;
        if let Some(entry) = self.role_index.get_mut(&cell.role_id) {
            entry.retain(|p| *p != origin);
            if entry.is_empty() {
                self.role_index.remove(&cell.role_id);
            }
        }
        Some(cell)
    }

    /// Cell covering `pos`, whether `pos` is its origin or lies inside its
    /// span rectangle.
    pub fn cell(&self, pos: GridPos) -> Option<&Cell> {
        // Any covering cell's origin sorts at or before `pos`.
        self.cells
            .range(..=pos)
            .rev()
            .map(|(_, cell)| cell)
            .find(|cell| cell.covers(pos))
    }

    pub fn cell_at_origin(&self, origin: GridPos) -> Option<&Cell> {
        self.cells.get(&origin)
    }

    pub fn cell_at_origin_mut(&mut self, origin: GridPos) -> Option<&mut Cell> {
        self.cells.get_mut(&origin)
    }

    /// Ordered origins of the cells sharing `role_id`.
    pub fn origins_for(&self, role_id: &RoleId) -> &[GridPos] {
        self.role_index.get(role_id).map_or(&[], Vec::as_slice)
    }

    /// Role of the field `role_id`, if the table knows it.
    pub fn role_of(&self, role_id: &RoleId) -> Option<Role> {
        let origin = self.origins_for(role_id).first()?;
        self.cells.get(origin).map(|cell| cell.role)
    }

    /// Check invariant I1: full coverage, no overlap, no out-of-bounds cell.
    pub fn verify_coverage(&self) -> Result<()> {
        let mut covered = vec![false; self.row_count * self.col_count];
        for cell in self.cells.values() {
            if cell.row_span == 0 || cell.col_span == 0 {
                return Err(GridError::ZeroSpan {
                    row: cell.origin.row,
                    col: cell.origin.col,
                });
            }
            if cell.end_row() >= self.row_count || cell.end_col() >= self.col_count {
                return Err(GridError::OutOfBounds {
                    row: cell.origin.row,
                    col: cell.origin.col,
                    row_count: self.row_count,
                    col_count: self.col_count,
                });
            }
            for r in cell.origin.row..=cell.end_row() {
                for c in cell.origin.col..=cell.end_col() {
                    let slot = &mut covered[r * self.col_count + c];
                    if *slot {
                        return Err(GridError::Overlap { row: r, col: c });
                    }
                    *slot = true;
                }
            }
        }
        if let Some(hole) = covered.iter().position(|seen| !seen) {
            return Err(GridError::Gap {
                row: hole / self.col_count,
                col: hole % self.col_count,
            });
        }
        Ok(())
    }

    /// Rebuild the role index from the cell map.
    ///
    /// Used once after classification; mutations afterwards keep the index
    /// current incrementally.
    pub fn rebuild_role_index(&mut self) {
        self.role_index.clear();
        for (origin, cell) in &self.cells {
            self.role_index
                .entry(cell.role_id.clone())
                .or_default()
                .push(*origin);
        }
    }

    /// Structure report: fields with positions and spans, plus empty cells.
    pub fn summary(&self) -> TableSummary {
        let mut fields = Vec::new();
        let mut empty_cells = Vec::new();
        for (origin, cell) in &self.cells {
            fields.push(FieldSummary {
                role_id: cell.role_id.clone(),
                role: cell.role,
                origin: *origin,
                row_span: cell.row_span,
                col_span: cell.col_span,
            });
            if cell.is_empty() {
                empty_cells.push(*origin);
            }
        }
        TableSummary {
            row_count: self.row_count,
            col_count: self.col_count,
            fields,
            empty_cells,
        }
    }
}

/// Snapshot of a table's structure for diagnostics and callers.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TableSummary {
    pub row_count: usize,
    pub col_count: usize,
    pub fields: Vec<FieldSummary>,
    pub empty_cells: Vec<GridPos>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FieldSummary {
    pub role_id: RoleId,
    pub role: Role,
    pub origin: GridPos,
    pub row_span: usize,
    pub col_span: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two_with_span() -> Table {
        // Left column is one 2x1 cell; right column is two 1x1 cells.
        let mut table = Table::new(2, 2);
        table.insert_cell(Cell::new(
            GridPos::new(0, 0),
            2,
            1,
            Role::GroupStub,
            RoleId::new("gstub-0001"),
        ));
        table.insert_cell(Cell::new(
            GridPos::new(0, 1),
            1,
            1,
            Role::Input,
            RoleId::new("input-0001"),
        ));
        table.insert_cell(Cell::new(
            GridPos::new(1, 1),
            1,
            1,
            Role::Input,
            RoleId::new("input-0001"),
        ));
        table
    }

    #[test]
    fn covering_lookup_follows_spans() {
        let table = two_by_two_with_span();
        let covered = table.cell(GridPos::new(1, 0)).expect("covered by span");
        assert_eq!(covered.origin, GridPos::new(0, 0));
        let exact = table.cell(GridPos::new(1, 1)).expect("exact cell");
        assert_eq!(exact.origin, GridPos::new(1, 1));
    }

    #[test]
    fn verify_accepts_valid_grid() {
        let table = two_by_two_with_span();
        assert!(table.verify_coverage().is_ok());
    }

    #[test]
    fn verify_reports_gap() {
        let mut table = two_by_two_with_span();
        table.remove_cell(GridPos::new(1, 1));
        assert_eq!(
            table.verify_coverage(),
            Err(GridError::Gap { row: 1, col: 1 })
        );
    }

    #[test]
    fn verify_reports_overlap() {
        let mut table = two_by_two_with_span();
        if let Some(cell) = table.cell_at_origin_mut(GridPos::new(0, 1)) {
            cell.row_span = 2;
        }
        assert_eq!(
            table.verify_coverage(),
            Err(GridError::Overlap { row: 1, col: 1 })
        );
    }

    #[test]
    fn verify_reports_zero_span() {
        let mut table = two_by_two_with_span();
        if let Some(cell) = table.cell_at_origin_mut(GridPos::new(0, 1)) {
            cell.row_span = 0;
        }
        assert_eq!(
            table.verify_coverage(),
            Err(GridError::ZeroSpan { row: 0, col: 1 })
        );
    }

    #[test]
    fn role_index_tracks_shared_fields() {
        let mut table = two_by_two_with_span();
        let id = RoleId::new("input-0001");
        assert_eq!(
            table.origins_for(&id),
            &[GridPos::new(0, 1), GridPos::new(1, 1)]
        );
        assert_eq!(table.role_of(&id), Some(Role::Input));
        table.remove_cell(GridPos::new(0, 1));
        assert_eq!(table.origins_for(&id), &[GridPos::new(1, 1)]);
    }
}
