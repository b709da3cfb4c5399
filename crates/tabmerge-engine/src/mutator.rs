//! Structural grid mutations.
//!
//! Every primitive re-verifies the coverage invariant before returning, so a
//! bad plan surfaces as [`MergeError::CorruptGrid`] instead of a silently
//! broken grid.

use tracing::trace;

use tabmerge_model::{Cell, GridError, GridPos, RoleId, Table};

use crate::error::{MergeError, Result};
use crate::plan::ColPlan;

/// Insert one row directly below `after_row`.
///
/// Cells spanning across the boundary absorb the new row automatically;
/// every other column must be covered by a [`ColPlan`] directive. Returns
/// the index of the new row.
pub fn insert_row_after(table: &mut Table, after_row: usize, plan: &[ColPlan]) -> Result<usize> {
    if after_row >= table.row_count {
        return Err(MergeError::RowOutOfRange {
            row: after_row,
            row_count: table.row_count,
        });
    }
    let new_row = after_row + 1;
    trace!(after_row, directives = plan.len(), "inserting row");

    // Shift origins below the boundary down by one. Descending order keeps
    // target keys free while moving.
    let moved: Vec<GridPos> = table
        .cells
        .range(GridPos::new(new_row, 0)..)
        .map(|(origin, _)| *origin)
        .collect();
    for origin in moved.into_iter().rev() {
        if let Some(mut cell) = table.cells.remove(&origin) {
            cell.origin.row += 1;
            table.cells.insert(cell.origin, cell);
        }
    }
    for positions in table.role_index.values_mut() {
        for pos in positions.iter_mut() {
            if pos.row > after_row {
                pos.row += 1;
            }
        }
    }

    // Cells crossing the boundary grow to cover the new row.
    let absorbing: Vec<GridPos> = table
        .cells
        .range(..GridPos::new(new_row, 0))
        .filter(|(_, cell)| cell.end_row() >= new_row)
        .map(|(origin, _)| *origin)
        .collect();
    for origin in absorbing {
        if let Some(cell) = table.cells.get_mut(&origin) {
            cell.row_span += 1;
        }
    }

    for directive in plan {
        match directive {
            ColPlan::Extend { origin } => {
                let Some(cell) = table.cell_at_origin_mut(*origin) else {
                    return Err(MergeError::ExpandBlocked { origin: *origin });
                };
                if cell.end_row() >= new_row {
                    continue; // already absorbed above
                }
                if cell.end_row() != after_row {
                    return Err(MergeError::ExpandBlocked { origin: *origin });
                }
                cell.row_span += 1;
            }
            ColPlan::New(spec) => {
                let cell = Cell::new(
                    GridPos::new(new_row, spec.col),
                    1,
                    spec.col_span,
                    spec.role,
                    spec.role_id.clone(),
                )
                .with_text(&spec.text);
                table.insert_cell(cell);
            }
        }
    }

    table.row_count += 1;
    table.verify_coverage()?;
    Ok(new_row)
}

/// Grow the cell at `origin` to also cover the row below its current span.
///
/// The covered band of that row must consist of single-row cells lying
/// entirely within the target's column range; they are removed and their
/// area absorbed. Anything else blocks the expansion, leaving the table
/// untouched.
pub fn expand_row_span(table: &mut Table, origin: GridPos) -> Result<()> {
    let Some(target) = table.cell_at_origin(origin) else {
        return Err(MergeError::ExpandBlocked { origin });
    };
    let band_row = target.end_row() + 1;
    let (start_col, end_col) = (origin.col, target.end_col());
    if band_row >= table.row_count {
        return Err(MergeError::ExpandBlocked { origin });
    }

    let mut displaced = Vec::new();
    for col in start_col..=end_col {
        let pos = GridPos::new(band_row, col);
        let Some(covered) = table.cell(pos) else {
            return Err(GridError::Gap {
                row: band_row,
                col,
            }
            .into());
        };
        if covered.row_span != 1 || covered.origin.col < start_col || covered.end_col() > end_col {
            return Err(MergeError::ExpandBlocked { origin });
        }
        displaced.push(covered.origin);
    }
    displaced.dedup();

    trace!(%origin, band_row, removed = displaced.len(), "expanding row span");
    for pos in displaced {
        table.remove_cell(pos);
    }
    if let Some(target) = table.cell_at_origin_mut(origin) {
        target.row_span += 1;
    }
    table.verify_coverage()?;
    Ok(())
}

/// Append `text` to the first mutable cell carrying `role_id`.
///
/// Returns `false` without touching the table when the id is unknown or
/// resolves only to immutable cells.
pub fn append_to_field(
    table: &mut Table,
    role_id: &RoleId,
    text: &str,
    separator: &str,
    paragraph_break: bool,
) -> bool {
    let Some(origin) = table
        .origins_for(role_id)
        .iter()
        .copied()
        .find(|pos| {
            table
                .cell_at_origin(*pos)
                .is_some_and(|cell| !cell.role.is_immutable())
        })
    else {
        return false;
    };
    if let Some(cell) = table.cell_at_origin_mut(origin) {
        cell.append_text(text, separator, paragraph_break);
        return true;
    }
    false
}
