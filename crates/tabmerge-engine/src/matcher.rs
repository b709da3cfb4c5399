//! Row matching against stub and group-stub labels.
//!
//! A record's label values form a conjunction of constraints; a row
//! satisfies the record when every constraint has a matching label cell
//! covering that row. Text comparison trims surrounding whitespace but is
//! otherwise exact.

use std::collections::BTreeSet;

use tracing::trace;

use tabmerge_model::{GridPos, Record, Role, RoleId, Table};

/// One label requirement extracted from a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelConstraint {
    pub role_id: RoleId,
    pub role: Role,
    pub value: String,
}

/// Best row for a record, with the group-stub cells anchoring it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMatch {
    pub row: usize,
    pub groups: Vec<GridPos>,
}

/// Full resolution of a label constraint set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Resolution {
    /// Rows satisfying every constraint, ascending. Never empty.
    pub rows: Vec<usize>,
    /// Matched group-stub origins covering the chosen (earliest) row.
    pub groups: Vec<GridPos>,
    /// Origin rows of the distinct label regions involved. More than one
    /// region means the record was ambiguous.
    pub region_starts: Vec<usize>,
}

impl Resolution {
    pub fn chosen_row(&self) -> usize {
        self.rows[0]
    }

    pub fn is_ambiguous(&self) -> bool {
        self.region_starts.len() > 1
    }
}

/// Label constraints of `record` against the fields `table` knows.
pub(crate) fn constraints_from(table: &Table, record: &Record) -> Vec<LabelConstraint> {
    let mut labels = Vec::new();
    for (role_id, value) in record.iter() {
        if value.trim().is_empty() {
            continue;
        }
        match table.role_of(role_id) {
            Some(role @ (Role::Stub | Role::GroupStub)) => labels.push(LabelConstraint {
                role_id: role_id.clone(),
                role,
                value: value.to_string(),
            }),
            _ => {}
        }
    }
    labels
}

/// Intersect the row sets of all constraints. `None` when the set is empty
/// or some constraint matches nowhere.
pub(crate) fn resolve(table: &Table, labels: &[LabelConstraint]) -> Option<Resolution> {
    if labels.is_empty() {
        return None;
    }

    let mut valid: Option<BTreeSet<usize>> = None;
    for label in labels {
        let mut rows = BTreeSet::new();
        for origin in table.origins_for(&label.role_id) {
            let Some(cell) = table.cell_at_origin(*origin) else {
                continue;
            };
            if cell.text().trim() == label.value.trim() {
                rows.extend(origin.row..=cell.end_row());
            }
        }
        let narrowed = match valid {
            None => rows,
            Some(previous) => &previous & &rows,
        };
        if narrowed.is_empty() {
            trace!(id = %label.role_id, value = %label.value, "label constraint matched no row");
            return None;
        }
        valid = Some(narrowed);
    }
    let valid = valid?;
    let rows: Vec<usize> = valid.iter().copied().collect();
    let chosen = rows[0];

    let mut groups = Vec::new();
    let mut region_starts = BTreeSet::new();
    for label in labels {
        for origin in table.origins_for(&label.role_id) {
            let Some(cell) = table.cell_at_origin(*origin) else {
                continue;
            };
            if cell.text().trim() != label.value.trim() {
                continue;
            }
            if (origin.row..=cell.end_row()).any(|row| valid.contains(&row)) {
                region_starts.insert(origin.row);
            }
            if label.role == Role::GroupStub && cell.covers(GridPos::new(chosen, origin.col)) {
                groups.push(*origin);
            }
        }
    }
    groups.sort_unstable();
    groups.dedup();

    Some(Resolution {
        rows,
        groups,
        region_starts: region_starts.into_iter().collect(),
    })
}

/// Find the earliest row satisfying all label values `record` supplies.
pub fn find_row(table: &Table, record: &Record) -> Option<RowMatch> {
    let labels = constraints_from(table, record);
    resolve(table, &labels).map(|resolution| RowMatch {
        row: resolution.chosen_row(),
        groups: resolution.groups,
    })
}
