use std::collections::BTreeMap;

use tabmerge_model::{GridPos, Role, RoleId, Table};

/// A cell to create in a freshly inserted row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCellSpec {
    pub col: usize,
    pub col_span: usize,
    pub role: Role,
    pub role_id: RoleId,
    pub text: String,
}

/// Per-column directive for [`insert_row_after`](crate::insert_row_after).
///
/// Columns covered by a cell spanning across the insertion boundary need no
/// directive; the spanning cell absorbs the new row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColPlan {
    /// Grow the span of the cell at `origin` to cover the new row. The cell
    /// must end exactly at the insertion boundary.
    Extend { origin: GridPos },
    /// Create a new cell in the inserted row.
    New(NewCellSpec),
}

/// Reference cell for one column, used when building a new row.
#[derive(Debug, Clone)]
pub(crate) struct ColumnProfile {
    pub role: Role,
    pub role_id: RoleId,
    pub col_span: usize,
    end_row: usize,
}

/// Pick one reference cell per origin column.
///
/// Roles compete by how strongly they characterise a column: a group stub
/// wins over inputs, inputs over plain stubs, and data over headers. Among
/// group stubs the bottom-most region wins so appended rows continue the
/// latest group.
pub(crate) fn column_profiles(table: &Table) -> BTreeMap<usize, ColumnProfile> {
    fn priority(role: Role) -> u8 {
        match role {
            Role::GroupStub => 5,
            Role::Input => 4,
            Role::Stub => 3,
            Role::Data => 2,
            Role::Header => 1,
            Role::Add | Role::Unclassified => 0,
        }
    }

    let mut profiles: BTreeMap<usize, ColumnProfile> = BTreeMap::new();
    for (origin, cell) in &table.cells {
        let prio = priority(cell.role);
        if prio == 0 {
            continue;
        }
        let replace = match profiles.get(&origin.col) {
            None => true,
            Some(current) => {
                prio > priority(current.role)
                    || (cell.role == Role::GroupStub
                        && current.role == Role::GroupStub
                        && cell.end_row() > current.end_row)
            }
        };
        if replace {
            profiles.insert(
                origin.col,
                ColumnProfile {
                    role: cell.role,
                    role_id: cell.role_id.clone(),
                    col_span: cell.col_span,
                    end_row: cell.end_row(),
                },
            );
        }
    }
    profiles
}
