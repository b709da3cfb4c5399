use std::collections::BTreeMap;

use tracing::{debug, trace};

use tabmerge_model::{Cell, GridError, GridPos, RawGrid, Role, RoleId, Table};

use crate::error::Result;
use crate::options::ClassifyOptions;

/// Assigns a role and role id to every cell of a raw template grid.
///
/// Classification is deterministic: cells are visited in grid order and
/// role ids are numbered counters, so the same grid always classifies to
/// the same table.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    options: ClassifyOptions,
}

impl Classifier {
    pub fn new(options: ClassifyOptions) -> Self {
        Self { options }
    }

    /// Classify a raw grid into a table, recursing into nested grids.
    ///
    /// Fails with `MalformedTemplate` if the raw grid violates coverage or
    /// non-overlap.
    pub fn classify(&self, raw: &RawGrid) -> Result<Table> {
        let mut ids = RoleIdGen::default();
        self.classify_grid(raw, &mut ids)
    }

    fn classify_grid(&self, raw: &RawGrid, ids: &mut RoleIdGen) -> Result<Table> {
        debug!(
            rows = raw.row_count,
            cols = raw.col_count,
            cells = raw.cells.len(),
            "classifying template grid"
        );
        let mut draft = Draft::build(raw, &self.options)?;

        self.mark_headers(&mut draft, ids);
        self.mark_add_cells(&mut draft, ids);
        self.mark_stubs(&mut draft, ids);
        self.mark_inputs_and_data(&mut draft, ids);

        let mut table = Table::new(raw.row_count, raw.col_count);
        for &idx in &draft.order {
            let raw_cell = &raw.cells[idx];
            let role = draft.roles[idx];
            let role_id = draft.ids[idx]
                .clone()
                .unwrap_or_else(|| ids.next(Role::Unclassified));
            trace!(row = raw_cell.row, col = raw_cell.col, %role, id = %role_id, "classified cell");
            let mut cell = Cell::new(
                GridPos::new(raw_cell.row, raw_cell.col),
                raw_cell.row_span,
                raw_cell.col_span,
                role,
                role_id,
            );
            cell.paragraphs = raw_cell.paragraphs.clone();
            cell.shaded = draft.shaded[idx];
            if let Some(nested) = &raw_cell.nested {
                cell.nested = Some(Box::new(self.classify_grid(nested, ids)?));
            }
            table.insert_cell(cell);
        }
        table.rebuild_role_index();
        Ok(table)
    }

    /// Rule 1: a maximal contiguous run of fully shaded rows from the top.
    ///
    /// A row counts as fully shaded when every cell starting in it is
    /// shaded; cells reaching down from an earlier row are tolerated.
    fn mark_headers(&self, draft: &mut Draft<'_>, ids: &mut RoleIdGen) {
        let mut header_rows = 0;
        'rows: for row in 0..draft.raw.row_count {
            for col in 0..draft.raw.col_count {
                let idx = draft.index_at(row, col);
                if draft.raw.cells[idx].row == row && !draft.shaded[idx] {
                    break 'rows;
                }
            }
            header_rows = row + 1;
        }
        if header_rows == 0 {
            return;
        }
        debug!(header_rows, "header rows detected");
        for &idx in &draft.order {
            if draft.raw.cells[idx].row < header_rows {
                draft.roles[idx] = Role::Header;
                draft.ids[idx] = Some(ids.next(Role::Header));
            }
        }
    }

    /// Rule 2: unshaded long text in the first data row, or a sole 1x1 cell.
    fn mark_add_cells(&self, draft: &mut Draft<'_>, ids: &mut RoleIdGen) {
        let raw = draft.raw;
        if raw.row_count == 1 && raw.col_count == 1 && raw.cells.len() == 1 {
            if draft.roles[0] == Role::Unclassified && !draft.shaded[0] {
                draft.roles[0] = Role::Add;
                draft.ids[0] = Some(ids.next(Role::Add));
            }
            return;
        }

        let first_data_row = (0..raw.row_count).find(|&row| {
            (0..raw.col_count).all(|col| draft.roles[draft.index_at(row, col)] != Role::Header)
        });
        let Some(first_data_row) = first_data_row else {
            return;
        };

        for &idx in &draft.order {
            let cell = &raw.cells[idx];
            if draft.roles[idx] == Role::Unclassified
                && cell.row == first_data_row
                && !draft.shaded[idx]
                && cell.text().trim().chars().count() >= self.options.add_text_threshold
            {
                draft.roles[idx] = Role::Add;
                draft.ids[idx] = Some(ids.next(Role::Add));
            }
        }
    }

    /// Rule 3: non-empty cell with an empty cell strictly to its right in
    /// the same row. Row span decides Stub vs GroupStub.
    fn mark_stubs(&self, draft: &mut Draft<'_>, ids: &mut RoleIdGen) {
        let raw = draft.raw;
        for &idx in &draft.order {
            let cell = &raw.cells[idx];
            if draft.roles[idx] != Role::Unclassified || cell.is_empty() || draft.shaded[idx] {
                continue;
            }
            let has_empty_right = (cell.end_col() + 1..raw.col_count)
                .any(|col| raw.cells[draft.index_at(cell.row, col)].is_empty());
            if !has_empty_right {
                continue;
            }
            let role = if cell.row_span > 1 {
                Role::GroupStub
            } else {
                Role::Stub
            };
            draft.roles[idx] = role;
            draft.ids[idx] = Some(ids.next(role));
        }
    }

    /// Rule 4: remaining empty cells become Input, grouped into shared role
    /// ids; leftover non-empty cells become Data.
    fn mark_inputs_and_data(&self, draft: &mut Draft<'_>, ids: &mut RoleIdGen) {
        let raw = draft.raw;
        let mut groups: BTreeMap<GroupKey, RoleId> = BTreeMap::new();

        for position in 0..draft.order.len() {
            let idx = draft.order[position];
            let cell = &raw.cells[idx];
            if draft.roles[idx] != Role::Unclassified {
                continue;
            }
            if !cell.is_empty() {
                draft.roles[idx] = Role::Data;
                draft.ids[idx] = Some(ids.next(Role::Data));
                continue;
            }

            draft.roles[idx] = Role::Input;
            let Some(key) = self.group_key(draft, idx) else {
                draft.ids[idx] = Some(ids.next(Role::Input));
                continue;
            };
            let id = groups
                .entry(key)
                .or_insert_with(|| ids.next(Role::Input))
                .clone();
            trace!(row = cell.row, col = cell.col, id = %id, "grouped input cell");
            draft.ids[idx] = Some(id);
        }
    }

    /// Grouping key for an Input cell, or `None` when the cell cannot be
    /// grouped and needs its own role id.
    ///
    /// Two Input cells share a role id when all hold: same column and col
    /// span, identical governing header text above, and an identical chain
    /// of stub labels to the left. A non-stub text cell to the left, or a
    /// missing governing header, disqualifies grouping.
    fn group_key(&self, draft: &Draft<'_>, idx: usize) -> Option<GroupKey> {
        let raw = draft.raw;
        let cell = &raw.cells[idx];

        // Nearest non-empty cell above in the same column, skipping row
        // labels: stubs cannot govern a column.
        let mut governing = None;
        for row in (0..cell.row).rev() {
            let above = draft.index_at(row, cell.col);
            if raw.cells[above].is_empty() {
                continue;
            }
            if draft.roles[above].is_label() {
                continue;
            }
            governing = Some(raw.cells[above].text().trim().to_string());
            break;
        }
        let governing = governing?;

        // Stub chain scanning left, nearest first. Any other text cell on
        // the way disqualifies grouping.
        let mut chain = Vec::new();
        let mut seen = GridPos::new(usize::MAX, usize::MAX);
        for col in (0..cell.col).rev() {
            let left = draft.index_at(cell.row, col);
            let left_cell = &raw.cells[left];
            if left_cell.is_empty() {
                continue;
            }
            if draft.roles[left].is_label() {
                let origin = GridPos::new(left_cell.row, left_cell.col);
                if origin != seen {
                    chain.push((draft.roles[left], left_cell.text().trim().to_string()));
                    seen = origin;
                }
                continue;
            }
            return None;
        }

        Some(GroupKey {
            governing,
            col: cell.col,
            col_span: cell.col_span,
            chain,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct GroupKey {
    governing: String,
    col: usize,
    col_span: usize,
    chain: Vec<(Role, String)>,
}

/// Deterministic role id source: `input-0001`, `stub-0002`, ...
#[derive(Debug, Default)]
struct RoleIdGen {
    counters: BTreeMap<&'static str, u32>,
}

impl RoleIdGen {
    fn next(&mut self, role: Role) -> RoleId {
        let prefix = match role {
            Role::Header => "header",
            Role::Stub => "stub",
            Role::GroupStub => "gstub",
            Role::Input => "input",
            Role::Add => "add",
            Role::Data => "data",
            Role::Unclassified => "cell",
        };
        let counter = self.counters.entry(prefix).or_insert(0);
        *counter += 1;
        RoleId::new(format!("{prefix}-{counter:04}"))
    }
}

/// Raw grid with a validated coverage map and per-cell working state.
struct Draft<'a> {
    raw: &'a RawGrid,
    /// Raw cell indices in (row, col) order.
    order: Vec<usize>,
    /// Row-major map from coordinate to covering raw cell index.
    coverage: Vec<usize>,
    shaded: Vec<bool>,
    roles: Vec<Role>,
    ids: Vec<Option<RoleId>>,
}

impl<'a> Draft<'a> {
    fn build(raw: &'a RawGrid, options: &ClassifyOptions) -> Result<Self> {
        const UNCOVERED: usize = usize::MAX;
        let mut coverage = vec![UNCOVERED; raw.row_count * raw.col_count];
        for (idx, cell) in raw.cells.iter().enumerate() {
            // Spans come straight from the external parser; a zero span
            // would underflow the rectangle arithmetic below.
            if cell.row_span == 0 || cell.col_span == 0 {
                return Err(GridError::ZeroSpan {
                    row: cell.row,
                    col: cell.col,
                }
                .into());
            }
            if cell.end_row() >= raw.row_count || cell.end_col() >= raw.col_count {
                return Err(GridError::OutOfBounds {
                    row: cell.row,
                    col: cell.col,
                    row_count: raw.row_count,
                    col_count: raw.col_count,
                }
                .into());
            }
            for row in cell.row..=cell.end_row() {
                for col in cell.col..=cell.end_col() {
                    let slot = &mut coverage[row * raw.col_count + col];
                    if *slot != UNCOVERED {
                        return Err(GridError::Overlap { row, col }.into());
                    }
                    *slot = idx;
                }
            }
        }
        if let Some(hole) = coverage.iter().position(|&idx| idx == UNCOVERED) {
            return Err(GridError::Gap {
                row: hole / raw.col_count,
                col: hole % raw.col_count,
            }
            .into());
        }

        let mut order: Vec<usize> = (0..raw.cells.len()).collect();
        order.sort_by_key(|&idx| (raw.cells[idx].row, raw.cells[idx].col));

        let shaded = raw
            .cells
            .iter()
            .map(|cell| options.shading.is_background_shaded(cell.background))
            .collect();

        Ok(Self {
            raw,
            order,
            coverage,
            shaded,
            roles: vec![Role::Unclassified; raw.cells.len()],
            ids: vec![None; raw.cells.len()],
        })
    }

    fn index_at(&self, row: usize, col: usize) -> usize {
        self.coverage[row * self.raw.col_count + col]
    }
}
