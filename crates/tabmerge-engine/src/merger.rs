//! Merge orchestration.
//!
//! The merger walks a record stream in order, placing each record into the
//! table: Add fields first, then either a fill into existing empty Input
//! cells or a freshly planned row. The input table is never mutated; the
//! merge works on a clone, so a fatal error leaves the caller's table
//! untouched.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use tabmerge_model::{GridPos, Record, Role, RoleId, Table};

use crate::error::Result;
use crate::matcher::{self, LabelConstraint};
use crate::mutator;
use crate::options::{DegradePolicy, MergeOptions};
use crate::plan::{self, ColPlan, NewCellSpec};
use crate::report::{MergeReport, SkippedField, TieBreak};

/// Merged table plus the diagnostics gathered while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub table: Table,
    pub report: MergeReport,
}

/// Where an appended row goes and how its label columns are treated.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RowKind {
    /// Continue matched group regions; their group stubs grow downward.
    ExtendGroup { groups: Vec<GridPos> },
    /// Insert directly under a matched stub row, duplicating its stubs.
    DuplicateStubRow,
    /// Start a new region at the bottom with the record's label values.
    NewRegion,
    /// Append at the bottom without any label guidance.
    Plain,
}

#[derive(Debug, Clone, Default)]
pub struct Merger {
    options: MergeOptions,
}

impl Merger {
    pub fn new(options: MergeOptions) -> Self {
        Self { options }
    }

    /// Merge `records`, in order, into a copy of `table`.
    pub fn merge(&self, table: &Table, records: &[Record]) -> Result<MergeOutcome> {
        let mut working = table.clone();
        let mut report = MergeReport::default();
        let mut acted: BTreeSet<usize> = BTreeSet::new();

        let known = known_ids(&working);
        let mut accepted: Vec<(usize, Record)> = Vec::new();
        for (index, record) in records.iter().enumerate() {
            let unknown: Vec<RoleId> = record
                .role_ids()
                .filter(|id| !known.contains(*id))
                .cloned()
                .collect();
            if unknown.is_empty() {
                accepted.push((index, record.clone()));
                continue;
            }
            for role_id in unknown {
                warn!(record = index, id = %role_id, "record references unknown field");
                report.skipped_fields.push(SkippedField {
                    record_index: index,
                    role_id,
                });
            }
        }

        self.merge_table(&mut working, &accepted, &mut report, &mut acted)?;

        report.records_merged = acted.len();
        report.records_skipped = records.len() - acted.len();
        debug!(
            merged = report.records_merged,
            skipped = report.records_skipped,
            rows_inserted = report.rows_inserted,
            "merge complete"
        );
        Ok(MergeOutcome {
            table: working,
            report,
        })
    }

    fn merge_table(
        &self,
        table: &mut Table,
        records: &[(usize, Record)],
        report: &mut MergeReport,
        acted: &mut BTreeSet<usize>,
    ) -> Result<()> {
        // Nested tables first; each gets the projection of the stream onto
        // its own fields and merges independently.
        let nested_origins: Vec<GridPos> = table
            .cells
            .iter()
            .filter(|(_, cell)| cell.nested.is_some())
            .map(|(origin, _)| *origin)
            .collect();
        for origin in nested_origins {
            let ids = match table.cell_at_origin(origin).and_then(|c| c.nested.as_deref()) {
                Some(nested) => known_ids(nested),
                None => continue,
            };
            let projected: Vec<(usize, Record)> = records
                .iter()
                .filter_map(|(index, record)| {
                    let sub = record.project(|id| ids.contains(id));
                    (!sub.is_empty()).then_some((*index, sub))
                })
                .collect();
            if projected.is_empty() {
                continue;
            }
            if let Some(nested) = table
                .cell_at_origin_mut(origin)
                .and_then(|cell| cell.nested.as_deref_mut())
            {
                self.merge_table(nested, &projected, report, acted)?;
            }
        }

        for (index, record) in records {
            let local = record.project(|id| table.role_index.contains_key(id));
            if local.is_empty() {
                continue;
            }
            self.merge_record(table, *index, &local, report, acted)?;
        }
        Ok(())
    }

    fn merge_record(
        &self,
        table: &mut Table,
        index: usize,
        record: &Record,
        report: &mut MergeReport,
        acted: &mut BTreeSet<usize>,
    ) -> Result<()> {
        let labels = matcher::constraints_from(table, record);
        let mut adds: Vec<(RoleId, String)> = Vec::new();
        let mut inputs: Vec<(RoleId, String)> = Vec::new();
        for (role_id, value) in record.iter() {
            match table.role_of(role_id) {
                Some(Role::Add) if !value.trim().is_empty() => {
                    adds.push((role_id.clone(), value.to_string()));
                }
                Some(Role::Input) if !value.trim().is_empty() => {
                    inputs.push((role_id.clone(), value.to_string()));
                }
                // Header and Data fields are immutable; values aimed at
                // them are dropped without failing the record.
                _ => {}
            }
        }

        for (role_id, value) in &adds {
            let appended = mutator::append_to_field(
                table,
                role_id,
                value,
                &self.options.add_separator,
                self.options.add_paragraph_break,
            );
            if appended {
                report.cells_filled += 1;
                acted.insert(index);
            }
        }

        // A record with no non-empty Input values never places a row.
        if inputs.is_empty() {
            return Ok(());
        }

        let resolution = matcher::resolve(table, &labels);
        if let Some(resolution) = &resolution {
            if resolution.is_ambiguous() {
                warn!(
                    record = index,
                    chosen = resolution.chosen_row(),
                    "ambiguous label match, keeping earliest row"
                );
                report.tie_breaks.push(TieBreak {
                    record_index: index,
                    chosen_row: resolution.chosen_row(),
                    candidate_rows: resolution.region_starts.clone(),
                });
            }
        }

        if self.options.fill_empty_first {
            let rows: Vec<usize> = match &resolution {
                Some(resolution) => resolution.rows.clone(),
                None if labels.is_empty() => (0..table.row_count).collect(),
                None => Vec::new(),
            };
            if self.try_fill(table, &rows, &inputs, report) {
                acted.insert(index);
                return Ok(());
            }
        }

        let (after, kind) = match &resolution {
            Some(resolution) if !resolution.groups.is_empty() => {
                let after = resolution
                    .groups
                    .iter()
                    .filter_map(|origin| table.cell_at_origin(*origin))
                    .map(|cell| cell.end_row())
                    .min()
                    .unwrap_or_else(|| resolution.chosen_row());
                (after, RowKind::ExtendGroup {
                    groups: resolution.groups.clone(),
                })
            }
            Some(resolution) => (resolution.chosen_row(), RowKind::DuplicateStubRow),
            None if !labels.is_empty() => (table.row_count - 1, RowKind::NewRegion),
            None => (table.row_count - 1, RowKind::Plain),
        };

        let plan = self.plan_row(table, after, &kind, &labels, &inputs);
        let new_row = mutator::insert_row_after(table, after, &plan)?;
        debug!(record = index, row = new_row, ?kind, "inserted row");
        report.rows_inserted += 1;
        acted.insert(index);
        Ok(())
    }

    /// Write the record's inputs into the first row where every targeted
    /// cell exists and is empty.
    fn try_fill(
        &self,
        table: &mut Table,
        rows: &[usize],
        inputs: &[(RoleId, String)],
        report: &mut MergeReport,
    ) -> bool {
        'rows: for &row in rows {
            let mut targets = Vec::new();
            for (role_id, value) in inputs {
                let Some(origin) = table
                    .origins_for(role_id)
                    .iter()
                    .copied()
                    .find(|pos| pos.row == row)
                else {
                    continue 'rows;
                };
                match table.cell_at_origin(origin) {
                    Some(cell) if cell.is_empty() => targets.push((origin, value.clone())),
                    _ => continue 'rows,
                }
            }
            if targets.is_empty() {
                continue;
            }
            for (origin, value) in targets {
                if let Some(cell) = table.cell_at_origin_mut(origin) {
                    cell.set_text(&value);
                    report.cells_filled += 1;
                }
            }
            debug!(row, "filled existing row");
            return true;
        }
        false
    }

    /// Build the per-column directives for a row inserted after `after`.
    fn plan_row(
        &self,
        table: &Table,
        after: usize,
        kind: &RowKind,
        labels: &[LabelConstraint],
        inputs: &[(RoleId, String)],
    ) -> Vec<ColPlan> {
        let profiles = plan::column_profiles(table);
        let labels_by_col = by_column(table, labels.iter().map(|l| (&l.role_id, l.value.as_str())));
        let inputs_by_col = by_column(table, inputs.iter().map(|(id, v)| (id, v.as_str())));

        let mut directives = Vec::new();
        let mut col = 0;
        while col < table.col_count {
            if let Some(cell) = table.cell(GridPos::new(after, col)) {
                if cell.end_row() > after {
                    // Spans across the boundary; absorbed automatically.
                    col = cell.end_col() + 1;
                    continue;
                }
            }
            let Some(profile) = profiles.get(&col) else {
                directives.push(ColPlan::New(NewCellSpec {
                    col,
                    col_span: 1,
                    role: Role::Unclassified,
                    role_id: RoleId::new(format!("cell-r{}c{}", after + 1, col)),
                    text: String::new(),
                }));
                col += 1;
                continue;
            };
            let span = profile.col_span;

            let directive = match profile.role {
                Role::GroupStub => {
                    let matched = match kind {
                        RowKind::ExtendGroup { groups } => {
                            groups.iter().copied().find(|origin| origin.col == col)
                        }
                        _ => None,
                    };
                    if let Some(origin) = matched {
                        ColPlan::Extend { origin }
                    } else if let Some((role_id, value)) = labels_by_col.get(&col) {
                        ColPlan::New(NewCellSpec {
                            col,
                            col_span: span,
                            role: Role::GroupStub,
                            role_id: role_id.clone(),
                            text: value.clone(),
                        })
                    } else {
                        ColPlan::New(NewCellSpec {
                            col,
                            col_span: span,
                            role: Role::GroupStub,
                            role_id: profile.role_id.clone(),
                            text: self.unlabeled_text(table, after, col, kind),
                        })
                    }
                }
                Role::Stub => {
                    let (role_id, text) = if let Some((role_id, value)) = labels_by_col.get(&col) {
                        (role_id.clone(), value.clone())
                    } else if matches!(kind, RowKind::DuplicateStubRow) {
                        (profile.role_id.clone(), cell_text_at(table, after, col))
                    } else {
                        (
                            profile.role_id.clone(),
                            self.unlabeled_text(table, after, col, kind),
                        )
                    };
                    ColPlan::New(NewCellSpec {
                        col,
                        col_span: span,
                        role: Role::Stub,
                        role_id,
                        text,
                    })
                }
                Role::Input => {
                    let (role_id, text) = inputs_by_col
                        .get(&col)
                        .cloned()
                        .unwrap_or_else(|| (profile.role_id.clone(), String::new()));
                    ColPlan::New(NewCellSpec {
                        col,
                        col_span: span,
                        role: Role::Input,
                        role_id,
                        text,
                    })
                }
                Role::Data => ColPlan::New(NewCellSpec {
                    col,
                    col_span: span,
                    role: Role::Data,
                    role_id: profile.role_id.clone(),
                    text: String::new(),
                }),
                _ => ColPlan::New(NewCellSpec {
                    col,
                    col_span: span,
                    role: Role::Unclassified,
                    role_id: RoleId::new(format!("cell-r{}c{}", after + 1, col)),
                    text: String::new(),
                }),
            };
            directives.push(directive);
            col += span;
        }
        directives
    }

    /// Text for a label column the record did not supply.
    ///
    /// Only a fully unlabeled append consults the degrade policy; rows
    /// anchored by some label leave their other label columns empty.
    fn unlabeled_text(&self, table: &Table, after: usize, col: usize, kind: &RowKind) -> String {
        if !matches!(kind, RowKind::Plain) {
            return String::new();
        }
        match self.options.degrade {
            DegradePolicy::DuplicatePrevious => cell_text_at(table, after, col),
            DegradePolicy::LeaveEmpty => String::new(),
        }
    }
}

/// Merge with default options.
pub fn merge(table: &Table, records: &[Record]) -> Result<MergeOutcome> {
    Merger::default().merge(table, records)
}

/// All role ids a table answers for, including nested tables.
fn known_ids(table: &Table) -> BTreeSet<RoleId> {
    let mut ids: BTreeSet<RoleId> = table.role_index.keys().cloned().collect();
    for cell in table.cells.values() {
        if let Some(nested) = cell.nested.as_deref() {
            ids.extend(known_ids(nested));
        }
    }
    ids
}

/// Map field values to the origin column of their field, first value wins.
fn by_column<'a>(
    table: &Table,
    fields: impl Iterator<Item = (&'a RoleId, &'a str)>,
) -> BTreeMap<usize, (RoleId, String)> {
    let mut by_col = BTreeMap::new();
    for (role_id, value) in fields {
        if let Some(origin) = table.origins_for(role_id).first() {
            by_col
                .entry(origin.col)
                .or_insert_with(|| (role_id.clone(), value.to_string()));
        }
    }
    by_col
}

fn cell_text_at(table: &Table, row: usize, col: usize) -> String {
    table
        .cell(GridPos::new(row, col))
        .map(|cell| cell.text())
        .unwrap_or_default()
}
