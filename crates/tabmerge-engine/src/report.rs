use tabmerge_model::RoleId;

/// Diagnostics accumulated across one merge.
///
/// Skipped fields and tie-breaks are recovered conditions: the merge
/// continues, but callers get a full account of what was dropped or
/// decided deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MergeReport {
    pub records_merged: usize,
    pub records_skipped: usize,
    pub rows_inserted: usize,
    pub cells_filled: usize,
    pub skipped_fields: Vec<SkippedField>,
    pub tie_breaks: Vec<TieBreak>,
}

impl MergeReport {
    pub fn has_warnings(&self) -> bool {
        !self.skipped_fields.is_empty() || !self.tie_breaks.is_empty()
    }
}

/// A record referenced a role id the table does not know; the record was
/// dropped.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SkippedField {
    pub record_index: usize,
    pub role_id: RoleId,
}

/// Several rows satisfied a record's label constraints equally well; the
/// earliest row was chosen.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TieBreak {
    pub record_index: usize,
    pub chosen_row: usize,
    pub candidate_rows: Vec<usize>,
}
