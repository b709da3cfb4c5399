/// How label columns are populated when a record appends a row without
/// supplying any stub or group-stub value.
///
/// The degrade chain GroupStub -> Stub -> Input is otherwise implicit; this
/// knob makes the final step an explicit configuration instead of a silent
/// heuristic.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize,
)]
pub enum DegradePolicy {
    /// Copy the label text of the row the insertion follows.
    #[default]
    DuplicatePrevious,
    /// Leave the label cells of the new row empty.
    LeaveEmpty,
}

/// Merge policy knobs.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MergeOptions {
    /// Try writing into existing empty Input cells before appending rows.
    pub fill_empty_first: bool,
    /// Separator between existing and appended Add-field content when the
    /// same paragraph is continued.
    pub add_separator: String,
    /// Append Add-field content as new paragraphs instead of continuing
    /// the last one.
    pub add_paragraph_break: bool,
    pub degrade: DegradePolicy,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            fill_empty_first: true,
            add_separator: " ".to_string(),
            add_paragraph_break: false,
            degrade: DegradePolicy::default(),
        }
    }
}
