//! Merge engine for classified table templates.
//!
//! Three layers build on the grid model:
//!
//! * [`matcher`] resolves a record's stub and group-stub values to the row
//!   they describe.
//! * [`mutator`] provides the structural primitives: row insertion with a
//!   per-column plan, row-span expansion and in-place field appends. Every
//!   primitive re-verifies grid coverage.
//! * [`merger`] orchestrates a record stream: Add fields append in place,
//!   then each record either fills an existing empty row or gets a new one
//!   planned from the table's column profiles.
//!
//! The merge is atomic with respect to the caller's table: it runs on a
//! clone and a fatal error discards all partial work.

pub mod error;
pub mod matcher;
pub mod merger;
pub mod mutator;
pub mod options;
pub mod plan;
pub mod report;

pub use error::{MergeError, Result};
pub use matcher::{find_row, LabelConstraint, RowMatch};
pub use merger::{merge, MergeOutcome, Merger};
pub use mutator::{append_to_field, expand_row_span, insert_row_after};
pub use options::{DegradePolicy, MergeOptions};
pub use plan::{ColPlan, NewCellSpec};
pub use report::{MergeReport, SkippedField, TieBreak};
