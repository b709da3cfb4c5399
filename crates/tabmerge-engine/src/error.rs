use thiserror::Error;

use tabmerge_model::{GridError, GridPos};

#[derive(Debug, Error)]
pub enum MergeError {
    /// A mutation violated the grid coverage invariant. Fatal: the merge
    /// aborts and no partial grid is returned to the caller.
    #[error("grid corrupted during merge: {source}")]
    CorruptGrid {
        #[from]
        source: GridError,
    },

    /// A mutation primitive was asked to operate outside the grid.
    #[error("row {row} is outside a table with {row_count} rows")]
    RowOutOfRange { row: usize, row_count: usize },

    /// The expansion target is missing, or the row below it cannot be
    /// absorbed into its span.
    #[error("cannot expand row span of cell at {origin}")]
    ExpandBlocked { origin: GridPos },
}

pub type Result<T> = std::result::Result<T, MergeError>;
