use thiserror::Error;

/// Grid coverage violations, reported with the offending coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("cell overlap at ({row}, {col})")]
    Overlap { row: usize, col: usize },
    #[error("uncovered grid coordinate ({row}, {col})")]
    Gap { row: usize, col: usize },
    #[error("cell at ({row}, {col}) extends past the {row_count}x{col_count} grid")]
    OutOfBounds {
        row: usize,
        col: usize,
        row_count: usize,
        col_count: usize,
    },
    #[error("cell at ({row}, {col}) has a zero-sized span")]
    ZeroSpan { row: usize, col: usize },
}

pub type Result<T> = std::result::Result<T, GridError>;
