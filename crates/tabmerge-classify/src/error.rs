use thiserror::Error;

use tabmerge_model::GridError;

#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The raw grid violates coverage/non-overlap before classification
    /// even starts. The wrapped error names the offending coordinates.
    #[error("malformed template: {0}")]
    MalformedTemplate(#[from] GridError),
}

pub type Result<T> = std::result::Result<T, ClassifyError>;
