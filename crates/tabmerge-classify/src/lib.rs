//! Role classification for table template grids.
//!
//! A freshly parsed [`tabmerge_model::RawGrid`] carries only position, span,
//! content and shading per cell. The classifier assigns every cell a
//! [`tabmerge_model::Role`] and role id in one deterministic pass driven by
//! four ordered rules (first match wins):
//!
//! 1. **Header**: a maximal contiguous run of fully shaded rows from the top
//! 2. **Add**: unshaded long-text cell in the first data row, or the sole
//!    1x1 cell of a table
//! 3. **Stub / GroupStub**: non-empty unshaded cell with an empty cell to
//!    its right, split on row span
//! 4. **Input**: any remaining empty cell; leftover non-empty cells are Data
//!
//! Input cells in the same column under the same governing header and with
//! an identical left stub chain share a role id and form one logical field.

pub mod classifier;
pub mod error;
pub mod options;
pub mod shading;

pub use classifier::Classifier;
pub use error::{ClassifyError, Result};
pub use options::ClassifyOptions;
pub use shading::ShadingPolicy;
