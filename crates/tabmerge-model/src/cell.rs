use std::fmt;

use crate::role::{Role, RoleId};
use crate::table::Table;

/// Top-left grid address of a cell, unique per cell.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct GridPos {
    pub row: usize,
    pub col: usize,
}

impl GridPos {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// One classified cell of a table grid.
///
/// The rectangle `[origin.row, origin.row + row_span) x
/// [origin.col, origin.col + col_span)` is the area the cell covers.
/// Content is an ordered sequence of paragraphs; an empty sequence (or
/// whitespace-only paragraphs) is a visually empty cell.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Cell {
    pub origin: GridPos,
    pub row_span: usize,
    pub col_span: usize,
    pub paragraphs: Vec<String>,
    pub role: Role,
    pub role_id: RoleId,
    pub shaded: bool,
    /// Independently merged child table, never flattened into the parent.
    pub nested: Option<Box<Table>>,
}

impl Cell {
    pub fn new(
        origin: GridPos,
        row_span: usize,
        col_span: usize,
        role: Role,
        role_id: RoleId,
    ) -> Self {
        Self {
            origin,
            row_span,
            col_span,
            paragraphs: Vec::new(),
            role,
            role_id,
            shaded: false,
            nested: None,
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.set_text(text);
        self
    }

    pub fn with_shaded(mut self, shaded: bool) -> Self {
        self.shaded = shaded;
        self
    }

    /// Last row index covered by this cell.
    pub fn end_row(&self) -> usize {
        self.origin.row + self.row_span - 1
    }

    /// Last column index covered by this cell.
    pub fn end_col(&self) -> usize {
        self.origin.col + self.col_span - 1
    }

    pub fn covers(&self, pos: GridPos) -> bool {
        self.origin.row <= pos.row
            && pos.row <= self.end_row()
            && self.origin.col <= pos.col
            && pos.col <= self.end_col()
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.iter().all(|p| p.trim().is_empty())
    }

    /// Cell content as a single newline-joined string.
    pub fn text(&self) -> String {
        self.paragraphs.join("\n")
    }

    /// Replace the cell content, splitting on newlines into paragraphs.
    pub fn set_text(&mut self, text: &str) {
        if text.is_empty() {
            self.paragraphs.clear();
        } else {
            self.paragraphs = text.split('\n').map(str::to_string).collect();
        }
    }

    /// Append text to the cell content.
    ///
    /// With `paragraph_break` the text starts new paragraphs; otherwise it
    /// continues the last paragraph joined by `separator`.
    pub fn append_text(&mut self, text: &str, separator: &str, paragraph_break: bool) {
        if self.is_empty() {
            self.set_text(text);
            return;
        }
        if paragraph_break {
            self.paragraphs.extend(text.split('\n').map(str::to_string));
        } else if let Some(last) = self.paragraphs.last_mut() {
            let mut lines = text.split('\n');
            if let Some(first) = lines.next() {
                last.push_str(separator);
                last.push_str(first);
            }
            self.paragraphs.extend(lines.map(str::to_string));
        }
    }
}
