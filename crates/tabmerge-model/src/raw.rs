/// Normalized background color of a parsed cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#rrggbb` string as emitted by markup parsers.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
        let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
        let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }
}

/// Pre-classification cell: position, span, content and shading only.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RawCell {
    pub row: usize,
    pub col: usize,
    pub row_span: usize,
    pub col_span: usize,
    pub paragraphs: Vec<String>,
    pub background: Option<Color>,
    /// Child grid owned by this cell, classified and merged independently.
    pub nested: Option<Box<RawGrid>>,
}

impl RawCell {
    pub fn new(row: usize, col: usize) -> Self {
        Self {
            row,
            col,
            row_span: 1,
            col_span: 1,
            paragraphs: Vec::new(),
            background: None,
            nested: None,
        }
    }

    pub fn with_span(mut self, row_span: usize, col_span: usize) -> Self {
        self.row_span = row_span;
        self.col_span = col_span;
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.paragraphs = if text.is_empty() {
            Vec::new()
        } else {
            text.split('\n').map(str::to_string).collect()
        };
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    pub fn with_nested(mut self, nested: RawGrid) -> Self {
        self.nested = Some(Box::new(nested));
        self
    }

    pub fn end_row(&self) -> usize {
        self.row + self.row_span - 1
    }

    pub fn end_col(&self) -> usize {
        self.col + self.col_span - 1
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.iter().all(|p| p.trim().is_empty())
    }

    pub fn text(&self) -> String {
        self.paragraphs.join("\n")
    }
}

/// Table grid as handed over by an external markup parser.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RawGrid {
    pub row_count: usize,
    pub col_count: usize,
    pub cells: Vec<RawCell>,
}

impl RawGrid {
    pub fn new(row_count: usize, col_count: usize) -> Self {
        Self {
            row_count,
            col_count,
            cells: Vec::new(),
        }
    }

    pub fn push(&mut self, cell: RawCell) {
        self.cells.push(cell);
    }

    pub fn with_cell(mut self, cell: RawCell) -> Self {
        self.cells.push(cell);
        self
    }
}
