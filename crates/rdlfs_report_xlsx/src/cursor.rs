//! 1-based layout cursor.
//!
//! Blocks stack vertically by relative row advances; the cursor never jumps to
//! an absolute row except through [`Cursor::reset_row`].

/// Current `(col, row)` write position, both 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    col: usize,
    row: usize,
}

impl Default for Cursor {
    fn default() -> Self {
        Self { col: 1, row: 1 }
    }
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn col(&self) -> usize {
        self.col
    }

    pub fn row(&self) -> usize {
        self.row
    }

    /// Move `n` rows down.
    pub fn advance_row(&mut self, n: usize) {
        self.row += n;
    }

    /// Move back to row 1.
    pub fn reset_row(&mut self) {
        self.row = 1;
    }

    /// Move `n` columns right.
    pub fn advance_col(&mut self, n: usize) {
        self.col += n;
    }

    /// Move back to column 1.
    pub fn reset_col(&mut self) {
        self.col = 1;
    }

    /// Zero-based `(row, col)` as expected by the xlsx backend.
    pub fn to_zero_based(&self) -> (usize, usize) {
        (self.row - 1, self.col - 1)
    }
}
