use rustc_hash::FxHashMap;

use crate::cell::CellValue;

static EMPTY: CellValue = CellValue::Empty;

/// A single worksheet: sparse cell storage plus the used-range bounds.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    cells: FxHashMap<(usize, usize), CellValue>,
    /// Number of rows in the used range (last populated row + 1).
    rows: usize,
    /// Number of columns in the used range (last populated column + 1).
    cols: usize,
}

impl Sheet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Build a sheet from dense rows of text, starting at A1. Empty strings
    /// stay empty cells.
    pub fn from_rows<R, C>(name: &str, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        let mut sheet = Self::new(name);
        for (r, row) in rows.into_iter().enumerate() {
            for (c, value) in row.into_iter().enumerate() {
                sheet.set(r, c, CellValue::text(value.as_ref()));
            }
        }
        sheet
    }

    pub fn get(&self, row: usize, col: usize) -> &CellValue {
        self.cells.get(&(row, col)).unwrap_or(&EMPTY)
    }

    /// Set a cell. Setting `Empty` removes the cell but leaves the used
    /// range as it was.
    pub fn set(&mut self, row: usize, col: usize, value: CellValue) {
        if matches!(value, CellValue::Empty) {
            self.cells.remove(&(row, col));
            return;
        }
        self.rows = self.rows.max(row + 1);
        self.cols = self.cols.max(col + 1);
        self.cells.insert((row, col), value);
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn col_count(&self) -> usize {
        self.cols
    }

    pub fn is_row_empty(&self, row: usize) -> bool {
        (0..self.cols).all(|c| self.get(row, c).is_empty())
    }

    /// Mutable view of one row; writes land in the live sheet.
    pub fn row_mut(&mut self, row: usize) -> RowMut<'_> {
        RowMut { sheet: self, row }
    }

    /// Iterate over all populated cells (unordered).
    pub fn cells_iter(&self) -> impl Iterator<Item = (&(usize, usize), &CellValue)> {
        self.cells.iter()
    }
}

/// Write handle for a single row. Only the addressed cell changes on each
/// write; the rest of the row is untouched.
pub struct RowMut<'a> {
    sheet: &'a mut Sheet,
    row: usize,
}

impl RowMut<'_> {
    pub fn get(&self, col: usize) -> &CellValue {
        self.sheet.get(self.row, col)
    }

    pub fn set(&mut self, col: usize, value: CellValue) {
        self.sheet.set(self.row, col, value);
    }

    pub fn set_text(&mut self, col: usize, value: impl Into<String>) {
        self.set(col, CellValue::text(value));
    }
}
