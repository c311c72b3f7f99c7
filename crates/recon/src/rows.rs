//! Header-keyed row access over a worksheet.
//!
//! The header row is found once per sheet; each data row below it is
//! handed out as a [`RowRecord`] carrying its sheet row index, so the
//! driver can write status cells back between reads.

use std::collections::HashMap;

use regcheck_engine::Sheet;

/// Normalize a header cell for keying: lowercase, whitespace collapsed.
pub fn normalize_header(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn compact(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// One data row: values keyed by header plus positional access.
#[derive(Debug, Clone, PartialEq)]
pub struct RowRecord {
    /// Zero-based row index in the sheet.
    pub row: usize,
    /// Trimmed values keyed by normalized header. On duplicate headers the
    /// leftmost column wins.
    pub fields: HashMap<String, String>,
    /// Positional values; `None` where the header cell is empty.
    values: Vec<Option<String>>,
}

impl RowRecord {
    /// Value under a header name (normalized before lookup).
    pub fn get(&self, header: &str) -> Option<&str> {
        self.fields.get(&normalize_header(header)).map(String::as_str)
    }

    /// Value at a column index. `None` when the column has no header or
    /// lies beyond the header row.
    pub fn value_at(&self, col: usize) -> Option<&str> {
        self.values.get(col).and_then(|v| v.as_deref())
    }
}

/// Resumable cursor over the data rows of a sheet.
///
/// The sheet is borrowed per call, so the caller may mutate it between
/// calls to [`RowCursor::next_row`].
#[derive(Debug, Clone)]
pub struct RowCursor {
    headers: Vec<String>,
    header_row: Option<usize>,
    next: usize,
}

impl RowCursor {
    /// Locate the header row. With a sentinel, the header is the first row
    /// whose first cell (column A) equals it, case and spaces ignored;
    /// without one, the first non-empty row.
    pub fn new(sheet: &Sheet, sentinel: Option<&str>) -> Self {
        let wanted = sentinel.map(compact).filter(|s| !s.is_empty());
        let header_row = (0..sheet.row_count()).find(|&row| match &wanted {
            Some(wanted) => compact(&sheet.get(row, 0).to_text()) == *wanted,
            None => !sheet.is_row_empty(row),
        });

        let mut headers = Vec::new();
        if let Some(row) = header_row {
            headers = (0..sheet.col_count())
                .map(|col| normalize_header(&sheet.get(row, col).to_text()))
                .collect();
            while headers.last().is_some_and(|h| h.is_empty()) {
                headers.pop();
            }
        }

        Self {
            headers,
            next: header_row.map_or(0, |r| r + 1),
            header_row,
        }
    }

    pub fn header_row(&self) -> Option<usize> {
        self.header_row
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Next non-blank data row, or `None` at the end of the sheet.
    pub fn next_row(&mut self, sheet: &Sheet) -> Option<RowRecord> {
        self.header_row?;
        while self.next < sheet.row_count() {
            let row = self.next;
            self.next += 1;
            if sheet.is_row_empty(row) {
                continue;
            }
            return Some(self.record(sheet, row));
        }
        None
    }

    fn record(&self, sheet: &Sheet, row: usize) -> RowRecord {
        let mut fields = HashMap::new();
        let mut values = Vec::with_capacity(self.headers.len());
        for (col, header) in self.headers.iter().enumerate() {
            if header.is_empty() {
                values.push(None);
                continue;
            }
            let value = sheet.get(row, col).to_text().trim().to_string();
            fields
                .entry(header.clone())
                .or_insert_with(|| value.clone());
            values.push(Some(value));
        }
        RowRecord { row, fields, values }
    }
}

/// Read-only iterator over a sheet's data rows.
pub struct SheetRows<'a> {
    sheet: &'a Sheet,
    cursor: RowCursor,
}

impl Iterator for SheetRows<'_> {
    type Item = RowRecord;

    fn next(&mut self) -> Option<RowRecord> {
        self.cursor.next_row(self.sheet)
    }
}

pub fn iterate<'a>(sheet: &'a Sheet, sentinel: Option<&str>) -> SheetRows<'a> {
    SheetRows {
        sheet,
        cursor: RowCursor::new(sheet, sentinel),
    }
}
