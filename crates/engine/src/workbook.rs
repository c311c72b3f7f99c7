use crate::sheet::Sheet;

/// An ordered collection of sheets.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sheets(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    /// Append a sheet and return its index.
    pub fn add_sheet(&mut self, sheet: Sheet) -> usize {
        self.sheets.push(sheet);
        self.sheets.len() - 1
    }

    pub fn sheet(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    pub fn sheet_mut(&mut self, index: usize) -> Option<&mut Sheet> {
        self.sheets.get_mut(index)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheets_keep_insertion_order() {
        let mut wb = Workbook::new();
        assert_eq!(wb.add_sheet(Sheet::new("QBCC Individual")), 0);
        assert_eq!(wb.add_sheet(Sheet::new("Surveyors")), 1);

        assert_eq!(wb.sheet_names(), vec!["QBCC Individual", "Surveyors"]);
        wb.sheet_mut(1).unwrap().set(0, 0, crate::CellValue::text("Surname"));
        assert_eq!(wb.sheet(1).unwrap().row_count(), 1);
        assert!(wb.sheet(2).is_none());
    }
}
