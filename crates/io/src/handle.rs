use std::path::{Path, PathBuf};

use regcheck_engine::{StoreError, Workbook, WorkbookStore};

use crate::{xlsx, IoError};

/// An open spreadsheet file. Owns the in-memory workbook for the duration of
/// a run and writes it back to the path it was opened from.
///
/// The source file is read fully on open and not held open afterwards, so
/// dropping the handle on any exit path leaves nothing locked. Only `.xlsx`
/// paths are accepted: saving writes XLSX bytes back to the same path.
#[derive(Debug)]
pub struct XlsxHandle {
    path: PathBuf,
    workbook: Workbook,
    saves: usize,
}

impl XlsxHandle {
    pub fn open(path: &Path) -> Result<Self, IoError> {
        let is_xlsx = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"));
        if !is_xlsx {
            return Err(IoError::Unsupported {
                path: path.display().to_string(),
            });
        }

        let (workbook, result) = xlsx::import(path)?;
        tracing::info!(
            path = %path.display(),
            sheets = result.sheets_imported,
            cells = result.cells_imported,
            dates = result.dates_imported,
            ms = result.import_duration_ms as u64,
            "opened workbook"
        );
        Ok(Self {
            path: path.to_path_buf(),
            workbook,
            saves: 0,
        })
    }

    /// Release the handle. Unsaved changes are discarded; callers save first.
    pub fn close(self) {
        tracing::debug!(path = %self.path.display(), saves = self.saves, "closed workbook");
    }
}

impl WorkbookStore for XlsxHandle {
    fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    fn workbook_mut(&mut self) -> &mut Workbook {
        &mut self.workbook
    }

    fn save(&mut self) -> Result<(), StoreError> {
        let result = xlsx::export(&self.workbook, &self.path).map_err(|e| StoreError {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;
        self.saves += 1;
        tracing::debug!(
            path = %self.path.display(),
            cells = result.cells_exported,
            ms = result.export_duration_ms as u64,
            "saved workbook"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regcheck_engine::{CellValue, Sheet};

    #[test]
    fn test_save_writes_back_to_opened_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("licences.xlsx");
        let mut wb = Workbook::new();
        wb.add_sheet(Sheet::from_rows("QBCC Company", [["Company", "Licence Number", "Status"]]));
        xlsx::export(&wb, &path).unwrap();

        let mut handle = XlsxHandle::open(&path).unwrap();
        handle
            .workbook_mut()
            .sheet_mut(0)
            .unwrap()
            .row_mut(1)
            .set_text(2, "Current");
        handle.save().unwrap();
        handle.close();

        let reopened = XlsxHandle::open(&path).unwrap();
        let sheet = reopened.workbook().sheet(0).unwrap();
        assert_eq!(sheet.get(1, 2), &CellValue::text("Current"));
    }

    #[test]
    fn test_open_rejects_non_xlsx_paths() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["licences.xls", "licences.ods", "licences"] {
            let path = dir.path().join(name);
            std::fs::write(&path, b"not read").unwrap();
            let err = XlsxHandle::open(&path).unwrap_err();
            assert!(matches!(err, IoError::Unsupported { .. }), "{name}: {err}");
            assert_eq!(std::fs::read(&path).unwrap(), b"not read");
        }
    }
}
