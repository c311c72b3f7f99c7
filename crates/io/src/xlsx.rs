// Excel import/export: calamine reads, rust_xlsxwriter writes.

use std::path::{Path, PathBuf};
use std::time::Instant;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use chrono::{NaiveDateTime, NaiveTime};
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook, Worksheet};

use regcheck_engine::cell::{datetime_to_serial, serial_to_datetime};
use regcheck_engine::{CellValue, Sheet, Workbook};

use crate::IoError;

/// Excel's hard sheet limits. Cells beyond these cannot be written back.
const MAX_ROWS: usize = 1_048_576;
const MAX_COLS: usize = 16_384;

const DATE_FORMAT: &str = "yyyy-mm-dd";
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Statistics from an import operation
#[derive(Debug, Default, Clone)]
pub struct ImportResult {
    pub sheets_imported: usize,
    pub cells_imported: usize,
    pub dates_imported: usize,
    pub import_duration_ms: u128,
}

/// Statistics from an export operation
#[derive(Debug, Default, Clone)]
pub struct ExportResult {
    pub sheets_exported: usize,
    pub cells_exported: usize,
    pub export_duration_ms: u128,
}

/// Import a spreadsheet (xlsx, xls, xlsb, ods) into an in-memory workbook.
/// Values are imported as cached; formulas are not preserved.
pub fn import(path: &Path) -> Result<(Workbook, ImportResult), IoError> {
    let start_time = Instant::now();

    let mut source: Sheets<_> = open_workbook_auto(path).map_err(|e| IoError::Open {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let sheet_names: Vec<String> = source.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err(IoError::NoSheets {
            path: path.display().to_string(),
        });
    }

    let mut result = ImportResult::default();
    let mut workbook = Workbook::new();

    for sheet_name in &sheet_names {
        let range = source
            .worksheet_range(sheet_name)
            .map_err(|e| IoError::Sheet {
                sheet: sheet_name.clone(),
                message: e.to_string(),
            })?;

        let mut sheet = Sheet::new(sheet_name);

        // Range start offset (data may not begin at A1)
        let (start_row, start_col) = range.start().unwrap_or((0, 0));

        for (row_idx, row) in range.rows().enumerate() {
            let target_row = start_row as usize + row_idx;
            for (col_idx, cell) in row.iter().enumerate() {
                let target_col = start_col as usize + col_idx;
                let value = convert_cell(cell);
                if matches!(value, CellValue::Empty) {
                    continue;
                }
                if matches!(value, CellValue::DateTime(_)) {
                    result.dates_imported += 1;
                }
                sheet.set(target_row, target_col, value);
                result.cells_imported += 1;
            }
        }

        workbook.add_sheet(sheet);
        result.sheets_imported += 1;
    }

    result.import_duration_ms = start_time.elapsed().as_millis();
    Ok((workbook, result))
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::text(s.as_str()),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Error(e) => CellValue::Text(format!("#{:?}", e)),
        Data::DateTime(dt) => match serial_to_datetime(dt.as_f64()) {
            Some(ts) => CellValue::DateTime(ts),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => {
            let text = CellValue::text(s.as_str());
            match text.as_datetime() {
                Some(ts) => CellValue::DateTime(ts),
                None => text,
            }
        }
        Data::DurationIso(s) => CellValue::text(s.as_str()),
    }
}

/// Export a workbook to XLSX, replacing `path` atomically: the workbook is
/// written to a sibling temp file which is then renamed over the target.
pub fn export(workbook: &Workbook, path: &Path) -> Result<ExportResult, IoError> {
    let start_time = Instant::now();
    let mut result = ExportResult::default();
    let write_err = |message: String| IoError::Write {
        path: path.display().to_string(),
        message,
    };

    let mut xlsx_workbook = XlsxWorkbook::new();
    let date_format = Format::new().set_num_format(DATE_FORMAT);
    let datetime_format = Format::new().set_num_format(DATETIME_FORMAT);

    for sheet in workbook.sheets() {
        let worksheet = xlsx_workbook
            .add_worksheet()
            .set_name(&sheet.name)
            .map_err(|e| write_err(format!("cannot create sheet '{}': {}", sheet.name, e)))?;

        result.cells_exported +=
            export_sheet_cells(sheet, worksheet, &date_format, &datetime_format)
                .map_err(write_err)?;
        result.sheets_exported += 1;
    }

    let tmp = temp_path_for(path);
    if let Err(e) = xlsx_workbook.save(&tmp) {
        let _ = std::fs::remove_file(&tmp);
        return Err(write_err(e.to_string()));
    }
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(write_err(format!("cannot replace file: {}", e)));
    }

    result.export_duration_ms = start_time.elapsed().as_millis();
    Ok(result)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workbook.xlsx".to_string());
    path.with_file_name(format!(".{}.regcheck-tmp", name))
}

/// Write the populated cells of one sheet. Returns the number written.
fn export_sheet_cells(
    sheet: &Sheet,
    worksheet: &mut Worksheet,
    date_format: &Format,
    datetime_format: &Format,
) -> Result<usize, String> {
    let mut cells_exported = 0;

    for (&(row, col), value) in sheet.cells_iter() {
        if row >= MAX_ROWS || col >= MAX_COLS {
            return Err(format!(
                "cell ({}, {}) in '{}' is outside Excel's sheet limits",
                row, col, sheet.name
            ));
        }
        let row32 = row as u32;
        let col16 = col as u16;
        let cell_err = |e: rust_xlsxwriter::XlsxError| {
            format!("failed to write cell ({}, {}) in '{}': {}", row, col, sheet.name, e)
        };

        match value {
            CellValue::Empty => continue,
            CellValue::Text(s) => {
                worksheet.write_string(row32, col16, s).map_err(cell_err)?;
            }
            CellValue::Number(n) => {
                worksheet.write_number(row32, col16, *n).map_err(cell_err)?;
            }
            CellValue::Bool(b) => {
                worksheet.write_boolean(row32, col16, *b).map_err(cell_err)?;
            }
            CellValue::DateTime(dt) => {
                let format = if is_midnight(dt) { date_format } else { datetime_format };
                worksheet
                    .write_number_with_format(row32, col16, datetime_to_serial(*dt), format)
                    .map_err(cell_err)?;
            }
        }
        cells_exported += 1;
    }

    Ok(cells_exported)
}

fn is_midnight(dt: &NaiveDateTime) -> bool {
    dt.time() == NaiveTime::MIN
}
