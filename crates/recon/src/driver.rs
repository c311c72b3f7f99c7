//! Row-by-row reconciliation of one sheet against one registry.

use chrono::{NaiveDateTime, SubsecRound};
use regcheck_engine::{CellValue, Sheet, WorkbookStore};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::SheetConfig;
use crate::error::ReconError;
use crate::registry::{
    normalize_identifier, title_case, Identifier, IdentifierSpec, LookupResult, Registry,
    COMPANY, FIRST_NAME, SURNAME,
};
use crate::rows::{RowCursor, RowRecord};
use crate::skip::should_skip;

pub const STATUS_NOT_FOUND: &str = "Missing in Register";
pub const STATUS_EXPIRED: &str = "License Expired";
pub const STATUS_LOOKUP_FAILED: &str = "Lookup Failed";

#[derive(Debug, Clone, Copy)]
pub struct ReconcileOptions {
    pub skip_days: u32,
    /// Timestamp written to last-checked cells.
    pub now: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Skipped,
    WrittenFound,
    WrittenExpired,
    WrittenNotFound,
    WrittenMissingColumn,
    WrittenBlankIdentifier,
    WrittenError,
}

/// Counts for one sheet pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SheetSummary {
    pub sheet: String,
    pub registry: String,
    pub header_row: Option<usize>,
    pub skipped: usize,
    pub found: usize,
    pub expired: usize,
    pub not_found: usize,
    pub missing_column: usize,
    pub blank_identifier: usize,
    pub errors: usize,
    pub checkpoints: usize,
}

impl SheetSummary {
    fn record(&mut self, outcome: RowOutcome) {
        let slot = match outcome {
            RowOutcome::Skipped => &mut self.skipped,
            RowOutcome::WrittenFound => &mut self.found,
            RowOutcome::WrittenExpired => &mut self.expired,
            RowOutcome::WrittenNotFound => &mut self.not_found,
            RowOutcome::WrittenMissingColumn => &mut self.missing_column,
            RowOutcome::WrittenBlankIdentifier => &mut self.blank_identifier,
            RowOutcome::WrittenError => &mut self.errors,
        };
        *slot += 1;
    }

    /// Rows that had a status written.
    pub fn processed(&self) -> usize {
        self.found
            + self.expired
            + self.not_found
            + self.missing_column
            + self.blank_identifier
            + self.errors
    }
}

/// Run-wide counter of processed rows that decides when to save.
#[derive(Debug, Clone)]
pub struct Checkpointer {
    every: usize,
    processed: usize,
}

impl Checkpointer {
    /// `every == 0` disables checkpoints.
    pub fn new(every: usize) -> Self {
        Self {
            every,
            processed: 0,
        }
    }

    /// Count one processed row; true when a save is due.
    pub fn record(&mut self) -> bool {
        self.processed += 1;
        self.every > 0 && self.processed % self.every == 0
    }

    pub fn processed(&self) -> usize {
        self.processed
    }
}

/// Reconcile every data row of one sheet, writing status and last-checked
/// cells in place. Saves through `store` whenever `checkpointer` says so;
/// the final save is the caller's job.
pub fn reconcile_sheet<S: WorkbookStore + ?Sized>(
    store: &mut S,
    sheet_index: usize,
    registry: &dyn Registry,
    config: &SheetConfig,
    options: &ReconcileOptions,
    checkpointer: &mut Checkpointer,
) -> Result<SheetSummary, ReconError> {
    let sheet = store
        .workbook()
        .sheet(sheet_index)
        .ok_or(ReconError::SheetNotFound(sheet_index))?;
    let sentinel = config.header.as_deref().or(registry.header_sentinel());
    let mut cursor = RowCursor::new(sheet, sentinel);

    let mut summary = SheetSummary {
        sheet: sheet.name.clone(),
        registry: registry.name().to_string(),
        header_row: cursor.header_row(),
        ..Default::default()
    };

    if cursor.header_row().is_none() {
        warn!(sheet = %summary.sheet, sentinel = ?sentinel, "no header row found, sheet left untouched");
        return Ok(summary);
    }

    loop {
        let sheet = store
            .workbook()
            .sheet(sheet_index)
            .ok_or(ReconError::SheetNotFound(sheet_index))?;
        let Some(record) = cursor.next_row(sheet) else {
            break;
        };

        let sheet = store
            .workbook_mut()
            .sheet_mut(sheet_index)
            .ok_or(ReconError::SheetNotFound(sheet_index))?;
        let outcome = process_row(sheet, &record, registry, config, options);
        summary.record(outcome);

        if outcome != RowOutcome::Skipped && checkpointer.record() {
            store.save()?;
            summary.checkpoints += 1;
            info!(
                sheet = %summary.sheet,
                processed = checkpointer.processed(),
                "checkpoint saved"
            );
        }
    }

    info!(
        sheet = %summary.sheet,
        registry = %summary.registry,
        processed = summary.processed(),
        skipped = summary.skipped,
        "sheet pass complete"
    );
    Ok(summary)
}

fn process_row(
    sheet: &mut Sheet,
    record: &RowRecord,
    registry: &dyn Registry,
    config: &SheetConfig,
    options: &ReconcileOptions,
) -> RowOutcome {
    // Sheet rows are zero-based; log them the way a spreadsheet shows them.
    let display_row = record.row + 1;

    if should_skip(sheet, record.row, config, options.skip_days, options.now.date()) {
        debug!(row = display_row, "checked recently, skipping");
        return RowOutcome::Skipped;
    }

    let spec = registry.identifier();
    let label = spec.label();
    let (outcome, status) = match extract_identifier(record, config, &spec) {
        None => (RowOutcome::WrittenMissingColumn, format!("No {label} Column found!")),
        Some(id) if id.is_blank() => (RowOutcome::WrittenBlankIdentifier, format!("{label} is Blank!")),
        Some(id) => {
            let result = registry.resolve(&id);
            let written = status_for(&result);
            match &result {
                LookupResult::QueryError { message } => {
                    error!(row = display_row, identifier = id.display(), error = %message, "lookup failed");
                }
                _ => {
                    info!(row = display_row, identifier = id.display(), status = %written, "checked");
                }
            }
            (outcome_for(&result), written)
        }
    };

    match outcome {
        RowOutcome::WrittenMissingColumn => warn!(row = display_row, status = %status, "identifier column missing"),
        RowOutcome::WrittenBlankIdentifier => debug!(row = display_row, status = %status, "blank identifier"),
        _ => {}
    }

    write_status(sheet, record.row, config, status, options.now);
    outcome
}

/// Pull the lookup key for `spec` out of a row. `None` means the column is
/// not configured or has no header in this sheet.
fn extract_identifier(
    record: &RowRecord,
    config: &SheetConfig,
    spec: &IdentifierSpec,
) -> Option<Identifier> {
    let value = |column: &str| config.column(column).and_then(|i| record.value_at(i));

    match spec {
        IdentifierSpec::Column { column, .. } => {
            value(*column).map(|v| Identifier::Single(normalize_identifier(v)))
        }
        IdentifierSpec::NameOrCompany { .. } => {
            let surname = value(SURNAME);
            let company = value(COMPANY);
            if surname.is_none() && company.is_none() {
                return None;
            }
            let surname = normalize_identifier(surname.unwrap_or_default());
            let name = if surname.is_empty() {
                String::new()
            } else {
                let first = value(FIRST_NAME).unwrap_or_default();
                normalize_identifier(&format!("{first} {surname}"))
            };
            Some(Identifier::NameOrCompany {
                name,
                company: normalize_identifier(company.unwrap_or_default()),
            })
        }
    }
}

fn status_for(result: &LookupResult) -> String {
    match result {
        LookupResult::Found(finding) => title_case(&finding.status),
        LookupResult::Expired(_) => STATUS_EXPIRED.to_string(),
        LookupResult::NotFound => STATUS_NOT_FOUND.to_string(),
        LookupResult::QueryError { .. } => STATUS_LOOKUP_FAILED.to_string(),
    }
}

fn outcome_for(result: &LookupResult) -> RowOutcome {
    match result {
        LookupResult::Found(_) => RowOutcome::WrittenFound,
        LookupResult::Expired(_) => RowOutcome::WrittenExpired,
        LookupResult::NotFound => RowOutcome::WrittenNotFound,
        LookupResult::QueryError { .. } => RowOutcome::WrittenError,
    }
}

/// Write the status text and stamp last-checked. An existing stamp later
/// than `now` is kept.
fn write_status(
    sheet: &mut Sheet,
    row: usize,
    config: &SheetConfig,
    status: String,
    now: NaiveDateTime,
) {
    let now = now.trunc_subsecs(0);
    let mut cells = sheet.row_mut(row);
    let stamp = match cells.get(config.last_checked_index).as_datetime() {
        Some(previous) if previous > now => previous,
        _ => now,
    };
    cells.set_text(config.status_index, status);
    cells.set(config.last_checked_index, CellValue::DateTime(stamp));
}
