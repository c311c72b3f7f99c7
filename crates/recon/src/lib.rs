//! `regcheck-recon`: checks spreadsheet rows against public registers.
//!
//! Pure engine crate: walks sheets, asks a [`Registry`] about each row and
//! writes the verdict back. No network or file dependencies; those sit
//! behind the [`Registry`] and [`regcheck_engine::WorkbookStore`] traits.

pub mod config;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod registry;
pub mod rows;
pub mod skip;

pub use config::{CheckConfig, SheetConfig, SheetMatch};
pub use dispatch::{Assignment, Dispatcher, RunOptions, RunSummary};
pub use driver::{reconcile_sheet, Checkpointer, ReconcileOptions, RowOutcome, SheetSummary};
pub use error::ReconError;
pub use registry::{
    normalize_identifier, title_case, Finding, Identifier, IdentifierSpec, LookupResult, Registry,
};
pub use rows::{iterate, RowCursor, RowRecord};
pub use skip::should_skip;
