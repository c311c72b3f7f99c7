//! `regcheck-engine`: in-memory workbook model.
//!
//! Sheets hold sparse typed cells; rows are written through [`sheet::RowMut`]
//! so a write to one column never disturbs another. Persistence is abstracted
//! behind [`store::WorkbookStore`].

pub mod cell;
pub mod sheet;
pub mod store;
pub mod workbook;

pub use cell::CellValue;
pub use sheet::{RowMut, Sheet};
pub use store::{MemoryStore, StoreError, WorkbookStore};
pub use workbook::Workbook;
