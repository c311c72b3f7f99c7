// File I/O operations

pub mod handle;
pub mod xlsx;

pub use handle::XlsxHandle;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to open {path}: {message}")]
    Open { path: String, message: String },
    #[error("{path}: only .xlsx workbooks can be checked and saved in place")]
    Unsupported { path: String },
    #[error("{path} contains no sheets")]
    NoSheets { path: String },
    #[error("failed to read sheet '{sheet}': {message}")]
    Sheet { sheet: String, message: String },
    #[error("failed to write {path}: {message}")]
    Write { path: String, message: String },
}
