use regcheck_engine::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (bad column key, clashing indices, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// A planned sheet disappeared from the workbook.
    #[error("sheet index {0} not found in workbook")]
    SheetNotFound(usize),
    /// Checkpoint or final save failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
