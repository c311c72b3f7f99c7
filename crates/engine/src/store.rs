//! Persistence seam between the reconciliation engine and file I/O.

use thiserror::Error;

use crate::workbook::Workbook;

#[derive(Debug, Error)]
#[error("failed to save workbook to {path}: {message}")]
pub struct StoreError {
    pub path: String,
    pub message: String,
}

/// Owner of an open workbook that can persist it.
///
/// The reconciliation driver mutates the workbook through `workbook_mut`
/// and calls `save` at checkpoints; it never touches the file directly.
pub trait WorkbookStore {
    fn workbook(&self) -> &Workbook;
    fn workbook_mut(&mut self) -> &mut Workbook;
    fn save(&mut self) -> Result<(), StoreError>;
}

/// In-memory store that counts saves. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub workbook: Workbook,
    pub saves: usize,
    /// When set, every save fails with this message.
    pub fail_saves: Option<String>,
}

impl MemoryStore {
    pub fn new(workbook: Workbook) -> Self {
        Self {
            workbook,
            saves: 0,
            fail_saves: None,
        }
    }
}

impl WorkbookStore for MemoryStore {
    fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    fn workbook_mut(&mut self) -> &mut Workbook {
        &mut self.workbook
    }

    fn save(&mut self) -> Result<(), StoreError> {
        if let Some(message) = &self.fail_saves {
            return Err(StoreError {
                path: "<memory>".to_string(),
                message: message.clone(),
            });
        }
        self.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_counts_and_fails_saves() {
        let mut store = MemoryStore::new(Workbook::default());
        store.save().unwrap();
        store.save().unwrap();
        assert_eq!(store.saves, 2);

        store.fail_saves = Some("read-only".into());
        let err = store.save().unwrap_err();
        assert_eq!(store.saves, 2);
        assert_eq!(err.to_string(), "failed to save workbook to <memory>: read-only");
    }
}
