/// Append-only worksheet storage. The collection store is never read,
/// updated, or deduplicated by this service; a retried submission whose
/// first write landed may therefore produce a duplicate row.
pub trait SheetStore: Send + Sync {
    /// Append one row to the named worksheet, returning its row id.
    fn append(&self, worksheet: &str, row: Vec<String>) -> Result<u64, StoreError>;
}

/// Error enumeration for worksheet storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("worksheet not found: {0}")]
    UnknownWorksheet(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
