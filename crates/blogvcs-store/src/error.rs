use blogvcs_types::{DocumentId, VersionId};

/// Errors from version store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested document does not exist.
    #[error("document not found: {0}")]
    DocumentNotFound(DocumentId),

    /// The requested version does not exist.
    #[error("version not found: {0}")]
    VersionNotFound(VersionId),

    /// A conditional append found the document at a different revision.
    #[error("revision conflict on {document}: expected {expected}, found {actual}")]
    RevisionConflict {
        document: DocumentId,
        expected: u64,
        actual: u64,
    },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The journal contains a record that cannot be replayed.
    #[error("corrupt journal at line {line}: {reason}")]
    Corrupt { line: usize, reason: String },

    /// A lock guarding store state was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    LockPoisoned,
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
