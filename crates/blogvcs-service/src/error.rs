use blogvcs_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage failure: {0}")]
    Storage(StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Storage(_) => "storage_failure",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DocumentNotFound(_) | StoreError::VersionNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            StoreError::RevisionConflict { .. } => Self::Conflict(err.to_string()),
            other => Self::Storage(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use blogvcs_types::DocumentId;

    #[test]
    fn store_errors_map_to_service_kinds() {
        let id = DocumentId::new();
        let err: ServiceError = StoreError::DocumentNotFound(id).into();
        assert_eq!(err.code(), "not_found");

        let err: ServiceError = StoreError::RevisionConflict {
            document: id,
            expected: 1,
            actual: 2,
        }
        .into();
        assert_eq!(err.code(), "conflict");

        let err: ServiceError = StoreError::LockPoisoned.into();
        assert_eq!(err.code(), "storage_failure");
    }
}
