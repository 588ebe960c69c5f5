use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid {kind} id {input:?}: {reason}")]
    InvalidId {
        kind: &'static str,
        input: String,
        reason: String,
    },
}
