//! Version control service for blogvcs.
//!
//! [`VersionControl`] is the entry point for applications: it validates
//! input, writes through an injected [`VersionStore`](blogvcs_store::VersionStore),
//! and produces rendered comparisons.

pub mod config;
pub mod error;
pub mod service;

pub use config::{ServiceConfig, DEFAULT_MAX_CONTENT_BYTES};
pub use error::{ServiceError, ServiceResult};
pub use service::{Comparison, Saved, VersionControl};

// Re-export key types
pub use blogvcs_diff::{DiffStats, EditScript, Granularity};
pub use blogvcs_store::{InMemoryVersionStore, JournalVersionStore, VersionStore};
pub use blogvcs_types::{Document, DocumentId, Version, VersionId};
