//! Version storage for blogvcs.
//!
//! Documents and their immutable versions live behind the [`VersionStore`]
//! trait. Every mutation writes a document together with the version that
//! justifies its new content, so the two can never drift apart.
//!
//! # Storage Backends
//!
//! - [`InMemoryVersionStore`] -- `HashMap`-based store for tests and embedding
//! - [`JournalVersionStore`] -- append-only JSON-lines journal, replayed on open
//!
//! # Design Rules
//!
//! 1. Versions are append-only; nothing is ever edited or deleted.
//! 2. Write-ahead: the journal record is durable before readers can see it.
//! 3. Optimistic concurrency through [`DocumentUpdate::expected_revision`].
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod journal;
pub mod memory;
mod state;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use journal::{JournalVersionStore, SyncMode};
pub use memory::InMemoryVersionStore;
pub use traits::{DocumentUpdate, SortOrder, VersionStore};
