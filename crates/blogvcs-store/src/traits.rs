use blogvcs_types::{Document, DocumentId, Version, VersionId};
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;

/// Display order for version listings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Most recent first (`created_at`, then `seq`, descending).
    #[default]
    NewestFirst,
    /// Oldest first.
    OldestFirst,
}

/// The change applied to a document when a new version is appended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentUpdate {
    /// New title; `None` keeps the current one.
    pub title: Option<String>,
    /// Content of the new version, mirrored into the document.
    pub content: String,
    /// When set, the append only happens if the document is still at this
    /// revision.
    pub expected_revision: Option<u64>,
}

impl DocumentUpdate {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            title: None,
            content: content.into(),
            expected_revision: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn expecting_revision(mut self, revision: u64) -> Self {
        self.expected_revision = Some(revision);
        self
    }
}

/// Persistent record of documents and their versions.
///
/// All implementations must satisfy these invariants:
/// - Versions are append-only: never edited, never deleted.
/// - A document and the version that sets its content are written in one
///   atomic step; readers never observe one without the other.
/// - `Document::current_content` equals the content of its newest version and
///   `Document::revision` equals that version's `seq`.
pub trait VersionStore: Send + Sync {
    /// Look up a document. Returns `Ok(None)` if it does not exist.
    fn find_document(&self, id: &DocumentId) -> StoreResult<Option<Document>>;

    /// All documents, most recently updated first.
    fn list_documents(&self) -> StoreResult<Vec<Document>>;

    /// Create a document together with its initial version.
    fn create_document(&self, title: &str, content: &str) -> StoreResult<(Document, Version)>;

    /// Update a document and append the version recording the change.
    ///
    /// Fails with `DocumentNotFound` if the document does not exist, and with
    /// `RevisionConflict` if `update.expected_revision` is set and stale.
    fn append_version(
        &self,
        id: &DocumentId,
        update: DocumentUpdate,
    ) -> StoreResult<(Document, Version)>;

    /// Look up a version. Returns `Ok(None)` if it does not exist.
    fn find_version(&self, id: &VersionId) -> StoreResult<Option<Version>>;

    /// All versions of a document in the requested order; empty if the
    /// document has none or does not exist.
    fn list_versions_by_document(
        &self,
        id: &DocumentId,
        order: SortOrder,
    ) -> StoreResult<Vec<Version>>;
}
