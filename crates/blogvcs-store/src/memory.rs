use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use blogvcs_types::{Document, DocumentId, Version, VersionId};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::state::StoreState;
use crate::traits::{DocumentUpdate, SortOrder, VersionStore};

/// In-memory version store.
///
/// Intended for tests and embedding. State lives behind a single `RwLock`,
/// so a document and its new version are always published together.
pub struct InMemoryVersionStore {
    state: RwLock<StoreState>,
}

impl InMemoryVersionStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
        }
    }

    /// Number of documents currently stored.
    pub fn document_count(&self) -> usize {
        self.read().map(|s| s.document_count()).unwrap_or(0)
    }

    /// Number of versions across all documents.
    pub fn version_count(&self) -> usize {
        self.read().map(|s| s.version_count()).unwrap_or(0)
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, StoreState>> {
        self.state.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, StoreState>> {
        self.state.write().map_err(|_| StoreError::LockPoisoned)
    }
}

impl Default for InMemoryVersionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionStore for InMemoryVersionStore {
    fn find_document(&self, id: &DocumentId) -> StoreResult<Option<Document>> {
        Ok(self.read()?.document(id).cloned())
    }

    fn list_documents(&self) -> StoreResult<Vec<Document>> {
        Ok(self.read()?.documents_by_recency())
    }

    fn create_document(&self, title: &str, content: &str) -> StoreResult<(Document, Version)> {
        let (document, version) = Document::create(title, content);
        self.write()?
            .apply_created(document.clone(), version.clone());
        debug!(document = %document.id, version = %version.id, "document created");
        Ok((document, version))
    }

    fn append_version(
        &self,
        id: &DocumentId,
        update: DocumentUpdate,
    ) -> StoreResult<(Document, Version)> {
        let mut state = self.write()?;
        let (document, version) = state.prepare_append(id, &update)?;
        state.apply_appended(document.clone(), version.clone());
        debug!(document = %id, version = %version.id, seq = version.seq, "version appended");
        Ok((document, version))
    }

    fn find_version(&self, id: &VersionId) -> StoreResult<Option<Version>> {
        Ok(self.read()?.version(id).cloned())
    }

    fn list_versions_by_document(
        &self,
        id: &DocumentId,
        order: SortOrder,
    ) -> StoreResult<Vec<Version>> {
        Ok(self.read()?.versions_of(id, order))
    }
}

impl std::fmt::Debug for InMemoryVersionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryVersionStore")
            .field("document_count", &self.document_count())
            .field("version_count", &self.version_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn create_then_find() {
        let store = InMemoryVersionStore::new();
        let (doc, v1) = store.create_document("T1", "<p>A</p>").unwrap();

        assert_eq!(store.find_document(&doc.id).unwrap(), Some(doc.clone()));
        assert_eq!(store.find_version(&v1.id).unwrap(), Some(v1.clone()));
        assert_eq!(store.document_count(), 1);
        assert_eq!(store.version_count(), 1);
    }

    #[test]
    fn missing_lookups_are_none() {
        let store = InMemoryVersionStore::new();
        assert!(store.find_document(&DocumentId::new()).unwrap().is_none());
        assert!(store.find_version(&VersionId::new()).unwrap().is_none());
        assert!(store
            .list_versions_by_document(&DocumentId::new(), SortOrder::NewestFirst)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn append_updates_document_pointer() {
        let store = InMemoryVersionStore::new();
        let (doc, _) = store.create_document("T1", "a").unwrap();
        let (updated, v2) = store
            .append_version(&doc.id, DocumentUpdate::new("b").with_title("T2"))
            .unwrap();

        assert_eq!(updated.current_content, "b");
        assert_eq!(updated.title, "T2");
        assert_eq!(updated.revision, v2.seq);
        assert_eq!(store.find_document(&doc.id).unwrap(), Some(updated));
    }

    #[test]
    fn append_to_unknown_document_fails() {
        let store = InMemoryVersionStore::new();
        let err = store
            .append_version(&DocumentId::new(), DocumentUpdate::new("x"))
            .unwrap_err();
        assert!(matches!(err, StoreError::DocumentNotFound(_)));
        assert_eq!(store.version_count(), 0);
    }

    #[test]
    fn stale_revision_appends_nothing() {
        let store = InMemoryVersionStore::new();
        let (doc, _) = store.create_document("t", "a").unwrap();
        store
            .append_version(&doc.id, DocumentUpdate::new("b").expecting_revision(1))
            .unwrap();

        let err = store
            .append_version(&doc.id, DocumentUpdate::new("c").expecting_revision(1))
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::RevisionConflict {
                expected: 1,
                actual: 2,
                ..
            }
        ));
        assert_eq!(store.version_count(), 2);
        assert_eq!(
            store.find_document(&doc.id).unwrap().unwrap().current_content,
            "b"
        );
    }

    #[test]
    fn versions_listed_in_both_orders() {
        let store = InMemoryVersionStore::new();
        let (doc, v1) = store.create_document("t", "1").unwrap();
        let (_, v2) = store.append_version(&doc.id, DocumentUpdate::new("2")).unwrap();
        let (_, v3) = store.append_version(&doc.id, DocumentUpdate::new("3")).unwrap();

        let newest: Vec<_> = store
            .list_versions_by_document(&doc.id, SortOrder::NewestFirst)
            .unwrap()
            .into_iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(newest, vec![v3.id, v2.id, v1.id]);

        let oldest: Vec<_> = store
            .list_versions_by_document(&doc.id, SortOrder::OldestFirst)
            .unwrap()
            .into_iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(oldest, vec![v1.id, v2.id, v3.id]);
    }

    #[test]
    fn documents_listed_by_recency() {
        let store = InMemoryVersionStore::new();
        let (first, _) = store.create_document("first", "a").unwrap();
        let (second, _) = store.create_document("second", "b").unwrap();
        thread::sleep(Duration::from_millis(2));
        store.append_version(&first.id, DocumentUpdate::new("a2")).unwrap();

        let docs = store.list_documents().unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, first.id);
        assert_eq!(docs[1].id, second.id);
    }

    #[test]
    fn concurrent_appends_keep_revisions_dense() {
        let store = Arc::new(InMemoryVersionStore::new());
        let (doc, _) = store.create_document("t", "0").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for j in 0..10 {
                        store
                            .append_version(&doc.id, DocumentUpdate::new(format!("{i}-{j}")))
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let versions = store
            .list_versions_by_document(&doc.id, SortOrder::OldestFirst)
            .unwrap();
        assert_eq!(versions.len(), 81);
        let seqs: Vec<u64> = versions.iter().map(|v| v.seq).collect();
        assert_eq!(seqs, (1..=81).collect::<Vec<u64>>());

        let current = store.find_document(&doc.id).unwrap().unwrap();
        assert_eq!(current.revision, 81);
        assert_eq!(current.current_content, versions[80].content);
    }
}
