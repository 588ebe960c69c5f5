//! Index of documents and versions shared by every backend.

use std::collections::HashMap;

use blogvcs_types::{Document, DocumentId, Version, VersionId};

use crate::error::{StoreError, StoreResult};
use crate::traits::{DocumentUpdate, SortOrder};

#[derive(Debug, Default)]
pub(crate) struct StoreState {
    documents: HashMap<DocumentId, Document>,
    versions: HashMap<VersionId, Version>,
    /// Version ids per document in append order.
    history: HashMap<DocumentId, Vec<VersionId>>,
}

impl StoreState {
    pub fn document(&self, id: &DocumentId) -> Option<&Document> {
        self.documents.get(id)
    }

    pub fn version(&self, id: &VersionId) -> Option<&Version> {
        self.versions.get(id)
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn version_count(&self) -> usize {
        self.versions.len()
    }

    pub fn documents_by_recency(&self) -> Vec<Document> {
        let mut docs: Vec<Document> = self.documents.values().cloned().collect();
        docs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        docs
    }

    pub fn versions_of(&self, id: &DocumentId, order: SortOrder) -> Vec<Version> {
        let mut versions: Vec<Version> = self
            .history
            .get(id)
            .map(|ids| ids.iter().filter_map(|v| self.versions.get(v)).cloned().collect())
            .unwrap_or_default();
        versions.sort_by(Version::cmp_newest_first);
        if order == SortOrder::OldestFirst {
            versions.reverse();
        }
        versions
    }

    /// Compute the next state of a document without applying it.
    pub fn prepare_append(
        &self,
        id: &DocumentId,
        update: &DocumentUpdate,
    ) -> StoreResult<(Document, Version)> {
        let current = self
            .documents
            .get(id)
            .ok_or(StoreError::DocumentNotFound(*id))?;
        if let Some(expected) = update.expected_revision {
            if expected != current.revision {
                return Err(StoreError::RevisionConflict {
                    document: *id,
                    expected,
                    actual: current.revision,
                });
            }
        }
        Ok(current.advance(update.title.as_deref(), update.content.as_str()))
    }

    pub fn apply_created(&mut self, document: Document, version: Version) {
        self.history.insert(document.id, vec![version.id]);
        self.versions.insert(version.id, version);
        self.documents.insert(document.id, document);
    }

    pub fn apply_appended(&mut self, document: Document, version: Version) {
        self.history
            .entry(document.id)
            .or_default()
            .push(version.id);
        self.versions.insert(version.id, version);
        self.documents.insert(document.id, document);
    }

    /// Check that a replayed pairing is consistent with the current state.
    pub fn validate_replay(
        &self,
        document: &Document,
        version: &Version,
        created: bool,
    ) -> Result<(), String> {
        if version.document_id != document.id {
            return Err(format!(
                "version {} does not belong to document {}",
                version.id, document.id
            ));
        }
        if version.seq != document.revision || version.content != document.current_content {
            return Err(format!(
                "document {} does not mirror version {}",
                document.id, version.id
            ));
        }
        if self.versions.contains_key(&version.id) {
            return Err(format!("duplicate version {}", version.id));
        }
        match (created, self.documents.get(&document.id)) {
            (true, Some(_)) => Err(format!("document {} created twice", document.id)),
            (true, None) if version.seq != 1 => {
                Err(format!("document {} starts at seq {}", document.id, version.seq))
            }
            (false, None) => Err(format!("append to unknown document {}", document.id)),
            (false, Some(prev)) if version.seq != prev.revision + 1 => Err(format!(
                "document {} jumps from revision {} to {}",
                document.id, prev.revision, version.seq
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_append_does_not_mutate() {
        let mut state = StoreState::default();
        let (doc, v1) = Document::create("t", "a");
        state.apply_created(doc.clone(), v1);

        let (next, v2) = state
            .prepare_append(&doc.id, &DocumentUpdate::new("b"))
            .unwrap();
        assert_eq!(next.revision, 2);
        assert_eq!(v2.seq, 2);
        assert_eq!(state.document(&doc.id).unwrap().revision, 1);
        assert_eq!(state.version_count(), 1);
    }

    #[test]
    fn prepare_append_checks_revision() {
        let mut state = StoreState::default();
        let (doc, v1) = Document::create("t", "a");
        state.apply_created(doc.clone(), v1);

        let err = state
            .prepare_append(&doc.id, &DocumentUpdate::new("b").expecting_revision(5))
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::RevisionConflict {
                expected: 5,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn validate_replay_rejects_gaps() {
        let mut state = StoreState::default();
        let (doc, v1) = Document::create("t", "a");
        state.apply_created(doc.clone(), v1);
        let (d2, v2) = doc.advance(None, "b");
        let (d3, v3) = d2.advance(None, "c");

        assert!(state.validate_replay(&d3, &v3, false).is_err());
        assert!(state.validate_replay(&d2, &v2, false).is_ok());
        assert!(state.validate_replay(&doc, &v2, true).is_err());
    }
}
