use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{DocumentId, VersionId};

/// A blog post.
///
/// `current_content` always mirrors the content of the most recently
/// appended [`Version`] of this document, and `revision` equals that
/// version's `seq`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    pub current_content: String,
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// A fresh document at revision 1, paired with its initial version.
    pub fn create(title: impl Into<String>, content: impl Into<String>) -> (Self, Version) {
        let now = Utc::now();
        let content = content.into();
        let document = Self {
            id: DocumentId::new(),
            title: title.into(),
            current_content: content.clone(),
            revision: 1,
            created_at: now,
            updated_at: now,
        };
        let version = Version {
            id: VersionId::new(),
            document_id: document.id,
            seq: 1,
            content,
            created_at: now,
        };
        (document, version)
    }

    /// Produce the next state of this document together with the version
    /// that records it. `self` is left untouched.
    pub fn advance(&self, title: Option<&str>, content: impl Into<String>) -> (Self, Version) {
        let now = Utc::now().max(self.updated_at);
        let content = content.into();
        let seq = self.revision + 1;
        let document = Self {
            id: self.id,
            title: title.map_or_else(|| self.title.clone(), str::to_string),
            current_content: content.clone(),
            revision: seq,
            created_at: self.created_at,
            updated_at: now,
        };
        let version = Version {
            id: VersionId::new(),
            document_id: self.id,
            seq,
            content,
            created_at: now,
        };
        (document, version)
    }
}

/// An immutable snapshot of a document's content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub id: VersionId,
    pub document_id: DocumentId,
    /// 1-based append position within the owning document.
    pub seq: u64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Version {
    /// Ordering used for display: newest first, `seq` breaking clock ties.
    pub fn cmp_newest_first(a: &Self, b: &Self) -> Ordering {
        b.created_at
            .cmp(&a.created_at)
            .then(b.seq.cmp(&a.seq))
    }

    /// Byte length of the snapshot content.
    pub fn size(&self) -> usize {
        self.content.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_pairs_document_and_version() {
        let (doc, v) = Document::create("T1", "<p>A</p>");
        assert_eq!(doc.revision, 1);
        assert_eq!(doc.current_content, "<p>A</p>");
        assert_eq!(v.document_id, doc.id);
        assert_eq!(v.seq, 1);
        assert_eq!(v.content, doc.current_content);
        assert_eq!(v.created_at, doc.created_at);
    }

    #[test]
    fn advance_bumps_revision_and_keeps_identity() {
        let (doc, _) = Document::create("T1", "a");
        let (next, v) = doc.advance(Some("T2"), "b");
        assert_eq!(next.id, doc.id);
        assert_eq!(next.revision, 2);
        assert_eq!(next.title, "T2");
        assert_eq!(next.current_content, "b");
        assert_eq!(next.created_at, doc.created_at);
        assert!(next.updated_at >= doc.updated_at);
        assert_eq!(v.seq, 2);
        assert_eq!(v.content, "b");
    }

    #[test]
    fn advance_without_title_keeps_title() {
        let (doc, _) = Document::create("Keep me", "a");
        let (next, _) = doc.advance(None, "b");
        assert_eq!(next.title, "Keep me");
    }

    #[test]
    fn newest_first_breaks_ties_by_seq() {
        let (doc, v1) = Document::create("t", "a");
        let (_, mut v2) = doc.advance(None, "b");
        v2.created_at = v1.created_at;
        let mut versions = vec![v1.clone(), v2.clone()];
        versions.sort_by(Version::cmp_newest_first);
        assert_eq!(versions[0].id, v2.id);
        assert_eq!(versions[1].id, v1.id);
    }

    #[test]
    fn serde_uses_camel_case() {
        let (doc, v) = Document::create("t", "c");
        let doc_json = serde_json::to_value(&doc).unwrap();
        assert!(doc_json.get("currentContent").is_some());
        assert!(doc_json.get("updatedAt").is_some());
        let v_json = serde_json::to_value(&v).unwrap();
        assert!(v_json.get("documentId").is_some());
        let back: Version = serde_json::from_value(v_json).unwrap();
        assert_eq!(back, v);
    }
}
