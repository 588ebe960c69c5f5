use std::sync::Arc;

use blogvcs_diff::{diff_with, render_with, DiffStats, EditScript};
use blogvcs_store::{DocumentUpdate, SortOrder, VersionStore};
use blogvcs_types::{Document, DocumentId, Version, VersionId};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::ServiceConfig;
use crate::error::{ServiceError, ServiceResult};

/// A document together with the version that was just appended to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Saved {
    pub document: Document,
    pub version: Version,
}

/// Full result of comparing two versions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub source: Version,
    pub target: Version,
    pub script: EditScript,
    pub stats: DiffStats,
    pub markup: String,
}

/// Orchestrates saving, listing, comparing, and reverting versions over an
/// injected [`VersionStore`].
#[derive(Clone)]
pub struct VersionControl {
    store: Arc<dyn VersionStore>,
    config: ServiceConfig,
}

impl VersionControl {
    pub fn new(store: Arc<dyn VersionStore>) -> Self {
        Self::with_config(store, ServiceConfig::default())
    }

    pub fn with_config(store: Arc<dyn VersionStore>, config: ServiceConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn VersionStore> {
        &self.store
    }

    // ---- Writes ----

    /// Save a snapshot of a document.
    ///
    /// Without an id a new document is created with this content as its first
    /// version. With an id the document's title and content are replaced and
    /// a version appended; an id that resolves to nothing is `NotFound`.
    pub fn save_version(
        &self,
        document_id: Option<&DocumentId>,
        title: &str,
        content: &str,
    ) -> ServiceResult<Saved> {
        let title = self.validate(title, content)?;
        let (document, version) = match document_id {
            None => self.store.create_document(title, content)?,
            Some(id) => self
                .store
                .append_version(id, DocumentUpdate::new(content).with_title(title))?,
        };
        info!(
            document = %document.id,
            version = %version.id,
            revision = document.revision,
            bytes = version.size(),
            "version saved"
        );
        Ok(Saved { document, version })
    }

    /// Like [`save_version`](Self::save_version) on an existing document, but
    /// only if it is still at `expected_revision`.
    pub fn save_version_if(
        &self,
        document_id: &DocumentId,
        title: &str,
        content: &str,
        expected_revision: u64,
    ) -> ServiceResult<Saved> {
        let title = self.validate(title, content)?;
        let update = DocumentUpdate::new(content)
            .with_title(title)
            .expecting_revision(expected_revision);
        let (document, version) = self.store.append_version(document_id, update)?;
        info!(
            document = %document.id,
            version = %version.id,
            revision = document.revision,
            "version saved (conditional)"
        );
        Ok(Saved { document, version })
    }

    /// Restore the content of `version_id` by appending it as a new version.
    ///
    /// Existing versions are never touched; the title is kept.
    pub fn revert(&self, document_id: &DocumentId, version_id: &VersionId) -> ServiceResult<Saved> {
        let target = self.get_version(version_id)?;
        let current = self.get_document(document_id)?;
        if target.document_id != current.id {
            return Err(ServiceError::InvalidInput(format!(
                "version {} belongs to document {}, not {}",
                target.id, target.document_id, current.id
            )));
        }

        let (document, version) = self
            .store
            .append_version(&current.id, DocumentUpdate::new(target.content))?;
        info!(
            document = %document.id,
            restored = %target.id,
            version = %version.id,
            revision = document.revision,
            "version reverted"
        );
        Ok(Saved { document, version })
    }

    // ---- Reads ----

    /// All versions of a document, newest first. Empty if there are none.
    pub fn list_versions(&self, document_id: &DocumentId) -> ServiceResult<Vec<Version>> {
        Ok(self
            .store
            .list_versions_by_document(document_id, SortOrder::NewestFirst)?)
    }

    pub fn get_version(&self, version_id: &VersionId) -> ServiceResult<Version> {
        self.store
            .find_version(version_id)?
            .ok_or_else(|| ServiceError::NotFound(format!("version {version_id}")))
    }

    pub fn get_document(&self, document_id: &DocumentId) -> ServiceResult<Document> {
        self.store
            .find_document(document_id)?
            .ok_or_else(|| ServiceError::NotFound(format!("document {document_id}")))
    }

    /// All documents, most recently updated first.
    pub fn list_documents(&self) -> ServiceResult<Vec<Document>> {
        Ok(self.store.list_documents()?)
    }

    // ---- Compare ----

    /// Inline markup for the change from version `a` to version `b`.
    pub fn compare(&self, a: &VersionId, b: &VersionId) -> ServiceResult<String> {
        Ok(self.compare_detailed(a, b)?.markup)
    }

    /// Compare two versions, keeping the edit script and its statistics.
    pub fn compare_detailed(&self, a: &VersionId, b: &VersionId) -> ServiceResult<Comparison> {
        let source = self.get_version(a)?;
        let target = self.get_version(b)?;
        let script = diff_with(&source.content, &target.content, &self.config.diff);
        let stats = script.stats();
        let markup = render_with(&script, &self.config.markup);
        debug!(
            source = %source.id,
            target = %target.id,
            ops = stats.operations,
            distance = stats.edit_distance,
            "versions compared"
        );
        Ok(Comparison {
            source,
            target,
            script,
            stats,
            markup,
        })
    }

    fn validate<'a>(&self, title: &'a str, content: &str) -> ServiceResult<&'a str> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ServiceError::InvalidInput("title must not be blank".into()));
        }
        if content.len() > self.config.max_content_bytes {
            return Err(ServiceError::InvalidInput(format!(
                "content is {} bytes, limit is {}",
                content.len(),
                self.config.max_content_bytes
            )));
        }
        Ok(title)
    }
}

impl std::fmt::Debug for VersionControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionControl")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
