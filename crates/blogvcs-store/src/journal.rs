//! Append-only JSON-lines journal backend.
//!
//! On-disk format: one JSON object per line, each carrying a complete
//! document/version pairing:
//!
//! ```text
//! {"record":"document_created","document":{...},"version":{...}}
//! {"record":"version_appended","document":{...},"version":{...}}
//! ```
//!
//! A record is written and flushed before the in-memory index is updated.
//! On open the journal is replayed front to back. A record and its newline
//! go out in a single write, so only a final line without a newline can be
//! a torn write from a crash: if it fails to parse it is logged, cut off the
//! file, and ignored. Any other unparsable line is corruption.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use blogvcs_types::{Document, DocumentId, Version, VersionId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::state::StoreState;
use crate::traits::{DocumentUpdate, SortOrder, VersionStore};

/// Flush/sync strategy for the journal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` after every record.
    EveryWrite,
    /// Flush to the OS and rely on its page cache.
    #[default]
    OsDefault,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
enum JournalRecord {
    DocumentCreated { document: Document, version: Version },
    VersionAppended { document: Document, version: Version },
}

struct JournalWriter {
    file: File,
    /// Byte length of the valid journal.
    offset: u64,
    records: usize,
}

struct Replay {
    state: StoreState,
    valid_len: u64,
    records: usize,
    /// The last record is complete but lacks its newline.
    needs_newline: bool,
}

/// Version store persisted to a single append-only journal file.
pub struct JournalVersionStore {
    path: PathBuf,
    sync_mode: SyncMode,
    state: RwLock<StoreState>,
    writer: Mutex<JournalWriter>,
}

impl JournalVersionStore {
    /// Open (or create) the journal at `path` and replay it.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with(path, SyncMode::default())
    }

    pub fn open_with(path: impl AsRef<Path>, sync_mode: SyncMode) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        let replay = replay(BufReader::new(&file))?;
        let file_len = file.metadata()?.len();
        if file_len > replay.valid_len {
            warn!(
                path = %path.display(),
                valid_len = replay.valid_len,
                file_len,
                "truncating torn journal tail"
            );
            file.set_len(replay.valid_len)?;
        }
        let mut offset = replay.valid_len;
        if replay.needs_newline {
            file.write_all(b"\n")?;
            offset += 1;
        }

        info!(
            path = %path.display(),
            records = replay.records,
            documents = replay.state.document_count(),
            versions = replay.state.version_count(),
            "journal opened"
        );

        Ok(Self {
            path: path.to_path_buf(),
            sync_mode,
            state: RwLock::new(replay.state),
            writer: Mutex::new(JournalWriter {
                file,
                offset,
                records: replay.records,
            }),
        })
    }

    /// Path to the journal file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records in the journal.
    pub fn record_count(&self) -> usize {
        self.writer.lock().map(|w| w.records).unwrap_or(0)
    }

    pub fn document_count(&self) -> usize {
        self.read().map(|s| s.document_count()).unwrap_or(0)
    }

    pub fn version_count(&self) -> usize {
        self.read().map(|s| s.version_count()).unwrap_or(0)
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, StoreState>> {
        self.state.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, StoreState>> {
        self.state.write().map_err(|_| StoreError::LockPoisoned)
    }

    /// Write one record.
    fn append(&self, record: &JournalRecord) -> StoreResult<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut w = self.writer.lock().map_err(|_| StoreError::LockPoisoned)?;
        let start = w.offset;
        append_line(&mut w.file, start, &line, self.sync_mode)?;
        w.offset += line.len() as u64;
        w.records += 1;

        debug!(offset = start, len = line.len(), "journal append");
        Ok(())
    }
}

/// Destination of journal appends.
trait JournalSink: Write {
    fn truncate(&mut self, len: u64) -> io::Result<()>;
    fn sync(&mut self) -> io::Result<()>;
}

impl JournalSink for File {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }
}

/// Append `line` to a sink whose valid length is `start`. On failure the
/// sink is cut back to `start` so a partial line never precedes later
/// records.
fn append_line<S: JournalSink>(
    sink: &mut S,
    start: u64,
    line: &[u8],
    sync_mode: SyncMode,
) -> io::Result<()> {
    let result = write_line(sink, line, sync_mode);
    if result.is_err() {
        if let Err(rollback) = sink.truncate(start) {
            warn!(offset = start, error = %rollback, "failed to roll back journal write");
        }
    }
    result
}

fn write_line<S: JournalSink>(sink: &mut S, line: &[u8], sync_mode: SyncMode) -> io::Result<()> {
    sink.write_all(line)?;
    sink.flush()?;
    if sync_mode == SyncMode::EveryWrite {
        sink.sync()?;
    }
    Ok(())
}

fn replay(mut reader: impl BufRead) -> StoreResult<Replay> {
    let mut state = StoreState::default();
    let mut valid_len: u64 = 0;
    let mut records = 0;
    let mut needs_newline = false;
    let mut line_no = 0;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf)?;
        if n == 0 {
            break;
        }
        line_no += 1;
        let complete = buf.ends_with(b"\n");
        let body = buf.trim_ascii();
        if body.is_empty() {
            if complete {
                valid_len += n as u64;
            }
            continue;
        }

        let record = match serde_json::from_slice::<JournalRecord>(body) {
            Ok(record) => record,
            Err(err) => {
                if !complete {
                    warn!(line = line_no, error = %err, "discarding torn journal record");
                    break;
                }
                return Err(StoreError::Corrupt {
                    line: line_no,
                    reason: err.to_string(),
                });
            }
        };

        let (document, version, created) = match record {
            JournalRecord::DocumentCreated { document, version } => (document, version, true),
            JournalRecord::VersionAppended { document, version } => (document, version, false),
        };
        state
            .validate_replay(&document, &version, created)
            .map_err(|reason| StoreError::Corrupt {
                line: line_no,
                reason,
            })?;
        if created {
            state.apply_created(document, version);
        } else {
            state.apply_appended(document, version);
        }

        records += 1;
        valid_len += n as u64;
        needs_newline = !complete;
    }

    debug!(records, valid_len, "journal replay complete");
    Ok(Replay {
        state,
        valid_len,
        records,
        needs_newline,
    })
}

impl VersionStore for JournalVersionStore {
    fn find_document(&self, id: &DocumentId) -> StoreResult<Option<Document>> {
        Ok(self.read()?.document(id).cloned())
    }

    fn list_documents(&self) -> StoreResult<Vec<Document>> {
        Ok(self.read()?.documents_by_recency())
    }

    fn create_document(&self, title: &str, content: &str) -> StoreResult<(Document, Version)> {
        let mut state = self.write()?;
        let (document, version) = Document::create(title, content);
        self.append(&JournalRecord::DocumentCreated {
            document: document.clone(),
            version: version.clone(),
        })?;
        state.apply_created(document.clone(), version.clone());
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
        self.append(&JournalRecord::VersionAppended {
            document: document.clone(),
            version: version.clone(),
        })?;
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

impl std::fmt::Debug for JournalVersionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JournalVersionStore")
            .field("path", &self.path)
            .field("sync_mode", &self.sync_mode)
            .field("records", &self.record_count())
            .finish()
    }
}
