//! Text diff: raw Myers pass followed by semantic cleanup.
//!
//! Uses the `similar` crate for the raw pass. The deadline keeps runtime
//! bounded on pathological inputs: once it passes, `similar` stops refining
//! and reports the remaining region as a plain replacement, which is still
//! an exact edit script. How far it got depends on machine speed, so only
//! diffs that finish inside the budget (or run with `timeout_ms = 0`) are
//! reproducible across runs.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use similar::{Algorithm, ChangeTag, TextDiff, TextDiffConfig};

use crate::cleanup::{self, Chunk};
use crate::script::{EditScript, OpKind, Operation};

/// Default time budget for the raw diff pass.
pub const DEFAULT_TIMEOUT_MS: u64 = 1_000;

/// Token size used by the raw diff pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Individual characters.
    #[default]
    Char,
    /// Words and the whitespace runs between them.
    Word,
    /// Whole lines, newline included.
    Line,
}

/// Tuning knobs for [`diff_with`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffOptions {
    pub granularity: Granularity,
    /// Time budget for the raw pass in milliseconds; `0` disables it.
    pub timeout_ms: u64,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            granularity: Granularity::Char,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl DiffOptions {
    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// The time budget, or `None` when unbounded.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

/// Diff `source` against `target` with default options.
///
/// The result reconstructs `target` from its equal and insert runs and
/// `source` from its equal and delete runs.
pub fn diff(source: &str, target: &str) -> EditScript {
    diff_with(source, target, &DiffOptions::default())
}

/// Diff `source` against `target`.
pub fn diff_with(source: &str, target: &str, options: &DiffOptions) -> EditScript {
    if source == target {
        return EditScript::from_operations([Operation::equal(source)]);
    }
    if source.is_empty() {
        return EditScript::from_operations([Operation::insert(target)]);
    }
    if target.is_empty() {
        return EditScript::from_operations([Operation::delete(source)]);
    }

    let mut chunks = raw_chunks(source, target, options);
    cleanup::cleanup_merge(&mut chunks);
    cleanup::cleanup_semantic(&mut chunks);

    let script = EditScript::from_operations(
        chunks
            .into_iter()
            .map(|(kind, text)| Operation::new(kind, text.into_iter().collect::<String>())),
    );
    tracing::debug!(
        source_len = source.len(),
        target_len = target.len(),
        ops = script.len(),
        "diff computed"
    );
    script
}

fn raw_chunks(source: &str, target: &str, options: &DiffOptions) -> Vec<Chunk> {
    let mut config: TextDiffConfig = TextDiff::configure();
    config.algorithm(Algorithm::Myers);
    if let Some(timeout) = options.timeout() {
        config.timeout(timeout);
    }
    let text_diff = match options.granularity {
        Granularity::Char => config.diff_chars(source, target),
        Granularity::Word => config.diff_words(source, target),
        Granularity::Line => config.diff_lines(source, target),
    };

    let mut chunks: Vec<Chunk> = Vec::new();
    for change in text_diff.iter_all_changes() {
        let kind = match change.tag() {
            ChangeTag::Equal => OpKind::Equal,
            ChangeTag::Insert => OpKind::Insert,
            ChangeTag::Delete => OpKind::Delete,
        };
        let text = change.value().chars();
        match chunks.last_mut() {
            Some((last, buf)) if *last == kind => buf.extend(text),
            _ => chunks.push((kind, text.collect())),
        }
    }
    chunks
}
