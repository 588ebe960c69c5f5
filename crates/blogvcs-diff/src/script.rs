//! The edit script model: an ordered, maximally coalesced list of
//! equal/insert/delete operations.

use serde::{Deserialize, Serialize};

/// Kind of a single edit operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    /// Text present in both source and target.
    Equal,
    /// Text present only in the target.
    Insert,
    /// Text present only in the source.
    Delete,
}

/// One run of text with its edit kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub kind: OpKind,
    pub text: String,
}

impl Operation {
    pub fn new(kind: OpKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn equal(text: impl Into<String>) -> Self {
        Self::new(OpKind::Equal, text)
    }

    pub fn insert(text: impl Into<String>) -> Self {
        Self::new(OpKind::Insert, text)
    }

    pub fn delete(text: impl Into<String>) -> Self {
        Self::new(OpKind::Delete, text)
    }

    /// Length of the text in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// An ordered sequence of operations transforming a source string into a
/// target string.
///
/// Invariants, upheld by every constructor:
/// - no operation carries empty text;
/// - no two adjacent operations share the same kind.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Operation>", into = "Vec<Operation>")]
pub struct EditScript {
    ops: Vec<Operation>,
}

impl EditScript {
    /// Build a script from arbitrary operations, dropping empty ones and
    /// merging adjacent runs of the same kind.
    pub fn from_operations(ops: impl IntoIterator<Item = Operation>) -> Self {
        let mut merged: Vec<Operation> = Vec::new();
        for op in ops {
            if op.text.is_empty() {
                continue;
            }
            match merged.last_mut() {
                Some(last) if last.kind == op.kind => last.text.push_str(&op.text),
                _ => merged.push(op),
            }
        }
        Self { ops: merged }
    }

    pub fn operations(&self) -> &[Operation] {
        &self.ops
    }

    pub fn into_operations(self) -> Vec<Operation> {
        self.ops
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.ops.iter()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Returns `true` if the script contains no insertions or deletions.
    pub fn is_identity(&self) -> bool {
        self.ops.iter().all(|op| op.kind == OpKind::Equal)
    }

    /// Reconstruct the source string (equal + delete runs).
    pub fn source(&self) -> String {
        self.collect_text(OpKind::Delete)
    }

    /// Reconstruct the target string (equal + insert runs).
    pub fn target(&self) -> String {
        self.collect_text(OpKind::Insert)
    }

    fn collect_text(&self, side: OpKind) -> String {
        self.ops
            .iter()
            .filter(|op| op.kind == OpKind::Equal || op.kind == side)
            .map(|op| op.text.as_str())
            .collect()
    }

    /// Characters inserted across the whole script.
    pub fn inserted_chars(&self) -> usize {
        self.chars_of(OpKind::Insert)
    }

    /// Characters deleted across the whole script.
    pub fn deleted_chars(&self) -> usize {
        self.chars_of(OpKind::Delete)
    }

    fn chars_of(&self, kind: OpKind) -> usize {
        self.ops
            .iter()
            .filter(|op| op.kind == kind)
            .map(Operation::char_len)
            .sum()
    }

    /// Levenshtein distance implied by the script, in characters.
    ///
    /// Each run of edits between two equalities counts as
    /// `max(inserted, deleted)`: substitutions are paired up.
    pub fn levenshtein(&self) -> usize {
        let mut distance = 0;
        let mut inserted = 0;
        let mut deleted = 0;
        for op in &self.ops {
            match op.kind {
                OpKind::Insert => inserted += op.char_len(),
                OpKind::Delete => deleted += op.char_len(),
                OpKind::Equal => {
                    distance += inserted.max(deleted);
                    inserted = 0;
                    deleted = 0;
                }
            }
        }
        distance + inserted.max(deleted)
    }

    /// Summary counters for display.
    pub fn stats(&self) -> DiffStats {
        DiffStats {
            operations: self.ops.len(),
            equal_chars: self.chars_of(OpKind::Equal),
            inserted_chars: self.inserted_chars(),
            deleted_chars: self.deleted_chars(),
            edit_distance: self.levenshtein(),
        }
    }
}

impl From<Vec<Operation>> for EditScript {
    fn from(ops: Vec<Operation>) -> Self {
        Self::from_operations(ops)
    }
}

impl From<EditScript> for Vec<Operation> {
    fn from(script: EditScript) -> Self {
        script.ops
    }
}

impl<'a> IntoIterator for &'a EditScript {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

/// Counters describing an edit script.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffStats {
    pub operations: usize,
    pub equal_chars: usize,
    pub inserted_chars: usize,
    pub deleted_chars: usize,
    pub edit_distance: usize,
}
