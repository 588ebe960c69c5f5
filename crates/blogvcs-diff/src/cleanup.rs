//! Post-processing passes that turn a raw, character-exact edit script into
//! one a human can read.
//!
//! The pipeline is:
//!
//! 1. **Equality elimination** -- an equal run that is no longer than the
//!    edits on both of its sides is folded into them.
//! 2. **Merge** -- adjacent runs are coalesced, common affixes of paired
//!    delete/insert runs are factored out into the surrounding equalities,
//!    and lone edits are slid sideways when that swallows an equality.
//! 3. **Boundary alignment** -- lone edits between two equalities are
//!    slid to the most natural boundary (blank line, line break, sentence
//!    end, whitespace, punctuation).
//! 4. **Overlap extraction** -- a delete followed by an insert that
//!    overlap substantially have the overlap pulled out as an equality.
//!
//! Every pass preserves both reconstructions exactly.

use crate::script::OpKind;

/// Working representation: runs of chars so slicing never splits a code point.
pub(crate) type Chunk = (OpKind, Vec<char>);

/// Run the full semantic cleanup pipeline in place.
pub(crate) fn cleanup_semantic(chunks: &mut Vec<Chunk>) {
    if eliminate_equalities(chunks) {
        cleanup_merge(chunks);
    }
    align_boundaries(chunks);
    extract_overlaps(chunks);
    coalesce(chunks);
}

/// Drop empty runs and merge adjacent runs of the same kind.
pub(crate) fn coalesce(chunks: &mut Vec<Chunk>) {
    let mut out: Vec<Chunk> = Vec::with_capacity(chunks.len());
    for (kind, text) in chunks.drain(..) {
        if text.is_empty() {
            continue;
        }
        match out.last_mut() {
            Some((last_kind, last_text)) if *last_kind == kind => last_text.extend(text),
            _ => out.push((kind, text)),
        }
    }
    *chunks = out;
}

fn eliminate_equalities(chunks: &mut Vec<Chunk>) -> bool {
    let mut changed = false;
    // Indices of equalities seen so far, innermost last.
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<usize> = None;
    // Edit lengths before (1) and after (2) the last equality.
    let (mut ins_before, mut del_before) = (0usize, 0usize);
    let (mut ins_after, mut del_after) = (0usize, 0usize);

    let mut i = 0;
    while i < chunks.len() {
        let (kind, len) = (chunks[i].0, chunks[i].1.len());
        if kind == OpKind::Equal {
            equalities.push(i);
            ins_before = ins_after;
            del_before = del_after;
            ins_after = 0;
            del_after = 0;
            last_equality = Some(len);
            i += 1;
            continue;
        }

        if kind == OpKind::Insert {
            ins_after += len;
        } else {
            del_after += len;
        }

        let collapse = matches!(
            last_equality,
            Some(eq_len) if eq_len <= ins_before.max(del_before) && eq_len <= ins_after.max(del_after)
        );
        if !collapse {
            i += 1;
            continue;
        }

        if let Some(at) = equalities.pop() {
            let text = chunks[at].1.clone();
            chunks.insert(at, (OpKind::Delete, text));
            chunks[at + 1].0 = OpKind::Insert;
        }
        // The previous equality needs re-evaluating too.
        equalities.pop();
        i = equalities.last().map_or(0, |&at| at + 1);
        ins_before = 0;
        del_before = 0;
        ins_after = 0;
        del_after = 0;
        last_equality = None;
        changed = true;
    }

    changed
}

/// Coalesce, factor out common affixes, and shift lone edits until stable.
pub(crate) fn cleanup_merge(chunks: &mut Vec<Chunk>) {
    loop {
        *chunks = merge_runs(std::mem::take(chunks));
        if !shift_lone_edits(chunks) {
            break;
        }
    }
}

fn merge_runs(chunks: Vec<Chunk>) -> Vec<Chunk> {
    let mut out: Vec<Chunk> = Vec::with_capacity(chunks.len());
    let mut deleted: Vec<char> = Vec::new();
    let mut inserted: Vec<char> = Vec::new();

    for (kind, text) in chunks {
        match kind {
            OpKind::Delete => deleted.extend(text),
            OpKind::Insert => inserted.extend(text),
            OpKind::Equal => {
                let mut equal = text;
                flush_edits(&mut out, &mut deleted, &mut inserted, &mut equal);
                push_equal(&mut out, equal);
            }
        }
    }
    let mut tail = Vec::new();
    flush_edits(&mut out, &mut deleted, &mut inserted, &mut tail);
    push_equal(&mut out, tail);
    out
}

fn flush_edits(
    out: &mut Vec<Chunk>,
    deleted: &mut Vec<char>,
    inserted: &mut Vec<char>,
    next_equal: &mut Vec<char>,
) {
    if !deleted.is_empty() && !inserted.is_empty() {
        let prefix = common_prefix(deleted, inserted);
        if prefix > 0 {
            push_equal(out, inserted[..prefix].to_vec());
            deleted.drain(..prefix);
            inserted.drain(..prefix);
        }
        let suffix = common_suffix(deleted, inserted);
        if suffix > 0 {
            let mut moved = inserted.split_off(inserted.len() - suffix);
            deleted.truncate(deleted.len() - suffix);
            moved.append(next_equal);
            *next_equal = moved;
        }
    }
    if !deleted.is_empty() {
        out.push((OpKind::Delete, std::mem::take(deleted)));
    }
    if !inserted.is_empty() {
        out.push((OpKind::Insert, std::mem::take(inserted)));
    }
}

fn push_equal(out: &mut Vec<Chunk>, text: Vec<char>) {
    if text.is_empty() {
        return;
    }
    match out.last_mut() {
        Some((OpKind::Equal, last)) => last.extend(text),
        _ => out.push((OpKind::Equal, text)),
    }
}

/// `A<BA>C` becomes `<AB>AC`; `A<BC>B` becomes `AB<CB>`.
fn shift_lone_edits(chunks: &mut Vec<Chunk>) -> bool {
    let mut changed = false;
    let mut i = 1;
    while i + 1 < chunks.len() {
        if chunks[i - 1].0 == OpKind::Equal && chunks[i + 1].0 == OpKind::Equal {
            if chunks[i].1.ends_with(&chunks[i - 1].1) {
                let prev = chunks.remove(i - 1).1;
                // `i - 1` is now the edit, `i` the following equality.
                let edit = &mut chunks[i - 1].1;
                edit.truncate(edit.len() - prev.len());
                let mut shifted = prev.clone();
                shifted.append(edit);
                *edit = shifted;
                let mut next = prev;
                next.append(&mut chunks[i].1);
                chunks[i].1 = next;
                changed = true;
            } else if chunks[i].1.starts_with(&chunks[i + 1].1) {
                let next = chunks.remove(i + 1).1;
                chunks[i - 1].1.extend_from_slice(&next);
                let edit = &mut chunks[i].1;
                edit.drain(..next.len());
                edit.extend_from_slice(&next);
                changed = true;
            }
        }
        i += 1;
    }
    changed
}

/// Three slices read as one contiguous sequence.
struct Joined<'a> {
    parts: [&'a [char]; 3],
}

impl Joined<'_> {
    fn len(&self) -> usize {
        self.parts.iter().map(|p| p.len()).sum()
    }

    fn at(&self, mut index: usize) -> char {
        for part in self.parts {
            if index < part.len() {
                return part[index];
            }
            index -= part.len();
        }
        unreachable!("index out of range")
    }

    fn collect(&self, from: usize, to: usize) -> Vec<char> {
        (from..to).map(|i| self.at(i)).collect()
    }

    /// Score the cut at `cut`, looking no further than `lo` on the left
    /// and `hi` on the right.
    fn score(&self, lo: usize, cut: usize, hi: usize) -> u8 {
        let left = self.collect(cut.saturating_sub(3).max(lo), cut);
        let right = self.collect(cut, (cut + 4).min(hi));
        boundary_score(&left, &right)
    }
}

fn align_boundaries(chunks: &mut Vec<Chunk>) {
    let mut i = 1;
    while i + 1 < chunks.len() {
        if chunks[i - 1].0 == OpKind::Equal && chunks[i + 1].0 == OpKind::Equal {
            if let Some((before, edit, after)) =
                best_alignment(&chunks[i - 1].1, &chunks[i].1, &chunks[i + 1].1)
            {
                chunks[i].1 = edit;
                if after.is_empty() {
                    chunks.remove(i + 1);
                } else {
                    chunks[i + 1].1 = after;
                }
                if before.is_empty() {
                    chunks.remove(i - 1);
                    i -= 1;
                } else {
                    chunks[i - 1].1 = before;
                }
            }
        }
        i += 1;
    }
}

/// Slide `edit` between `before` and `after` to the best-scoring position.
/// Returns `None` when the current position is already best.
fn best_alignment(
    before: &[char],
    edit: &[char],
    after: &[char],
) -> Option<(Vec<char>, Vec<char>, Vec<char>)> {
    let joined = Joined {
        parts: [before, edit, after],
    };
    let n = edit.len();
    let total = joined.len();
    let score_at = |start: usize| {
        u16::from(joined.score(0, start, start + n)) + u16::from(joined.score(start, start + n, total))
    };

    // Leftmost position first, then step right while the edit can roll.
    let mut start = before.len() - common_suffix(before, edit);
    let mut best = start;
    let mut best_score = score_at(start);
    while start + n < total && joined.at(start) == joined.at(start + n) {
        start += 1;
        let score = score_at(start);
        if score >= best_score {
            best = start;
            best_score = score;
        }
    }

    if best == before.len() {
        return None;
    }
    Some((
        joined.collect(0, best),
        joined.collect(best, best + n),
        joined.collect(best + n, total),
    ))
}

/// How natural a split between `left` and `right` is, from 6 (an edge)
/// down to 0 (mid-word).
fn boundary_score(left: &[char], right: &[char]) -> u8 {
    let (Some(&c1), Some(&c2)) = (left.last(), right.first()) else {
        return 6;
    };
    let non_alnum1 = !c1.is_alphanumeric();
    let non_alnum2 = !c2.is_alphanumeric();
    let space1 = non_alnum1 && c1.is_whitespace();
    let space2 = non_alnum2 && c2.is_whitespace();
    let break1 = matches!(c1, '\r' | '\n');
    let break2 = matches!(c2, '\r' | '\n');
    let blank1 = break1 && (left.ends_with(&['\n', '\n']) || left.ends_with(&['\n', '\r', '\n']));
    let blank2 = break2 && starts_with_blank_line(right);

    if blank1 || blank2 {
        5
    } else if break1 || break2 {
        4
    } else if non_alnum1 && !space1 && space2 {
        3
    } else if space1 || space2 {
        2
    } else if non_alnum1 || non_alnum2 {
        1
    } else {
        0
    }
}

fn starts_with_blank_line(text: &[char]) -> bool {
    let rest = text.strip_prefix(&['\r']).unwrap_or(text);
    let Some(rest) = rest.strip_prefix(&['\n']) else {
        return false;
    };
    let rest = rest.strip_prefix(&['\r']).unwrap_or(rest);
    rest.first() == Some(&'\n')
}

fn extract_overlaps(chunks: &mut Vec<Chunk>) {
    let mut i = 1;
    while i < chunks.len() {
        if chunks[i - 1].0 == OpKind::Delete && chunks[i].0 == OpKind::Insert {
            let del_len = chunks[i - 1].1.len();
            let ins_len = chunks[i].1.len();
            let forward = common_overlap(&chunks[i - 1].1, &chunks[i].1);
            let backward = common_overlap(&chunks[i].1, &chunks[i - 1].1);
            let substantial = |overlap: usize| {
                overlap > 0 && (overlap * 2 >= del_len || overlap * 2 >= ins_len)
            };

            if forward >= backward {
                if substantial(forward) {
                    // abcXX / XXdef  ->  abc = XX + def
                    let mut inserted = std::mem::take(&mut chunks[i].1);
                    let rest = inserted.split_off(forward);
                    chunks[i - 1].1.truncate(del_len - forward);
                    chunks[i] = (OpKind::Insert, rest);
                    chunks.insert(i, (OpKind::Equal, inserted));
                    i += 1;
                }
            } else if substantial(backward) {
                // XXabc / defXX  ->  + def = XX - abc
                let mut deleted = std::mem::take(&mut chunks[i - 1].1);
                let rest = deleted.split_off(backward);
                let mut inserted = std::mem::take(&mut chunks[i].1);
                inserted.truncate(ins_len - backward);
                chunks[i - 1] = (OpKind::Insert, inserted);
                chunks[i] = (OpKind::Delete, rest);
                chunks.insert(i, (OpKind::Equal, deleted));
                i += 1;
            }
            i += 1;
        }
        i += 1;
    }
}

pub(crate) fn common_prefix(a: &[char], b: &[char]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

pub(crate) fn common_suffix(a: &[char], b: &[char]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

/// Length of the longest suffix of `a` that is also a prefix of `b`.
///
/// Linear time: runs the KMP failure function over `b ++ [sep] ++ a`.
fn common_overlap(a: &[char], b: &[char]) -> usize {
    let m = a.len().min(b.len());
    if m == 0 {
        return 0;
    }
    let seq: Vec<Option<char>> = b[..m]
        .iter()
        .copied()
        .map(Some)
        .chain(std::iter::once(None))
        .chain(a[a.len() - m..].iter().copied().map(Some))
        .collect();
    let mut fail = vec![0usize; seq.len()];
    for i in 1..seq.len() {
        let mut k = fail[i - 1];
        while k > 0 && seq[i] != seq[k] {
            k = fail[k - 1];
        }
        if seq[i] == seq[k] {
            k += 1;
        }
        fail[i] = k;
    }
    fail[seq.len() - 1]
}
