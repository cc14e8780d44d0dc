//! Edit scripts: aligned runs of equal, inserted and deleted text.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditKind {
    /// Present in both texts.
    Equal,
    /// Present only in the current text.
    Insert,
    /// Present only in the baseline text.
    Delete,
}

impl EditKind {
    pub fn on_baseline(self) -> bool {
        matches!(self, EditKind::Equal | EditKind::Delete)
    }

    pub fn on_current(self) -> bool {
        matches!(self, EditKind::Equal | EditKind::Insert)
    }
}

impl fmt::Display for EditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal => write!(f, "equal"),
            Self::Insert => write!(f, "insert"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// A run of characters with a single edit kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOp {
    kind: EditKind,
    text: String,
    len: usize,
}

impl EditOp {
    pub fn new(kind: EditKind, text: impl Into<String>) -> Self {
        let text = text.into();
        let len = text.chars().count();
        Self { kind, text, len }
    }

    pub fn kind(&self) -> EditKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Run length in chars.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Ordered edit operations transforming a baseline text into a current text.
///
/// Empty runs are never stored and adjacent runs of the same kind are merged,
/// so the baseline side (equal + delete) always concatenates back to the
/// baseline text and the current side (equal + insert) to the current text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditScript {
    ops: Vec<EditOp>,
}

impl EditScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from runs, dropping empty ones and merging neighbours.
    pub fn from_ops(ops: impl IntoIterator<Item = EditOp>) -> Self {
        let mut script = Self::new();
        for op in ops {
            script.push(op.kind, &op.text);
        }
        script
    }

    pub fn equal(mut self, text: &str) -> Self {
        self.push(EditKind::Equal, text);
        self
    }

    pub fn insert(mut self, text: &str) -> Self {
        self.push(EditKind::Insert, text);
        self
    }

    pub fn delete(mut self, text: &str) -> Self {
        self.push(EditKind::Delete, text);
        self
    }

    pub fn push(&mut self, kind: EditKind, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(last) = self.ops.last_mut()
            && last.kind == kind
        {
            last.text.push_str(text);
            last.len += text.chars().count();
            return;
        }
        self.ops.push(EditOp::new(kind, text));
    }

    pub fn ops(&self) -> &[EditOp] {
        &self.ops
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EditOp> {
        self.ops.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// True when the script contains no insertions or deletions.
    pub fn is_identity(&self) -> bool {
        self.ops.iter().all(|op| op.kind == EditKind::Equal)
    }

    pub fn baseline_text(&self) -> String {
        self.side(EditKind::on_baseline)
    }

    pub fn current_text(&self) -> String {
        self.side(EditKind::on_current)
    }

    pub fn baseline_len(&self) -> usize {
        self.side_len(EditKind::on_baseline)
    }

    pub fn current_len(&self) -> usize {
        self.side_len(EditKind::on_current)
    }

    fn side(&self, keep: fn(EditKind) -> bool) -> String {
        self.ops
            .iter()
            .filter(|op| keep(op.kind))
            .map(|op| op.text.as_str())
            .collect()
    }

    fn side_len(&self, keep: fn(EditKind) -> bool) -> usize {
        self.ops
            .iter()
            .filter(|op| keep(op.kind))
            .map(|op| op.len)
            .sum()
    }
}

impl<'a> IntoIterator for &'a EditScript {
    type Item = &'a EditOp;
    type IntoIter = std::slice::Iter<'a, EditOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}
