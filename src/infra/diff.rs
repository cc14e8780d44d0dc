//! Character-level diffing between a baseline text and the current text.
//!
//! The raw Myers output from `similar` is coalesced into runs and then each
//! lone insertion or deletion is slid to the most natural boundary, so an edit
//! such as `foo(bar)` -> `foo(baz, bar)` reads as inserting `baz, ` instead of
//! splitting `bar` around `z, ba`.

use crate::domain::{EditKind, EditOp, EditScript};
use similar::{Algorithm, ChangeTag, TextDiff};
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default)]
pub struct DiffOptions {
    /// Give up searching for a minimal script after this long. The script is
    /// still valid, just possibly larger.
    pub timeout: Option<Duration>,
}

impl DiffOptions {
    pub fn from_timeout_ms(timeout_ms: u64) -> Self {
        Self {
            timeout: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms)),
        }
    }
}

pub fn diff(baseline: &str, current: &str) -> EditScript {
    diff_with(baseline, current, &DiffOptions::default())
}

pub fn diff_with(baseline: &str, current: &str, options: &DiffOptions) -> EditScript {
    let mut config = TextDiff::configure();
    config.algorithm(Algorithm::Myers);
    if let Some(timeout) = options.timeout {
        config.timeout(timeout);
    }
    let text_diff = config.diff_chars(baseline, current);

    let mut script = EditScript::new();
    for change in text_diff.iter_all_changes() {
        let kind = match change.tag() {
            ChangeTag::Equal => EditKind::Equal,
            ChangeTag::Insert => EditKind::Insert,
            ChangeTag::Delete => EditKind::Delete,
        };
        script.push(kind, change.value());
    }

    align_to_boundaries(script)
}

/// Slide every edit run that sits between two equal runs to the placement
/// with the best boundary score. Both reconstructed sides stay unchanged.
fn align_to_boundaries(script: EditScript) -> EditScript {
    let mut runs: Vec<(EditKind, Vec<char>)> = script
        .iter()
        .map(|op| (op.kind(), op.text().chars().collect()))
        .collect();

    for i in 1..runs.len().saturating_sub(1) {
        if runs[i].0 == EditKind::Equal
            || runs[i - 1].0 != EditKind::Equal
            || runs[i + 1].0 != EditKind::Equal
        {
            continue;
        }

        let before = runs[i - 1].1.len();
        let edit = runs[i].1.len();
        let joined: Vec<char> = runs[i - 1]
            .1
            .iter()
            .chain(&runs[i].1)
            .chain(&runs[i + 1].1)
            .copied()
            .collect();

        let split = best_split(&joined, before, edit);
        if split == before {
            continue;
        }
        runs[i - 1].1 = joined[..split].to_vec();
        runs[i].1 = joined[split..split + edit].to_vec();
        runs[i + 1].1 = joined[split + edit..].to_vec();
    }

    EditScript::from_ops(
        runs.into_iter()
            .map(|(kind, chars)| EditOp::new(kind, chars.into_iter().collect::<String>())),
    )
}

/// Best start for an edit of length `edit` currently starting at `start`
/// inside `joined` (= equal + edit + equal). Ties go to the rightmost start.
fn best_split(joined: &[char], start: usize, edit: usize) -> usize {
    let mut split = start;
    while split > 0 && joined[split - 1] == joined[split + edit - 1] {
        split -= 1;
    }

    let score_at = |split: usize| {
        boundary_score(&joined[..split], &joined[split..split + edit])
            + boundary_score(&joined[split..split + edit], &joined[split + edit..])
    };

    let mut best = split;
    let mut best_score = score_at(split);
    while split + edit < joined.len() && joined[split] == joined[split + edit] {
        split += 1;
        let score = score_at(split);
        if score >= best_score {
            best = split;
            best_score = score;
        }
    }
    best
}

/// How natural a break between `left` and `right` is: blank lines score 5,
/// line breaks 4, end of sentence 3, whitespace 2, punctuation 1, mid-word 0.
/// The start and end of the text carry no bonus.
fn boundary_score(left: &[char], right: &[char]) -> u8 {
    let (Some(&a), Some(&b)) = (left.last(), right.first()) else {
        return 0;
    };

    let non_alnum_a = !a.is_alphanumeric();
    let non_alnum_b = !b.is_alphanumeric();
    let space_a = non_alnum_a && a.is_whitespace();
    let space_b = non_alnum_b && b.is_whitespace();
    let break_a = space_a && (a == '\n' || a == '\r');
    let break_b = space_b && (b == '\n' || b == '\r');
    let blank_a = break_a && (left.ends_with(&['\n', '\n']) || left.ends_with(&['\n', '\r', '\n']));
    let blank_b = break_b
        && (right.starts_with(&['\n', '\n'])
            || right.starts_with(&['\n', '\r', '\n'])
            || right.starts_with(&['\r', '\n', '\n'])
            || right.starts_with(&['\r', '\n', '\r', '\n']));

    if blank_a || blank_b {
        5
    } else if break_a || break_b {
        4
    } else if non_alnum_a && !space_a && space_b {
        3
    } else if space_a || space_b {
        2
    } else if non_alnum_a || non_alnum_b {
        1
    } else {
        0
    }
}
