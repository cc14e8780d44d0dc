//! Projects baseline ranges onto the current text through an edit script.
//!
//! Only text that survived unchanged (equal runs) carries a range across.
//! A range is widened to cover everything between its first and last
//! surviving character, so insertions inside it are included while deletions
//! at its edges clip it. A range whose text was deleted entirely has no
//! projection.

use crate::domain::{EditKind, EditScript, TextRange};

/// Project `region` (baseline offsets) to current offsets.
///
/// Returns `None` when no character of a non-empty region survives. An empty
/// region always projects to a point.
pub fn project(script: &EditScript, region: TextRange) -> Option<TextRange> {
    if region.is_empty() {
        return Some(TextRange::point(project_point(script, region.start)));
    }

    let mut baseline = 0usize;
    let mut current = 0usize;
    let mut projected: Option<TextRange> = None;

    for op in script {
        if baseline >= region.end {
            break;
        }
        let len = op.len();
        match op.kind() {
            EditKind::Equal => {
                let span = TextRange::new(baseline, baseline + len);
                if let Some(overlap) = span.intersect(region) {
                    let start = overlap.start - baseline + current;
                    let end = overlap.end - baseline + current;
                    projected = Some(match projected {
                        Some(first) => TextRange::new(first.start, end),
                        None => TextRange::new(start, end),
                    });
                }
                baseline += len;
                current += len;
            }
            EditKind::Delete => baseline += len,
            EditKind::Insert => current += len,
        }
    }

    projected
}

/// Project a single baseline offset.
///
/// Offsets inside an equal run map 1:1 (after any text inserted before the
/// run). Offsets inside deleted text collapse to where the deletion happened.
/// Offsets at or past the end of the baseline map to the end of the current
/// text.
pub fn project_point(script: &EditScript, offset: usize) -> usize {
    let mut baseline = 0usize;
    let mut current = 0usize;

    for op in script {
        let len = op.len();
        match op.kind() {
            EditKind::Equal => {
                if offset < baseline + len {
                    return current + (offset - baseline);
                }
                baseline += len;
                current += len;
            }
            EditKind::Delete => {
                if offset < baseline + len {
                    return current;
                }
                baseline += len;
            }
            EditKind::Insert => current += len,
        }
    }

    current
}

/// Project through `script` when a baseline exists; without one the region
/// is taken verbatim, since missing diff information cannot be told apart from
/// no drift.
pub fn project_region(script: Option<&EditScript>, region: TextRange) -> Option<TextRange> {
    match script {
        Some(script) => project(script, region),
        None => Some(region),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_script_keeps_ranges() {
        let script = EditScript::new().equal("hello world");
        for region in [
            TextRange::new(0, 5),
            TextRange::new(6, 11),
            TextRange::new(3, 8),
            TextRange::point(4),
        ] {
            assert_eq!(project(&script, region), Some(region));
        }
    }

    #[test]
    fn test_insertion_before_region_shifts_it() {
        let script = EditScript::new().equal("foo(").insert("baz, ").equal("bar)");
        assert_eq!(
            project(&script, TextRange::new(4, 7)),
            Some(TextRange::new(9, 12))
        );
    }

    #[test]
    fn test_insertion_after_region_leaves_it() {
        let script = EditScript::new()
            .equal("abc def")
            .insert("XYZ")
            .equal(" ghi");
        assert_eq!(
            project(&script, TextRange::new(0, 3)),
            Some(TextRange::new(0, 3))
        );
        // insertion exactly at the region end stays outside it
        assert_eq!(
            project(&script, TextRange::new(4, 7)),
            Some(TextRange::new(4, 7))
        );
    }

    #[test]
    fn test_insertion_inside_region_widens_it() {
        let script = EditScript::new().equal("ab").insert("XX").equal("cd");
        assert_eq!(
            project(&script, TextRange::new(0, 4)),
            Some(TextRange::new(0, 6))
        );
    }

    #[test]
    fn test_fully_deleted_region_is_absent() {
        let script = EditScript::new().equal("a(").delete("bar").equal(")");
        assert_eq!(project(&script, TextRange::new(2, 5)), None);
        assert_eq!(project(&script, TextRange::new(3, 4)), None);
    }

    #[test]
    fn test_replaced_region_is_absent() {
        let script = EditScript::new()
            .equal("let ")
            .delete("x")
            .insert("y")
            .equal(" = 1;");
        assert_eq!(project(&script, TextRange::new(4, 5)), None);
    }

    #[test]
    fn test_trailing_deletion_clips_region() {
        let script = EditScript::new()
            .equal("call(alpha")
            .delete("_beta")
            .equal(");");
        assert_eq!(
            project(&script, TextRange::new(5, 15)),
            Some(TextRange::new(5, 10))
        );
    }

    #[test]
    fn test_leading_deletion_clips_region() {
        let script = EditScript::new()
            .equal("x = ")
            .delete("old_")
            .equal("value;");
        assert_eq!(
            project(&script, TextRange::new(4, 13)),
            Some(TextRange::new(4, 9))
        );
    }

    #[test]
    fn test_interior_deletion_keeps_both_ends() {
        let script = EditScript::new().equal("ab").delete("--").equal("cd");
        assert_eq!(
            project(&script, TextRange::new(0, 6)),
            Some(TextRange::new(0, 4))
        );
    }

    #[test]
    fn test_region_past_baseline_end_keeps_covered_part() {
        let script = EditScript::new().equal("abc").insert("d");
        assert_eq!(
            project(&script, TextRange::new(1, 10)),
            Some(TextRange::new(1, 3))
        );
    }

    #[test]
    fn test_empty_region_mapping() {
        let script = EditScript::new()
            .equal("foo(")
            .insert("baz, ")
            .equal("bar")
            .delete("_old")
            .equal(")");

        // inside an equal run, after the inserted text
        assert_eq!(project(&script, TextRange::point(4)), Some(TextRange::point(9)));
        assert_eq!(project(&script, TextRange::point(5)), Some(TextRange::point(10)));
        // inside deleted text collapses to the deletion point
        assert_eq!(project(&script, TextRange::point(8)), Some(TextRange::point(12)));
        // end of baseline maps to end of current
        assert_eq!(project(&script, TextRange::point(12)), Some(TextRange::point(13)));
    }

    #[test]
    fn test_missing_script_is_identity() {
        let region = TextRange::new(40, 45);
        assert_eq!(project_region(None, region), Some(region));

        let script = EditScript::new().delete("gone");
        assert_eq!(project_region(Some(&script), TextRange::new(0, 4)), None);
    }
}
