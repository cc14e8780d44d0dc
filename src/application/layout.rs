//! Lays out end-of-line callouts so their labels start in one visual column.

use crate::domain::{AnnotationEntry, LineIndex, ProjectedLocation, TextRange};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutOptions {
    pub tab_width: usize,
    pub cushion: usize,
    pub filler: String,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            tab_width: 4,
            cushion: 2,
            filler: "-".to_string(),
        }
    }
}

/// Visual column of char `column` in `line`.
///
/// A tab occupies `tab_width` visual columns but a single char column, so
/// every tab before `column` adds `tab_width - 1`. A tab at `column` itself
/// is not counted.
pub fn visual_column(line: &str, column: usize, tab_width: usize) -> usize {
    let tabs = line.chars().take(column).filter(|&ch| ch == '\t').count();
    column + tabs * tab_width.saturating_sub(1)
}

/// Line a callout for `range` hangs off: the line of its end, unless the end
/// sits at the very start of a later line.
pub fn anchor_line(index: &LineIndex, range: TextRange) -> usize {
    let start = index.position_of(range.start);
    let end = index.position_of(range.end);
    if end.column == 0 && end.line > start.line {
        end.line - 1
    } else {
        end.line
    }
}

/// Build one callout per projected location; absent projections are skipped
/// without renumbering the rest.
pub fn layout(
    text: &str,
    index: &LineIndex,
    locations: &[ProjectedLocation],
    options: &LayoutOptions,
) -> Vec<AnnotationEntry> {
    let anchored: Vec<(&ProjectedLocation, TextRange, usize, usize)> = locations
        .iter()
        .filter_map(|location| {
            let range = location.range?;
            let line = anchor_line(index, range);
            let column = visual_column(
                index.line_text(text, line),
                index.line_len(line),
                options.tab_width,
            );
            Some((location, range, line, column))
        })
        .collect();

    let Some(widest) = anchored.iter().map(|(_, _, _, column)| *column).max() else {
        return Vec::new();
    };
    let target = widest + options.cushion;

    anchored
        .into_iter()
        .map(|(location, range, line, column)| {
            let padding = target - column;
            AnnotationEntry {
                step: location.step,
                range,
                line,
                padding,
                text: format!(" {} {}", options.filler.repeat(padding), location.label()),
            }
        })
        .collect()
}
