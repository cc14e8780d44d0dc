use super::error::RegionError;
use super::identity::{ArtifactUri, LogId, ResultId, RevisionKey};
use super::text::{LineIndex, LinePosition, TextRange};
use serde::{Deserialize, Serialize};

/// A region as recorded by the analysis tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionSpec {
    /// Char offsets into the baseline text.
    Offsets(TextRange),
    /// 1-based lines and columns; the end column is exclusive.
    Lines {
        start_line: usize,
        #[serde(default)]
        start_column: Option<usize>,
        #[serde(default)]
        end_line: Option<usize>,
        #[serde(default)]
        end_column: Option<usize>,
    },
}

impl RegionSpec {
    /// Whole-line region covering `line` (1-based).
    pub fn line(line: usize) -> Self {
        Self::Lines {
            start_line: line,
            start_column: None,
            end_line: None,
            end_column: None,
        }
    }

    /// Resolve to a char range in the text `index` was built from.
    ///
    /// A missing start column means column 1, a missing end line means the
    /// start line and a missing end column means the end of the end line.
    pub fn resolve(&self, index: &LineIndex) -> Result<TextRange, RegionError> {
        match *self {
            RegionSpec::Offsets(range) => {
                if range.start > range.end {
                    return Err(RegionError::Inverted {
                        start: range.start,
                        end: range.end,
                    });
                }
                Ok(range)
            }
            RegionSpec::Lines {
                start_line,
                start_column,
                end_line,
                end_column,
            } => {
                if start_line == 0 {
                    return Err(RegionError::InvalidLine { line: start_line });
                }
                let end_line = end_line.unwrap_or(start_line);
                if end_line == 0 {
                    return Err(RegionError::InvalidLine { line: end_line });
                }

                let start = index.offset_of(LinePosition::new(
                    start_line - 1,
                    start_column.unwrap_or(1).saturating_sub(1),
                ));
                let end = match end_column {
                    Some(column) => {
                        index.offset_of(LinePosition::new(end_line - 1, column.saturating_sub(1)))
                    }
                    None => index.line_end(end_line - 1),
                };

                if end < start {
                    return Err(RegionError::Inverted { start, end });
                }
                Ok(TextRange::new(start, end))
            }
        }
    }
}

/// One step of a result: where it points and what it says.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultLocation {
    /// `None` when the location's artifact could not be resolved.
    pub artifact: Option<ArtifactUri>,
    /// `None` for steps recorded without a physical region; they keep their
    /// place in the step order but never project.
    #[serde(default)]
    pub region: Option<RegionSpec>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ResultLocation {
    pub fn new(artifact: impl Into<String>, region: RegionSpec) -> Self {
        Self {
            artifact: Some(ArtifactUri::new(artifact)),
            region: Some(region),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// A single analysis result with its ordered steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: ResultId,
    #[serde(default)]
    pub rule_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Revision the analysis ran against, if the log records one.
    #[serde(default)]
    pub revision: Option<RevisionKey>,
    /// Steps in recorded order (code-flow steps, or the primary locations
    /// when the result has no flow).
    pub locations: Vec<ResultLocation>,
}

/// The results loaded from one analysis log.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnalysisLog {
    pub id: LogId,
    pub results: Vec<AnalysisResult>,
}

impl AnalysisLog {
    pub fn find(&self, id: &ResultId) -> Option<&AnalysisResult> {
        if id.log != self.id {
            return None;
        }
        self.results.iter().find(|result| &result.id == id)
    }
}
