use super::text::TextRange;
use serde::{Deserialize, Serialize};

/// Outcome of projecting one step of a result onto the current text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedLocation {
    /// Zero-based position of the step in the result's original location list.
    pub step: usize,
    /// `None` when no live text corresponds to the recorded region.
    pub range: Option<TextRange>,
    pub message: Option<String>,
}

impl ProjectedLocation {
    /// Label shown in the callout, numbered from 1.
    pub fn label(&self) -> String {
        match self.message.as_deref() {
            Some(message) if !message.is_empty() => format!("Step {}: {}", self.step + 1, message),
            _ => format!("Step {}", self.step + 1),
        }
    }
}

/// An end-of-line callout for one projected step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationEntry {
    pub step: usize,
    /// Projected range in current-text offsets.
    pub range: TextRange,
    /// Zero-based line the callout is anchored to.
    pub line: usize,
    /// Number of filler glyphs before the label.
    pub padding: usize,
    /// Full trailing text, `" <filler> <label>"`.
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_numbers_from_one() {
        let location = ProjectedLocation {
            step: 2,
            range: None,
            message: Some("tainted value flows here".into()),
        };
        assert_eq!(location.label(), "Step 3: tainted value flows here");

        let bare = ProjectedLocation {
            step: 0,
            range: None,
            message: Some(String::new()),
        };
        assert_eq!(bare.label(), "Step 1");
    }
}
