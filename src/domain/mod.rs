//! Domain types for driftmark
//! Defines the identities, text geometry and analysis-result model shared by every layer.

pub mod annotation;
pub mod edit_script;
pub mod error;
pub mod identity;
pub mod result;
pub mod text;

pub use annotation::*;
pub use edit_script::*;
pub use error::*;
pub use identity::*;
pub use result::*;
pub use text::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_id_ordering_follows_log_run_result() {
        let a = ResultId::new("a.sarif", 0, 3);
        let b = ResultId::new("a.sarif", 1, 0);
        let c = ResultId::new("b.sarif", 0, 0);
        assert!(a < b);
        assert!(b < c);
        assert_eq!(a.to_string(), "a.sarif#0/3");
    }

    #[test]
    fn test_text_range_overlap() {
        let range = TextRange::new(4, 7);
        assert_eq!(range.len(), 3);
        assert_eq!(range.intersect(TextRange::new(6, 10)), Some(TextRange::new(6, 7)));
        assert_eq!(range.intersect(TextRange::new(7, 10)), None);
        assert!(TextRange::point(5).is_empty());
    }
}
