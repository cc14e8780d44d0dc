//! The pinned-result state machine.
//!
//! Pinning is sticky: an empty selection leaves the current pin alone, so
//! stepping through a pinned result's flow in other views keeps its
//! annotations on screen. The session turns selections of unknown results
//! into empty ones before they reach the reducer. Nothing here checks that
//! the pinned id still resolves; every update pass re-resolves it and renders
//! nothing when it does not.

use super::action::Action;
use super::command::{Command, RenderReason};
use crate::application::VisibleEditor;
use crate::domain::ResultId;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    Unset,
    Pinned(ResultId),
}

impl Selection {
    pub fn pinned(&self) -> Option<&ResultId> {
        match self {
            Selection::Unset => None,
            Selection::Pinned(id) => Some(id),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub selection: Selection,
    pub visible_editors: Vec<VisibleEditor>,
}

pub fn reduce(state: &mut SessionState, action: Action) -> Vec<Command> {
    match action {
        Action::Select(Some(id)) => {
            log::debug!("pinning {}", id);
            state.selection = Selection::Pinned(id);
            vec![Command::Render {
                reason: RenderReason::Selection,
            }]
        }
        Action::Select(None) => Vec::new(),
        Action::LogsRemoved(logs) => {
            if logs.is_empty() {
                return Vec::new();
            }
            vec![Command::Render {
                reason: RenderReason::LogsRemoved,
            }]
        }
        Action::VisibleEditorsChanged(editors) => {
            state.visible_editors = editors;
            vec![Command::Render {
                reason: RenderReason::EditorsChanged,
            }]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(reason: RenderReason) -> Vec<Command> {
        vec![Command::Render { reason }]
    }

    #[test]
    fn test_initial_state_is_unset() {
        let state = SessionState::default();
        assert_eq!(state.selection, Selection::Unset);
        assert!(state.selection.pinned().is_none());
    }

    #[test]
    fn test_selection_pins_result() {
        let mut state = SessionState::default();
        let id = ResultId::new("scan.sarif", 0, 42);

        let commands = reduce(&mut state, Action::Select(Some(id.clone())));

        assert_eq!(state.selection, Selection::Pinned(id));
        assert_eq!(commands, render(RenderReason::Selection));
    }

    #[test]
    fn test_empty_selection_is_sticky() {
        let mut state = SessionState::default();
        let id = ResultId::new("scan.sarif", 0, 42);
        reduce(&mut state, Action::Select(Some(id.clone())));

        let commands = reduce(&mut state, Action::Select(None));

        assert_eq!(state.selection, Selection::Pinned(id));
        assert!(commands.is_empty());
    }

    #[test]
    fn test_new_selection_replaces_pin() {
        let mut state = SessionState::default();
        reduce(&mut state, Action::Select(Some(ResultId::new("a", 0, 1))));
        reduce(&mut state, Action::Select(Some(ResultId::new("a", 0, 2))));
        assert_eq!(state.selection.pinned(), Some(&ResultId::new("a", 0, 2)));
    }

    #[test]
    fn test_log_removal_rerenders_but_keeps_pin() {
        let mut state = SessionState::default();
        let id = ResultId::new("gone.sarif", 0, 0);
        reduce(&mut state, Action::Select(Some(id.clone())));

        let commands = reduce(&mut state, Action::LogsRemoved(vec!["gone.sarif".into()]));

        assert_eq!(commands, render(RenderReason::LogsRemoved));
        assert_eq!(state.selection, Selection::Pinned(id));
        assert!(reduce(&mut state, Action::LogsRemoved(vec![])).is_empty());
    }

    #[test]
    fn test_editor_change_keeps_selection() {
        let mut state = SessionState::default();
        let editors = vec![VisibleEditor::new(1, "src/lib.rs")];

        let commands = reduce(&mut state, Action::VisibleEditorsChanged(editors.clone()));

        assert_eq!(commands, render(RenderReason::EditorsChanged));
        assert_eq!(state.selection, Selection::Unset);
        assert_eq!(state.visible_editors, editors);
    }
}
