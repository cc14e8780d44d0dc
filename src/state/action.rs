use crate::application::VisibleEditor;
use crate::domain::{LogId, ResultId};

#[derive(Debug, Clone)]
pub enum Action {
    /// A selection event from the results view. `None` when the selection
    /// does not resolve to a result (for example a click elsewhere).
    Select(Option<ResultId>),
    /// Logs were removed from the catalog.
    LogsRemoved(Vec<LogId>),
    /// The set of visible editors changed.
    VisibleEditorsChanged(Vec<VisibleEditor>),
}
