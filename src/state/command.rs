#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderReason {
    Selection,
    LogsRemoved,
    EditorsChanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run an update pass with the current state.
    Render { reason: RenderReason },
}
