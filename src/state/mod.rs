//! Session state: which result is pinned, which editors are visible, and the
//! loop that turns events into update passes.

mod action;
mod catalog;
mod command;
mod reducer;
mod session;

pub use action::Action;
pub use catalog::ResultCatalog;
pub use command::{Command, RenderReason};
pub use reducer::{Selection, SessionState, reduce};
pub use session::{Session, SessionHandle, SessionSummary};
