//! Projects static-analysis locations recorded against a baseline revision
//! onto the live text of edited documents, and lays them out as aligned
//! end-of-line callouts.

pub mod application;
pub mod domain;
pub mod infra;
pub mod state;
