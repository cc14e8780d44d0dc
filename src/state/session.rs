//! Drives the reducer and the projection pipeline from incoming events.
//!
//! [`Session::dispatch`] runs each resulting pass to completion before
//! returning. [`Session::spawn`] moves the session onto a task fed by a
//! channel; there every pass runs on its own task, so passes can overlap and
//! the pipeline discards whichever finishes out of order.

use super::action::Action;
use super::catalog::ResultCatalog;
use super::command::Command;
use super::reducer::{SessionState, reduce};
use crate::application::{PassReport, ProjectionPipeline, VisibleEditor};
use crate::domain::{AnalysisLog, LogId, ResultId};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle, JoinSet};

pub struct Session {
    state: SessionState,
    catalog: Arc<RwLock<ResultCatalog>>,
    pipeline: Arc<ProjectionPipeline>,
}

impl Session {
    pub fn new(pipeline: Arc<ProjectionPipeline>, catalog: Arc<RwLock<ResultCatalog>>) -> Self {
        Self {
            state: SessionState::default(),
            catalog,
            pipeline,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn catalog(&self) -> &Arc<RwLock<ResultCatalog>> {
        &self.catalog
    }

    pub fn add_log(&self, log: AnalysisLog) {
        self.catalog.write().add_log(log);
    }

    /// Remove logs from the catalog and re-render.
    pub async fn remove_logs(&mut self, ids: &[LogId]) -> Vec<PassReport> {
        let removed = self.catalog.write().remove_logs(ids);
        self.dispatch(Action::LogsRemoved(removed)).await
    }

    pub async fn dispatch(&mut self, action: Action) -> Vec<PassReport> {
        let action = resolvable(&self.catalog, action);
        let commands = reduce(&mut self.state, action);
        let mut reports = Vec::with_capacity(commands.len());
        for command in commands {
            reports.push(self.run(command).await);
        }
        reports
    }

    async fn run(&self, command: Command) -> PassReport {
        match command {
            Command::Render { reason } => {
                log::debug!("render requested: {:?}", reason);
                self.pipeline
                    .run_pass(
                        self.state.selection.pinned(),
                        &*self.catalog,
                        &self.state.visible_editors,
                    )
                    .await
            }
        }
    }

    /// Run the session on a background task and return a handle to feed it.
    pub fn spawn(self) -> SessionHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let catalog = self.catalog.clone();
        let task = tokio::spawn(self.event_loop(rx));
        SessionHandle { tx, catalog, task }
    }

    async fn event_loop(mut self, mut rx: mpsc::UnboundedReceiver<Action>) -> SessionSummary {
        let mut passes = JoinSet::new();
        let mut summary = SessionSummary::default();
        loop {
            tokio::select! {
                action = rx.recv() => {
                    let Some(action) = action else {
                        break;
                    };
                    let action = resolvable(&self.catalog, action);
                    for command in reduce(&mut self.state, action) {
                        let Command::Render { reason } = command;
                        log::debug!("render requested: {:?}", reason);
                        let pipeline = self.pipeline.clone();
                        let catalog = self.catalog.clone();
                        let pinned = self.state.selection.pinned().cloned();
                        let editors = self.state.visible_editors.clone();
                        let pass = pipeline.start_pass(&editors);
                        passes.spawn(async move {
                            pipeline
                                .run_started_pass(pass, pinned.as_ref(), &*catalog, &editors)
                                .await
                        });
                    }
                }
                Some(joined) = passes.join_next(), if !passes.is_empty() => {
                    summary.record(joined);
                }
            }
        }

        while let Some(joined) = passes.join_next().await {
            summary.record(joined);
        }
        summary
    }
}

/// A selection of a result the catalog does not know is treated like an
/// empty selection, so it leaves the current pin alone.
fn resolvable(catalog: &RwLock<ResultCatalog>, action: Action) -> Action {
    match action {
        Action::Select(Some(id)) if catalog.read().find(&id).is_none() => {
            log::debug!("ignoring selection of unknown result {}", id);
            Action::Select(None)
        }
        action => action,
    }
}

/// What a spawned session did before it stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Passes that ran to completion.
    pub passes: usize,
    /// Report of the newest completed pass.
    pub last: Option<PassReport>,
}

impl SessionSummary {
    fn record(&mut self, joined: Result<PassReport, JoinError>) {
        match joined {
            Ok(report) => {
                self.passes += 1;
                if self.last.is_none_or(|last| report.pass > last.pass) {
                    self.last = Some(report);
                }
            }
            Err(err) => log::error!("Update pass panicked: {}", err),
        }
    }
}

/// Sender side of a spawned [`Session`].
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<Action>,
    catalog: Arc<RwLock<ResultCatalog>>,
    task: JoinHandle<SessionSummary>,
}

impl SessionHandle {
    pub fn select(&self, id: Option<ResultId>) -> bool {
        self.send(Action::Select(id))
    }

    pub fn set_visible_editors(&self, editors: Vec<VisibleEditor>) -> bool {
        self.send(Action::VisibleEditorsChanged(editors))
    }

    pub fn remove_logs(&self, ids: &[LogId]) -> bool {
        let removed = self.catalog.write().remove_logs(ids);
        self.send(Action::LogsRemoved(removed))
    }

    /// Queue an action; `false` once the session has stopped.
    pub fn send(&self, action: Action) -> bool {
        self.tx.send(action).is_ok()
    }

    /// Stop accepting events and wait for in-flight passes.
    pub async fn shutdown(self) -> SessionSummary {
        drop(self.tx);
        match self.task.await {
            Ok(summary) => summary,
            Err(err) => {
                log::error!("Session task failed: {}", err);
                SessionSummary::default()
            }
        }
    }
}
