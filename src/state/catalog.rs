use crate::application::ResultSource;
use crate::domain::{AnalysisLog, AnalysisResult, LogId, ResultId, RevisionKey};
use parking_lot::RwLock;

/// The analysis logs currently loaded.
#[derive(Debug, Clone, Default)]
pub struct ResultCatalog {
    logs: Vec<AnalysisLog>,
}

impl ResultCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a log, replacing any log with the same id.
    pub fn add_log(&mut self, log: AnalysisLog) {
        self.logs.retain(|existing| existing.id != log.id);
        self.logs.push(log);
    }

    /// Remove the given logs and return the ids that were actually present.
    pub fn remove_logs(&mut self, ids: &[LogId]) -> Vec<LogId> {
        let mut removed = Vec::new();
        self.logs.retain(|log| {
            if ids.contains(&log.id) {
                removed.push(log.id.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn logs(&self) -> &[AnalysisLog] {
        &self.logs
    }

    pub fn find(&self, id: &ResultId) -> Option<&AnalysisResult> {
        self.logs.iter().find_map(|log| log.find(id))
    }

    /// Point every result of `log` at `revision`.
    pub fn set_revision(&mut self, log: &str, revision: &RevisionKey) {
        for result in self
            .logs
            .iter_mut()
            .filter(|l| l.id == log)
            .flat_map(|l| l.results.iter_mut())
        {
            result.revision = Some(revision.clone());
        }
    }
}

impl ResultSource for RwLock<ResultCatalog> {
    fn resolve(&self, id: &ResultId) -> Option<AnalysisResult> {
        self.read().find(id).cloned()
    }
}
