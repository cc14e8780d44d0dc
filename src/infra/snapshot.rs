//! Baseline snapshots: the text a document had at the analysed revision.
//!
//! Snapshots are fetched lazily and cached for the life of the process. The
//! cache is append-only; concurrent requests for the same key share a single
//! fetch.

use crate::domain::{DocumentId, RevisionKey, SnapshotError};
use anyhow::Context;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::process::Command;
use tokio::sync::OnceCell;

/// Source of baseline document text.
#[async_trait]
pub trait BaselineProvider: Send + Sync {
    /// Text of `document` at `revision`, or `None` when that revision of the
    /// document does not exist.
    async fn fetch(
        &self,
        revision: &RevisionKey,
        document: &DocumentId,
    ) -> Result<Option<String>, SnapshotError>;
}

/// Reads baselines out of a git repository with `git show <rev>:<path>`.
#[derive(Debug, Clone)]
pub struct GitBaselineProvider {
    repo_path: PathBuf,
}

impl GitBaselineProvider {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }
}

#[async_trait]
impl BaselineProvider for GitBaselineProvider {
    async fn fetch(
        &self,
        revision: &RevisionKey,
        document: &DocumentId,
    ) -> Result<Option<String>, SnapshotError> {
        let path = document.as_str().replace('\\', "/");
        let object = format!("{}:{}", revision.as_str(), path.trim_start_matches("./"));

        let output = Command::new("git")
            .args(["-C", &self.repo_path.to_string_lossy()])
            .args(["show", &object])
            .output()
            .await
            .context("run git show")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            log::debug!("git show {} failed: {}", object, stderr.trim());
            return Ok(None);
        }

        String::from_utf8(output.stdout)
            .map(Some)
            .map_err(|_| SnapshotError::InvalidEncoding {
                document: document.to_string(),
            })
    }
}

/// In-memory provider, keyed by revision and document.
#[derive(Debug, Default)]
pub struct MemoryBaselineProvider {
    texts: HashMap<(RevisionKey, DocumentId), String>,
    fetches: AtomicUsize,
}

impl MemoryBaselineProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, revision: &str, document: &str, text: &str) -> Self {
        self.texts.insert(
            (RevisionKey::new(revision), DocumentId::new(document)),
            text.to_string(),
        );
        self
    }

    /// Number of fetches served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BaselineProvider for MemoryBaselineProvider {
    async fn fetch(
        &self,
        revision: &RevisionKey,
        document: &DocumentId,
    ) -> Result<Option<String>, SnapshotError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        Ok(self
            .texts
            .get(&(revision.clone(), document.clone()))
            .cloned())
    }
}

type SnapshotKey = (DocumentId, RevisionKey);

/// Process-wide cache of baseline snapshots keyed by (document, revision).
///
/// Absent snapshots are cached like present ones. Failed fetches are not
/// cached, so a later pass retries them.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    entries: Mutex<HashMap<SnapshotKey, Arc<OnceCell<Option<Arc<str>>>>>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_fetch(
        &self,
        provider: &dyn BaselineProvider,
        revision: &RevisionKey,
        document: &DocumentId,
    ) -> Option<Arc<str>> {
        let cell = {
            let mut entries = self.entries.lock();
            entries
                .entry((document.clone(), revision.clone()))
                .or_default()
                .clone()
        };

        let fetched = cell
            .get_or_try_init(|| async {
                log::debug!("fetching baseline of {} at {}", document, revision);
                provider
                    .fetch(revision, document)
                    .await
                    .map(|text| text.map(Arc::<str>::from))
            })
            .await;

        match fetched {
            Ok(text) => text.clone(),
            Err(err) => {
                log::warn!("Baseline fetch failed for {} at {}: {}", document, revision, err);
                None
            }
        }
    }

    /// Cached snapshot without fetching; `None` for misses and for cached
    /// absences alike.
    pub fn get(&self, revision: &RevisionKey, document: &DocumentId) -> Option<Arc<str>> {
        let entries = self.entries.lock();
        entries
            .get(&(document.clone(), revision.clone()))
            .and_then(|cell| cell.get())
            .and_then(|text| text.clone())
    }

    /// Number of keys whose fetch has completed.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
