//! One update pass: project the pinned result onto every visible editor.
//!
//! Per editor the pass resolves the editor's artifact, reads its text, fetches
//! the baseline, diffs once, projects every step that belongs to the
//! document, lays out the callouts and hands both decoration sets to the
//! presentation layer in a single update. Editors are processed concurrently;
//! a failure in one editor only clears that editor.

use super::layout::{LayoutOptions, layout};
use super::projection::project_region;
use crate::domain::{
    AnalysisResult, AnnotationEntry, ArtifactUri, DocumentId, EditScript, EditorId, LineIndex,
    ProjectedLocation, ResultId, ResultLocation, RevisionKey, TextRange,
};
use crate::infra::app_config::AppConfig;
use crate::infra::diff::{DiffOptions, diff_with};
use crate::infra::hash::text_fingerprint;
use crate::infra::snapshot::{BaselineProvider, SnapshotCache};
use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// An editor currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleEditor {
    pub id: EditorId,
    pub document: DocumentId,
    /// Tab width reported by the editor, if any.
    pub tab_width: Option<usize>,
}

impl VisibleEditor {
    pub fn new(id: u64, document: impl Into<String>) -> Self {
        Self {
            id: EditorId(id),
            document: DocumentId::new(document),
            tab_width: None,
        }
    }

    pub fn with_tab_width(mut self, tab_width: usize) -> Self {
        self.tab_width = Some(tab_width);
        self
    }
}

/// Maps an open document to the artifact analysis results refer to it by.
#[async_trait]
pub trait ArtifactResolver: Send + Sync {
    async fn resolve_artifact(&self, document: &DocumentId) -> Option<ArtifactUri>;
}

/// Reads the live text of an open document.
#[async_trait]
pub trait DocumentReader: Send + Sync {
    async fn read_text(&self, document: &DocumentId) -> anyhow::Result<String>;
}

/// Looks up results by identity.
pub trait ResultSource: Send + Sync {
    fn resolve(&self, id: &ResultId) -> Option<AnalysisResult>;
}

/// Both decoration sets for one editor from one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecorationUpdate {
    pub editor: EditorId,
    pub pass: u64,
    pub highlights: Vec<TextRange>,
    pub callouts: Vec<AnnotationEntry>,
}

impl DecorationUpdate {
    pub fn clear(editor: EditorId, pass: u64) -> Self {
        Self {
            editor,
            pass,
            highlights: Vec::new(),
            callouts: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.highlights.is_empty() && self.callouts.is_empty()
    }
}

/// Presentation layer. Each update replaces everything previously shown in
/// that editor.
pub trait DecorationSink: Send + Sync {
    fn apply(&self, update: DecorationUpdate);
}

/// Sink that keeps the latest update per editor.
#[derive(Debug, Default)]
pub struct MemorySink {
    updates: Mutex<HashMap<EditorId, DecorationUpdate>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self, editor: EditorId) -> Option<DecorationUpdate> {
        self.updates.lock().get(&editor).cloned()
    }
}

impl DecorationSink for MemorySink {
    fn apply(&self, update: DecorationUpdate) {
        self.updates.lock().insert(update.editor, update);
    }
}

/// Drops updates from a pass older than one already applied to the same
/// editor, so an overtaken pass cannot overwrite newer decorations.
struct PresentationGate {
    sink: Arc<dyn DecorationSink>,
    state: Mutex<GateState>,
}

#[derive(Default)]
struct GateState {
    /// Last pass applied per visible editor.
    applied: HashMap<EditorId, u64>,
    /// Newest pass that started; editors it did not cover were forgotten, so
    /// older passes may not reach them either.
    floor: u64,
}

impl PresentationGate {
    fn new(sink: Arc<dyn DecorationSink>) -> Self {
        Self {
            sink,
            state: Mutex::new(GateState::default()),
        }
    }

    /// Start `pass` over `editors`, forgetting every other editor.
    fn begin(&self, pass: u64, editors: &[VisibleEditor]) {
        let mut state = self.state.lock();
        state
            .applied
            .retain(|id, _| editors.iter().any(|editor| editor.id == *id));
        state.floor = state.floor.max(pass);
    }

    fn apply(&self, update: DecorationUpdate) -> bool {
        let mut state = self.state.lock();
        let last = state
            .applied
            .get(&update.editor)
            .copied()
            .unwrap_or(state.floor);
        if update.pass < last {
            log::debug!(
                "dropping pass {} for {}: pass {} is newer",
                update.pass,
                update.editor,
                last
            );
            return false;
        }
        state.applied.insert(update.editor, update.pass);
        self.sink.apply(update);
        true
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub layout: LayoutOptions,
    pub diff: DiffOptions,
    /// Show locations verbatim when no baseline exists; otherwise they are
    /// treated as lost.
    pub identity_fallback: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            layout: LayoutOptions::default(),
            diff: DiffOptions::default(),
            identity_fallback: true,
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            layout: LayoutOptions {
                tab_width: config.tab_width,
                cushion: config.cushion,
                filler: config.filler.clone(),
            },
            diff: DiffOptions::from_timeout_ms(config.diff_timeout_ms),
            identity_fallback: config.highlight_fallback_to_identity,
        }
    }
}

/// Summary of one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassReport {
    pub pass: u64,
    /// Editors that received an update (cleared or not).
    pub editors: usize,
    /// Steps with a current range.
    pub projected: usize,
    /// Steps whose text no longer exists.
    pub lost: usize,
    /// Updates dropped because a newer pass already reached the editor.
    pub stale: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct EditorReport {
    applied: bool,
    projected: usize,
    lost: usize,
}

type ScriptKey = (DocumentId, RevisionKey);

pub struct ProjectionPipeline {
    baselines: Arc<dyn BaselineProvider>,
    resolver: Arc<dyn ArtifactResolver>,
    reader: Arc<dyn DocumentReader>,
    gate: PresentationGate,
    snapshots: SnapshotCache,
    /// Latest edit script per (document, revision), with the fingerprint of
    /// the current text it was computed against.
    scripts: Mutex<HashMap<ScriptKey, (u64, Arc<EditScript>)>>,
    options: PipelineOptions,
    passes: AtomicU64,
}

impl ProjectionPipeline {
    pub fn new(
        baselines: Arc<dyn BaselineProvider>,
        resolver: Arc<dyn ArtifactResolver>,
        reader: Arc<dyn DocumentReader>,
        sink: Arc<dyn DecorationSink>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            baselines,
            resolver,
            reader,
            gate: PresentationGate::new(sink),
            snapshots: SnapshotCache::new(),
            scripts: Mutex::new(HashMap::new()),
            options,
            passes: AtomicU64::new(0),
        }
    }

    /// Run one pass for `pinned` over `editors`. Never fails: problems are
    /// logged and the affected editor is cleared.
    pub async fn run_pass(
        &self,
        pinned: Option<&ResultId>,
        results: &dyn ResultSource,
        editors: &[VisibleEditor],
    ) -> PassReport {
        let pass = self.start_pass(editors);
        self.run_started_pass(pass, pinned, results, editors).await
    }

    /// Number a new pass over `editors`. Passes started later win over
    /// earlier ones no matter which finishes first.
    pub fn start_pass(&self, editors: &[VisibleEditor]) -> u64 {
        let pass = self.passes.fetch_add(1, Ordering::SeqCst) + 1;
        self.gate.begin(pass, editors);
        pass
    }

    /// Run a pass numbered by [`Self::start_pass`].
    pub async fn run_started_pass(
        &self,
        pass: u64,
        pinned: Option<&ResultId>,
        results: &dyn ResultSource,
        editors: &[VisibleEditor],
    ) -> PassReport {
        let result = pinned.and_then(|id| {
            let result = results.resolve(id);
            if result.is_none() {
                log::debug!("pinned result {} no longer resolves", id);
            }
            result
        });

        let reports = join_all(
            editors
                .iter()
                .map(|editor| self.update_editor(pass, result.as_ref(), editor)),
        )
        .await;

        let mut report = PassReport {
            pass,
            ..Default::default()
        };
        for editor in reports {
            if editor.applied {
                report.editors += 1;
            } else {
                report.stale += 1;
            }
            report.projected += editor.projected;
            report.lost += editor.lost;
        }
        log::debug!(
            "pass {}: {} editors, {} projected, {} lost",
            pass,
            report.editors,
            report.projected,
            report.lost
        );
        report
    }

    async fn update_editor(
        &self,
        pass: u64,
        result: Option<&AnalysisResult>,
        editor: &VisibleEditor,
    ) -> EditorReport {
        let clear = || EditorReport {
            applied: self.gate.apply(DecorationUpdate::clear(editor.id, pass)),
            ..Default::default()
        };

        let Some(result) = result else {
            return clear();
        };
        let Some(artifact) = self.resolver.resolve_artifact(&editor.document).await else {
            log::debug!("no artifact for {}", editor.document);
            return clear();
        };

        let steps: Vec<(usize, &ResultLocation)> = result
            .locations
            .iter()
            .enumerate()
            .filter(|(_, location)| {
                location
                    .artifact
                    .as_ref()
                    .is_some_and(|uri| same_artifact(uri, &artifact))
            })
            .collect();
        if steps.is_empty() {
            return clear();
        }

        let current = match self.reader.read_text(&editor.document).await {
            Ok(text) => text,
            Err(err) => {
                log::warn!("Failed to read {}: {:#}", editor.document, err);
                return clear();
            }
        };

        let mut baseline = None;
        let mut script = None;
        if let Some(revision) = &result.revision
            && let Some(text) = self
                .snapshots
                .get_or_fetch(&*self.baselines, revision, &editor.document)
                .await
        {
            script = Some(self.edit_script(&editor.document, revision, &text, &current));
            baseline = Some(text);
        }
        let unprojectable = baseline.is_none() && !self.options.identity_fallback;
        if baseline.is_none() {
            log::debug!(
                "no baseline for {}, {}",
                editor.document,
                if unprojectable { "hiding steps" } else { "projecting verbatim" }
            );
        }

        let current_index = LineIndex::new(&current);
        let baseline_index = baseline.as_deref().map(LineIndex::new);
        let region_index = baseline_index.as_ref().unwrap_or(&current_index);

        let projected: Vec<ProjectedLocation> = steps
            .into_iter()
            .map(|(step, location)| {
                let Some(spec) = &location.region else {
                    return ProjectedLocation {
                        step,
                        range: None,
                        message: location.message.clone(),
                    };
                };
                let range = match spec.resolve(region_index) {
                    Ok(_) if unprojectable => None,
                    Ok(region) => project_region(script.as_deref(), region),
                    Err(err) => {
                        log::warn!("Skipping step {} in {}: {}", step + 1, editor.document, err);
                        None
                    }
                };
                ProjectedLocation {
                    step,
                    range,
                    message: location.message.clone(),
                }
            })
            .collect();

        let mut options = self.options.layout.clone();
        if let Some(tab_width) = editor.tab_width {
            options.tab_width = tab_width;
        }
        let callouts = layout(&current, &current_index, &projected, &options);
        let highlights: Vec<TextRange> = projected.iter().filter_map(|step| step.range).collect();

        let lost = projected.len() - highlights.len();
        if lost > 0 {
            log::info!("{} step(s) of {} no longer present in {}", lost, result.id, editor.document);
        }

        EditorReport {
            applied: self.gate.apply(DecorationUpdate {
                editor: editor.id,
                pass,
                highlights: highlights.clone(),
                callouts,
            }),
            projected: highlights.len(),
            lost,
        }
    }

    fn edit_script(
        &self,
        document: &DocumentId,
        revision: &RevisionKey,
        baseline: &str,
        current: &str,
    ) -> Arc<EditScript> {
        let fingerprint = text_fingerprint(current);
        let key = (document.clone(), revision.clone());
        if let Some((cached, script)) = self.scripts.lock().get(&key)
            && *cached == fingerprint
        {
            return script.clone();
        }

        let script = Arc::new(diff_with(baseline, current, &self.options.diff));
        self.scripts
            .lock()
            .insert(key, (fingerprint, script.clone()));
        script
    }
}

/// Whether a location's artifact uri names `artifact`. Scheme, `./` prefixes
/// and path separators are normalised; an absolute uri matches a relative one
/// it ends with. Two relative paths must be equal.
pub fn same_artifact(uri: &ArtifactUri, artifact: &ArtifactUri) -> bool {
    let a = normalize_uri(uri.as_str());
    let b = normalize_uri(artifact.as_str());
    if a == b {
        return true;
    }
    let (long, short) = if a.len() > b.len() { (&a, &b) } else { (&b, &a) };
    is_absolute(long)
        && !is_absolute(short)
        && !short.is_empty()
        && long.ends_with(short.as_str())
        && long[..long.len() - short.len()].ends_with('/')
}

fn normalize_uri(uri: &str) -> String {
    let uri = match uri.strip_prefix("file://") {
        Some(path) => urlencoding::decode(path)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| path.to_string()),
        None => uri.to_string(),
    };
    let uri = uri.replace('\\', "/");
    uri.trim_start_matches("./").to_string()
}

/// `/`-rooted or starting with a drive letter.
fn is_absolute(path: &str) -> bool {
    let mut chars = path.chars();
    match (chars.next(), chars.next()) {
        (Some('/'), _) => true,
        (Some(drive), Some(':')) => drive.is_ascii_alphabetic(),
        _ => false,
    }
}
