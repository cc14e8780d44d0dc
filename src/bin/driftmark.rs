//! driftmark CLI entry point.
//!
//! Pins one result of a SARIF log, projects its steps onto the working tree
//! and prints the annotated files.

use anyhow::{Context, Result, bail};
use clap::Parser;
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use driftmark::application::{
    DecorationUpdate, MemorySink, PipelineOptions, ProjectionPipeline, VisibleEditor, anchor_line,
};
use driftmark::domain::{DocumentId, EditorId, LineIndex, ResultId, RevisionKey};
use driftmark::infra::app_config::load_config;
use driftmark::infra::sarif::load_log;
use driftmark::infra::snapshot::GitBaselineProvider;
use driftmark::infra::workspace::FsWorkspace;
use driftmark::state::{Action, ResultCatalog, Session};

#[derive(Parser, Debug)]
#[command(name = "driftmark")]
#[command(version)]
#[command(about = "Annotate edited files with analysis results recorded against an older revision", long_about = None)]
struct Args {
    /// SARIF log to read results from
    log: PathBuf,

    /// Index of the result to pin within its run
    #[arg(short, long, default_value = "0")]
    result: usize,

    /// Index of the run holding the result
    #[arg(long, default_value = "0")]
    run: usize,

    /// Repository root the artifacts are relative to
    #[arg(long, default_value = ".")]
    repo: PathBuf,

    /// Baseline revision; defaults to the run's recorded revision
    #[arg(long)]
    revision: Option<String>,

    /// Tab width used for callout alignment
    #[arg(long)]
    tab_width: Option<usize>,

    /// Files to annotate; defaults to every file the result mentions
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let mut config = load_config();
    if let Some(tab_width) = args.tab_width {
        config.tab_width = tab_width;
    }

    let analysis_log = load_log(&args.log)?;
    let log_id = analysis_log.id.clone();
    let id = ResultId::new(log_id.clone(), args.run, args.result);
    let Some(result) = analysis_log.find(&id).cloned() else {
        bail!("{} has no result {} in run {}", args.log.display(), args.result, args.run);
    };

    let mut catalog = ResultCatalog::new();
    catalog.add_log(analysis_log);
    if let Some(revision) = &args.revision {
        catalog.set_revision(&log_id, &RevisionKey::new(revision.as_str()));
    }
    if args.revision.is_none() && result.revision.is_none() {
        log::warn!("No baseline revision recorded; locations are shown unprojected");
    }

    let workspace = Arc::new(FsWorkspace::open(&args.repo)?);
    let documents: Vec<DocumentId> = if args.files.is_empty() {
        result
            .locations
            .iter()
            .filter_map(|location| location.artifact.as_ref())
            .map(|uri| workspace.document_for_uri(uri))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    } else {
        args.files
            .iter()
            .map(|path| {
                let path = std::fs::canonicalize(path).unwrap_or_else(|_| path.clone());
                workspace.document_for(&path)
            })
            .collect()
    };

    let editors: Vec<VisibleEditor> = documents
        .into_iter()
        .enumerate()
        .map(|(index, document)| VisibleEditor {
            id: EditorId(index as u64 + 1),
            document,
            tab_width: Some(config.tab_width),
        })
        .collect();

    let sink = Arc::new(MemorySink::new());
    let pipeline = Arc::new(ProjectionPipeline::new(
        Arc::new(GitBaselineProvider::new(workspace.root())),
        workspace.clone(),
        workspace.clone(),
        sink.clone(),
        PipelineOptions::from_config(&config),
    ));
    let mut session = Session::new(pipeline, Arc::new(RwLock::new(catalog)));
    session
        .dispatch(Action::VisibleEditorsChanged(editors.clone()))
        .await;
    let reports = session.dispatch(Action::Select(Some(id))).await;

    if let Some(message) = &result.message {
        println!("{}: {}", result.rule_id.as_deref().unwrap_or("result"), message);
    }
    for editor in &editors {
        let text = std::fs::read_to_string(workspace.root().join(editor.document.as_str()))
            .with_context(|| format!("read {}", editor.document))?;
        let update = sink
            .latest(editor.id)
            .unwrap_or_else(|| DecorationUpdate::clear(editor.id, 0));
        println!("== {}", editor.document);
        print!("{}", render(&text, &update, config.tab_width));
    }

    if let Some(report) = reports.last()
        && report.lost > 0
    {
        eprintln!("{} step(s) no longer present in the working tree", report.lost);
    }
    Ok(())
}

/// Text with tabs expanded, a `>` gutter on highlighted lines and callouts
/// appended to their anchor lines.
fn render(text: &str, update: &DecorationUpdate, tab_width: usize) -> String {
    let index = LineIndex::new(text);
    let highlighted: BTreeSet<usize> = update
        .highlights
        .iter()
        .flat_map(|range| {
            let start = index.position_of(range.start).line;
            let end = anchor_line(&index, *range);
            start..=end.max(start)
        })
        .collect();

    let mut out = String::new();
    for line in 0..index.line_count() {
        let content = index.line_text(text, line);
        if line + 1 == index.line_count() && content.is_empty() {
            break;
        }
        let expanded = content.replace('\t', &" ".repeat(tab_width));
        let gutter = if highlighted.contains(&line) { '>' } else { ' ' };
        out.push_str(&format!("{} {:>4} | {}", gutter, line + 1, expanded));
        for callout in update.callouts.iter().filter(|c| c.line == line) {
            out.push_str(&callout.text);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftmark::domain::{AnnotationEntry, TextRange};

    #[test]
    fn test_render_marks_lines_and_appends_callouts() {
        let text = "a\n\tb\nc\n";
        let update = DecorationUpdate {
            editor: EditorId(1),
            pass: 1,
            highlights: vec![TextRange::new(3, 4)],
            callouts: vec![AnnotationEntry {
                step: 0,
                range: TextRange::new(3, 4),
                line: 1,
                padding: 2,
                text: " -- Step 1".into(),
            }],
        };

        let rendered = render(text, &update, 2);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "     1 | a");
        assert_eq!(lines[1], ">    2 |   b -- Step 1");
        assert_eq!(lines[2], "     3 | c");
    }
}
