//! `codesight watch` - live analysis on file changes
//!
//! Filesystem events go through the [`Debouncer`]: a file is re-analysed once
//! it has been quiet for the debounce period, and a newer edit supersedes any
//! analysis still pending or running for it.

use anyhow::{Context, Result};
use console::style;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::analyze::{build_analyzer, is_supported};
use crate::config::CodesightConfig;
use crate::diagnostics::{to_diagnostics, ConsoleSink, DiagnosticSink};
use crate::pipeline::{load_unit, Analyzer, Debouncer};

/// Build output, dependencies and VCS metadata
const IGNORED_DIRS: &[&str] = &[
    "target",
    "node_modules",
    ".git",
    "__pycache__",
    ".next",
    "dist",
    "build",
    "vendor",
];

pub(super) fn run(path: &Path, debounce_ms: Option<u64>, ai: bool) -> Result<()> {
    let root = std::fs::canonicalize(path)
        .with_context(|| format!("Path does not exist: {}", path.display()))?;
    if !root.is_dir() {
        anyhow::bail!("Path is not a directory: {}", root.display());
    }

    let mut config = CodesightConfig::load(&root);
    if let Some(ms) = debounce_ms {
        config.watch.debounce_ms = ms;
    }
    let analyzer = Arc::new(build_analyzer(&config, ai || config.ai.enabled)?);
    let quiet = config.watch.debounce();

    println!(
        "\nWatching {} for changes...\n",
        style(root.display()).cyan()
    );
    println!("  {} Save a file to trigger analysis", style("→").dim());
    println!("  {} Press Ctrl+C to stop\n", style("→").dim());

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(watch_loop(root, analyzer, quiet))
}

async fn watch_loop(root: PathBuf, analyzer: Arc<Analyzer>, quiet: Duration) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| match result {
        Ok(event) => {
            let _ = tx.send(event);
        }
        Err(e) => warn!("Watch error: {}", e),
    })?;
    watcher.watch(&root, RecursiveMode::Recursive)?;

    let debouncer = Debouncer::new(quiet);
    let sink: Arc<dyn DiagnosticSink> = Arc::new(ConsoleSink);

    while let Some(event) = rx.recv().await {
        for file in changed_sources(&event, &root) {
            let key = relative_key(&file, &root);

            if !file.exists() {
                if debouncer.cancel(&key) {
                    debug!("Dropped pending analysis for removed {}", key);
                }
                sink.clear(&key);
                continue;
            }

            let analyzer = Arc::clone(&analyzer);
            let sink = Arc::clone(&sink);
            let root = root.clone();
            debouncer.schedule(key, move || async move {
                analyze_file(&analyzer, sink.as_ref(), &file, &root).await;
            });
        }
    }

    Ok(())
}

/// Re-analyse one file and publish its diagnostics
async fn analyze_file(analyzer: &Analyzer, sink: &dyn DiagnosticSink, file: &Path, root: &Path) {
    let unit = match load_unit(file, Some(root)) {
        Ok(unit) => unit,
        Err(e) => {
            warn!("{:#}", e);
            return;
        }
    };

    let result = analyzer.analyze(&unit).await;
    let time = chrono::Local::now().format("%H:%M:%S");
    println!(
        "{} {} score {} ({})",
        style(format!("[{}]", time)).dim(),
        style(&unit.path).cyan().bold(),
        result.overall_score,
        result.grade()
    );
    sink.publish(&unit.path, to_diagnostics(&result.findings));
}

/// Supported source files touched by an event
fn changed_sources(event: &Event, root: &Path) -> Vec<PathBuf> {
    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) {
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = event
        .paths
        .iter()
        .filter(|p| is_supported(p) && !is_ignored_path(p, root))
        .cloned()
        .collect();
    files.dedup();
    files
}

/// Check if path should be ignored (build dirs, node_modules, dotfiles)
fn is_ignored_path(path: &Path, root: &Path) -> bool {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components().any(|c| {
        let name = c.as_os_str().to_string_lossy();
        IGNORED_DIRS.contains(&name.as_ref()) || name.starts_with('.')
    })
}

fn relative_key(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}
