//! # Hot Reload Module
//!
//! Watches a project and regenerates whenever a source unit changes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use svcgen::hot_reload::watch_sources;
//!
//! let watcher = watch_sources(root, config, GenerateOptions::default(), |result| {
//!     if let Ok(report) = result {
//!         println!("regenerated {} services", report.services.len());
//!     }
//! })?;
//!
//! // Keep watcher alive
//! std::mem::forget(watcher);
//! ```
//!
//! Every run builds a new `RunContext`, so edits to any record file are
//! always picked up. A failed run is logged and the previous output stays on
//! disk. Events inside the output and entry-point directories are ignored so
//! a run never triggers itself.

use crate::config::GenConfig;
use crate::generator::{generate, GenerateOptions, GenerationReport};
use crate::source::is_source_file;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Whether `event` should trigger a new generation run.
pub fn is_relevant_event(event: &Event, excluded: &[PathBuf]) -> bool {
    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) {
        return false;
    }
    event.paths.iter().any(|path| {
        is_source_file(path) && !excluded.iter().any(|dir| path.starts_with(dir))
    })
}

/// Watch `root` recursively and call `on_run` with the result of every
/// regeneration.
///
/// The returned watcher must be kept alive for events to be delivered.
pub fn watch_sources<F>(
    root: impl AsRef<Path>,
    config: GenConfig,
    options: GenerateOptions,
    mut on_run: F,
) -> notify::Result<RecommendedWatcher>
where
    F: FnMut(anyhow::Result<GenerationReport>) + Send + 'static,
{
    let root: PathBuf = root.as_ref().to_path_buf();
    let watch_root = root.clone();
    let excluded = config.excluded_dirs(&root);

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| match res {
            Ok(event) => {
                if !is_relevant_event(&event, &excluded) {
                    return;
                }
                info!(paths = ?event.paths, "source change detected, regenerating");
                let result = generate(&watch_root, &config, options);
                match &result {
                    Ok(report) => info!(
                        services = report.services.len(),
                        written = report.written.len(),
                        warnings = report.diagnostics.len(),
                        "regeneration finished"
                    ),
                    Err(e) => error!(
                        error = %format!("{e:#}"),
                        "regeneration failed, keeping previous output"
                    ),
                }
                on_run(result);
            }
            Err(e) => error!(error = %e, "watch error"),
        },
        Config::default(),
    )?;
    watcher.watch(&root, RecursiveMode::Recursive)?;
    info!(root = %root.display(), "watching for source changes");
    Ok(watcher)
}
