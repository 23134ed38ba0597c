use super::ResolveError;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::model::RecordType;
use crate::source::{self, ProjectLayout, SourceUnit};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::trace;

/// State owned by one generation run.
///
/// Holds the parsed-source cache (by file path), the resolved-record cache (by
/// import path and name) and the ordered warnings. A new context is built for
/// every run and dropped when the run ends, so nothing resolved in one run is
/// visible to the next.
#[derive(Debug)]
pub struct RunContext {
    layout: ProjectLayout,
    sources: HashMap<PathBuf, Arc<SourceUnit>>,
    pub(super) records: HashMap<(String, String), Arc<RecordType>>,
    diagnostics: Diagnostics,
}

impl RunContext {
    pub fn new(layout: ProjectLayout) -> Self {
        RunContext {
            layout,
            sources: HashMap::new(),
            records: HashMap::new(),
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Parse a source unit, at most once per run.
    pub fn load_unit(&mut self, path: &Path) -> Result<Arc<SourceUnit>, ResolveError> {
        if let Some(unit) = self.sources.get(path) {
            return Ok(Arc::clone(unit));
        }
        trace!(file = %path.display(), "parsing source unit");
        let unit = Arc::new(source::load_unit(path, &self.layout)?);
        self.sources.insert(path.to_path_buf(), Arc::clone(&unit));
        Ok(unit)
    }

    /// Number of distinct files parsed so far.
    pub fn parsed_files(&self) -> usize {
        self.sources.len()
    }

    pub fn warn(
        &mut self,
        location: impl Into<String>,
        kind: DiagnosticKind,
        message: impl Into<String>,
    ) {
        self.diagnostics.warn(location, kind, message);
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }
}
