//! Annotated source discovery.
//!
//! Walks the project tree in sorted order and returns every source-unit file
//! whose text carries at least one annotation. Entries matched by patterns in
//! the root `.gitignore`, `.ignore` or `.svcgenignore` are skipped, as is any
//! `.git` directory.

use super::annotation::contains_annotation;
use super::is_source_file;
use crate::resolve::ResolveError;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Ignore files read from the project root.
pub const IGNORE_FILES: &[&str] = &[".gitignore", ".ignore", ".svcgenignore"];

#[derive(Debug)]
struct IgnorePattern {
    regex: Regex,
    /// Patterns without a `/` match an entry name at any depth.
    match_name: bool,
}

/// Compiled ignore patterns.
#[derive(Debug, Default)]
pub struct IgnoreRules {
    patterns: Vec<IgnorePattern>,
}

impl IgnoreRules {
    /// Load the ignore files present at `root`. Missing files are skipped.
    pub fn load(root: &Path) -> Self {
        let mut rules = IgnoreRules::default();
        rules.add_line("**/.git");
        for name in IGNORE_FILES {
            if let Ok(content) = fs::read_to_string(root.join(name)) {
                for line in content.lines() {
                    rules.add_line(line);
                }
            }
        }
        rules
    }

    /// Add one pattern line in gitignore syntax. Comments, blanks and negations are skipped.
    pub fn add_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return;
        }
        if line.starts_with('!') {
            debug!(pattern = %line, "negated ignore patterns are not supported");
            return;
        }
        let trimmed = line.trim_end_matches('/');
        let anchored = trimmed.starts_with('/');
        let body = trimmed.trim_start_matches('/');
        if body.is_empty() {
            return;
        }
        let match_name = !anchored && !body.contains('/');
        match Regex::new(&format!("^{}$", glob_to_regex(body))) {
            Ok(regex) => self.patterns.push(IgnorePattern { regex, match_name }),
            Err(err) => debug!(pattern = %line, error = %err, "skipping invalid ignore pattern"),
        }
    }

    /// Whether a path relative to the project root is ignored.
    pub fn is_ignored(&self, relative: &Path) -> bool {
        let rel = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if rel.is_empty() {
            return false;
        }
        let name = relative
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.patterns.iter().any(|p| {
            if p.match_name {
                p.regex.is_match(&name)
            } else {
                p.regex.is_match(&rel)
            }
        })
    }
}

fn glob_to_regex(glob: &str) -> String {
    let mut out = String::new();
    let mut chars = glob.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("(?:.*/)?");
                } else {
                    out.push_str(".*");
                }
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            c => out.push_str(&regex::escape(&c.to_string())),
        }
    }
    out
}

/// Find annotated source-unit files under `root`, in sorted path order.
///
/// Directories listed in `exclude` (such as the generation output) are not entered.
pub fn discover_source_files(
    root: &Path,
    rules: &IgnoreRules,
    exclude: &[PathBuf],
) -> Result<Vec<PathBuf>, ResolveError> {
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let path = entry.path();
            if exclude.iter().any(|ex| path == ex.as_path()) {
                return false;
            }
            let rel = path.strip_prefix(root).unwrap_or(path);
            !rules.is_ignored(rel)
        });

    let mut found = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|err| ResolveError::Io {
            path: err.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf()),
            source: err.into(),
        })?;
        if !entry.file_type().is_file() || !is_source_file(entry.path()) {
            continue;
        }
        let text = fs::read_to_string(entry.path()).map_err(|source| ResolveError::Io {
            path: entry.path().to_path_buf(),
            source,
        })?;
        if contains_annotation(&text) {
            debug!(file = %entry.path().display(), "found annotated source unit");
            found.push(entry.into_path());
        }
    }
    Ok(found)
}
