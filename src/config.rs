//! Project configuration loaded from `svcgen.toml` at the project root.
//!
//! ```toml
//! module = "example.com/shop"
//! gen_path = "gen"
//! cmd_path = "cmd"
//! service_annotation = "service"
//! ```
//!
//! Every key is optional. A missing file means all defaults.

use crate::source::ProjectLayout;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up at the project root.
pub const CONFIG_FILE: &str = "svcgen.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenConfig {
    /// Import path prefix of the project. Defaults to the root directory name.
    pub module: Option<String>,
    /// Output directory for generated files, relative to the root
    pub gen_path: String,
    /// Directory of hand-written entry points, relative to the root. Never scanned.
    pub cmd_path: String,
    /// Annotation name marking a service interface
    pub service_annotation: String,
}

impl Default for GenConfig {
    fn default() -> Self {
        GenConfig {
            module: None,
            gen_path: "gen".to_string(),
            cmd_path: "cmd".to_string(),
            service_annotation: "service".to_string(),
        }
    }
}

impl GenConfig {
    /// Module import path, falling back to the root directory name.
    pub fn module_for(&self, root: &Path) -> String {
        match &self.module {
            Some(module) if !module.trim().is_empty() => {
                module.trim().trim_end_matches('/').to_string()
            }
            _ => root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "app".to_string()),
        }
    }

    pub fn layout(&self, root: &Path) -> ProjectLayout {
        let mut layout = ProjectLayout::new(root, self.module_for(root));
        layout.service_annotation = self.service_annotation.clone();
        layout
    }

    /// Directory holding the sources of an import path inside the project.
    pub fn import_dir(&self, root: &Path, import_path: &str) -> Option<PathBuf> {
        self.layout(root).import_dir(import_path)
    }

    pub fn gen_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.gen_path)
    }

    pub fn cmd_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.cmd_path)
    }

    /// Directories discovery must not enter.
    pub fn excluded_dirs(&self, root: &Path) -> Vec<PathBuf> {
        vec![self.gen_dir(root), self.cmd_dir(root)]
    }
}

/// Load `svcgen.toml` from `root`.
///
/// Returns the defaults when the file does not exist and an error when it
/// exists but cannot be read or parsed.
pub fn load_config(root: &Path) -> anyhow::Result<GenConfig> {
    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(GenConfig::default());
    }
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let config: GenConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load_config(dir.path()).expect("load");
        assert_eq!(config, GenConfig::default());
        let expected = dir
            .path()
            .file_name()
            .expect("name")
            .to_string_lossy()
            .into_owned();
        assert_eq!(config.module_for(dir.path()), expected);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join(CONFIG_FILE),
            "module = \"example.com/shop/\"\nservice_annotation = \"svc\"\n",
        )
        .expect("write");
        let config = load_config(dir.path()).expect("load");
        assert_eq!(config.module_for(dir.path()), "example.com/shop");
        assert_eq!(config.gen_path, "gen");
        let layout = config.layout(dir.path());
        assert_eq!(layout.service_annotation, "svc");
        assert_eq!(
            config.import_dir(dir.path(), "example.com/shop/models"),
            Some(dir.path().join("models"))
        );
        assert_eq!(config.import_dir(dir.path(), "example.org/other"), None);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join(CONFIG_FILE), "gen_path = [").expect("write");
        let err = load_config(dir.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }
}
