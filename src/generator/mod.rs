//! # Generator Module
//!
//! Runs one full resolution over a project and writes the results.
//!
//! ```text
//! discovery → resolve_batch (fresh RunContext) → per-service output
//! ```
//!
//! ## Generated Structure
//!
//! ```text
//! <root>/<gen_path>/
//! └── <service>/
//!     ├── model.json          # Resolved service model and RPC schema
//!     └── <service>.proto     # Only when the service has @grpc endpoints
//! ```
//!
//! Each service directory is cleared before it is written, so files from
//! earlier runs never linger. A failed run writes nothing.

mod templates;


pub use templates::render_proto;

use crate::config::GenConfig;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::resolve::{resolve_batch, ResolvedService, RunContext};
use crate::source::discovery::{discover_source_files, IgnoreRules};
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateOptions {
    /// Resolve and report without touching the output directory
    pub dry_run: bool,
}

/// Outcome of one generation run.
#[derive(Debug)]
pub struct GenerationReport {
    pub services: Vec<ResolvedService>,
    /// Files written, in write order. Empty for a dry run.
    pub written: Vec<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

impl GenerationReport {
    pub fn has_warnings(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Discover and resolve every service under `root` in a new [`RunContext`].
pub fn resolve_project(
    root: &Path,
    config: &GenConfig,
) -> anyhow::Result<(Vec<ResolvedService>, Diagnostics)> {
    let rules = IgnoreRules::load(root);
    let files = discover_source_files(root, &rules, &config.excluded_dirs(root))
        .with_context(|| format!("Failed to discover source units under {}", root.display()))?;
    info!(root = %root.display(), files = files.len(), "discovered annotated source units");

    let mut ctx = RunContext::new(config.layout(root));
    let services = resolve_batch(&mut ctx, &files)?;
    info!(
        services = services.len(),
        parsed = ctx.parsed_files(),
        "resolved services"
    );
    Ok((services, ctx.into_diagnostics()))
}

/// Resolve the project and write the output of every service.
pub fn generate(
    root: &Path,
    config: &GenConfig,
    options: GenerateOptions,
) -> anyhow::Result<GenerationReport> {
    let (services, diagnostics) = resolve_project(root, config)?;

    let mut written = Vec::new();
    if options.dry_run {
        info!(services = services.len(), "dry run, nothing written");
    } else {
        let gen_dir = config.gen_dir(root);
        for service in &services {
            written.extend(write_service(&gen_dir, service)?);
        }
    }

    Ok(GenerationReport {
        services,
        written,
        diagnostics: diagnostics.into_vec(),
    })
}

fn write_service(gen_dir: &Path, service: &ResolvedService) -> anyhow::Result<Vec<PathBuf>> {
    let identifier = &service.model.identifier;
    let out_dir = gen_dir.join(identifier);
    if out_dir.exists() {
        fs::remove_dir_all(&out_dir)
            .with_context(|| format!("Failed to clear {}", out_dir.display()))?;
    }
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let mut written = Vec::new();

    let model_path = out_dir.join("model.json");
    let mut json = serde_json::to_string_pretty(service)
        .with_context(|| format!("Failed to serialize service '{identifier}'"))?;
    json.push('\n');
    fs::write(&model_path, json)
        .with_context(|| format!("Failed to write {}", model_path.display()))?;
    written.push(model_path);

    if let Some(schema) = &service.schema {
        let proto_path = out_dir.join(format!("{identifier}.proto"));
        let proto = render_proto(schema)
            .with_context(|| format!("Failed to render proto for service '{identifier}'"))?;
        fs::write(&proto_path, proto)
            .with_context(|| format!("Failed to write {}", proto_path.display()))?;
        written.push(proto_path);
    }

    info!(
        service = %identifier,
        dir = %out_dir.display(),
        files = written.len(),
        "generated service"
    );
    Ok(written)
}
