//! # Resolve Module
//!
//! Builds validated [`ServiceModel`]s from annotated source units.
//!
//! ## Flow
//!
//! ```text
//! source unit ─▶ service resolver ─▶ endpoint resolver ─┬─▶ type resolver
//!                                                        └─▶ http binder
//!             ─▶ rpc synthesizer (once per service)
//!             ─▶ batch checks (once per run)
//! ```
//!
//! All caches live in a [`RunContext`] that is created for a single run.
//! Services are resolved in the order their files are supplied and endpoints
//! in declaration order, so duplicate detection and field numbering are
//! reproducible.
//!
//! ## Errors
//!
//! - An endpoint failure aborts its service.
//! - A service failure aborts the batch.
//! - Duplicate identifiers, base routes or routes across services abort the batch.
//!
//! Warnings are collected in the context's [`crate::diagnostics::Diagnostics`].

mod context;
mod endpoint;
mod error;
mod service;
mod types;

#[cfg(test)]
mod tests;

pub use context::RunContext;
pub use endpoint::resolve_endpoint;
pub use error::ResolveError;
pub use service::{check_batch, resolve_service};

use crate::model::ServiceModel;
use crate::transport::rpc::{self, SchemaSet};
use serde::Serialize;
use std::path::PathBuf;

/// A resolved service and its RPC schema, if it exposes any `@grpc` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedService {
    pub model: ServiceModel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaSet>,
}

/// Resolve every service declared in `files`, in order, then check the batch.
pub fn resolve_batch(
    ctx: &mut RunContext,
    files: &[PathBuf],
) -> Result<Vec<ResolvedService>, ResolveError> {
    let mut resolved = Vec::new();
    for path in files {
        let unit = ctx.load_unit(path)?;
        let Some(model) = resolve_service(ctx, &unit)? else {
            continue;
        };
        let schema = rpc::synthesize(ctx, &model)?;
        resolved.push(ResolvedService { model, schema });
    }

    check_batch(resolved.iter().map(|r| &r.model))?;
    Ok(resolved)
}
