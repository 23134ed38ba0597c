//! # svcgen
//!
//! **svcgen** turns annotated service interfaces into validated service
//! models and the transport schemas derived from them.
//!
//! ## Overview
//!
//! A project is a tree of source units (YAML or JSON documents describing
//! interfaces, functions and record types). Interfaces annotated with
//! `@service(...)` become services; their methods annotated with
//! `@http(...)` or `@grpc()` become endpoints.
//!
//! ## Architecture
//!
//! - **[`source`]** - Source-unit format, type references, annotations and discovery
//! - **[`resolve`]** - Type, endpoint and service resolvers plus batch checks
//! - **[`transport`]** - HTTP binding plans and RPC schema synthesis
//! - **[`model`]** - Resolved service, endpoint and record types
//! - **[`generator`]** - Runs a resolution and writes `model.json` and `.proto` output
//! - **[`hot_reload`]** - Regenerates when source units change
//! - **[`cli`]** - The `svcgen` command line
//! - **[`config`]** / **[`logging`]** - Project configuration and tracing setup
//!
//! ```text
//! discover ─▶ load unit ─▶ resolve service ─▶ resolve endpoints ─┬─▶ resolve types
//!                                                                 └─▶ bind http
//!          ─▶ synthesize rpc schema ─▶ check batch ─▶ write output
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use svcgen::{generate, load_config, GenerateOptions};
//! use std::path::Path;
//!
//! let root = Path::new("shop");
//! let config = load_config(root)?;
//! let report = generate(root, &config, GenerateOptions::default())?;
//! for service in &report.services {
//!     println!("{} at {}", service.model.identifier, service.model.base_route);
//! }
//! ```

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod generator;
pub mod hot_reload;
pub mod logging;
pub mod model;
pub mod naming;
pub mod resolve;
pub mod source;
pub mod transport;

pub use config::{load_config, GenConfig};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use generator::{generate, resolve_project, GenerateOptions, GenerationReport};
pub use model::{Endpoint, RecordType, ServiceModel};
pub use resolve::{resolve_batch, ResolveError, ResolvedService, RunContext};
