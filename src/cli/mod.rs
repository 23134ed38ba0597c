//! # CLI Module
//!
//! Command-line interface of the `svcgen` binary.
//!
//! ## Commands
//!
//! Every command takes `--root <DIR>` (default `.`), the directory holding
//! `svcgen.toml` and the annotated source units.
//!
//! ### `generate`
//!
//! ```bash
//! svcgen generate --root shop
//! svcgen generate --root shop --dry-run
//! ```
//!
//! Writes `<gen_path>/<service>/model.json` and, for services with `@grpc`
//! endpoints, `<gen_path>/<service>/<service>.proto`.
//!
//! ### `inspect`
//!
//! Prints every service with its routes, parameter bindings and RPC methods.
//!
//! ### `check`
//!
//! Resolves without writing and prints warnings. `--fail-on-warning` turns
//! any warning into a non-zero exit.
//!
//! ### `watch`
//!
//! Generates once, then again on every source-unit change until interrupted.

mod commands;


pub use commands::{execute, format_inspection, run_cli, Cli, Commands};
