use crate::config::load_config;
use crate::diagnostics::print_diagnostics;
use crate::generator::{generate, resolve_project, GenerateOptions, GenerationReport};
use crate::hot_reload::watch_sources;
use crate::resolve::ResolvedService;
use crate::transport::http::{ParamBinding, ParamKind};
use anyhow::bail;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// Command-line interface for svcgen
///
/// Resolves annotated service interfaces and writes their transport schemas.
#[derive(Parser)]
#[command(name = "svcgen")]
#[command(about = "Annotation-driven service model generator", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available svcgen commands
#[derive(Subcommand)]
pub enum Commands {
    /// Resolve every service and write its model and RPC schema
    Generate {
        /// Project root (holds svcgen.toml)
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        /// Resolve and report without writing files
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Print services, routes and parameter bindings
    Inspect {
        /// Project root (holds svcgen.toml)
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
    },
    /// Resolve every service and print the warnings
    Check {
        /// Project root (holds svcgen.toml)
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        /// Exit with an error when any warning is reported
        #[arg(long, default_value_t = false)]
        fail_on_warning: bool,
    },
    /// Regenerate whenever a source unit changes
    Watch {
        /// Project root (holds svcgen.toml)
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
    },
}

/// Parse the process arguments and run the selected command.
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    execute(&cli)
}

/// Run a parsed command.
pub fn execute(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Generate { root, dry_run } => {
            let config = load_config(root)?;
            let report = generate(root, &config, GenerateOptions { dry_run: *dry_run })?;
            print_report(&report, *dry_run);
            Ok(())
        }
        Commands::Inspect { root } => {
            let config = load_config(root)?;
            let (services, diagnostics) = resolve_project(root, &config)?;
            print!("{}", format_inspection(&services));
            print_diagnostics(diagnostics.items());
            Ok(())
        }
        Commands::Check {
            root,
            fail_on_warning,
        } => {
            let config = load_config(root)?;
            let (services, diagnostics) = resolve_project(root, &config)?;
            println!("✅ {} service(s) resolved", services.len());
            print_diagnostics(diagnostics.items());
            if *fail_on_warning && !diagnostics.is_empty() {
                bail!("{} warning(s) reported", diagnostics.len());
            }
            Ok(())
        }
        Commands::Watch { root } => watch(root),
    }
}

fn watch(root: &Path) -> anyhow::Result<()> {
    let config = load_config(root)?;
    match generate(root, &config, GenerateOptions::default()) {
        Ok(report) => print_report(&report, false),
        Err(e) => eprintln!("❌ {e:#}"),
    }

    let (tx, rx) = mpsc::channel();
    let _watcher = watch_sources(root, config, GenerateOptions::default(), move |result| {
        if tx.send(result).is_err() {
            tracing::debug!("watch receiver closed");
        }
    })?;
    println!("👀 Watching {} (Ctrl-C to stop)", root.display());

    for result in rx {
        match result {
            Ok(report) => print_report(&report, false),
            Err(e) => eprintln!("❌ {e:#}"),
        }
    }
    Ok(())
}

fn print_report(report: &GenerationReport, dry_run: bool) {
    for service in &report.services {
        println!(
            "📦 {} ({} endpoint(s)) at {}",
            service.model.identifier,
            service.model.endpoints.len(),
            service.model.base_route
        );
    }
    if dry_run {
        println!("🔎 Dry run: nothing written");
    } else {
        for path in &report.written {
            println!("✅ Wrote {}", path.display());
        }
    }
    print_diagnostics(&report.diagnostics);
}

/// Human-readable summary of resolved services.
pub fn format_inspection(services: &[ResolvedService]) -> String {
    let mut out = String::new();
    for service in services {
        let model = &service.model;
        out.push_str(&format!(
            "📦 {} ({}) base {} [{}]\n",
            model.identifier,
            model.interface,
            model.base_route,
            model.source.display()
        ));
        for route in model.routes() {
            out.push_str(&format!("   {} {} → {}\n", route.method, route.path, route.endpoint));
        }
        for endpoint in &model.endpoints {
            let Some(http) = &endpoint.http else {
                continue;
            };
            if http.params.is_empty() {
                continue;
            }
            out.push_str(&format!("   {} params:\n", endpoint.name));
            for param in &http.params {
                out.push_str(&format_param(param));
                out.push('\n');
            }
        }
        if let Some(schema) = &service.schema {
            for method in &schema.methods {
                out.push_str(&format!(
                    "   rpc {} ({}) returns ({})\n",
                    method.name,
                    schema.message(method.request).name,
                    schema.message(method.response).name
                ));
            }
        }
    }
    out
}

fn format_param(param: &ParamBinding) -> String {
    let kind = match param.kind {
        ParamKind::Url => "url",
        ParamKind::Query => "query",
        ParamKind::Body => "body",
    };
    let source = param.field.as_deref().unwrap_or("<request>");
    let mut line = format!("      {kind:<5} {} ← {source}", param.name);
    if param.required {
        line.push_str(" (required)");
    }
    if let Some(conversion) = &param.conversion {
        line.push_str(" via ");
        line.push_str(conversion.function);
    }
    if let Some(format) = &param.format {
        line.push_str(" as ");
        line.push_str(format.as_str());
    }
    line
}
