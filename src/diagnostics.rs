//! Non-fatal findings collected during a generation run.
//!
//! Warnings never stop generation, but they are never dropped either: each one
//! is logged through `tracing` when raised and kept in an ordered list that is
//! handed back to the caller with the run's results.

use serde::Serialize;
use std::fmt;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A field kind cannot be mapped for HTTP or RPC and was dropped
    UnsupportedType,
    /// An unrecognized payload format name; JSON is used instead
    UnsupportedFormat,
    /// An interface method was left out of the service
    IgnoredMethod,
    /// A service without an explicit base route
    MissingRoute,
    /// An annotation that may appear only once was repeated
    DuplicateAnnotation,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::UnsupportedType => "unsupported_type",
            DiagnosticKind::UnsupportedFormat => "unsupported_format",
            DiagnosticKind::IgnoredMethod => "ignored_method",
            DiagnosticKind::MissingRoute => "missing_route",
            DiagnosticKind::DuplicateAnnotation => "duplicate_annotation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Where it happened, e.g. `users.Get` or `users.Get.Ids`
    pub location: String,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        location: impl Into<String>,
        kind: DiagnosticKind,
        message: impl Into<String>,
    ) -> Self {
        Diagnostic {
            location: location.into(),
            kind,
            message: message.into(),
        }
    }
}

/// Ordered list of warnings raised during one run.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Log and record a warning.
    pub fn warn(
        &mut self,
        location: impl Into<String>,
        kind: DiagnosticKind,
        message: impl Into<String>,
    ) {
        let diagnostic = Diagnostic::new(location, kind, message);
        warn!(
            location = %diagnostic.location,
            kind = %diagnostic.kind,
            "{}",
            diagnostic.message
        );
        self.items.push(diagnostic);
    }

    pub fn items(&self) -> &[Diagnostic] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.kind == kind)
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

/// Print diagnostics for a human reader.
pub fn print_diagnostics(diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        println!("✅ No warnings");
        return;
    }
    println!("\n⚠️  {} warning(s):\n", diagnostics.len());
    for d in diagnostics {
        println!("   [{}] {}", d.kind, d.location);
        println!("      {}", d.message);
    }
    println!();
}
