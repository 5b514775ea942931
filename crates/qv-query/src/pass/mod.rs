//! Pass infrastructure: composable transforms over the query IR

pub mod dangling_refs;
pub mod dead_joins;

use crate::ir::expr::BindingIndex;
use crate::ir::query::QueryIR;
use serde::{Deserialize, Serialize};

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational, no action required
    Info,
    /// Potential issue worth reviewing
    Warning,
    /// Likely bug in the caller
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Stable diagnostic codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// Expression node the analysis does not understand
    Q001,
    /// Reference to a binding that is neither the root nor a present join
    Q002,
    /// Join removed by dead-join elimination
    Q003,
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            DiagnosticCode::Q001 => "Q001",
            DiagnosticCode::Q002 => "Q002",
            DiagnosticCode::Q003 => "Q003",
        };
        f.write_str(code)
    }
}

/// A diagnostic message produced by a pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Diagnostic code (e.g. "Q003")
    pub code: DiagnosticCode,
    /// Severity level
    pub severity: Severity,
    /// Human-readable message
    pub message: String,
    /// Alias of the join concerned, if any
    pub alias: Option<String>,
    /// Binding concerned, if any
    pub binding: Option<BindingIndex>,
    /// Name of the pass that produced this diagnostic
    pub pass_name: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} ({}): {}",
            self.code, self.severity, self.pass_name, self.message
        )
    }
}

/// Receiver for diagnostics. Reporting never fails and never affects the
/// result of a pass.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Sink forwarding every diagnostic to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Info => log::info!("{diagnostic}"),
            Severity::Warning => log::warn!("{diagnostic}"),
            Severity::Error => log::error!("{diagnostic}"),
        }
    }
}

/// A transform over one query
pub trait QueryPass: Send + Sync {
    /// Pass name (used for filtering and display)
    fn name(&self) -> &'static str;
    /// Human-readable description
    fn description(&self) -> &'static str;
    /// Run the pass, returning the (possibly rewritten) query
    fn run(&self, query: QueryIR, sink: &mut dyn DiagnosticSink) -> QueryIR;
}

/// Manages and runs query passes in registration order
pub struct PassManager {
    passes: Vec<Box<dyn QueryPass>>,
}

impl PassManager {
    /// Create a PassManager with all built-in passes registered:
    /// dangling-reference validation, then dead-join elimination
    pub fn with_defaults() -> Self {
        Self {
            passes: vec![
                Box::new(dangling_refs::DanglingReferences),
                Box::new(dead_joins::DeadJoinElimination),
            ],
        }
    }

    /// An empty manager
    pub fn empty() -> Self {
        Self { passes: Vec::new() }
    }

    /// Register an additional pass after the existing ones
    pub fn with_pass(mut self, pass: Box<dyn QueryPass>) -> Self {
        self.passes.push(pass);
        self
    }

    /// Run every pass (or only those named in `pass_filter`) over `query`
    pub fn run(
        &self,
        query: QueryIR,
        sink: &mut dyn DiagnosticSink,
        pass_filter: Option<&[String]>,
    ) -> QueryIR {
        let mut query = query;
        for pass in &self.passes {
            if let Some(filter) = pass_filter {
                if !filter.iter().any(|f| f == pass.name()) {
                    continue;
                }
            }
            log::debug!("Running pass '{}'", pass.name());
            query = pass.run(query, sink);
        }
        query
    }

    /// List all registered pass names
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
#[path = "pass_test.rs"]
mod tests;
