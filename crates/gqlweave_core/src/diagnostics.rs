//! Diagnostic reporting for the engine.
//!
//! Diagnostics are an injected observer rather than a process-wide
//! logger: the controller and the schema generator receive a
//! [`Diagnostics`] handle at construction, so tests can capture every
//! emitted message deterministically through a [`MemorySink`]. The
//! default sink forwards to `tracing`.

use std::fmt;
use std::sync::{Arc, Mutex};

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// A recoverable failure that degraded some part of the schema.
    Error,
    /// An advisory message that does not degrade the schema.
    Warning,
}

/// A diagnostic message.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity level.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
}

impl Diagnostic {
    /// Creates a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    /// Creates a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Receives diagnostics emitted by the engine.
pub trait DiagnosticSink: Send + Sync {
    /// Reports a single diagnostic.
    fn report(&self, diagnostic: Diagnostic);
}

/// Cloneable handle to a [`DiagnosticSink`].
#[derive(Clone)]
pub struct Diagnostics {
    sink: Arc<dyn DiagnosticSink>,
}

impl Diagnostics {
    /// Creates a handle reporting into the given sink.
    pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { sink }
    }

    /// Creates a handle reporting through `tracing`.
    pub fn tracing() -> Self {
        Self::new(Arc::new(TracingSink))
    }

    /// Creates a handle buffering diagnostics in memory.
    ///
    /// Returns the handle together with the sink so callers can inspect
    /// what was reported.
    pub fn memory() -> (Self, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::default());
        (Self::new(Arc::clone(&sink) as Arc<dyn DiagnosticSink>), sink)
    }

    /// Reports an error diagnostic.
    pub fn error(&self, message: impl Into<String>) {
        self.sink.report(Diagnostic::error(message));
    }

    /// Reports a warning diagnostic.
    pub fn warning(&self, message: impl Into<String>) {
        self.sink.report(Diagnostic::warning(message));
    }

    /// Reports a prepared diagnostic.
    pub fn report(&self, diagnostic: Diagnostic) {
        self.sink.report(diagnostic);
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::tracing()
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics").finish_non_exhaustive()
    }
}

/// Sink forwarding diagnostics to `tracing`.
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => tracing::error!("{}", diagnostic.message),
            Severity::Warning => tracing::warn!("{}", diagnostic.message),
        }
    }
}

/// Sink buffering diagnostics in memory.
#[derive(Default)]
pub struct MemorySink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    /// Returns a snapshot of every reported diagnostic.
    pub fn entries(&self) -> Vec<Diagnostic> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Returns the reported messages, in report order.
    pub fn messages(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .map(|diagnostic| diagnostic.message)
            .collect()
    }

    /// Returns true if any reported message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries()
            .iter()
            .any(|diagnostic| diagnostic.message.contains(needle))
    }

    /// Returns true if nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

impl DiagnosticSink for MemorySink {
    fn report(&self, diagnostic: Diagnostic) {
        match self.entries.lock() {
            Ok(mut entries) => entries.push(diagnostic),
            Err(poisoned) => poisoned.into_inner().push(diagnostic),
        }
    }
}
