//! Per-migration context: structured logging plus optional diagnostics.

use crate::diagnostics::{
    DiagnosticOptions,
    MigrationReport,
    ReportCollector,
};

/// State passed by reference into every fix application.
///
/// A context is per-call, never shared: concurrent migrations each supply
/// their own. Logging goes through [`tracing`]; warnings are additionally
/// captured into the report when diagnostics are enabled.
#[derive(Default)]
pub struct Context {
    collector: Option<ReportCollector>,
}

impl Context {
    /// Creates a plain context without diagnostics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context that builds a [`MigrationReport`].
    pub fn with_diagnostics(options: DiagnosticOptions) -> Self {
        Self {
            collector: Some(ReportCollector::new(options)),
        }
    }

    /// Logs an informational message.
    pub fn info(&self, message: &str) {
        tracing::info!(target: "datafix", "{message}");
    }

    /// Logs a warning, capturing it into the report when diagnostics are
    /// enabled.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(target: "datafix", "{message}");

        if let Some(collector) = &mut self.collector {
            collector.warn(message);
        }
    }

    /// Returns `true` if this context captures diagnostics.
    pub fn is_diagnostic_enabled(&self) -> bool {
        self.collector.is_some()
    }

    /// Takes the report built so far, ending diagnostic capture. Returns
    /// `None` if diagnostics were disabled or no migration ran.
    pub fn take_report(&mut self) -> Option<MigrationReport> {
        self.collector.take().and_then(ReportCollector::finish)
    }

    pub(crate) fn collector_mut(&mut self) -> Option<&mut ReportCollector> {
        self.collector.as_mut()
    }

    pub(crate) fn is_recording_rules(&self) -> bool {
        self.collector
            .as_ref()
            .is_some_and(ReportCollector::is_recording_rules)
    }

    pub(crate) fn record_rule(&mut self, label: String) {
        if let Some(collector) = &mut self.collector {
            collector.record_rule(label);
        }
    }

    pub(crate) fn options(&self) -> Option<&DiagnosticOptions> {
        self.collector.as_ref().map(ReportCollector::options)
    }
}
