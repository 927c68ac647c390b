//! Optional capture of per-fix and per-rule events during a migration.

use std::time::{
    Duration,
    Instant,
    SystemTime,
};

use serde::Serialize;

use crate::{
    dynamic::Dynamic,
    ops::{
        JsonOps,
        Ops,
    },
    types::TypeId,
    version::Version,
};

/// Configuration for diagnostic capture.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticOptions {
    /// Capture before/after snapshots per fix and for the whole migration.
    pub capture_snapshots: bool,
    /// Record which rules modified the value inside each fix.
    pub capture_rule_details: bool,
    /// Maximum snapshot length in bytes; `0` means unlimited.
    pub max_snapshot_length: usize,
    /// Render snapshots as pretty-printed JSON.
    pub pretty_print_snapshots: bool,
}

impl Default for DiagnosticOptions {
    fn default() -> Self {
        Self {
            capture_snapshots: false,
            capture_rule_details: true,
            max_snapshot_length: 0,
            pretty_print_snapshots: false,
        }
    }
}

impl DiagnosticOptions {
    /// Enables snapshot capture.
    pub fn with_snapshots(mut self) -> Self {
        self.capture_snapshots = true;
        self
    }

    /// Caps snapshot length at `bytes`.
    pub fn with_max_snapshot_length(mut self, bytes: usize) -> Self {
        self.max_snapshot_length = bytes;
        self
    }

    /// Renders snapshots pretty-printed.
    pub fn with_pretty_snapshots(mut self) -> Self {
        self.pretty_print_snapshots = true;
        self
    }
}

/// One fix execution inside a [`MigrationReport`].
#[derive(Debug, Clone, Serialize)]
pub struct FixExecution {
    /// The fix name.
    pub name: String,
    /// The version the fix upgrades from.
    pub from: Version,
    /// The version the fix upgrades to.
    pub to: Version,
    /// Wall-clock time spent in the fix.
    pub duration: Duration,
    /// Labels of rules that modified the value, in application order.
    pub rules_applied: Vec<String>,
    /// Snapshot of the value before the fix, if captured.
    pub before: Option<String>,
    /// Snapshot of the value after the fix, if captured.
    pub after: Option<String>,
}

/// The record of one migration call, built when diagnostics are enabled on
/// the [`Context`](crate::context::Context).
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    /// The migrated type.
    pub type_id: TypeId,
    /// The stored version the migration started from.
    pub from: Version,
    /// The requested target version.
    pub to: Version,
    /// When the migration started.
    pub started_at: SystemTime,
    /// Total wall-clock time.
    pub duration: Duration,
    /// Every fix that executed, in order.
    pub fixes: Vec<FixExecution>,
    /// Types touched by the migration.
    pub touched_types: Vec<TypeId>,
    /// Warnings logged through the context.
    pub warnings: Vec<String>,
    /// Snapshot of the input, if captured.
    pub before: Option<String>,
    /// Snapshot of the output, if captured.
    pub after: Option<String>,
}

impl MigrationReport {
    /// Renders a human-readable summary.
    pub fn render(&self) -> String {
        let mut out = format!(
            "migrated `{}` {} -> {} in {:?} ({} fixes)\n",
            self.type_id,
            self.from,
            self.to,
            self.duration,
            self.fixes.len()
        );

        for fix in &self.fixes {
            out.push_str(&format!(
                "  {} ({} -> {}) in {:?}\n",
                fix.name, fix.from, fix.to, fix.duration
            ));
            for rule in &fix.rules_applied {
                out.push_str(&format!("    applied {rule}\n"));
            }
        }

        for warning in &self.warnings {
            out.push_str(&format!("  warning: {warning}\n"));
        }

        out
    }
}

struct CurrentFix {
    name: String,
    from: Version,
    to: Version,
    start: Instant,
    rules_applied: Vec<String>,
    before: Option<String>,
}

pub(crate) struct ReportCollector {
    options: DiagnosticOptions,
    started_at: SystemTime,
    start: Instant,
    header: Option<(TypeId, Version, Version)>,
    before: Option<String>,
    after: Option<String>,
    fixes: Vec<FixExecution>,
    current: Option<CurrentFix>,
    touched: Vec<TypeId>,
    warnings: Vec<String>,
}

impl ReportCollector {
    pub(crate) fn new(options: DiagnosticOptions) -> Self {
        Self {
            options,
            started_at: SystemTime::now(),
            start: Instant::now(),
            header: None,
            before: None,
            after: None,
            fixes: Vec::new(),
            current: None,
            touched: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn options(&self) -> &DiagnosticOptions {
        &self.options
    }

    pub(crate) fn begin_migration(
        &mut self,
        type_id: TypeId,
        from: Version,
        to: Version,
        before: Option<String>,
    ) {
        self.started_at = SystemTime::now();
        self.start = Instant::now();
        self.touch(type_id.clone());
        self.header = Some((type_id, from, to));
        self.before = before;
    }

    pub(crate) fn begin_fix(
        &mut self,
        name: &str,
        from: Version,
        to: Version,
        before: Option<String>,
    ) {
        self.current = Some(CurrentFix {
            name: name.to_owned(),
            from,
            to,
            start: Instant::now(),
            rules_applied: Vec::new(),
            before,
        });
    }

    pub(crate) fn record_rule(&mut self, label: String) {
        if !self.options.capture_rule_details {
            return;
        }
        if let Some(current) = &mut self.current {
            current.rules_applied.push(label);
        }
    }

    pub(crate) fn is_recording_rules(&self) -> bool {
        self.options.capture_rule_details && self.current.is_some()
    }

    pub(crate) fn end_fix(&mut self, after: Option<String>) {
        if let Some(current) = self.current.take() {
            self.fixes.push(FixExecution {
                name: current.name,
                from: current.from,
                to: current.to,
                duration: current.start.elapsed(),
                rules_applied: current.rules_applied,
                before: current.before,
                after,
            });
        }
    }

    pub(crate) fn end_migration(&mut self, after: Option<String>) {
        self.after = after;
    }

    pub(crate) fn touch(&mut self, type_id: TypeId) {
        if !self.touched.contains(&type_id) {
            self.touched.push(type_id);
        }
    }

    pub(crate) fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }

    pub(crate) fn finish(self) -> Option<MigrationReport> {
        let (type_id, from, to) = self.header?;

        Some(MigrationReport {
            type_id,
            from,
            to,
            started_at: self.started_at,
            duration: self.start.elapsed(),
            fixes: self.fixes,
            touched_types: self.touched,
            warnings: self.warnings,
            before: self.before,
            after: self.after,
        })
    }
}

/// Renders a snapshot of a dynamic value as JSON text, honoring the
/// configured length cap and pretty-printing.
pub(crate) fn render_snapshot<O: Ops>(value: &Dynamic<O>, options: &DiagnosticOptions) -> String {
    let json = value.convert(JsonOps).into_value();

    let mut text = if options.pretty_print_snapshots {
        serde_json::to_string_pretty(&json)
    } else {
        serde_json::to_string(&json)
    }
    .unwrap_or_else(|_| "<unrenderable>".to_owned());

    if options.max_snapshot_length > 0 && text.len() > options.max_snapshot_length {
        let mut end = options.max_snapshot_length;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
        text.push('\u{2026}');
    }

    text
}
