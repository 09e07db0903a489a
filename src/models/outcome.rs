//! Per-record and aggregate results of an import run.

/// Result of one upsert attempt. Produced exactly once per dispatched record.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub succeeded: bool,
    /// Whether the store actually persisted an icon, distinct from whether
    /// one was sent.
    pub icon_attached: bool,
    /// Diagnostic text, present when the record failed.
    pub reason: Option<String>,
}

/// Aggregate counters for a completed (possibly partial) run.
///
/// `processed` equals the number of outcomes produced; it is less than
/// `total` when the health probe stopped the run early.
#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    pub total: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub with_icon: usize,
    pub failed: usize,
    /// Set when the run stopped before dispatching every record.
    pub stopped_early: bool,
}
