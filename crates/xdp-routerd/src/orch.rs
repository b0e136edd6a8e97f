//! Shared bookkeeping for the per-table orchestrators.

/// Apply counters kept by each orchestrator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrchStats {
    /// Entries written to the table
    pub applied: u64,
    /// Entries that failed to encode or write
    pub failed: u64,
}

impl OrchStats {
    pub(crate) fn record_applied(&mut self) {
        self.applied = self.applied.saturating_add(1);
    }

    pub(crate) fn record_failed(&mut self) {
        self.failed = self.failed.saturating_add(1);
    }
}
