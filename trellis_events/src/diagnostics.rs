//! A point-in-time snapshot of dispatcher health: how many handlers are
//! live, how many distinct native listeners are installed, how much
//! filtering the admission gate has done, and the governor's own running
//! counters (handler count, cache sizes, approximate weak-index size,
//! last-sweep timestamp, peak handler count, cumulative warnings).

use rustc_hash::FxHashMap;

use crate::config::EventType;

/// A read-only snapshot, cheap to construct and safe to hand to application
/// code or a logging sink. Does not itself mutate any dispatcher state.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    pub handler_count: usize,
    pub active_listener_count: usize,
    pub cache_entry_count: usize,
    pub filtered_per_type: FxHashMap<EventType, u64>,
    pub total_filtered: u64,
    /// The highest `handler_count` ever observed, tracked by the governor on
    /// every pass so a host can spot a leak even after the count recovers.
    pub peak_handler_count: usize,
    /// Milliseconds-since-engine-construction of the governor's last
    /// completed pass, or `None` if it has never run.
    pub last_gc_timestamp_ms: Option<u64>,
    /// Cumulative count of hot-element warnings emitted by `register` when an
    /// element accumulates more than `max_handlers_per_element` handlers.
    /// Kept as its own counter rather than folded into a byte-based metric,
    /// since handler counts and byte budgets are different units.
    pub warning_count: u64,
}

impl Diagnostics {
    pub fn total_filtered_for(&self, event_type: EventType) -> u64 {
        self.filtered_per_type.get(&event_type).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_snapshot_reports_nothing_filtered() {
        let snapshot = Diagnostics::default();
        assert_eq!(snapshot.total_filtered, 0);
        assert_eq!(snapshot.total_filtered_for(EventType::Click), 0);
    }
}
