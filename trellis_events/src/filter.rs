//! The Filter & Scheduler layer: the admission gate that throttles
//! high-volume event types, and the debounce helper built on top of
//! [`trellis_spawner::Scheduler`]'s timeout primitive. Frame coalescing
//! itself lives in [`crate::engine`], since it needs to hold a handle back
//! into the dispatcher to replay the coalesced event once a frame fires.
//!
//! Every method here takes the current tick explicitly rather than reading a
//! clock itself, so admission decisions are exercised deterministically in
//! tests without depending on wall-clock time.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use rustc_hash::FxHashMap;

use crate::config::EventType;

/// Per-type leaky-bucket-of-one throttle: at most one admitted dispatch per
/// `1000 / max_rate` milliseconds, unless the type is exempted.
#[derive(Default)]
pub(crate) struct AdmissionGate {
    last_admitted_ms: FxHashMap<EventType, u64>,
    filtered_counts: FxHashMap<EventType, u64>,
}

impl AdmissionGate {
    /// Returns `true` if an event of `event_type` arriving at `now_ms`
    /// should be dispatched; `false` if it should be dropped as
    /// over-frequent. A dropped event still counts toward
    /// [`AdmissionGate::filtered_count`] diagnostics.
    pub fn admit(&mut self, event_type: EventType, now_ms: u64, exempt: bool, max_rate: f64) -> bool {
        if exempt || max_rate <= 0.0 {
            return true;
        }
        let min_interval_ms = (1000.0 / max_rate) as u64;
        match self.last_admitted_ms.get(&event_type) {
            Some(&last) if now_ms.saturating_sub(last) < min_interval_ms => {
                *self.filtered_counts.entry(event_type).or_insert(0) += 1;
                false
            }
            _ => {
                self.last_admitted_ms.insert(event_type, now_ms);
                true
            }
        }
    }

    pub fn filtered_count(&self, event_type: EventType) -> u64 {
        self.filtered_counts.get(&event_type).copied().unwrap_or(0)
    }

    pub fn total_filtered(&self) -> u64 {
        self.filtered_counts.values().sum()
    }

    pub fn clone_counts(&self) -> FxHashMap<EventType, u64> {
        self.filtered_counts.clone()
    }
}

/// Wraps `cb` so repeated calls within `wait` of each other coalesce into a
/// single invocation carrying the most recent argument, fired `wait` after
/// the last call — the same shape as a UI framework's `debounce(fn, delay)`
/// helper, built here on [`trellis_spawner::Scheduler::set_timeout`] instead
/// of a host-specific timer API.
pub fn debounce<T: 'static>(wait: Duration, mut cb: impl FnMut(T) + 'static) -> impl FnMut(T) {
    let pending: Rc<Cell<Option<trellis_spawner::TimeoutId>>> = Rc::new(Cell::new(None));
    let latest: Rc<RefCell<Option<T>>> = Rc::new(RefCell::new(None));

    move |value: T| {
        *latest.borrow_mut() = Some(value);
        if let Some(id) = pending.take() {
            trellis_spawner::Scheduler::clear_timeout(id);
        }
        let latest = latest.clone();
        let pending_for_timeout = pending.clone();
        let id = trellis_spawner::Scheduler::set_timeout(
            move || {
                pending_for_timeout.set(None);
                if let Some(value) = latest.borrow_mut().take() {
                    cb(value);
                }
            },
            wait,
        );
        pending.set(Some(id));
    }
}
