//! The host-agnostic event payload: a tagged record rather than the ad-hoc
//! duck typing a wrapped native event usually gets.
//!
//! [`RawEvent`] closes over either a [`NativeEvent`] test double or, under
//! the `browser` feature, a real `web_sys::Event` — the propagation
//! algorithm in [`crate::dispatcher`] only ever calls the handful of methods
//! declared here, so it never needs to know which one it has.

use std::cell::Cell;

use smallvec::SmallVec;
use trellis_dom::EventTarget;

use crate::config::EventType;

/// Keyboard modifier state at the moment the native event fired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

/// The type-specific data a native event carries, normalized to plain
/// values instead of leaving callers to downcast a platform type.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    Keyboard {
        key: String,
        code: String,
    },
    Mouse {
        button: i16,
        client_x: f64,
        client_y: f64,
    },
    Touch {
        points: SmallVec<[(f64, f64); 4]>,
    },
    Pointer {
        pointer_id: i32,
    },
    Wheel {
        delta_x: f64,
        delta_y: f64,
    },
    Generic,
}

/// A dependency-free stand-in for a platform event, used in tests and by any
/// non-browser host. Carries just enough state for the propagation algorithm
/// to exercise `preventDefault`/`stopPropagation`/`stopImmediatePropagation`.
#[derive(Debug)]
pub struct NativeEvent {
    pub cancelable: bool,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
    immediate_stopped: Cell<bool>,
}

impl NativeEvent {
    pub fn new(cancelable: bool) -> Self {
        Self {
            cancelable,
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
            immediate_stopped: Cell::new(false),
        }
    }

    fn prevent_default(&self) {
        if self.cancelable {
            self.default_prevented.set(true);
        }
    }

    fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    fn stop_immediate_propagation(&self) {
        self.propagation_stopped.set(true);
        self.immediate_stopped.set(true);
    }

    fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

/// The native event a [`crate::handler::HandlerRecord`] callback is invoked
/// over. Either a dependency-free [`NativeEvent`] or a real browser event.
pub enum RawEvent {
    Native(NativeEvent),
    #[cfg(feature = "browser")]
    Browser(web_sys::Event),
}

impl RawEvent {
    pub fn prevent_default(&self) {
        match self {
            RawEvent::Native(e) => e.prevent_default(),
            #[cfg(feature = "browser")]
            RawEvent::Browser(e) => e.prevent_default(),
        }
    }

    pub fn stop_propagation(&self) {
        match self {
            RawEvent::Native(e) => e.stop_propagation(),
            #[cfg(feature = "browser")]
            RawEvent::Browser(e) => e.stop_propagation(),
        }
    }

    pub fn stop_immediate_propagation(&self) {
        match self {
            RawEvent::Native(e) => e.stop_immediate_propagation(),
            #[cfg(feature = "browser")]
            RawEvent::Browser(e) => e.stop_immediate_propagation(),
        }
    }

    pub fn default_prevented(&self) -> bool {
        match self {
            RawEvent::Native(e) => e.default_prevented(),
            #[cfg(feature = "browser")]
            RawEvent::Browser(e) => e.default_prevented(),
        }
    }
}

/// Per-dispatch state shared by every handler invoked along the propagation
/// path: the raw event, the resolved propagation path, and the two
/// stop-flags a handler can set.
pub(crate) struct EventContext {
    pub event_type: EventType,
    pub modifiers: Modifiers,
    pub original_target: EventTarget,
    pub timestamp_ms: u64,
    pub raw: RawEvent,
    pub propagation_stopped: Cell<bool>,
    pub immediate_stopped: Cell<bool>,
}

/// What a registered callback actually receives: a read-only view onto the
/// shared [`EventContext`], plus the element the propagation algorithm is
/// currently visiting and the delegate target a selector-scoped registration
/// matched against, if any.
pub struct WrappedEvent<'a> {
    pub(crate) ctx: &'a EventContext,
    pub(crate) payload: &'a EventPayload,
    pub(crate) current_target: EventTarget,
    pub(crate) delegate_target: Option<EventTarget>,
}

impl<'a> WrappedEvent<'a> {
    pub fn event_type(&self) -> EventType {
        self.ctx.event_type
    }

    pub fn modifiers(&self) -> Modifiers {
        self.ctx.modifiers
    }

    pub fn target(&self) -> EventTarget {
        self.ctx.original_target
    }

    /// The element the currently-running handler was registered on.
    pub fn current_target(&self) -> EventTarget {
        self.current_target
    }

    /// For a selector-scoped registration, the descendant of
    /// `current_target` that actually matched the selector.
    pub fn delegate_target(&self) -> Option<EventTarget> {
        self.delegate_target
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.ctx.timestamp_ms
    }

    pub fn payload(&self) -> &EventPayload {
        self.payload
    }

    pub fn prevent_default(&self) {
        self.ctx.raw.prevent_default();
    }

    pub fn default_prevented(&self) -> bool {
        self.ctx.raw.default_prevented()
    }

    /// Stops the event from reaching ancestors in the current phase, but
    /// lets remaining handlers at the current target still run.
    pub fn stop_propagation(&self) {
        self.ctx.propagation_stopped.set(true);
        self.ctx.raw.stop_propagation();
    }

    /// Stops propagation *and* skips any remaining handlers at the current
    /// target, including ones registered after this one.
    pub fn stop_immediate_propagation(&self) {
        self.ctx.propagation_stopped.set(true);
        self.ctx.immediate_stopped.set(true);
        self.ctx.raw.stop_immediate_propagation();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_event_prevent_default_is_a_no_op_when_not_cancelable() {
        let event = NativeEvent::new(false);
        event.prevent_default();
        assert!(!event.default_prevented());
    }

    #[test]
    fn native_event_records_prevent_default_when_cancelable() {
        let event = NativeEvent::new(true);
        event.prevent_default();
        assert!(event.default_prevented());
    }

    #[test]
    fn stop_immediate_propagation_also_sets_stop_propagation() {
        let event = NativeEvent::new(true);
        event.stop_immediate_propagation();
        assert!(event.propagation_stopped.get());
        assert!(event.immediate_stopped.get());
    }
}
