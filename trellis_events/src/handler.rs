//! The registration record every `register` call produces, and the small
//! value types ([`HandlerId`], [`Phase`], [`OwnerGroupId`]) that identify and
//! describe it.

use std::rc::Rc;

use slotmap::new_key_type;
use trellis_dom::EventTarget;

use crate::config::EventType;
use crate::event::WrappedEvent;

new_key_type! {
    /// Identifies one registration, returned by `register` and accepted by
    /// `unregister`. Stable for the lifetime of the registration; never
    /// reused while the handler is live, and safe to hold onto after it has
    /// been removed (lookups simply fail).
    pub struct HandlerId;
}

/// The propagation phase a handler was registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Capture,
    Bubble,
}

/// A caller-supplied grouping token, opaque to the dispatcher. Typically one
/// per component instance or logical scope; `unregisterByOwner` removes
/// every handler sharing one in a single call. The dispatcher never
/// allocates these itself — callers mint their own (e.g. a counter, or by
/// reusing a [`trellis_reactive`](../trellis_reactive/index.html)-style owner id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerGroupId(pub u64);

/// Optional knobs for one `register` call. `..Default::default()` gives
/// bubble-phase, non-once, default-passive, priority-zero, ungrouped,
/// unscoped behavior.
#[derive(Clone, Default)]
pub struct RegisterOptions {
    /// Listen during the capture phase instead of bubble.
    pub capture: bool,
    /// Automatically unregister after the first invocation.
    pub once: bool,
    /// Overrides the engine's per-type passive default. `None` defers to
    /// [`crate::config::EventConfig::is_non_passive`].
    pub passive: Option<bool>,
    /// Handlers at the same target and phase run in descending priority
    /// order; ties preserve registration order.
    pub priority: i32,
    /// Groups this registration for bulk removal via `unregisterByOwner`.
    pub owner_group: Option<OwnerGroupId>,
    /// Restricts the handler to elements matching this selector at or below
    /// the registration target, resolved via `closest()`-style delegation.
    pub selector: Option<String>,
}

/// One live registration: what to call, where, when, and under what limits.
pub(crate) struct HandlerRecord {
    pub id: HandlerId,
    pub event_type: EventType,
    pub target: EventTarget,
    pub phase: Phase,
    pub once: bool,
    pub priority: i32,
    pub selector: Option<trellis_dom::Selector>,
    pub owner_group: Option<OwnerGroupId>,
    /// Monotonic registration sequence, used to break priority ties in
    /// insertion order regardless of slotmap key reuse.
    pub sequence: u64,
    pub callback: Rc<dyn Fn(&WrappedEvent)>,
}
