//! The closed set of event types the dispatcher understands, and the
//! configuration knobs that shape registration, filtering, and cleanup.
//!
//! The event-type set is deliberately a fixed, closed enumeration rather
//! than an arbitrary string — `register` fails fast on anything outside it,
//! rather than silently installing a listener for a typo'd event name.

use std::time::Duration;

use rustc_hash::FxHashSet;

/// Every event type the dispatcher knows how to install a native listener
/// for, plus the window-only lifecycle/connectivity events that only ever
/// make sense on `window` (mouse, keyboard, focus, input, paste, touch,
/// drag, scroll, resize, context-menu, wheel, history, window lifecycle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Click,
    DblClick,
    MouseDown,
    MouseUp,
    MouseMove,
    MouseEnter,
    MouseLeave,
    MouseOver,
    MouseOut,
    KeyDown,
    KeyUp,
    KeyPress,
    Focus,
    Blur,
    FocusIn,
    FocusOut,
    Input,
    Change,
    Submit,
    Paste,
    TouchStart,
    TouchMove,
    TouchEnd,
    TouchCancel,
    DragStart,
    DragOver,
    DragEnter,
    DragLeave,
    Drag,
    DragEnd,
    Drop,
    Scroll,
    Resize,
    ContextMenu,
    Wheel,
    PopState,
    HashChange,
    /// Fires once, on `window`, after the document and all resources load.
    Load,
    /// `window`'s `beforeunload`, the last chance to warn about unsaved state.
    BeforeUnload,
    /// `window`'s `online` — network connectivity regained.
    Online,
    /// `window`'s `offline` — network connectivity lost.
    Offline,
    /// `document`'s `visibilitychange`, fired on `window` here since only
    /// window-scoped listeners make sense for it.
    VisibilityChange,
    /// `window`'s `storage`, fired when another document changes local/session storage.
    Storage,
    /// `window`'s `message`, used for cross-document messaging.
    Message,
}

impl EventType {
    /// The native event name, exactly as the host's `addEventListener` (or
    /// this crate's [`crate::event::NativeEvent`] stand-in) expects it.
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Click => "click",
            EventType::DblClick => "dblclick",
            EventType::MouseDown => "mousedown",
            EventType::MouseUp => "mouseup",
            EventType::MouseMove => "mousemove",
            EventType::MouseEnter => "mouseenter",
            EventType::MouseLeave => "mouseleave",
            EventType::MouseOver => "mouseover",
            EventType::MouseOut => "mouseout",
            EventType::KeyDown => "keydown",
            EventType::KeyUp => "keyup",
            EventType::KeyPress => "keypress",
            EventType::Focus => "focus",
            EventType::Blur => "blur",
            EventType::FocusIn => "focusin",
            EventType::FocusOut => "focusout",
            EventType::Input => "input",
            EventType::Change => "change",
            EventType::Submit => "submit",
            EventType::Paste => "paste",
            EventType::TouchStart => "touchstart",
            EventType::TouchMove => "touchmove",
            EventType::TouchEnd => "touchend",
            EventType::TouchCancel => "touchcancel",
            EventType::DragStart => "dragstart",
            EventType::DragOver => "dragover",
            EventType::DragEnter => "dragenter",
            EventType::DragLeave => "dragleave",
            EventType::Drag => "drag",
            EventType::DragEnd => "dragend",
            EventType::Drop => "drop",
            EventType::Scroll => "scroll",
            EventType::Resize => "resize",
            EventType::ContextMenu => "contextmenu",
            EventType::Wheel => "wheel",
            EventType::PopState => "popstate",
            EventType::HashChange => "hashchange",
            EventType::Load => "load",
            EventType::BeforeUnload => "beforeunload",
            EventType::Online => "online",
            EventType::Offline => "offline",
            EventType::VisibilityChange => "visibilitychange",
            EventType::Storage => "storage",
            EventType::Message => "message",
        }
    }

    /// Whether this type only ever makes sense bound to `window` — a
    /// registration for one of these is silently retargeted there regardless
    /// of what element the caller passed.
    pub fn is_window_only(self) -> bool {
        matches!(
            self,
            EventType::Load
                | EventType::BeforeUnload
                | EventType::Online
                | EventType::Offline
                | EventType::VisibilityChange
                | EventType::Storage
                | EventType::Message
        )
    }
}

/// Configuration for one [`crate::engine::EventEngine`]. Constructed once by
/// the host and passed in at `EventEngine::new`.
#[derive(Debug, Clone)]
pub struct EventConfig {
    /// How often the memory governor's detach sweep and cache-bound check run.
    pub cleanup_interval: Duration,
    /// Per-type admission-gate ceiling: at most this many dispatches per
    /// second for types not in [`EventConfig::high_frequency_events`].
    pub max_throttle_rate: f64,
    /// Default quiescence window for [`crate::filter::debounce`].
    pub debounce_wait: Duration,
    /// A diagnostic warning is emitted once an element accumulates more than
    /// this many handlers.
    pub max_handlers_per_element: usize,
    /// Once the selector-match cache (or the other per-target caches) grows
    /// past roughly this many entries, the governor discards them; they are
    /// pure memoization and rebuild lazily.
    pub max_cache_size: usize,
    /// Event types exempt from the admission-gate throttle (still subject to
    /// frame coalescing if also listed in [`EventConfig::coalesced_events`]).
    pub high_frequency_events: FxHashSet<EventType>,
    /// Event types collapsed to one dispatch per animation frame.
    pub coalesced_events: FxHashSet<EventType>,
    /// Event types registered non-passive, so `preventDefault` is honored.
    /// Every other type is registered passive for scroll-performance.
    pub non_passive_events: FxHashSet<EventType>,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            cleanup_interval: Duration::from_secs(10),
            max_throttle_rate: 60.0,
            debounce_wait: Duration::from_millis(200),
            max_handlers_per_element: 50,
            max_cache_size: 2_000,
            high_frequency_events: [
                EventType::Scroll,
                EventType::Resize,
                EventType::MouseMove,
                EventType::TouchMove,
                EventType::DragOver,
            ]
            .into_iter()
            .collect(),
            coalesced_events: [
                EventType::Scroll,
                EventType::Resize,
                EventType::MouseMove,
                EventType::TouchMove,
                EventType::DragOver,
            ]
            .into_iter()
            .collect(),
            non_passive_events: [
                EventType::Click,
                EventType::Submit,
                EventType::KeyDown,
                EventType::KeyUp,
                EventType::KeyPress,
                EventType::TouchStart,
                EventType::TouchMove,
                EventType::Wheel,
                EventType::DragStart,
                EventType::DragOver,
                EventType::DragEnter,
                EventType::DragLeave,
                EventType::Drop,
                EventType::Paste,
            ]
            .into_iter()
            .collect(),
        }
    }
}

impl EventConfig {
    /// Whether `ty`'s native listener should be registered non-passive.
    pub fn is_non_passive(&self, ty: EventType) -> bool {
        self.non_passive_events.contains(&ty)
    }

    /// Whether `ty` is exempt from the per-type admission-gate throttle.
    pub fn is_high_frequency(&self, ty: EventType) -> bool {
        self.high_frequency_events.contains(&ty)
    }

    /// Whether `ty` is collapsed to one dispatch per animation frame.
    pub fn is_coalesced(&self, ty: EventType) -> bool {
        self.coalesced_events.contains(&ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_only_types_are_a_closed_subset() {
        assert!(EventType::Load.is_window_only());
        assert!(EventType::Storage.is_window_only());
        assert!(!EventType::Click.is_window_only());
        assert!(!EventType::Scroll.is_window_only());
    }

    #[test]
    fn default_config_matches_the_specified_coalescing_set() {
        let config = EventConfig::default();
        assert!(config.is_coalesced(EventType::Scroll));
        assert!(config.is_coalesced(EventType::MouseMove));
        assert!(!config.is_coalesced(EventType::Click));
    }
}
