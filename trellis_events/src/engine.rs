//! `EventEngine<H>`: the cloneable handle applications actually hold.
//!
//! [`crate::dispatcher::Dispatcher`] is the pure registration-table-plus-
//! propagation-algorithm core; this wraps it in `Rc<RefCell<_>>` so the
//! admission gate, the frame coalescer, and the governor's interval can all
//! capture a handle back into it and call back in later, the way a real
//! browser integration needs to (an animation-frame callback or an interval
//! tick necessarily runs after the call that scheduled it returns). One
//! `EventEngine` value is constructed once by the host and cloned wherever a
//! collaborator needs it, rather than living behind a thread-local.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use trellis_dom::{DomHost, NodeId};

use crate::config::{EventConfig, EventType};
use crate::diagnostics::Diagnostics;
use crate::dispatcher::{Dispatcher, RegisterError};
use crate::event::{EventPayload, Modifiers, RawEvent, WrappedEvent};
use crate::filter::AdmissionGate;
use crate::handler::{HandlerId, OwnerGroupId, RegisterOptions};

struct CoalescedDispatch {
    origin: NodeId,
    raw: RawEvent,
    modifiers: Modifiers,
    payload: EventPayload,
    timestamp_ms: u64,
}

struct Inner<H: DomHost> {
    dispatcher: Dispatcher<H>,
    admission: AdmissionGate,
    coalesced: IndexMap<EventType, CoalescedDispatch>,
    frame_scheduled: bool,
    governor_interval: Option<trellis_spawner::IntervalId>,
}

/// The public entry point for installing handlers and feeding native events
/// through filtering, coalescing, and propagation.
pub struct EventEngine<H: DomHost + 'static> {
    inner: Rc<RefCell<Inner<H>>>,
}

impl<H: DomHost> Clone for EventEngine<H> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<H: DomHost + 'static> EventEngine<H> {
    pub fn new(host: H, config: EventConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                dispatcher: Dispatcher::new(host, config),
                admission: AdmissionGate::default(),
                coalesced: IndexMap::new(),
                frame_scheduled: false,
                governor_interval: None,
            })),
        }
    }

    pub fn register(
        &self,
        target: trellis_dom::EventTarget,
        event_type: EventType,
        callback: impl Fn(&WrappedEvent) + 'static,
        options: RegisterOptions,
    ) -> Result<HandlerId, RegisterError> {
        self.inner.borrow_mut().dispatcher.register(target, event_type, callback, options)
    }

    pub fn unregister(&self, id: HandlerId) -> bool {
        self.inner.borrow_mut().dispatcher.unregister(id)
    }

    pub fn unregister_by_owner(&self, owner: OwnerGroupId) -> usize {
        self.inner.borrow_mut().dispatcher.unregister_by_owner(owner)
    }

    pub fn unregister_by_element(&self, target: trellis_dom::EventTarget) -> usize {
        self.inner.borrow_mut().dispatcher.unregister_by_element(target)
    }

    /// Runs the full filter-then-dispatch pipeline for a native event that
    /// just arrived at `origin`. Coalesced types are stashed and replayed at
    /// most once per animation frame; everything else passes through the
    /// admission gate immediately.
    pub fn dispatch_native(&self, origin: NodeId, event_type: EventType, raw: RawEvent, modifiers: Modifiers, payload: EventPayload, now_ms: u64) {
        let is_coalesced = self.inner.borrow().dispatcher.config().is_coalesced(event_type);
        if is_coalesced {
            self.stash_for_next_frame(origin, event_type, raw, modifiers, payload, now_ms);
            return;
        }

        let admitted = {
            let mut inner = self.inner.borrow_mut();
            let exempt = inner.dispatcher.config().is_high_frequency(event_type);
            let max_rate = inner.dispatcher.config().max_throttle_rate;
            inner.admission.admit(event_type, now_ms, exempt, max_rate)
        };
        if !admitted {
            return;
        }
        self.inner.borrow_mut().dispatcher.dispatch_now(origin, event_type, raw, modifiers, payload, now_ms);
    }

    fn stash_for_next_frame(&self, origin: NodeId, event_type: EventType, raw: RawEvent, modifiers: Modifiers, payload: EventPayload, now_ms: u64) {
        let mut inner = self.inner.borrow_mut();
        inner.coalesced.insert(
            event_type,
            CoalescedDispatch {
                origin,
                raw,
                modifiers,
                payload,
                timestamp_ms: now_ms,
            },
        );
        if inner.frame_scheduled {
            return;
        }
        inner.frame_scheduled = true;
        let engine = self.clone();
        trellis_spawner::Scheduler::request_animation_frame(move || engine.flush_coalesced());
    }

    fn flush_coalesced(&self) {
        let due: Vec<(EventType, CoalescedDispatch)> = {
            let mut inner = self.inner.borrow_mut();
            inner.frame_scheduled = false;
            std::mem::take(&mut inner.coalesced).into_iter().collect()
        };
        for (event_type, dispatch) in due {
            self.inner.borrow_mut().dispatcher.dispatch_now(
                dispatch.origin,
                event_type,
                dispatch.raw,
                dispatch.modifiers,
                dispatch.payload,
                dispatch.timestamp_ms,
            );
        }
    }

    /// Starts the periodic detach sweep and cache-bound check on
    /// [`crate::config::EventConfig::cleanup_interval`]. Idempotent: calling
    /// this twice replaces the previous interval rather than stacking a
    /// second one.
    pub fn start_governor(&self) {
        let interval = self.inner.borrow().dispatcher.config().cleanup_interval;
        let engine = self.clone();
        let id = trellis_spawner::Scheduler::set_interval(
            move || {
                engine.inner.borrow_mut().dispatcher.run_governor_pass();
            },
            interval,
        );
        let previous = self.inner.borrow_mut().governor_interval.replace(id);
        if let Some(previous) = previous {
            trellis_spawner::Scheduler::clear_interval(previous);
        }
    }

    pub fn stop_governor(&self) {
        if let Some(id) = self.inner.borrow_mut().governor_interval.take() {
            trellis_spawner::Scheduler::clear_interval(id);
        }
    }

    /// Responds to a host-reported structural mutation — a subtree removed
    /// from the document, as a real `MutationObserver` callback would
    /// report. Schedules a microtask rather than reclaiming immediately: a
    /// detach followed by a reattach of the same node within one task (an
    /// element move) must not lose its handlers, so the check is deferred
    /// until the task that performed the mutation has finished running.
    pub fn notify_subtree_removed(&self, root: NodeId) {
        let engine = self.clone();
        trellis_spawner::Scheduler::queue_microtask(move || {
            let mut inner = engine.inner.borrow_mut();
            let still_removed = {
                let host = inner.dispatcher.host();
                !host.node_exists(root) || !host.is_connected(root)
            };
            if still_removed {
                inner.dispatcher.sweep_detached();
                inner.dispatcher.invalidate_caches();
            }
        });
    }

    pub fn diagnostics(&self) -> Diagnostics {
        let inner = self.inner.borrow();
        Diagnostics {
            handler_count: inner.dispatcher.handler_count(),
            active_listener_count: inner.dispatcher.active_event_types().len(),
            cache_entry_count: inner.dispatcher.cache_len(),
            filtered_per_type: inner.admission.clone_counts(),
            total_filtered: inner.admission.total_filtered(),
            peak_handler_count: inner.dispatcher.peak_handler_count(),
            last_gc_timestamp_ms: inner.dispatcher.last_gc_timestamp_ms(),
            warning_count: inner.dispatcher.warning_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::NativeEvent;
    use std::cell::RefCell as StdRefCell;
    use trellis_dom::{Document, EventTarget};

    #[test]
    fn coalesced_events_dispatch_once_per_frame_with_the_latest_value() {
        let mut doc = Document::new("body");
        let button = doc.create_element("button");
        doc.append_child(doc.root(), button);
        let engine = EventEngine::new(doc, EventConfig::default());

        let seen = Rc::new(StdRefCell::new(0));
        let seen2 = seen.clone();
        engine
            .register(EventTarget::Node(button), EventType::Scroll, move |_| *seen2.borrow_mut() += 1, RegisterOptions::default())
            .unwrap();

        engine.dispatch_native(button, EventType::Scroll, RawEvent::Native(NativeEvent::new(false)), Modifiers::default(), EventPayload::Generic, 0);
        engine.dispatch_native(button, EventType::Scroll, RawEvent::Native(NativeEvent::new(false)), Modifiers::default(), EventPayload::Generic, 1);
        engine.dispatch_native(button, EventType::Scroll, RawEvent::Native(NativeEvent::new(false)), Modifiers::default(), EventPayload::Generic, 2);
        assert_eq!(*seen.borrow(), 0, "a coalesced type must not dispatch before the frame ticks");

        trellis_spawner::Scheduler::run_animation_frame();
        assert_eq!(*seen.borrow(), 1, "three coalesced arrivals in one frame must collapse to a single dispatch");
    }

    #[test]
    fn non_coalesced_high_rate_events_are_throttled_by_the_admission_gate() {
        let mut doc = Document::new("body");
        let button = doc.create_element("button");
        doc.append_child(doc.root(), button);
        let mut config = EventConfig::default();
        config.max_throttle_rate = 10.0;
        let engine = EventEngine::new(doc, config);

        let seen = Rc::new(StdRefCell::new(0));
        let seen2 = seen.clone();
        engine
            .register(EventTarget::Node(button), EventType::Click, move |_| *seen2.borrow_mut() += 1, RegisterOptions::default())
            .unwrap();

        engine.dispatch_native(button, EventType::Click, RawEvent::Native(NativeEvent::new(false)), Modifiers::default(), EventPayload::Generic, 0);
        engine.dispatch_native(button, EventType::Click, RawEvent::Native(NativeEvent::new(false)), Modifiers::default(), EventPayload::Generic, 10);
        assert_eq!(*seen.borrow(), 1);
        assert_eq!(engine.diagnostics().total_filtered, 1);
    }

    #[test]
    fn governor_interval_reclaims_detached_handlers_over_time() {
        let mut doc = Document::new("body");
        let row = doc.create_element("div");
        doc.append_child(doc.root(), row);
        let engine = EventEngine::new(doc, EventConfig::default());
        engine
            .register(EventTarget::Node(row), EventType::Click, |_| {}, RegisterOptions::default())
            .unwrap();
        assert_eq!(engine.diagnostics().handler_count, 1);

        engine.inner.borrow_mut().dispatcher.host_mut().detach(row);
        engine.start_governor();
        trellis_spawner::Scheduler::advance(std::time::Duration::from_secs(10));
        assert_eq!(engine.diagnostics().handler_count, 0);
        engine.stop_governor();
    }

    #[test]
    fn notify_subtree_removed_reclaims_handlers_once_the_microtask_runs() {
        let mut doc = Document::new("body");
        let row = doc.create_element("div");
        doc.append_child(doc.root(), row);
        let engine = EventEngine::new(doc, EventConfig::default());
        engine
            .register(EventTarget::Node(row), EventType::Click, |_| {}, RegisterOptions::default())
            .unwrap();
        assert_eq!(engine.diagnostics().handler_count, 1);

        engine.inner.borrow_mut().dispatcher.host_mut().detach(row);
        engine.notify_subtree_removed(row);
        assert_eq!(engine.diagnostics().handler_count, 0, "the fake scheduler runs microtasks inline");
    }

    #[test]
    fn notify_subtree_removed_is_a_no_op_if_the_node_was_reattached_before_the_microtask_runs() {
        let mut doc = Document::new("body");
        let row = doc.create_element("div");
        doc.append_child(doc.root(), row);
        let engine = EventEngine::new(doc, EventConfig::default());
        engine
            .register(EventTarget::Node(row), EventType::Click, |_| {}, RegisterOptions::default())
            .unwrap();

        // Simulate a move: detach then reattach within the same task, before
        // any microtask has had a chance to run.
        {
            let mut inner = engine.inner.borrow_mut();
            inner.dispatcher.host_mut().detach(row);
            let root = inner.dispatcher.host().root();
            inner.dispatcher.host_mut().append_child(root, row);
        }
        engine.notify_subtree_removed(row);
        assert_eq!(engine.diagnostics().handler_count, 1, "a same-task reattach must not lose the handler");
    }
}
