//! The Event Dispatcher: one native listener per event type at a configured
//! root, fanned out to registered handlers via a priority-ordered
//! capture/bubble walk of the propagation path.
//!
//! `Dispatcher<H>` itself holds no native listeners — that is
//! [`crate::engine::EventEngine`]'s job, since installing and tearing down a
//! real listener needs a live [`trellis_spawner::Scheduler`]-backed host and
//! outlives any single dispatch. This type is the pure, host-generic core:
//! given a target, an event type, and a raw event, it knows which handlers
//! should see it and in what order.

use std::panic::AssertUnwindSafe;
use std::rc::Rc;

use rustc_hash::FxHashSet;
use slotmap::SlotMap;
use thiserror::Error;
use trellis_dom::{DomHost, EventTarget, NodeId, Selector, SelectorError};
use trellis_log::{report, ErrorContext};

use crate::config::{EventConfig, EventType};
use crate::event::{EventContext, EventPayload, Modifiers, RawEvent, WrappedEvent};
use crate::handler::{HandlerId, HandlerRecord, OwnerGroupId, Phase, RegisterOptions};

/// Errors `register` can return. Everything else (duplicate unregister,
/// dispatch to a detached element) is a silent no-op: removal is idempotent
/// and a stale target is simply skipped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegisterError {
    #[error("invalid delegation selector: {0}")]
    InvalidSelector(#[from] SelectorError),
}

/// The host-generic registration table and propagation algorithm.
/// Constructed once per document/runtime and driven by [`crate::engine::EventEngine`].
pub struct Dispatcher<H: DomHost> {
    host: H,
    config: EventConfig,
    handlers: SlotMap<HandlerId, HandlerRecord>,
    index: crate::index::DelegationIndex,
    sequence: u64,
    created_at: std::time::Instant,
    peak_handler_count: usize,
    last_gc_timestamp_ms: Option<u64>,
    warning_count: u64,
}

impl<H: DomHost> Dispatcher<H> {
    pub fn new(host: H, config: EventConfig) -> Self {
        Self {
            host,
            config,
            handlers: SlotMap::with_key(),
            index: crate::index::DelegationIndex::default(),
            sequence: 0,
            created_at: std::time::Instant::now(),
            peak_handler_count: 0,
            last_gc_timestamp_ms: None,
            warning_count: 0,
        }
    }

    /// The highest [`Dispatcher::handler_count`] ever observed.
    pub fn peak_handler_count(&self) -> usize {
        self.peak_handler_count
    }

    /// Milliseconds since construction of this dispatcher's last completed
    /// governor pass, or `None` if [`Dispatcher::run_governor_pass`] has
    /// never run.
    pub fn last_gc_timestamp_ms(&self) -> Option<u64> {
        self.last_gc_timestamp_ms
    }

    /// Cumulative count of hot-element warnings emitted by `register`.
    pub fn warning_count(&self) -> u64 {
        self.warning_count
    }

    /// Records "now" (milliseconds since this dispatcher was constructed) as
    /// the governor's last completed pass. Called by
    /// [`crate::governor`]'s `run_governor_pass`.
    pub(crate) fn stamp_gc_timestamp(&mut self) {
        self.last_gc_timestamp_ms = Some(self.created_at.elapsed().as_millis() as u64);
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &EventConfig {
        &self.config
    }

    /// Whether any native listener is still needed for `event_type` — `true`
    /// once the last handler of that type is removed, at which point
    /// [`crate::engine::EventEngine`] tears its listener down.
    pub fn has_any_handler_for_type(&self, event_type: EventType) -> bool {
        self.index.has_any_handler_for_type(event_type)
    }

    /// Registers `callback` for `event_type` at `target`. Window-only event
    /// types are retargeted to [`EventTarget::Window`] regardless of what
    /// `target` was passed. Fails only if `options.selector` doesn't parse.
    pub fn register(
        &mut self,
        mut target: EventTarget,
        event_type: EventType,
        callback: impl Fn(&WrappedEvent) + 'static,
        options: RegisterOptions,
    ) -> Result<HandlerId, RegisterError> {
        if event_type.is_window_only() {
            target = EventTarget::Window;
        }
        let selector = options.selector.as_deref().map(Selector::parse).transpose()?;
        let phase = if options.capture { Phase::Capture } else { Phase::Bubble };
        self.sequence += 1;
        let sequence = self.sequence;

        let id = self.handlers.insert_with_key(|id| HandlerRecord {
            id,
            event_type,
            target,
            phase,
            once: options.once,
            priority: options.priority,
            selector,
            owner_group: options.owner_group,
            sequence,
            callback: Rc::new(callback),
        });
        self.index.insert(target, event_type, phase, id);
        self.peak_handler_count = self.peak_handler_count.max(self.handlers.len());

        if let Some(node) = target.as_node() {
            let count = self.index.handlers_at(target, event_type, phase).len()
                + self.index.handlers_at(target, event_type, other_phase(phase)).len();
            if count > self.config.max_handlers_per_element {
                self.warning_count += 1;
                trellis_log::warn!(
                    "element {:?} has accumulated {} handlers (limit {})",
                    node,
                    count,
                    self.config.max_handlers_per_element
                );
            }
        }

        Ok(id)
    }

    /// Removes one registration. Idempotent: removing an id twice, or one
    /// that never existed, is a no-op and returns `false` the second time.
    pub fn unregister(&mut self, id: HandlerId) -> bool {
        let Some(record) = self.handlers.remove(id) else {
            return false;
        };
        self.index.remove(record.target, record.event_type, record.phase, id);
        true
    }

    /// Removes every handler sharing `owner`. Returns how many were removed.
    pub fn unregister_by_owner(&mut self, owner: OwnerGroupId) -> usize {
        let ids: Vec<HandlerId> = self
            .handlers
            .iter()
            .filter(|(_, record)| record.owner_group == Some(owner))
            .map(|(id, _)| id)
            .collect();
        for id in &ids {
            self.unregister(*id);
        }
        ids.len()
    }

    /// Removes every handler attached directly to `target`. Called both as a
    /// public API and by the memory governor's detach sweep. Returns how
    /// many were removed.
    pub fn unregister_by_element(&mut self, target: EventTarget) -> usize {
        let ids: Vec<HandlerId> = self
            .handlers
            .iter()
            .filter(|(_, record)| record.target == target)
            .map(|(id, _)| id)
            .collect();
        for id in &ids {
            self.handlers.remove(*id);
        }
        self.index.remove_target(target);
        ids.len()
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    fn propagation_path(&mut self, from: NodeId) -> Vec<EventTarget> {
        if let Some(cached) = self.index.cached_propagation_path(from) {
            return cached.to_vec();
        }
        let path = self.host.propagation_path(from);
        self.index.cache_propagation_path(from, path.clone(), self.config.max_cache_size);
        path
    }

    fn resolve_delegate_target(&mut self, handler_target: EventTarget, selector: &Selector, from: NodeId) -> Option<EventTarget> {
        let root = handler_target.as_node()?;
        if let Some(cached) = self.index.cached_selector_match(from, handler_target) {
            return cached.map(EventTarget::Node);
        }
        let result = self.host.closest(from, selector, root);
        self.index.cache_selector_match(from, handler_target, result, self.config.max_cache_size);
        result.map(EventTarget::Node)
    }

    /// Runs the full capture-then-bubble propagation algorithm for a native
    /// event that originated at `origin`. `modifiers`/`payload` describe the
    /// event's typed data; `raw` is invoked for `preventDefault`/
    /// `stopPropagation` side effects.
    pub fn dispatch_now(&mut self, origin: NodeId, event_type: EventType, raw: RawEvent, modifiers: Modifiers, payload: EventPayload, timestamp_ms: u64) {
        if !self.host.node_exists(origin) {
            return;
        }
        let path = self.propagation_path(origin);
        let ctx = EventContext {
            event_type,
            modifiers,
            original_target: EventTarget::Node(origin),
            timestamp_ms,
            raw,
            propagation_stopped: std::cell::Cell::new(false),
            immediate_stopped: std::cell::Cell::new(false),
        };

        // Capture: window/document down to (but not including) the target.
        for &node in path.iter().rev() {
            if ctx.propagation_stopped.get() {
                break;
            }
            self.visit(node, event_type, Phase::Capture, origin, &ctx, &payload);
        }
        // Bubble: target up to window.
        if !ctx.propagation_stopped.get() {
            for &node in path.iter() {
                if ctx.propagation_stopped.get() {
                    break;
                }
                self.visit(node, event_type, Phase::Bubble, origin, &ctx, &payload);
            }
        }
    }

    fn visit(&mut self, current_target: EventTarget, event_type: EventType, phase: Phase, origin: NodeId, ctx: &EventContext, payload: &EventPayload) {
        let mut ids: Vec<HandlerId> = self.index.handlers_at(current_target, event_type, phase).to_vec();
        if ids.is_empty() {
            return;
        }
        ids.sort_by(|a, b| match (self.handlers.get(*a), self.handlers.get(*b)) {
            (Some(ra), Some(rb)) => rb.priority.cmp(&ra.priority).then(ra.sequence.cmp(&rb.sequence)),
            _ => std::cmp::Ordering::Equal,
        });

        // Snapshot everything a handler's invocation needs before resolving
        // delegate targets, since that resolution needs `&mut self` (it may
        // populate the selector-match cache) and can't run while an
        // `&HandlerRecord` borrow from `self.handlers` is still alive.
        struct Snapshot {
            id: HandlerId,
            callback: Rc<dyn Fn(&WrappedEvent)>,
            once: bool,
            has_selector: bool,
            target: EventTarget,
            selector: Option<Selector>,
        }
        let snapshots: Vec<Snapshot> = ids
            .into_iter()
            .filter_map(|id| {
                self.handlers.get(id).map(|r| Snapshot {
                    id,
                    callback: r.callback.clone(),
                    once: r.once,
                    has_selector: r.selector.is_some(),
                    target: r.target,
                    selector: r.selector.clone(),
                })
            })
            .collect();

        let mut fired_once: Vec<HandlerId> = Vec::new();
        for snapshot in snapshots {
            if ctx.immediate_stopped.get() {
                break;
            }
            let delegate_target = if snapshot.has_selector {
                match &snapshot.selector {
                    Some(selector) => self.resolve_delegate_target(snapshot.target, selector, origin),
                    None => None,
                }
            } else {
                Some(snapshot.target)
            };
            if snapshot.has_selector && delegate_target.is_none() {
                continue;
            }
            let callback = snapshot.callback;
            let once = snapshot.once;
            let id = snapshot.id;
            let wrapped = WrappedEvent {
                ctx,
                payload,
                current_target,
                delegate_target,
            };
            let result = std::panic::catch_unwind(AssertUnwindSafe(|| callback(&wrapped)));
            if let Err(payload) = result {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "handler panicked".to_string());
                report(message, ErrorContext::new("event-handler", event_type.as_str()));
            }
            if once {
                fired_once.push(id);
            }
        }
        for id in fired_once {
            self.unregister(id);
        }
    }

    /// Every distinct event type with at least one live handler, used by
    /// [`crate::engine::EventEngine`] to know which native listeners to keep
    /// installed.
    pub fn active_event_types(&self) -> FxHashSet<EventType> {
        self.handlers.values().map(|r| r.event_type).collect()
    }

    pub(crate) fn handler_targets(&self) -> FxHashSet<EventTarget> {
        self.handlers.values().map(|r| r.target).collect()
    }

    pub(crate) fn invalidate_caches(&mut self) {
        self.index.invalidate_caches();
    }

    pub(crate) fn cache_len(&self) -> usize {
        self.index.cache_len()
    }
}

fn other_phase(phase: Phase) -> Phase {
    match phase {
        Phase::Capture => Phase::Bubble,
        Phase::Bubble => Phase::Capture,
    }
}
