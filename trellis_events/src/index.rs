//! The Delegation Index: the lookup structure that turns "an event of type
//! `T` reached element `E`" into "which handlers, in what order, should
//! run" without rescanning every registration on every dispatch.
//!
//! Three views are kept over the same set of [`HandlerId`]s:
//! - `by_target_and_type` — the handlers actually attached at a given
//!   [`EventTarget`] for a given [`EventType`], split by [`Phase`].
//! - `selector_match_cache` — memoizes `closest()` resolution for
//!   (element, selector) pairs so repeated dispatches to the same element
//!   don't re-walk the tree; invalidated wholesale on any DOM mutation the
//!   host reports, since a stale hit would silently misroute an event.
//! - `propagation_path_cache` — memoizes the ancestor path for a target,
//!   under the same invalidation rule.
//!
//! Both caches are bounded by [`crate::config::EventConfig::max_cache_size`]
//! and are pure memoization: dropping them loses no correctness, only some
//! recomputation, which is exactly what lets the memory governor reclaim
//! them under pressure.

use rustc_hash::FxHashMap;
use trellis_dom::{EventTarget, NodeId};

use crate::config::EventType;
use crate::handler::{HandlerId, Phase};

#[derive(Default)]
pub(crate) struct DelegationIndex {
    by_target_and_type: FxHashMap<(EventTarget, EventType, Phase), Vec<HandlerId>>,
    selector_match_cache: FxHashMap<(NodeId, EventTarget), Option<NodeId>>,
    propagation_path_cache: FxHashMap<NodeId, Vec<EventTarget>>,
}

impl DelegationIndex {
    pub fn insert(&mut self, target: EventTarget, event_type: EventType, phase: Phase, id: HandlerId) {
        self.by_target_and_type.entry((target, event_type, phase)).or_default().push(id);
    }

    pub fn remove(&mut self, target: EventTarget, event_type: EventType, phase: Phase, id: HandlerId) {
        let key = (target, event_type, phase);
        if let Some(ids) = self.by_target_and_type.get_mut(&key) {
            ids.retain(|&existing| existing != id);
            if ids.is_empty() {
                self.by_target_and_type.remove(&key);
            }
        }
    }

    pub fn handlers_at(&self, target: EventTarget, event_type: EventType, phase: Phase) -> &[HandlerId] {
        self.by_target_and_type
            .get(&(target, event_type, phase))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether any handler of `event_type`, in either phase, is registered
    /// anywhere — used to decide whether a native listener is still needed
    /// at all for that type.
    pub fn has_any_handler_for_type(&self, event_type: EventType) -> bool {
        self.by_target_and_type
            .keys()
            .any(|(_, ty, _)| *ty == event_type)
    }

    pub fn cached_selector_match(&self, from: NodeId, target: EventTarget) -> Option<Option<NodeId>> {
        self.selector_match_cache.get(&(from, target)).copied()
    }

    pub fn cache_selector_match(&mut self, from: NodeId, target: EventTarget, result: Option<NodeId>, max_size: usize) {
        if self.selector_match_cache.len() >= max_size {
            self.selector_match_cache.clear();
        }
        self.selector_match_cache.insert((from, target), result);
    }

    pub fn cached_propagation_path(&self, from: NodeId) -> Option<&[EventTarget]> {
        self.propagation_path_cache.get(&from).map(Vec::as_slice)
    }

    pub fn cache_propagation_path(&mut self, from: NodeId, path: Vec<EventTarget>, max_size: usize) {
        if self.propagation_path_cache.len() >= max_size {
            self.propagation_path_cache.clear();
        }
        self.propagation_path_cache.insert(from, path);
    }

    /// Drops both memoization caches wholesale. Called whenever the host
    /// reports a structural DOM mutation (a node detached or removed), since
    /// a targeted invalidation would need to track every cache entry that
    /// could mention the affected subtree — clearing is cheap and correct.
    pub fn invalidate_caches(&mut self) {
        self.selector_match_cache.clear();
        self.propagation_path_cache.clear();
    }

    pub fn cache_len(&self) -> usize {
        self.selector_match_cache.len() + self.propagation_path_cache.len()
    }

    /// Drops every index entry referring to `target`, used by
    /// `unregisterByElement` and by the governor's detach sweep.
    pub fn remove_target(&mut self, target: EventTarget) {
        self.by_target_and_type.retain(|(t, _, _), _| *t != target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn handlers_at_respects_phase_and_type() {
        let mut ids: SlotMap<HandlerId, ()> = SlotMap::with_key();
        let a = ids.insert(());
        let b = ids.insert(());
        let mut index = DelegationIndex::default();
        let target = EventTarget::Document;
        index.insert(target, EventType::Click, Phase::Bubble, a);
        index.insert(target, EventType::Click, Phase::Capture, b);

        assert_eq!(index.handlers_at(target, EventType::Click, Phase::Bubble), &[a]);
        assert_eq!(index.handlers_at(target, EventType::Click, Phase::Capture), &[b]);
        assert!(index.handlers_at(target, EventType::Scroll, Phase::Bubble).is_empty());
    }

    #[test]
    fn removing_last_handler_for_a_type_clears_has_any_handler() {
        let mut ids: SlotMap<HandlerId, ()> = SlotMap::with_key();
        let a = ids.insert(());
        let mut index = DelegationIndex::default();
        let target = EventTarget::Document;
        index.insert(target, EventType::Click, Phase::Bubble, a);
        assert!(index.has_any_handler_for_type(EventType::Click));

        index.remove(target, EventType::Click, Phase::Bubble, a);
        assert!(!index.has_any_handler_for_type(EventType::Click));
    }

    #[test]
    fn selector_match_cache_evicts_wholesale_past_its_bound() {
        let mut index = DelegationIndex::default();
        let mut docs: SlotMap<NodeId, ()> = SlotMap::with_key();
        let n1 = docs.insert(());
        let n2 = docs.insert(());
        index.cache_selector_match(n1, EventTarget::Document, Some(n1), 1);
        assert_eq!(index.cache_len(), 1);
        index.cache_selector_match(n2, EventTarget::Document, Some(n2), 1);
        assert_eq!(index.cache_len(), 1, "bound of 1 must evict the prior entry before inserting");
    }
}
