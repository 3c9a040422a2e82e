//! The Memory Governor: periodic upkeep that reclaims state the dispatcher
//! would otherwise accumulate forever — handlers left on elements that have
//! since been detached, and memoization caches that grow without bound.
//!
//! None of this changes dispatch semantics; every method here is safe to
//! skip for a run or two; it only affects how much memory the dispatcher
//! is holding onto at any given moment. [`crate::engine::EventEngine`] drives
//! it off a [`trellis_spawner::Scheduler::set_interval`] tick.

use trellis_dom::DomHost;

use crate::dispatcher::Dispatcher;

impl<H: DomHost> Dispatcher<H> {
    /// Removes every handler whose target element is no longer connected to
    /// the document. Returns how many handlers were reclaimed.
    ///
    /// A detached-but-not-yet-removed element (see
    /// [`trellis_dom::Document::detach`]) can still be reattached, so this is
    /// a genuine leak risk only once nothing reattaches it — which is exactly
    /// why this runs on an interval rather than being driven eagerly by
    /// detachment itself.
    pub fn sweep_detached(&mut self) -> usize {
        let targets: Vec<_> = self
            .handler_targets()
            .into_iter()
            .filter(|target| match target.as_node() {
                Some(node) => !self.host().node_exists(node) || !self.host().is_connected(node),
                None => false,
            })
            .collect();
        let mut reclaimed = 0;
        for target in targets {
            reclaimed += self.unregister_by_element(target);
        }
        reclaimed
    }

    /// Drops the selector-match and propagation-path caches once their
    /// combined size passes [`crate::config::EventConfig::max_cache_size`].
    /// Returns `true` if a clear happened.
    pub fn enforce_cache_bound(&mut self) -> bool {
        if self.cache_len() > self.config().max_cache_size {
            self.invalidate_caches();
            true
        } else {
            false
        }
    }

    /// Runs one governor pass: a detach sweep followed by a cache-bound
    /// check. Returns how many handlers were reclaimed. Stamps
    /// [`Dispatcher::last_gc_timestamp_ms`] regardless of whether anything
    /// was actually reclaimed, since a no-op pass still proves the governor
    /// is alive.
    pub fn run_governor_pass(&mut self) -> usize {
        let reclaimed = self.sweep_detached();
        self.enforce_cache_bound();
        self.stamp_gc_timestamp();
        reclaimed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EventConfig;
    use crate::handler::RegisterOptions;
    use trellis_dom::{Document, EventTarget};

    #[test]
    fn sweep_detached_removes_handlers_on_unreachable_elements() {
        let mut doc = Document::new("body");
        let row = doc.create_element("div");
        doc.append_child(doc.root(), row);
        let mut dispatcher = Dispatcher::new(doc, EventConfig::default());
        dispatcher
            .register(EventTarget::Node(row), crate::config::EventType::Click, |_| {}, RegisterOptions::default())
            .unwrap();
        assert_eq!(dispatcher.handler_count(), 1);

        dispatcher.host_mut().detach(row);
        let reclaimed = dispatcher.sweep_detached();
        assert_eq!(reclaimed, 1);
        assert_eq!(dispatcher.handler_count(), 0);
    }

    #[test]
    fn sweep_detached_leaves_connected_elements_alone() {
        let mut doc = Document::new("body");
        let row = doc.create_element("div");
        doc.append_child(doc.root(), row);
        let mut dispatcher = Dispatcher::new(doc, EventConfig::default());
        dispatcher
            .register(EventTarget::Node(row), crate::config::EventType::Click, |_| {}, RegisterOptions::default())
            .unwrap();

        assert_eq!(dispatcher.sweep_detached(), 0);
        assert_eq!(dispatcher.handler_count(), 1);
    }

    #[test]
    fn enforce_cache_bound_clears_once_past_the_configured_size() {
        let doc = Document::new("body");
        let mut config = EventConfig::default();
        config.max_cache_size = 0;
        let mut dispatcher = Dispatcher::new(doc, config);
        assert!(!dispatcher.enforce_cache_bound(), "an empty cache at the bound should not report a clear");
    }

    #[test]
    fn a_governor_pass_stamps_the_last_gc_timestamp() {
        let doc = Document::new("body");
        let mut dispatcher = Dispatcher::new(doc, EventConfig::default());
        assert!(dispatcher.last_gc_timestamp_ms().is_none());
        dispatcher.run_governor_pass();
        assert!(dispatcher.last_gc_timestamp_ms().is_some());
    }

    #[test]
    fn peak_handler_count_does_not_fall_back_after_unregistration() {
        let mut doc = Document::new("body");
        let row = doc.create_element("div");
        doc.append_child(doc.root(), row);
        let mut dispatcher = Dispatcher::new(doc, EventConfig::default());
        let a = dispatcher
            .register(EventTarget::Node(row), crate::config::EventType::Click, |_| {}, RegisterOptions::default())
            .unwrap();
        dispatcher
            .register(EventTarget::Node(row), crate::config::EventType::MouseDown, |_| {}, RegisterOptions::default())
            .unwrap();
        assert_eq!(dispatcher.peak_handler_count(), 2);
        dispatcher.unregister(a);
        assert_eq!(dispatcher.handler_count(), 1);
        assert_eq!(dispatcher.peak_handler_count(), 2, "peak must survive a later unregister");
    }
}
