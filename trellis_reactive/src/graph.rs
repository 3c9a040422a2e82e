//! The dependency graph: a push-then-pull mark-and-sweep over [`Node`]s,
//! identical in shape to the graph that backs `reactive_graph`'s signals and
//! effects. Triggers back [`crate::observable::Observable`] property reads,
//! memos back [`crate::computed::Computed`], and a bare effect node backs
//! [`crate::effect::Effect`].
//!
//! A write marks the written trigger's direct subscribers `Dirty` and walks
//! the rest of the reachable subgraph as `Check` (push phase). Reading a
//! memo, or flushing a pending effect, walks back down resolving `Check`
//! nodes into either `Clean` (no source actually changed) or `Dirty`
//! (recompute) — the pull phase. This two-phase scheme is what lets a
//! diamond dependency (`a -> b, a -> c, b+c -> d`) run `d` exactly once per
//! write to `a`, rather than once per incoming edge.
//!
//! The graph is `thread_local`: the reactive core is single-threaded and
//! cooperative (see the concurrency model), so there is exactly one graph
//! per thread, constructed lazily on first use.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexSet;
use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::SlotMap;

use trellis_log::{report, ErrorContext};
use trellis_spawner::Scheduler;

use crate::node::{Computation, Node, NodeKind, NodeState};

pub use crate::node::NodeId;

thread_local! {
    static GRAPH: Graph = Graph::new();
}

/// Runs `f` with shared access to the thread's dependency graph.
pub(crate) fn with_graph<R>(f: impl FnOnce(&Graph) -> R) -> R {
    GRAPH.with(f)
}

pub(crate) struct Graph {
    nodes: RefCell<SlotMap<NodeId, Node>>,
    sources: RefCell<FxHashMap<NodeId, FxHashSet<NodeId>>>,
    subscribers: RefCell<FxHashMap<NodeId, FxHashSet<NodeId>>>,
    /// Stack of (node being recomputed, dependencies collected so far). The
    /// top frame is "the current effect".
    observer_stack: RefCell<Vec<(NodeId, FxHashSet<NodeId>)>>,
    /// Effects due to run, in the order they were first marked dirty. A
    /// `IndexSet` gives us "insertion order, no duplicates" for free.
    pending: RefCell<IndexSet<NodeId>>,
    flush_scheduled: RefCell<bool>,
    batch_depth: RefCell<u32>,
}

impl Graph {
    fn new() -> Self {
        Self {
            nodes: RefCell::new(SlotMap::with_key()),
            sources: RefCell::new(FxHashMap::default()),
            subscribers: RefCell::new(FxHashMap::default()),
            observer_stack: RefCell::new(Vec::new()),
            pending: RefCell::new(IndexSet::default()),
            flush_scheduled: RefCell::new(false),
            batch_depth: RefCell::new(0),
        }
    }

    pub(crate) fn insert(&self, node: Node) -> NodeId {
        self.nodes.borrow_mut().insert(node)
    }

    pub(crate) fn is_alive(&self, id: NodeId) -> bool {
        self.nodes.borrow().contains_key(id)
    }

    /// The currently-running effect or memo, if any observable read right
    /// now should record a dependency edge.
    pub(crate) fn current_observer(&self) -> Option<NodeId> {
        self.observer_stack.borrow().last().map(|(id, _)| *id)
    }

    /// Records that `source` was read while `current_observer()` was
    /// running. A no-op outside of any effect/memo run (an untracked read).
    pub(crate) fn record_read(&self, source: NodeId) {
        if let Some((_, deps)) = self.observer_stack.borrow_mut().last_mut() {
            deps.insert(source);
        }
    }

    /// Reads a memo's cached value, recomputing first if necessary. Also
    /// records a dependency edge from the current observer onto `id`, so a
    /// memo transitively propagates invalidation to whatever reads it.
    pub(crate) fn track_and_pull(&self, id: NodeId) {
        self.record_read(id);
        self.update_if_necessary(id);
    }

    /// Current cached value of a node, as a shared, type-erased cell. Panics
    /// if the node has no value yet, which should not happen for a memo that
    /// has just been pulled.
    pub(crate) fn value(&self, id: NodeId) -> Option<Rc<RefCell<dyn Any>>> {
        self.nodes.borrow().get(id).and_then(|n| n.value.clone())
    }

    /// Writes a fresh value directly into a node's cell (used by observables,
    /// which are not themselves graph nodes but keep their trigger node's
    /// `value` slot unused — memos are the only nodes that store a value
    /// here). Exposed for computed initialization.
    pub(crate) fn set_value(&self, id: NodeId, value: Rc<RefCell<dyn Any>>) {
        if let Some(node) = self.nodes.borrow_mut().get_mut(id) {
            node.value = Some(value);
        }
    }

    pub(crate) fn label(&self, id: NodeId) -> &'static str {
        self.nodes.borrow().get(id).map(|n| n.label).unwrap_or("disposed")
    }

    // ---- push phase -------------------------------------------------

    /// Call when an observable property changes. Marks every direct
    /// subscriber `Dirty` and walks the rest of the dependent subgraph as
    /// `Check`.
    pub(crate) fn notify_write(&self, trigger: NodeId) {
        let direct: Vec<NodeId> = self
            .subscribers
            .borrow()
            .get(&trigger)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();
        for sub in direct {
            self.mark_dirty(sub);
        }
        self.maybe_schedule_flush();
    }

    fn mark_dirty(&self, id: NodeId) {
        let already_dirty = {
            let mut nodes = self.nodes.borrow_mut();
            match nodes.get_mut(id) {
                Some(node) => {
                    let was_dirty = node.state == NodeState::Dirty;
                    node.state = NodeState::Dirty;
                    was_dirty
                }
                None => return,
            }
        };
        self.enqueue_if_effect(id);
        if already_dirty {
            return;
        }
        let subs: Vec<NodeId> = self
            .subscribers
            .borrow()
            .get(&id)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();
        for sub in subs {
            self.mark_check(sub);
        }
    }

    fn mark_check(&self, id: NodeId) {
        let should_continue = {
            let mut nodes = self.nodes.borrow_mut();
            match nodes.get_mut(id) {
                Some(node) if node.state == NodeState::Clean => {
                    node.state = NodeState::Check;
                    true
                }
                _ => false,
            }
        };
        if !should_continue {
            return;
        }
        self.enqueue_if_effect(id);
        let subs: Vec<NodeId> = self
            .subscribers
            .borrow()
            .get(&id)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();
        for sub in subs {
            self.mark_check(sub);
        }
    }

    fn enqueue_if_effect(&self, id: NodeId) {
        let is_effect = self.nodes.borrow().get(id).map(|n| n.is_effect()).unwrap_or(false);
        if is_effect {
            self.pending.borrow_mut().insert(id);
        }
    }

    // ---- pull phase ---------------------------------------------------

    /// Resolves a `Check`/`Dirty` node into an up-to-date `Clean` state,
    /// recomputing it if (transitively) necessary. Returns whether the
    /// node's value actually changed on this pass.
    pub(crate) fn update_if_necessary(&self, id: NodeId) -> bool {
        let state = self.nodes.borrow().get(id).map(|n| n.state);
        match state {
            None | Some(NodeState::Clean) => false,
            Some(NodeState::Dirty) | Some(NodeState::DirtyMarked) => self.recompute(id),
            Some(NodeState::Check) => {
                let sources: Vec<NodeId> =
                    self.sources.borrow().get(&id).map(|s| s.iter().copied().collect()).unwrap_or_default();
                let mut any_changed = false;
                for source in sources {
                    if self.update_if_necessary(source) {
                        any_changed = true;
                        break;
                    }
                }
                if any_changed {
                    if let Some(node) = self.nodes.borrow_mut().get_mut(id) {
                        node.state = NodeState::Dirty;
                    }
                    self.recompute(id)
                } else {
                    if let Some(node) = self.nodes.borrow_mut().get_mut(id) {
                        node.state = NodeState::Clean;
                    }
                    false
                }
            }
        }
    }

    fn recompute(&self, id: NodeId) -> bool {
        // Replace dependency edges wholesale: detach from every old source
        // before re-running, so a stale branch not taken this run leaves no
        // dangling subscription behind.
        if let Some(old_sources) = self.sources.borrow_mut().remove(&id) {
            let mut subscribers = self.subscribers.borrow_mut();
            for source in old_sources {
                if let Some(subs) = subscribers.get_mut(&source) {
                    subs.remove(&id);
                }
            }
        }

        let (computation, previous, is_effect) = {
            let nodes = self.nodes.borrow();
            let Some(node) = nodes.get(id) else { return false };
            let (f, is_effect) = match &node.kind {
                NodeKind::Memo { f } => (f.clone(), false),
                NodeKind::Effect { f } => (f.clone(), true),
                NodeKind::Trigger => return false,
            };
            let previous = node
                .value
                .clone()
                .unwrap_or_else(|| Rc::new(RefCell::new(())) as Rc<RefCell<dyn Any>>);
            (f, previous, is_effect)
        };

        self.observer_stack.borrow_mut().push((id, FxHashSet::default()));
        let label = self.label(id);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| computation.run(previous)));
        let (_, new_sources) = self
            .observer_stack
            .borrow_mut()
            .pop()
            .expect("observer stack frame pushed above must still be on top");

        // Dependency edges are committed even on a panicking run: whatever
        // was read before the panic is still a real dependency, and without
        // it a retry could be missed entirely.
        for source in &new_sources {
            self.subscribers.borrow_mut().entry(*source).or_default().insert(id);
        }
        self.sources.borrow_mut().insert(id, new_sources);

        match result {
            Ok(changed) => {
                if let Some(node) = self.nodes.borrow_mut().get_mut(id) {
                    node.state = NodeState::Clean;
                }
                changed
            }
            Err(payload) if is_effect => {
                // Handler/effect exceptions are caught and reported; the
                // effect stays active so a later write gives it another run.
                let message = panic_message(&payload);
                report(message, ErrorContext::new("effect", label));
                if let Some(node) = self.nodes.borrow_mut().get_mut(id) {
                    node.state = NodeState::Clean;
                }
                false
            }
            Err(payload) => {
                // A computed that throws propagates to the reader and stays
                // dirty, so the next read retries the getter from scratch.
                if let Some(node) = self.nodes.borrow_mut().get_mut(id) {
                    node.state = NodeState::Dirty;
                }
                std::panic::resume_unwind(payload);
            }
        }
    }

    // ---- batching / flush ----------------------------------------------

    pub(crate) fn enter_batch(&self) {
        *self.batch_depth.borrow_mut() += 1;
    }

    pub(crate) fn exit_batch(&self) {
        let mut depth = self.batch_depth.borrow_mut();
        *depth = depth.saturating_sub(1);
        if *depth == 0 {
            drop(depth);
            self.flush();
        }
    }

    fn maybe_schedule_flush(&self) {
        if *self.batch_depth.borrow() > 0 {
            return;
        }
        if self.pending.borrow().is_empty() {
            return;
        }
        let mut scheduled = self.flush_scheduled.borrow_mut();
        if *scheduled {
            return;
        }
        *scheduled = true;
        Scheduler::queue_microtask(|| with_graph(|g| g.flush()));
    }

    /// Drains the pending-effect set in insertion order. Effects that enqueue
    /// further effects while running (e.g. a `batch` nested inside an
    /// effect) are appended and run within the same flush.
    fn flush(&self) {
        loop {
            let next = {
                let mut pending = self.pending.borrow_mut();
                pending.shift_remove_index(0)
            };
            let Some(id) = next else { break };
            if !self.is_alive(id) {
                continue;
            }
            self.update_if_necessary(id);
        }
        *self.flush_scheduled.borrow_mut() = false;
    }

    // ---- disposal --------------------------------------------------

    /// Tears an effect or memo down: detaches it from every source and
    /// subscriber edge, drops it from the pending-flush set if present, and
    /// removes its slotmap entry so the `NodeId` becomes permanently dead.
    pub(crate) fn dispose(&self, id: NodeId) {
        self.pending.borrow_mut().shift_remove(&id);
        if let Some(sources) = self.sources.borrow_mut().remove(&id) {
            let mut subscribers = self.subscribers.borrow_mut();
            for source in sources {
                if let Some(subs) = subscribers.get_mut(&source) {
                    subs.remove(&id);
                }
            }
        }
        if let Some(subs) = self.subscribers.borrow_mut().remove(&id) {
            let mut sources = self.sources.borrow_mut();
            for sub in subs {
                if let Some(srcs) = sources.get_mut(&sub) {
                    srcs.remove(&id);
                }
            }
        }
        self.nodes.borrow_mut().remove(id);
    }
}

fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panicked with a non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Count(Rc<Cell<u32>>);
    impl Computation for Count {
        fn run(&self, _previous: Rc<RefCell<dyn Any>>) -> bool {
            self.0.set(self.0.get() + 1);
            true
        }
    }

    #[test]
    fn diamond_dependency_runs_sink_once() {
        with_graph(|g| {
            let trigger = g.insert(Node::trigger("a"));
            // b and c both "depend on" trigger by virtue of being in its
            // subscriber set directly (simulating two memos reading `a`).
            let runs = Rc::new(Cell::new(0));
            let sink = g.insert(Node::effect("d", Rc::new(Count(runs.clone()))));
            g.subscribers.borrow_mut().entry(trigger).or_default().insert(sink);
            g.sources.borrow_mut().entry(sink).or_default().insert(trigger);

            g.notify_write(trigger);
            g.flush();
            assert_eq!(runs.get(), 1);
        });
    }

    #[test]
    fn dispose_removes_from_pending_before_flush() {
        with_graph(|g| {
            let trigger = g.insert(Node::trigger("a"));
            let runs = Rc::new(Cell::new(0));
            let effect = g.insert(Node::effect("e", Rc::new(Count(runs.clone()))));
            g.subscribers.borrow_mut().entry(trigger).or_default().insert(effect);
            g.sources.borrow_mut().entry(effect).or_default().insert(trigger);

            g.notify_write(trigger);
            g.dispose(effect);
            g.flush();
            assert_eq!(runs.get(), 0, "disposed effect must not run even if it was pending");
        });
    }
}
