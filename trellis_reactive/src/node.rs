use std::{any::Any, cell::RefCell, rc::Rc};

slotmap::new_key_type! {
    /// A stable identity for one node in the dependency graph: a trigger, a
    /// signal-like observable key, a memo, or an effect.
    pub struct NodeId;
}

/// The lifecycle state of a graph node, ordered so that `Dirty >= Check` holds
/// and `update_if_necessary` can short-circuit a subtree that turns out clean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NodeState {
    /// No pending change; the cached value (if any) is valid.
    Clean,
    /// An upstream source changed state but it isn't yet known whether the
    /// value this node computes from it actually differs.
    Check,
    /// A source is known to have produced a new value; this node must rerun.
    Dirty,
    /// Like `Dirty`, but produced during the same `mark_dirty` traversal that
    /// marked a downstream effect, used to avoid revisiting a node twice in
    /// one DFS.
    DirtyMarked,
}

/// Something that can be (re-)computed: effects and memos both implement this,
/// differing only in whether their return value is observed by anyone.
pub trait Computation {
    /// Runs the computation, threading the previous cached value (if any)
    /// through so memoized functions can diff against it. Returns whether the
    /// value changed (memos use this to decide whether to mark their own
    /// subscribers dirty; effects always report `true` since they have no
    /// useful notion of "unchanged").
    fn run(&self, previous_value: Rc<RefCell<dyn Any>>) -> bool;
}

/// What kind of thing a [`NodeId`] refers to.
pub enum NodeKind {
    /// A bare dependency edge with no value of its own — the backing store
    /// for one [`crate::observable::ObservableKey`].
    Trigger,
    /// A memoized derivation; recomputed lazily via `update_if_necessary`.
    Memo { f: Rc<dyn Computation> },
    /// A side-effecting subscriber; recomputed eagerly during the next flush.
    Effect { f: Rc<dyn Computation> },
}

pub struct Node {
    pub value: Option<Rc<RefCell<dyn Any>>>,
    pub state: NodeState,
    pub kind: NodeKind,
    /// A human-readable label, purely for diagnostics and panic messages.
    pub label: &'static str,
}

impl Node {
    pub fn trigger(label: &'static str) -> Self {
        Self {
            value: None,
            state: NodeState::Clean,
            kind: NodeKind::Trigger,
            label,
        }
    }

    pub fn memo(label: &'static str, f: Rc<dyn Computation>, initial: Rc<RefCell<dyn Any>>) -> Self {
        Self {
            value: Some(initial),
            state: NodeState::Dirty,
            kind: NodeKind::Memo { f },
            label,
        }
    }

    pub fn effect(label: &'static str, f: Rc<dyn Computation>) -> Self {
        Self {
            value: None,
            state: NodeState::Dirty,
            kind: NodeKind::Effect { f },
            label,
        }
    }

    pub fn is_effect(&self) -> bool {
        matches!(self.kind, NodeKind::Effect { .. })
    }
}
