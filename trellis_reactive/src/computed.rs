//! `computed(getter)`: a lazily-memoized derived value.
//!
//! A [`Computed`] is a [`crate::node::NodeKind::Memo`] node. Unlike an
//! effect it is never eagerly scheduled: it only recomputes when
//! [`Computed::get`] is called and the graph's pull phase
//! (`update_if_necessary`) finds it `Dirty` or `Check`-resolving-to-changed.
//! Its [`Computation::run`] diffs the new value against the previous cached
//! one with `PartialEq` so that an unchanged memo doesn't needlessly mark
//! *its* subscribers dirty — the same "equality check before propagating"
//! trick `reactive_graph`'s memos use.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::graph::{with_graph, NodeId};
use crate::node::{Computation, Node};
use crate::owner::own_current;

struct ComputedBody<T, F>(RefCell<F>)
where
    F: FnMut() -> T + 'static;

impl<T, F> Computation for ComputedBody<T, F>
where
    T: PartialEq + 'static,
    F: FnMut() -> T + 'static,
{
    fn run(&self, previous_value: Rc<RefCell<dyn Any>>) -> bool {
        let next = (self.0.borrow_mut())();
        let mut slot = previous_value.borrow_mut();
        let previous = slot.downcast_mut::<Option<T>>().expect("computed cell has wrong type");
        let changed = previous.as_ref() != Some(&next);
        *previous = Some(next);
        changed
    }
}

/// A memoized derivation of other observables/computeds. Cheap to clone —
/// clones share the same underlying graph node.
pub struct Computed<T> {
    id: NodeId,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T: PartialEq + Clone + 'static> Computed<T> {
    /// Reads the memoized value, recomputing the getter first if any of its
    /// dependencies changed since the last read. Also records a dependency
    /// edge if called from within a running effect or another computed.
    pub fn get(&self) -> T {
        with_graph(|g| {
            g.track_and_pull(self.id);
            let cell = g.value(self.id).expect("computed node missing its value cell");
            let value = cell.borrow();
            value
                .downcast_ref::<Option<T>>()
                .and_then(|o| o.clone())
                .expect("computed has not produced a value yet")
        })
    }

    /// Stops this computed from ever recomputing again.
    pub fn dispose(&self) {
        with_graph(|g| g.dispose(self.id));
    }
}

/// Creates a lazily-evaluated, memoized derivation. The getter is not run
/// until the first [`Computed::get`] call.
///
/// A panic inside `getter` propagates to the caller of `get` and leaves the
/// computed `Dirty`, so the very next `get` retries the getter from scratch
/// rather than caching the panic.
pub fn computed<T>(getter: impl FnMut() -> T + 'static) -> Computed<T>
where
    T: PartialEq + Clone + 'static,
{
    let body = Rc::new(ComputedBody(RefCell::new(getter)));
    let initial: Rc<RefCell<dyn Any>> = Rc::new(RefCell::new(Option::<T>::None));
    let id = with_graph(|g| g.insert(Node::memo("computed", body, initial)));
    own_current(move || with_graph(|g| g.dispose(id)));
    Computed {
        id,
        _marker: std::marker::PhantomData,
    }
}
