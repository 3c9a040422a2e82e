//! `effect(fn)`: a side-effecting subscriber that reruns whenever any
//! observable it read on its last run changes.
//!
//! Grounded on the push-then-pull graph in [`crate::graph`]; an effect is
//! simply a [`crate::node::NodeKind::Effect`] node whose [`Computation::run`]
//! invokes the user's closure for side effect and always reports `true`
//! (effects have no "did the output change" notion of their own — see
//! `reactive_graph`'s own `Effect`, which makes the same call).

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::graph::{with_graph, NodeId};
use crate::node::{Computation, Node};
use crate::owner::own_current;

struct EffectBody<F>(RefCell<F>)
where
    F: FnMut() + 'static;

impl<F> Computation for EffectBody<F>
where
    F: FnMut() + 'static,
{
    fn run(&self, _previous: Rc<RefCell<dyn Any>>) -> bool {
        (self.0.borrow_mut())();
        true
    }
}

/// A handle to a running effect. Dropping this handle does *not* stop the
/// effect — call [`EffectHandle::dispose`], or let an enclosing
/// [`crate::owner::Owner`] do it for you. Disposal is always explicit;
/// nothing here runs a finalizer on drop.
pub struct EffectHandle {
    id: NodeId,
}

impl EffectHandle {
    /// Stops the effect: it is removed from the graph and will never run
    /// again, even if one of its former dependencies changes.
    pub fn dispose(&self) {
        with_graph(|g| g.dispose(self.id));
    }
}

/// Creates and immediately runs an effect. `f` is re-run, synchronously
/// during the microtask flush (or immediately inside an active [`crate::batch`]),
/// whenever any observable read during its previous run changes.
///
/// A panic inside `f` is caught and reported through [`trellis_log::report`];
/// the effect is left active so a later write still triggers another run.
pub fn effect(f: impl FnMut() + 'static) -> EffectHandle {
    let body = Rc::new(EffectBody(RefCell::new(f)));
    let id = with_graph(|g| {
        let id = g.insert(Node::effect("effect", body));
        g.update_if_necessary(id);
        id
    });
    own_current({
        move || with_graph(|g| g.dispose(id))
    });
    EffectHandle { id }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observable::observable;

    #[test]
    fn effect_runs_once_immediately() {
        let runs = Rc::new(RefCell::new(0));
        let runs2 = runs.clone();
        let handle = effect(move || *runs2.borrow_mut() += 1);
        assert_eq!(*runs.borrow(), 1);
        handle.dispose();
    }

    #[test]
    fn effect_reruns_synchronously_inside_a_batch() {
        let count = observable(0_i32);
        let runs = Rc::new(RefCell::new(Vec::new()));
        let runs2 = runs.clone();
        let count2 = count.clone();
        let handle = effect(move || runs2.borrow_mut().push(count2.get()));
        crate::batch::batch(|| {
            count.set(1);
            count.set(2);
        });
        assert_eq!(*runs.borrow(), vec![0, 2]);
        handle.dispose();
    }

    #[test]
    fn disposed_effect_never_reruns() {
        let count = observable(0_i32);
        let runs = Rc::new(RefCell::new(0));
        let runs2 = runs.clone();
        let count2 = count.clone();
        let handle = effect(move || {
            count2.get();
            *runs2.borrow_mut() += 1;
        });
        handle.dispose();
        crate::batch::batch(|| count.set(1));
        assert_eq!(*runs.borrow(), 1);
    }
}
