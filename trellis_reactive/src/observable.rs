//! `observable(initial)`: the mutable, trackable leaf of the dependency
//! graph — every read/write of application state ultimately goes through one
//! of these.
//!
//! State is modeled as deeply-reactive objects/arrays in the spirit of
//! Vue's `reactive()`, but implemented here as two concrete,
//! explicitly-typed wrappers rather than a generic per-key proxy:
//! [`Observable<T>`] for a single value and [`ObservableVec<T>`] for a list,
//! each owning its own trigger [`NodeId`]s in [`crate::graph`]. A
//! struct with several reactive fields is simply several `Observable<T>`
//! fields — there is no reflection-based "make every field reactive" step,
//! matching how `reactive_graph` itself favors explicit `RwSignal` fields
//! over a proxy object.

use std::cell::RefCell;
use std::rc::Rc;

use crate::graph::{with_graph, NodeId};
use crate::node::Node;

/// A single reactive value.
pub struct Observable<T> {
    id: NodeId,
    value: Rc<RefCell<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            value: self.value.clone(),
        }
    }
}

impl<T: Clone + 'static> Observable<T> {
    /// Reads the current value, recording a dependency edge onto the current
    /// effect/computed (if any is running).
    pub fn get(&self) -> T {
        with_graph(|g| g.record_read(self.id));
        self.value.borrow().clone()
    }

    /// Runs `f` with a reference to the current value, without cloning it
    /// and without recording a dependency edge — the untracked-read escape
    /// hatch every fine-grained reactive system needs for the rare case
    /// where a read should not create a subscription.
    pub fn peek<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }
}

impl<T: PartialEq + 'static> Observable<T> {
    /// Overwrites the value and notifies subscribers, but only if the new
    /// value differs from the old one by `PartialEq` — writing the same
    /// value back is a no-op, matching how a computed's own equality check
    /// avoids redundant downstream work.
    pub fn set(&self, value: T) {
        let changed = {
            let mut slot = self.value.borrow_mut();
            if *slot == value {
                false
            } else {
                *slot = value;
                true
            }
        };
        if changed {
            with_graph(|g| g.notify_write(self.id));
        }
    }

    /// Mutates the value in place via `f`, then notifies subscribers
    /// unconditionally (since `f` may have made a change that `PartialEq`
    /// alone can't cheaply detect, e.g. mutating behind a `Vec`'s indices).
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.value.borrow_mut());
        with_graph(|g| g.notify_write(self.id));
    }
}

/// Wraps `initial` in a fresh reactive cell.
pub fn observable<T: 'static>(initial: T) -> Observable<T> {
    let id = with_graph(|g| g.insert(Node::trigger("observable")));
    Observable {
        id,
        value: Rc::new(RefCell::new(initial)),
    }
}

/// A reactive list. Exposed as a small, explicit API (rather than
/// `Deref<Target = Vec<T>>`) so every mutation has an obvious point to
/// notify subscribers from — see the module doc for why this isn't a
/// generic proxy.
pub struct ObservableVec<T> {
    id: NodeId,
    items: Rc<RefCell<Vec<T>>>,
}

impl<T> Clone for ObservableVec<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            items: self.items.clone(),
        }
    }
}

impl<T: Clone + 'static> ObservableVec<T> {
    /// Snapshots the whole list, recording a dependency edge.
    pub fn get(&self) -> Vec<T> {
        with_graph(|g| g.record_read(self.id));
        self.items.borrow().clone()
    }

    /// Current length, recording a dependency edge.
    pub fn len(&self) -> usize {
        with_graph(|g| g.record_read(self.id));
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push(&self, item: T) {
        self.items.borrow_mut().push(item);
        with_graph(|g| g.notify_write(self.id));
    }

    /// Removes and returns the item at `index`, notifying subscribers.
    /// Panics if `index` is out of bounds, matching `Vec::remove`.
    pub fn remove(&self, index: usize) -> T {
        let item = self.items.borrow_mut().remove(index);
        with_graph(|g| g.notify_write(self.id));
        item
    }

    /// Replaces the whole backing list and notifies subscribers.
    pub fn set(&self, items: Vec<T>) {
        *self.items.borrow_mut() = items;
        with_graph(|g| g.notify_write(self.id));
    }
}

/// Creates an empty reactive list.
pub fn observable_vec<T: 'static>(initial: Vec<T>) -> ObservableVec<T> {
    let id = with_graph(|g| g.insert(Node::trigger("observable_vec")));
    ObservableVec {
        id,
        items: Rc::new(RefCell::new(initial)),
    }
}

/// A marker trait implemented by [`Observable`] and [`ObservableVec`], so
/// `isObservable`-style call sites can be written generically. Exposed as a
/// function rather than `dyn Any` downcasting, since both wrapper types
/// already know statically that they are reactive.
pub trait IsObservable {
    /// Always `true` for these wrapper types; exists purely so an
    /// `isObservable(x)`-style check reads naturally as `x.is_observable()`
    /// against a generic `T: MaybeObservable` bound at call sites that don't
    /// know ahead of time whether `x` is wrapped.
    fn is_observable(&self) -> bool {
        true
    }
}

impl<T> IsObservable for Observable<T> {}
impl<T> IsObservable for ObservableVec<T> {}

/// Mirrors a framework-level `isObservable(x)` check. Since every reactive
/// wrapper here is its own concrete, statically-known type rather than a
/// value that might or might not be proxied at runtime, this is trivially
/// `true` for anything that implements [`IsObservable`] — the check has
/// already been made by the type checker at the call site.
pub fn is_observable(x: &impl IsObservable) -> bool {
    x.is_observable()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_current_value() {
        let count = observable(41_i32);
        assert_eq!(count.get(), 41);
        count.set(42);
        assert_eq!(count.get(), 42);
    }

    #[test]
    fn set_with_equal_value_does_not_notify() {
        let count = observable(1_i32);
        let count2 = count.clone();
        let runs = Rc::new(RefCell::new(0));
        let runs2 = runs.clone();
        let handle = crate::effect::effect(move || {
            count2.get();
            *runs2.borrow_mut() += 1;
        });
        assert_eq!(*runs.borrow(), 1);
        crate::batch::batch(|| count.set(1));
        assert_eq!(*runs.borrow(), 1, "setting the same value must not rerun subscribers");
        handle.dispose();
    }

    #[test]
    fn observable_vec_push_and_remove_notify() {
        let list = observable_vec(vec![1, 2, 3]);
        let list2 = list.clone();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen2 = seen.clone();
        let handle = crate::effect::effect(move || seen2.borrow_mut().push(list2.len()));
        assert_eq!(*seen.borrow(), vec![3]);

        crate::batch::batch(|| list.push(4));
        assert_eq!(*seen.borrow(), vec![3, 4]);

        crate::batch::batch(|| {
            list.remove(0);
        });
        assert_eq!(*seen.borrow(), vec![3, 4, 3]);
        handle.dispose();
    }

    #[test]
    fn peek_does_not_create_a_dependency() {
        let count = observable(1_i32);
        let count2 = count.clone();
        let runs = Rc::new(RefCell::new(0));
        let runs2 = runs.clone();
        let handle = crate::effect::effect(move || {
            count2.peek(|v| *v);
            *runs2.borrow_mut() += 1;
        });
        assert_eq!(*runs.borrow(), 1);
        crate::batch::batch(|| count.set(2));
        assert_eq!(*runs.borrow(), 1, "peek must not subscribe the effect");
        handle.dispose();
    }
}
