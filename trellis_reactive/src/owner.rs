//! Ownership groups: the disposal mechanism shared by effects, computeds, and
//! the event dispatcher's handler registrations.
//!
//! An [`Owner`] is nothing more than a bag of disposer closures collected
//! while it is the "current" owner. Creating an effect or computed while an
//! owner is active registers that node's disposer with it, so tearing the
//! owner down (`teardown_owner`) disposes every node it accumulated, in the
//! order they were created. This mirrors the arena-based ownership
//! `reactive_graph` builds around `Owner`, simplified to a flat, non-nested
//! grouping.

use std::cell::RefCell;
use std::rc::Rc;

thread_local! {
    static CURRENT: RefCell<Vec<Owner>> = const { RefCell::new(Vec::new()) };
}

/// A disposer group. Cloning an `Owner` shares the same underlying bag of
/// disposers — there is exactly one logical owner per `Owner` value, clones
/// just let it be held in more than one place.
#[derive(Clone, Default)]
pub struct Owner {
    disposers: Rc<RefCell<Vec<Box<dyn FnOnce()>>>>,
}

impl Owner {
    /// Creates a fresh, empty owner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a disposer to run when this owner is torn down. A no-op if
    /// the owner has already been disposed.
    pub fn own(&self, disposer: impl FnOnce() + 'static) {
        self.disposers.borrow_mut().push(Box::new(disposer));
    }

    /// Runs every registered disposer, in creation order, and clears the
    /// owner so it can be reused (or simply dropped).
    pub fn dispose(&self) {
        let disposers = std::mem::take(&mut *self.disposers.borrow_mut());
        for disposer in disposers {
            disposer();
        }
    }

    /// Runs `f` with `self` as the current owner: any effect/computed created
    /// by `f` registers its disposer here instead of with whatever owner (if
    /// any) was current before.
    pub fn with<R>(&self, f: impl FnOnce() -> R) -> R {
        CURRENT.with(|stack| stack.borrow_mut().push(self.clone()));
        let result = f();
        CURRENT.with(|stack| {
            stack.borrow_mut().pop();
        });
        result
    }
}

/// Registers `disposer` with the current owner, if any. Called by
/// [`crate::effect::effect`] and [`crate::computed::computed`] so their nodes
/// get torn down automatically when an enclosing [`Owner`] is disposed; a
/// no-op when created outside of any `Owner::with` scope (the caller is then
/// responsible for calling the handle's own `.dispose()`).
pub(crate) fn own_current(disposer: impl FnOnce() + 'static) {
    CURRENT.with(|stack| {
        if let Some(owner) = stack.borrow().last() {
            owner.own(disposer);
        }
    });
}

/// Disposes every effect and computed owned by `owner`, scoped to whichever
/// [`Owner`] value the caller held on to.
pub fn teardown_owner(owner: &Owner) {
    owner.dispose();
}
