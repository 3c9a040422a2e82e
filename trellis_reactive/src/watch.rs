//! `watch(source, cb)`: runs `cb(new, old)` whenever `source` produces a
//! different value, without being re-run itself for unrelated reads the way a
//! plain [`crate::effect::effect`] would be.
//!
//! Implemented as an effect over `source` whose body does nothing but track
//! dependencies and diff against the previous snapshot; `cb` itself runs
//! outside of the tracking scope, so reads inside `cb` do not silently grow
//! the watch's dependency set (matching `reactive_graph`'s own `watch`, which
//! separates "what is tracked" from "what runs on change").

use std::cell::RefCell;
use std::rc::Rc;

use crate::effect::{effect, EffectHandle};

/// Subscribes `cb` to changes in `source`. `source` is called once
/// immediately to establish a baseline and its dependencies, but `cb` itself
/// is not invoked for that baseline run; after that, any write that changes
/// `source`'s result re-runs `source` and, if the new value differs from the
/// last one by `PartialEq`, calls `cb(new_value, old_value)`.
///
/// Returns a handle whose `dispose()` stops the watch, mirroring
/// [`crate::effect::EffectHandle`].
pub fn watch<T>(
    mut source: impl FnMut() -> T + 'static,
    mut cb: impl FnMut(&T, Option<&T>) + 'static,
) -> EffectHandle
where
    T: PartialEq + 'static,
{
    let previous: Rc<RefCell<Option<T>>> = Rc::new(RefCell::new(None));
    effect(move || {
        let next = source();
        let mut slot = previous.borrow_mut();
        let is_baseline_run = slot.is_none();
        let changed = slot.as_ref() != Some(&next);
        if changed && !is_baseline_run {
            cb(&next, slot.as_ref());
        }
        *slot = Some(next);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observable::observable;
    use std::cell::RefCell;

    #[test]
    fn watch_does_not_fire_for_the_baseline_run() {
        let count = observable(1_i32);
        let seen: Rc<RefCell<Vec<(i32, Option<i32>)>>> = Rc::new(RefCell::new(Vec::new()));
        let seen2 = seen.clone();
        let count2 = count.clone();
        let handle = watch(move || count2.get(), move |new, old| seen2.borrow_mut().push((*new, old.copied())));
        assert!(seen.borrow().is_empty(), "establishing the baseline dependency must not invoke the callback");
        handle.dispose();
    }

    #[test]
    fn watch_receives_old_and_new_value_on_change() {
        let count = observable(1_i32);
        let seen: Rc<RefCell<Vec<(i32, Option<i32>)>>> = Rc::new(RefCell::new(Vec::new()));
        let seen2 = seen.clone();
        let count2 = count.clone();
        let handle = watch(move || count2.get(), move |new, old| seen2.borrow_mut().push((*new, old.copied())));

        crate::batch::batch(|| count.set(5));
        assert_eq!(*seen.borrow(), vec![(5, Some(1))]);
        handle.dispose();
    }

    #[test]
    fn watch_does_not_fire_when_source_value_is_unchanged() {
        let count = observable(1_i32);
        let runs = Rc::new(RefCell::new(0));
        let runs2 = runs.clone();
        let count2 = count.clone();
        let handle = watch(move || count2.get(), move |_, _| *runs2.borrow_mut() += 1);
        assert_eq!(*runs.borrow(), 0);

        crate::batch::batch(|| count.set(1));
        assert_eq!(*runs.borrow(), 0, "setting the same value must not invoke the watch callback");
        handle.dispose();
    }

    #[test]
    fn disposed_watch_never_fires_again() {
        let count = observable(1_i32);
        let runs = Rc::new(RefCell::new(0));
        let runs2 = runs.clone();
        let count2 = count.clone();
        let handle = watch(move || count2.get(), move |_, _| *runs2.borrow_mut() += 1);
        handle.dispose();
        crate::batch::batch(|| count.set(2));
        assert_eq!(*runs.borrow(), 0);
    }
}
