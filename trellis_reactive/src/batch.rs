//! `batch(fn)`: groups writes so their effects flush once, synchronously,
//! when `fn` returns — instead of once per write via the microtask queue.
//!
//! Nested `batch` calls are supported via a depth counter on [`crate::graph::Graph`]:
//! only the outermost call's return triggers a flush, and that flush happens
//! immediately rather than being handed to [`trellis_spawner::Scheduler`] —
//! ambient write scheduling always goes through a microtask, while an
//! explicit `batch` flushes synchronously once `fn` returns.

use crate::graph::with_graph;

/// Runs `f`, deferring any effect reruns triggered by writes inside it until
/// `f` returns, at which point they run synchronously (not via the
/// microtask queue). Safe to call from inside another `batch` or from
/// inside a running effect.
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    with_graph(|g| g.enter_batch());
    let result = f();
    with_graph(|g| g.exit_batch());
    result
}
