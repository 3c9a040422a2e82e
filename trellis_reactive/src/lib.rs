//! The reactive state engine: dependency-tracking observables, batched
//! effects, lazy computed values, and scoped teardown.
//!
//! Built on a push-then-pull dependency graph ([`graph`]) that is
//! structurally the same algorithm `reactive_graph` uses for signals and
//! effects, generalized to this crate's own vocabulary:
//!
//! - [`observable`]/[`observable_vec`] wrap a value so reads during an active
//!   effect or computed record a dependency edge, and writes notify it.
//! - [`effect`] runs a closure once immediately and again, batched through a
//!   microtask (via [`trellis_spawner::Scheduler`]), whenever a dependency
//!   changes.
//! - [`computed`] is a lazy, cached derivation; it only recomputes when read
//!   and a dependency has actually changed.
//! - [`watch`] diffs a source's value across changes, handing the callback
//!   both the new and previous value.
//! - [`batch`] groups several writes so their effects flush once,
//!   synchronously, instead of once per write via the microtask queue.
//! - [`Owner`]/[`teardown_owner`] give every effect and computed created
//!   inside a scope a single point of bulk disposal — the same mechanism
//!   the event engine's handler registrations tear down through.

pub mod batch;
pub mod computed;
pub mod effect;
pub(crate) mod graph;
pub(crate) mod node;
pub mod observable;
pub mod owner;
pub mod watch;

pub use batch::batch;
pub use computed::{computed, Computed};
pub use effect::{effect, EffectHandle};
pub use graph::NodeId;
pub use observable::{is_observable, observable, observable_vec, IsObservable, Observable, ObservableVec};
pub use owner::{teardown_owner, Owner};
pub use watch::watch;
