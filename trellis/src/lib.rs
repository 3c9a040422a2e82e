//! Trellis: a browser-side UI core built from two tightly coupled engines.
//!
//! - [`trellis_events`] delegates native DOM events through a single
//!   listener per event type, a priority-ordered capture/bubble propagation
//!   algorithm, throttling and frame coalescing, and a periodic memory
//!   governor.
//! - [`trellis_reactive`] tracks dependencies on observable state, batches
//!   effect re-runs through a microtask, and caches lazy computed values.
//!
//! Everything else — a form engine, a router, a modal manager, a chart
//! renderer — is an external collaborator: it consumes a [`Core`] and the
//! reactive primitives without the core needing to know it exists.
//!
//! [`core`] packages both engines behind one value a host constructs once,
//! and [`scope`] bundles the reactive and event-handler halves of teardown
//! into a single disposable unit. [`prelude`] re-exports the public surface
//! most call sites need.

pub mod core;
pub mod prelude;
pub mod scope;

pub use core::Core;
pub use scope::Scope;

pub use trellis_events::{EventConfig, EventType, RegisterOptions};
pub use trellis_reactive::{batch, computed, effect, observable, observable_vec, watch};
