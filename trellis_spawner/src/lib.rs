//! Executor- and scheduler-independent task spawning and timing primitives.
//!
//! Trellis never picks an async runtime or a timing source for you. Instead it
//! exposes two small global registries that a host application initializes exactly
//! once at startup:
//!
//! - [`Executor`] spawns `Future`s (used by collaborator crates that need to await
//!   network or file I/O).
//! - [`Scheduler`] queues microtasks, animation frames, and interval/timeout
//!   callbacks (used by the reactive runtime's effect flush and by the event
//!   engine's frame coalescing).
//!
//! Both are registered as plain function pointers behind a `OnceLock`, mirroring
//! each other: call an `init_*` function once, and get `AlreadySet` if you call it
//! again. This makes it possible to run the exact same reactive/event code against
//! a real browser event loop or against a deterministic, hand-advanced fake clock
//! in tests.

mod executor;
mod scheduler;

pub use executor::{
    CustomExecutor, Executor, ExecutorError, PinnedFuture, PinnedLocalFuture,
};
pub use scheduler::{
    FrameId, IntervalId, Scheduler, SchedulerError, TimeoutId,
};
