//! The event delegation engine: one native listener per event type, fanned
//! out through a priority-ordered capture/bubble propagation algorithm, with
//! a filtering layer in front and a memory governor behind.
//!
//! - [`config`] — the closed [`config::EventType`] enumeration and the
//!   [`config::EventConfig`] knobs that shape the rest of the crate.
//! - [`event`] — the host-agnostic [`event::RawEvent`]/[`event::WrappedEvent`]
//!   payload, a tagged record rather than duck-typed access to a native event.
//! - [`handler`] — [`handler::HandlerId`], [`handler::OwnerGroupId`], and the
//!   [`handler::RegisterOptions`] a `register` call accepts.
//! - [`index`] — the Delegation Index: per-target/type handler lookup plus
//!   the selector-match and propagation-path memoization caches.
//! - [`filter`] — the admission gate and the [`filter::debounce`] helper.
//! - [`dispatcher`] — [`dispatcher::Dispatcher`], the host-generic
//!   registration table and propagation algorithm.
//! - [`governor`] — the detach sweep and cache-bound enforcement, as methods
//!   on [`dispatcher::Dispatcher`].
//! - [`engine`] — [`engine::EventEngine`], the cloneable handle applications
//!   hold: `Dispatcher` wrapped so the admission gate, frame coalescing, and
//!   governor interval can all call back into it.
//! - [`diagnostics`] — a read-only [`diagnostics::Diagnostics`] snapshot.

pub mod config;
pub mod diagnostics;
pub mod dispatcher;
pub mod engine;
pub mod event;
pub mod filter;
pub mod governor;
pub mod handler;
pub(crate) mod index;

pub use config::{EventConfig, EventType};
pub use diagnostics::Diagnostics;
pub use dispatcher::{Dispatcher, RegisterError};
pub use engine::EventEngine;
pub use event::{EventPayload, Modifiers, NativeEvent, RawEvent, WrappedEvent};
pub use filter::debounce;
pub use handler::{HandlerId, OwnerGroupId, Phase, RegisterOptions};
