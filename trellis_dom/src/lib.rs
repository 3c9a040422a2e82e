//! A small DOM arena, selector matcher, and host abstraction.
//!
//! The event and reactive engines need a strongly typed stand-in for "the
//! document" that is cheap to construct, cheap to mutate, and fully
//! deterministic in tests. This crate provides that: [`arena::Document`] is an
//! in-memory arena of nodes keyed by a stable [`arena::NodeId`] rather than a
//! host weak reference, [`selector::Selector`] matches the small slice of CSS
//! syntax delegation needs, and [`host::DomHost`] is the trait the dispatcher
//! actually programs against, so a `browser` feature build can swap in real
//! `web_sys` nodes without touching engine code.

pub mod arena;
pub mod host;
pub mod selector;

pub use arena::{Document, EventTarget, NodeId};
pub use host::DomHost;
pub use selector::{Selector, SelectorError};
