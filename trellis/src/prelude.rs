//! Everything an application or an external collaborator typically needs,
//! in one `use trellis::prelude::*;`.

pub use trellis_dom::{DomHost, Document, EventTarget, NodeId};
pub use trellis_events::{
    debounce, Diagnostics, EventConfig, EventPayload, EventType, HandlerId, Modifiers,
    NativeEvent, OwnerGroupId, Phase, RawEvent, RegisterError, RegisterOptions, WrappedEvent,
};
pub use trellis_reactive::{
    batch, computed, effect, is_observable, observable, observable_vec, teardown_owner, watch,
    Computed, EffectHandle, IsObservable, Observable, ObservableVec, Owner,
};

pub use crate::core::Core;
pub use crate::scope::Scope;
