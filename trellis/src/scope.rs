//! [`Scope`]: the lifecycle unit an external collaborator mounts and tears
//! down — a component instance, a route, a modal. Pairs a reactive
//! [`Owner`] (disposes effects and computeds created under it) with an
//! [`OwnerGroupId`] (bulk-unregisters event handlers registered under it),
//! so a single [`Scope::teardown`] call cancels both handlers and effects
//! together, in one operation.

use trellis_dom::{DomHost, EventTarget};
use trellis_events::{EventType, HandlerId, OwnerGroupId, RegisterError, RegisterOptions, WrappedEvent};
use trellis_reactive::Owner;

use crate::core::Core;

/// A bundled reactive owner and handler owner-group, minted by
/// [`Core::scope`](crate::Core::scope) and torn down together.
pub struct Scope<H: DomHost + 'static> {
    core: Core<H>,
    owner: Owner,
    owner_group: OwnerGroupId,
}

impl<H: DomHost + 'static> Scope<H> {
    pub(crate) fn new(core: Core<H>, owner_group: OwnerGroupId) -> Self {
        Self {
            core,
            owner: Owner::new(),
            owner_group,
        }
    }

    /// The owner-group id backing this scope, for a caller that wants to
    /// register handlers directly against [`Core`] instead of through
    /// [`Scope::register`].
    pub fn owner_group(&self) -> OwnerGroupId {
        self.owner_group
    }

    /// Runs `f` with this scope's reactive owner current: any `effect` or
    /// `computed` created inside `f` registers its disposer here instead of
    /// with whatever owner (if any) was current before.
    pub fn with<R>(&self, f: impl FnOnce() -> R) -> R {
        self.owner.with(f)
    }

    /// Registers a handler tagged with this scope's owner group, so it is
    /// reclaimed at [`Scope::teardown`] even if the caller never calls
    /// `unregister` directly. Any `owner_group` already set on `options` is
    /// overwritten.
    pub fn register(
        &self,
        target: EventTarget,
        event_type: EventType,
        callback: impl Fn(&WrappedEvent) + 'static,
        mut options: RegisterOptions,
    ) -> Result<HandlerId, RegisterError> {
        options.owner_group = Some(self.owner_group);
        self.core.register(target, event_type, callback, options)
    }

    /// Disposes every effect and computed created under [`Scope::with`],
    /// then unregisters every handler registered under this scope's owner
    /// group. Returns the number of handlers reclaimed. Idempotent: tearing
    /// down an already-torn-down scope disposes nothing further and
    /// unregisters zero handlers.
    pub fn teardown(&self) -> usize {
        self.owner.dispose();
        self.core.unregister_by_owner(self.owner_group)
    }
}
