//! [`Core`]: the single explicit context a host constructs once.
//!
//! Rather than a module-level dispatcher singleton, one `Core` is
//! constructed by the host against its [`DomHost`], then threaded into every
//! external
//! collaborator (a form engine, a modal engine, a router) by reference or by
//! clone rather than reached for as ambient state. `Core` is a thin front
//! door over [`trellis_events::EventEngine`]; the reactive half of the
//! runtime (`observable`/`effect`/`computed`/`watch`/`batch`) has no
//! singleton to wrap in the first place — it already threads its
//! "current effect" through a scoped thread-local, so `Core`'s only
//! reactive-facing job is minting the [`Scope`]s that pair a
//! [`trellis_reactive::Owner`] with an [`OwnerGroupId`].

use std::cell::Cell;
use std::rc::Rc;

use trellis_dom::{DomHost, EventTarget};
use trellis_events::{
    Diagnostics, EventConfig, EventEngine, EventType, HandlerId, OwnerGroupId, RegisterError,
    RegisterOptions, WrappedEvent,
};

use crate::scope::Scope;

struct Inner {
    next_owner_group: Cell<u64>,
}

/// The context value a host constructs once per document and clones into
/// every collaborator that needs to register handlers or mint scopes.
/// Cloning is cheap: it shares the same underlying event engine and owner
/// group counter, it does not duplicate any state.
pub struct Core<H: DomHost + 'static> {
    events: EventEngine<H>,
    inner: Rc<Inner>,
}

impl<H: DomHost + 'static> Clone for Core<H> {
    fn clone(&self) -> Self {
        Self {
            events: self.events.clone(),
            inner: self.inner.clone(),
        }
    }
}

impl<H: DomHost + 'static> Core<H> {
    /// Builds a new core over `host`, installing no listeners yet — the
    /// first `register` call for a given event type is what an application
    /// shell or the `browser`-feature glue uses to know to attach the native
    /// listener.
    pub fn new(host: H, config: EventConfig) -> Self {
        Self {
            events: EventEngine::new(host, config),
            inner: Rc::new(Inner {
                next_owner_group: Cell::new(0),
            }),
        }
    }

    /// The underlying event engine, for collaborators that need
    /// `dispatch_native` directly (an input-loop adapter, a test harness)
    /// rather than the register/unregister surface re-exposed here.
    pub fn events(&self) -> &EventEngine<H> {
        &self.events
    }

    pub fn register(
        &self,
        target: EventTarget,
        event_type: EventType,
        callback: impl Fn(&WrappedEvent) + 'static,
        options: RegisterOptions,
    ) -> Result<HandlerId, RegisterError> {
        self.events.register(target, event_type, callback, options)
    }

    pub fn unregister(&self, id: HandlerId) -> bool {
        self.events.unregister(id)
    }

    pub fn unregister_by_owner(&self, owner: OwnerGroupId) -> usize {
        self.events.unregister_by_owner(owner)
    }

    pub fn unregister_by_element(&self, target: EventTarget) -> usize {
        self.events.unregister_by_element(target)
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.events.diagnostics()
    }

    pub fn start_governor(&self) {
        self.events.start_governor();
    }

    pub fn stop_governor(&self) {
        self.events.stop_governor();
    }

    /// Mints a fresh [`Scope`]: a paired reactive owner and owner-group id,
    /// both disposed together by [`Scope::teardown`]. `trellis_events` never
    /// allocates an `OwnerGroupId` itself (callers mint their own), and
    /// `Core` is the mint external collaborators are expected to use rather
    /// than rolling their own counter per component kind.
    pub fn scope(&self) -> Scope<H> {
        let id = self.inner.next_owner_group.get();
        self.inner.next_owner_group.set(id + 1);
        Scope::new(self.clone(), OwnerGroupId(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_dom::Document;

    #[test]
    fn scope_mints_distinct_owner_groups() {
        let core = Core::new(Document::new("body"), EventConfig::default());
        let a = core.scope();
        let b = core.scope();
        assert_ne!(a.owner_group().0, b.owner_group().0);
    }

    #[test]
    fn clones_share_the_same_event_engine() {
        let core = Core::new(Document::new("body"), EventConfig::default());
        let clone = core.clone();
        let root = core.events().diagnostics().handler_count;
        clone
            .register(EventTarget::Window, EventType::Resize, |_| {}, RegisterOptions::default())
            .unwrap();
        assert_eq!(core.diagnostics().handler_count, root + 1);
    }
}
