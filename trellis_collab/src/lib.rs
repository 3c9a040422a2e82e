//! A minimal external collaborator over [`trellis::Core`]: a single form
//! field wired to a generic validation predicate.
//!
//! A form engine is a natural example of an external collaborator —
//! everything outside the event dispatcher and the reactive core that
//! consumes them rather than reimplementing them. This crate is that
//! collaborator, reduced to the smallest slice that actually exercises the
//! lifecycle boundary: one [`Scope`] owns both a `blur` handler (registered
//! through the event half) and a validity [`Computed`] (built on the
//! reactive half), and [`FormField::unmount`] tears both down in a single
//! call.
//!
//! Validator semantics beyond a generic predicate are deliberately out of
//! scope; `predicate` is just `Fn(&str) -> bool` rather than a rule DSL.

use thiserror::Error;
use trellis::prelude::*;

/// Errors [`FormField::mount`] can return.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// The `blur` handler registration itself failed — today only possible
    /// if a future caller adds a delegation selector that doesn't parse.
    #[error("form field registration failed: {0}")]
    Register(#[from] RegisterError),
}

/// One form field: a reactive string value, a `touched` flag set the first
/// time the bound element loses focus, and a validity [`Computed`] derived
/// from a caller-supplied predicate.
///
/// The actual `<input>` value never flows through this crate — reading a
/// native input's value is host glue (e.g. `web_sys::HtmlInputElement::value`)
/// that belongs to the application, not to the core or to this
/// collaborator. [`FormField::set_value`] is the seam: a host's own `input`
/// listener reads the element and calls it.
pub struct FormField<H: DomHost + 'static> {
    scope: Scope<H>,
    value: Observable<String>,
    touched: Observable<bool>,
    valid: Computed<bool>,
}

impl<H: DomHost + 'static> FormField<H> {
    /// Mounts a field bound to `element`: registers a `blur` handler under a
    /// fresh [`Scope`] and builds a lazily-recomputed `valid` value from
    /// `predicate`. Fails only if the handler registration itself fails
    /// (today that can't happen for an unscoped registration, but the error
    /// is threaded through rather than swallowed, matching how
    /// [`Core::register`] reports it elsewhere).
    pub fn mount(core: &Core<H>, element: EventTarget, predicate: impl Fn(&str) -> bool + 'static) -> Result<Self, FieldError> {
        let scope = core.scope();
        let value = observable(String::new());
        let touched = observable(false);

        let value_for_valid = value.clone();
        let valid = scope.with(|| computed(move || predicate(&value_for_valid.get())));

        let touched_for_blur = touched.clone();
        scope.register(element, EventType::Blur, move |_event| touched_for_blur.set(true), RegisterOptions::default())?;

        Ok(Self { scope, value, touched, valid })
    }

    /// Overwrites the tracked value, invalidating `valid` for the next read
    /// or subscriber run. Called by the host's own input-reading glue.
    pub fn set_value(&self, value: impl Into<String>) {
        self.value.set(value.into());
    }

    /// The current tracked value.
    pub fn value(&self) -> String {
        self.value.get()
    }

    /// Whether the bound element has lost focus at least once since mount.
    pub fn touched(&self) -> bool {
        self.touched.get()
    }

    /// Whether the current value satisfies the configured predicate,
    /// recomputing it first if the value has changed since the last read.
    pub fn is_valid(&self) -> bool {
        self.valid.get()
    }

    /// Subscribes `cb` to every change in `is_valid()`, batched through the
    /// same microtask flush as any other [`trellis_reactive::effect`]. The
    /// returned handle disposes independently of [`FormField::unmount`]; it
    /// is also disposed automatically when `unmount` tears down the field's
    /// scope, whichever comes first.
    pub fn on_validity_change(&self, mut cb: impl FnMut(bool) + 'static) -> EffectHandle {
        let valid = self.valid.clone();
        self.scope.with(|| effect(move || cb(valid.get())))
    }

    /// The owner-group id backing this field, for a caller that wants to
    /// group several fields (e.g. a whole form) under one outer
    /// [`Scope::teardown`] instead of unmounting each field individually.
    pub fn owner_group(&self) -> OwnerGroupId {
        self.scope.owner_group()
    }

    /// Disposes the validity computed and any `on_validity_change`
    /// subscribers, then unregisters the `blur` handler. Returns the number
    /// of handlers reclaimed (0 or 1). Idempotent.
    pub fn unmount(&self) -> usize {
        self.scope.teardown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_dom::Document;

    fn field_on(tag: &str, predicate: impl Fn(&str) -> bool + 'static) -> (Core<Document>, NodeId, FormField<Document>) {
        let mut doc = Document::new("body");
        let input = doc.create_element(tag);
        doc.append_child(doc.root(), input);
        let core = Core::new(doc, EventConfig::default());
        let field = FormField::mount(&core, EventTarget::Node(input), predicate).unwrap();
        (core, input, field)
    }

    #[test]
    fn a_fresh_field_is_untouched_and_validates_the_initial_value() {
        let (_core, _input, field) = field_on("input", |v| !v.is_empty());
        assert!(!field.touched());
        assert!(!field.is_valid(), "an empty initial value must fail a non-empty predicate");
    }

    #[test]
    fn set_value_updates_validity_without_touching_the_field() {
        let (_core, _input, field) = field_on("input", |v| v.len() >= 3);
        field.set_value("ok");
        assert!(!field.is_valid());
        field.set_value("okay");
        assert!(field.is_valid());
        assert!(!field.touched(), "validity tracks the value independently of blur");
    }

    #[test]
    fn blur_on_the_bound_element_marks_the_field_touched() {
        let (core, input, field) = field_on("input", |_| true);
        assert!(!field.touched());
        core.events().dispatch_native(
            input,
            EventType::Blur,
            RawEvent::Native(NativeEvent::new(false)),
            Modifiers::default(),
            EventPayload::Generic,
            0,
        );
        assert!(field.touched());
    }

    #[test]
    fn on_validity_change_fires_once_immediately_then_on_each_change() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let (_core, _input, field) = field_on("input", |v| v == "yes");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen2 = seen.clone();
        let handle = field.on_validity_change(move |valid| seen2.borrow_mut().push(valid));
        assert_eq!(*seen.borrow(), vec![false]);

        field.set_value("yes");
        assert_eq!(*seen.borrow(), vec![false, true]);
        handle.dispose();
    }

    #[test]
    fn unmount_tears_down_the_handler_and_stops_validity_subscribers() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let (core, input, field) = field_on("input", |v| v == "yes");
        let seen = Rc::new(RefCell::new(0));
        let seen2 = seen.clone();
        field.on_validity_change(move |_| *seen2.borrow_mut() += 1);
        assert_eq!(*seen.borrow(), 1);
        assert_eq!(core.diagnostics().handler_count, 1);

        let reclaimed = field.unmount();
        assert_eq!(reclaimed, 1);
        assert_eq!(core.diagnostics().handler_count, 0);

        field.set_value("yes");
        assert_eq!(*seen.borrow(), 1, "a disposed validity subscriber must not run after unmount");

        core.events().dispatch_native(
            input,
            EventType::Blur,
            RawEvent::Native(NativeEvent::new(false)),
            Modifiers::default(),
            EventPayload::Generic,
            0,
        );
        assert!(!field.touched(), "an unregistered blur handler must not fire");
    }
}
