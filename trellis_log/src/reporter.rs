//! The error-reporter hook: the only user-visible surface for core-internal
//! failures (register-time programmer errors are the exception — those fail
//! fast at the call site instead).
//!
//! A handler that throws, an effect that throws, or an invalid delegation
//! selector are all caught at the point of failure and handed to [`report`]
//! along with a small [`ErrorContext`] describing what was running. The
//! default reporter logs through `tracing::error!`; call [`set_reporter`]
//! once at startup to route these into a host's own telemetry instead.

use std::fmt;
use std::sync::OnceLock;

/// What was executing when an error was caught.
///
/// `data` is a short, human-readable description of the failing unit (for
/// example `"handler#42 click on <button>"` or `"effect#7"`); it deliberately
/// is not a structured type, since the set of things that can fail (handler
/// callbacks, selector parses, effect closures) don't share a schema.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Short tag for the kind of failure, e.g. `"handler"`, `"effect"`, `"selector"`.
    pub context: &'static str,
    /// Human-readable detail about which unit failed.
    pub data: String,
}

impl ErrorContext {
    /// Builds a new context.
    pub fn new(context: &'static str, data: impl Into<String>) -> Self {
        Self {
            context,
            data: data.into(),
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.context, self.data)
    }
}

/// A sink for core-internal failures. Implement this to route reported
/// errors into a host's own telemetry or crash-reporting system.
pub trait ErrorReporter: Send + Sync {
    /// Called once per caught failure, with a short description of what
    /// failed (`message`) and the context it failed in.
    fn report(&self, message: &str, context: &ErrorContext);
}

struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, message: &str, context: &ErrorContext) {
        tracing::error!(context = %context, "{message}");
    }
}

static REPORTER: OnceLock<Box<dyn ErrorReporter>> = OnceLock::new();

/// Installs a custom [`ErrorReporter`]. Returns `Err(())` if a reporter was
/// already installed (the default `tracing`-backed reporter is used until
/// this is called, so calling it is optional).
pub fn set_reporter(reporter: impl ErrorReporter + 'static) -> Result<(), ()> {
    REPORTER.set(Box::new(reporter)).map_err(|_| ())
}

/// Reports a caught failure. Never panics, never propagates: this is the
/// terminal point for an error the core has decided not to let crash it.
pub fn report(message: impl fmt::Display, context: ErrorContext) {
    let message = message.to_string();
    match REPORTER.get() {
        Some(reporter) => reporter.report(&message, &context),
        None => TracingReporter.report(&message, &context),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn default_reporter_does_not_panic() {
        report("boom", ErrorContext::new("handler", "h#1 click"));
    }

    #[test]
    fn error_context_display_is_readable() {
        let ctx = ErrorContext::new("effect", "effect#7");
        assert_eq!(ctx.to_string(), "[effect] effect#7");
    }

    // Exercises the trait object path without touching the process-wide
    // OnceLock (already claimed by whichever test runs first in this binary).
    #[test]
    fn custom_reporter_receives_message_and_context() {
        struct Captured(Arc<Mutex<Vec<String>>>);
        impl ErrorReporter for Captured {
            fn report(&self, message: &str, context: &ErrorContext) {
                self.0.lock().unwrap().push(format!("{context}: {message}"));
            }
        }
        let sink = Arc::new(Mutex::new(Vec::new()));
        let reporter = Captured(sink.clone());
        reporter.report("boom", &ErrorContext::new("selector", "target#3 '.row >'"));
        assert_eq!(sink.lock().unwrap().as_slice(), ["[selector] target#3 '.row >': boom"]);
    }
}
