//! Isomorphic logging plus the diagnostic reporter hook used across the
//! Trellis core.
//!
//! The event dispatcher, the reactive runtime, and the memory governor never
//! panic or abort in response to a user-thrown error: a handler or effect
//! exception is caught, reported, and dispatch/flushing continues.
//! [`report`] is the single place those exceptions surface to. By default it
//! forwards to `tracing`, but a host can install its own [`ErrorReporter`] to
//! route failures into its own telemetry instead.
//!
//! `log!`/`warn!`/`error!` print to the browser console under the `browser`
//! feature and to stdout/stderr otherwise, so the same core code logs
//! sensibly whether it's compiled to `wasm32` or run natively in tests.

pub mod reporter;

pub use reporter::{report, set_reporter, ErrorContext, ErrorReporter};

/// Uses `println!()`-style formatting to log something to the console (in the browser)
/// or via `println!()` (if not in the browser).
#[macro_export]
macro_rules! log {
    ($($t:tt)*) => ($crate::console_log(&format_args!($($t)*).to_string()))
}

/// Uses `println!()`-style formatting to log warnings to the console (in the browser)
/// or via `eprintln!()` (if not in the browser).
#[macro_export]
macro_rules! warn {
    ($($t:tt)*) => ($crate::console_warn(&format_args!($($t)*).to_string()))
}

/// Uses `println!()`-style formatting to log errors to the console (in the browser)
/// or via `eprintln!()` (if not in the browser).
#[macro_export]
macro_rules! error {
    ($($t:tt)*) => ($crate::console_error(&format_args!($($t)*).to_string()))
}

/// Uses `println!()`-style formatting to log warnings to the console (in the browser)
/// or via `eprintln!()` (if not in the browser), but only if it's a debug build.
#[macro_export]
macro_rules! debug_warn {
    ($($x:tt)*) => {
        {
            #[cfg(debug_assertions)]
            {
                $crate::warn!($($x)*)
            }
            #[cfg(not(debug_assertions))]
            {
                ($($x)*)
            }
        }
    }
}

/// Log a string to the console (in the browser) or via `println!()` (if not in the browser).
pub fn console_log(s: &str) {
    cfg_if::cfg_if! {
        if #[cfg(feature = "browser")] {
            web_sys::console::log_1(&wasm_bindgen::JsValue::from_str(s));
        } else {
            #[allow(clippy::print_stdout)]
            { println!("{s}"); }
        }
    }
}

/// Log a warning to the console (in the browser) or via `eprintln!()` (if not in the browser).
pub fn console_warn(s: &str) {
    cfg_if::cfg_if! {
        if #[cfg(feature = "browser")] {
            web_sys::console::warn_1(&wasm_bindgen::JsValue::from_str(s));
        } else {
            eprintln!("{s}");
        }
    }
}

/// Log an error to the console (in the browser) or via `eprintln!()` (if not in the browser).
pub fn console_error(s: &str) {
    cfg_if::cfg_if! {
        if #[cfg(feature = "browser")] {
            web_sys::console::error_1(&wasm_bindgen::JsValue::from_str(s));
        } else {
            eprintln!("{s}");
        }
    }
}
