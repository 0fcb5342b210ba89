//! Stacktrace capture

use std::backtrace::Backtrace;

/// Capture and render the current call stack.
///
/// The rendering is whatever the platform's backtrace support produces; the
/// pipeline treats it as an opaque string. The Logger carries this function
/// as a swappable provider so tests can substitute a deterministic one.
pub fn take_stacktrace() -> String {
    Backtrace::force_capture().to_string()
}
