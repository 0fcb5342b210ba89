//! Logging macros for ergonomic message formatting.
//!
//! These macros format a message `println!`-style and log it without
//! structured fields; calls carrying fields use the [`Logger`] methods
//! directly.
//!
//! [`Logger`]: crate::Logger
//!
//! # Examples
//!
//! ```
//! use fastlog::{info, Logger};
//!
//! let logger = Logger::nop();
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//! ```

/// Log a formatted message at the given level.
///
/// # Examples
///
/// ```
/// # use fastlog::{log, Level, Logger};
/// # let logger = Logger::nop();
/// log!(logger, Level::Info, "Simple message");
/// log!(logger, Level::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, &format!($($arg)+), &[])
    };
}

/// Log a formatted debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Debug, $($arg)+)
    };
}

/// Log a formatted info-level message.
///
/// # Examples
///
/// ```
/// # use fastlog::Logger;
/// # let logger = Logger::nop();
/// use fastlog::info;
/// info!(logger, "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Info, $($arg)+)
    };
}

/// Log a formatted warn-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Warn, $($arg)+)
    };
}

/// Log a formatted error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Error, $($arg)+)
    };
}

/// Log a formatted DPanic-level message; panics in development mode.
#[macro_export]
macro_rules! dpanic {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::DPanic, $($arg)+)
    };
}

/// Log a formatted fatal-level message, then exit the process.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Fatal, $($arg)+)
    };
}
