//! # fastlog
//!
//! A high-performance structured, leveled logging core for hot paths where
//! allocation and reflection overhead are unacceptable.
//!
//! ## Features
//!
//! - **Two surfaces, one pipeline**: a strongly-typed field API
//!   ([`Logger`]) for maximum performance, and a loosely-typed key/value
//!   API ([`SugaredLogger`]) for ergonomics.
//! - **Allocation-free encoding**: pooled byte buffers and typed field
//!   slots keep the JSON hot path off the allocator.
//! - **Composable cores**: tee, hooks, sampling, and no-op stages combine
//!   into arbitrary pipelines.
//! - **Thread safe**: every public operation is safe for concurrent use.
//!
//! ## Example
//!
//! ```
//! use fastlog::{EncoderConfig, Field, IoCore, JsonEncoder, Level, Logger};
//! use fastlog::sinks;
//!
//! let core = IoCore::new(
//!     Box::new(JsonEncoder::new(EncoderConfig::production())),
//!     sinks::stdout(),
//!     Level::Info,
//! );
//! let logger = Logger::new(core);
//! logger.info(
//!     "Failed to fetch URL.",
//!     &[
//!         Field::string("url", "http://example.com"),
//!         Field::int64("attempt", 3),
//!     ],
//! );
//! ```

pub mod buffer;
pub mod core;
pub mod macros;
pub mod observer;
pub mod sinks;

pub mod prelude {
    pub use crate::core::{
        EncoderConfig, Entry, Field, IoCore, Level, Logger, LoggerBuilder, Result, SugaredLogger,
    };
    pub use crate::sinks::WriteSyncer;
}

pub use crate::core::{
    add_fields, capital_color_level_encoder, capital_level_encoder, epoch_millis_time_encoder,
    epoch_nanos_time_encoder, epoch_time_encoder, exit, full_caller_encoder, full_name_encoder,
    iso8601_time_encoder, lowercase_color_level_encoder, lowercase_level_encoder,
    nanos_duration_encoder, new_nop_core, new_sampler, new_tee, register_hooks,
    seconds_duration_encoder, short_caller_encoder, string_duration_encoder, take_stacktrace,
    ArrayEncoder, ArrayMarshaler, AtomicLevel, Caller, CallerEncoder, CheckWriteAction,
    CheckedEntry, ConsoleEncoder, Core, DurationEncoder, Encoder, EncoderConfig, Entry, Error,
    Field, FieldPayload, FieldTag, Hook, IoCore, JsonEncoder, Level, LevelEnabler, LevelEncoder,
    LevelEnablerFn, Logger, LoggerBuilder, MultiError, NameEncoder, NopCore, ObjectEncoder,
    ObjectMarshaler, PrimitiveEncoder, Result, SugaredLogger, TimeEncoder, Value,
    DEFAULT_LINE_ENDING,
};
