//! The logging pipeline: levels, entries, fields, encoders, and cores

pub mod checked_entry;
pub mod console_encoder;
pub mod encoder;
pub mod entry;
pub mod error;
pub mod exit;
pub mod field;
pub mod json_encoder;
pub mod level;
pub mod logger;
pub mod pipeline;
pub mod sampler;
pub mod stacktrace;
pub mod sugar;

pub use checked_entry::{CheckWriteAction, CheckedEntry};
pub use console_encoder::ConsoleEncoder;
pub use encoder::{
    capital_color_level_encoder, capital_level_encoder, epoch_millis_time_encoder,
    epoch_nanos_time_encoder, epoch_time_encoder, full_caller_encoder, full_name_encoder,
    iso8601_time_encoder, lowercase_color_level_encoder, lowercase_level_encoder,
    nanos_duration_encoder, seconds_duration_encoder, short_caller_encoder,
    string_duration_encoder, ArrayEncoder, ArrayMarshaler, CallerEncoder, DurationEncoder,
    Encoder, EncoderConfig, LevelEncoder, NameEncoder, ObjectEncoder, ObjectMarshaler,
    PrimitiveEncoder, TimeEncoder, DEFAULT_LINE_ENDING,
};
pub use entry::{Caller, Entry};
pub use error::{Error, MultiError, Result};
pub use field::{add_fields, Field, FieldPayload, FieldTag};
pub use json_encoder::JsonEncoder;
pub use level::{AtomicLevel, Level, LevelEnabler, LevelEnablerFn};
pub use logger::{Logger, LoggerBuilder};
pub use pipeline::{new_nop_core, new_tee, register_hooks, Core, Hook, IoCore, NopCore};
pub use sampler::new_sampler;
pub use stacktrace::take_stacktrace;
pub use sugar::{SugaredLogger, Value};
