//! Encoder contracts and policy encoders
//!
//! The encoding surface is split in three: [`PrimitiveEncoder`] appends bare
//! values, [`ArrayEncoder`] adds the composite appends used inside arrays,
//! and [`ObjectEncoder`] adds keyed values. A full [`Encoder`] is an object
//! encoder that can also clone itself and encode a complete entry.
//!
//! Formatting of entry metadata is delegated to pluggable policy functions
//! ([`LevelEncoder`], [`TimeEncoder`], ...) carried by [`EncoderConfig`].
//! A policy that appends nothing makes the host encoder fall back to a
//! deterministic default so output stays well-formed.

use super::entry::{Caller, Entry};
use super::error::Result;
use super::field::Field;
use super::level::Level;
use crate::buffer::Buffer;
use chrono::{DateTime, Utc};
use colored::Colorize;
use std::time::Duration;

/// Line ending used when the config leaves it unset.
pub const DEFAULT_LINE_ENDING: &str = "\n";

/// Implemented by types that add themselves to an entry as a JSON array.
pub trait ArrayMarshaler: Send + Sync {
    fn marshal_log_array(&self, enc: &mut dyn ArrayEncoder) -> Result<()>;
}

/// Implemented by types that add themselves to an entry as a JSON object.
pub trait ObjectMarshaler: Send + Sync {
    fn marshal_log_object(&self, enc: &mut dyn ObjectEncoder) -> Result<()>;
}

/// Appends single values in some format. Policy encoders write through this
/// surface, which keeps them usable by both the JSON and console encoders.
pub trait PrimitiveEncoder {
    fn append_bool(&mut self, value: bool);
    fn append_byte_string(&mut self, value: &[u8]);
    fn append_complex128(&mut self, re: f64, im: f64);
    fn append_duration(&mut self, value: Duration);
    fn append_float64(&mut self, value: f64);
    fn append_float32(&mut self, value: f32);
    fn append_int64(&mut self, value: i64);
    fn append_uint64(&mut self, value: u64);
    fn append_string(&mut self, value: &str);
    fn append_time(&mut self, value: DateTime<Utc>);
}

/// The surface handed to [`ArrayMarshaler`] callbacks.
pub trait ArrayEncoder: PrimitiveEncoder {
    fn append_array(&mut self, arr: &dyn ArrayMarshaler) -> Result<()>;
    fn append_object(&mut self, obj: &dyn ObjectMarshaler) -> Result<()>;
    fn append_reflected(&mut self, value: &serde_json::Value) -> Result<()>;
}

/// Adds keyed values; the surface handed to [`ObjectMarshaler`] callbacks
/// and driven by [`Field::add_to`](crate::Field::add_to).
pub trait ObjectEncoder {
    fn add_array(&mut self, key: &str, arr: &dyn ArrayMarshaler) -> Result<()>;
    fn add_object(&mut self, key: &str, obj: &dyn ObjectMarshaler) -> Result<()>;
    fn add_binary(&mut self, key: &str, value: &[u8]);
    fn add_byte_string(&mut self, key: &str, value: &[u8]);
    fn add_bool(&mut self, key: &str, value: bool);
    fn add_complex128(&mut self, key: &str, re: f64, im: f64);
    fn add_duration(&mut self, key: &str, value: Duration);
    fn add_float64(&mut self, key: &str, value: f64);
    fn add_float32(&mut self, key: &str, value: f32);
    fn add_int64(&mut self, key: &str, value: i64);
    fn add_uint64(&mut self, key: &str, value: u64);
    fn add_string(&mut self, key: &str, value: &str);
    fn add_time(&mut self, key: &str, value: DateTime<Utc>);
    fn add_reflected(&mut self, key: &str, value: &serde_json::Value) -> Result<()>;
    /// Open a nested scope named `key`; fields added afterwards land inside
    /// it until the encoder closes its open scopes.
    fn open_namespace(&mut self, key: &str);
}

/// A format-agnostic serializer of entries plus fields.
///
/// Encoders accumulate context fields between entries; [`clone_encoder`]
/// produces an independent copy so derived pipelines never share buffers.
///
/// [`clone_encoder`]: Encoder::clone_encoder
pub trait Encoder: ObjectEncoder + Send + Sync {
    fn clone_encoder(&self) -> Box<dyn Encoder>;

    /// Encode the entry, the accumulated context, and the per-call fields
    /// into a pooled buffer owned by the caller.
    fn encode_entry(&self, entry: &Entry, fields: &[Field]) -> Result<Buffer>;
}

/// Formats a [`Level`].
pub type LevelEncoder = fn(Level, &mut dyn PrimitiveEncoder);

/// Formats an entry or field timestamp.
pub type TimeEncoder = fn(DateTime<Utc>, &mut dyn PrimitiveEncoder);

/// Formats a duration field.
pub type DurationEncoder = fn(Duration, &mut dyn PrimitiveEncoder);

/// Formats the caller of a log call.
pub type CallerEncoder = fn(&Caller, &mut dyn PrimitiveEncoder);

/// Formats a logger name.
pub type NameEncoder = fn(&str, &mut dyn PrimitiveEncoder);

/// Lowercase level name: `info`.
pub fn lowercase_level_encoder(level: Level, enc: &mut dyn PrimitiveEncoder) {
    enc.append_string(level.as_str());
}

/// Uppercase level name: `INFO`.
pub fn capital_level_encoder(level: Level, enc: &mut dyn PrimitiveEncoder) {
    enc.append_string(level.capital_str());
}

/// Lowercase level name wrapped in ANSI color codes.
pub fn lowercase_color_level_encoder(level: Level, enc: &mut dyn PrimitiveEncoder) {
    enc.append_string(&level.as_str().color(level.color()).to_string());
}

/// Uppercase level name wrapped in ANSI color codes.
pub fn capital_color_level_encoder(level: Level, enc: &mut dyn PrimitiveEncoder) {
    enc.append_string(&level.capital_str().color(level.color()).to_string());
}

/// Seconds since epoch as a float: `1572549000.33262`.
pub fn epoch_time_encoder(time: DateTime<Utc>, enc: &mut dyn PrimitiveEncoder) {
    let nanos = time.timestamp_nanos_opt().unwrap_or_default();
    enc.append_float64(nanos as f64 / 1e9);
}

/// Milliseconds since epoch as a float.
pub fn epoch_millis_time_encoder(time: DateTime<Utc>, enc: &mut dyn PrimitiveEncoder) {
    let nanos = time.timestamp_nanos_opt().unwrap_or_default();
    enc.append_float64(nanos as f64 / 1e6);
}

/// Nanoseconds since epoch as an integer.
pub fn epoch_nanos_time_encoder(time: DateTime<Utc>, enc: &mut dyn PrimitiveEncoder) {
    enc.append_int64(time.timestamp_nanos_opt().unwrap_or_default());
}

/// ISO 8601 with millisecond precision: `2026-08-02T10:30:45.123+0000`.
pub fn iso8601_time_encoder(time: DateTime<Utc>, enc: &mut dyn PrimitiveEncoder) {
    enc.append_string(&time.format("%Y-%m-%dT%H:%M:%S%.3f%z").to_string());
}

/// Elapsed seconds as a float.
pub fn seconds_duration_encoder(d: Duration, enc: &mut dyn PrimitiveEncoder) {
    enc.append_float64(d.as_secs_f64());
}

/// Elapsed nanoseconds as an integer.
pub fn nanos_duration_encoder(d: Duration, enc: &mut dyn PrimitiveEncoder) {
    enc.append_int64(d.as_nanos() as i64);
}

/// Human-readable duration: `1.5s`, `20ms`.
pub fn string_duration_encoder(d: Duration, enc: &mut dyn PrimitiveEncoder) {
    enc.append_string(&format!("{:?}", d));
}

/// Full file path and line: `project/src/server/handler.rs:42`.
pub fn full_caller_encoder(caller: &Caller, enc: &mut dyn PrimitiveEncoder) {
    enc.append_string(&caller.full_path());
}

/// Trimmed file path and line: `server/handler.rs:42`.
pub fn short_caller_encoder(caller: &Caller, enc: &mut dyn PrimitiveEncoder) {
    enc.append_string(&caller.trimmed_path());
}

/// The logger name as given.
pub fn full_name_encoder(name: &str, enc: &mut dyn PrimitiveEncoder) {
    enc.append_string(name);
}

/// Keys, line ending, and formatting policies for the entry metadata.
///
/// Setting a key to the empty string suppresses that part of the record in
/// both the JSON and console encoders. A `None` policy suppresses the part
/// in the console encoder; the JSON encoder substitutes a deterministic
/// default instead, so its output is always complete.
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    pub message_key: String,
    pub level_key: String,
    pub time_key: String,
    pub name_key: String,
    pub caller_key: String,
    pub stacktrace_key: String,
    /// Appended after each entry; [`DEFAULT_LINE_ENDING`] when empty.
    pub line_ending: String,
    pub encode_level: Option<LevelEncoder>,
    pub encode_time: Option<TimeEncoder>,
    pub encode_duration: Option<DurationEncoder>,
    pub encode_caller: Option<CallerEncoder>,
    pub encode_name: Option<NameEncoder>,
}

impl EncoderConfig {
    /// Terse, machine-oriented keys and encodings, suitable for production.
    pub fn production() -> Self {
        EncoderConfig {
            message_key: "msg".to_string(),
            level_key: "level".to_string(),
            time_key: "ts".to_string(),
            name_key: "logger".to_string(),
            caller_key: "caller".to_string(),
            stacktrace_key: "stacktrace".to_string(),
            line_ending: DEFAULT_LINE_ENDING.to_string(),
            encode_level: Some(lowercase_level_encoder),
            encode_time: Some(epoch_time_encoder),
            encode_duration: Some(seconds_duration_encoder),
            encode_caller: Some(short_caller_encoder),
            encode_name: None,
        }
    }

    /// Human-oriented encodings for development consoles.
    pub fn development() -> Self {
        EncoderConfig {
            message_key: "M".to_string(),
            level_key: "L".to_string(),
            time_key: "T".to_string(),
            name_key: "N".to_string(),
            caller_key: "C".to_string(),
            stacktrace_key: "S".to_string(),
            line_ending: DEFAULT_LINE_ENDING.to_string(),
            encode_level: Some(capital_level_encoder),
            encode_time: Some(iso8601_time_encoder),
            encode_duration: Some(string_duration_encoder),
            encode_caller: Some(short_caller_encoder),
            encode_name: None,
        }
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig::production()
    }
}
