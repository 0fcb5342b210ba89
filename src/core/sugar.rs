//! Loosely-typed key/value logging surface
//!
//! The typed [`Logger`] asks callers to pick a field constructor for every
//! value. `SugaredLogger` trades a little of that performance for
//! ergonomics: values arrive as [`Value`]s (usually via `.into()`) and are
//! converted to typed fields at log time.

use super::field::Field;
use super::level::Level;
use super::logger::Logger;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// A dynamically-typed field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Duration(Duration),
    Time(DateTime<Utc>),
    Reflect(serde_json::Value),
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Uint(u64::from(v))
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Uint(v)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Uint(v as u64)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<Duration> for Value {
    fn from(v: Duration) -> Self {
        Value::Duration(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Time(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Reflect(v)
    }
}

impl Value {
    fn into_field(self, key: &str) -> Field {
        match self {
            Value::Null => Field {
                key: key.to_string(),
                tag: super::field::FieldTag::Reflect,
                payload: super::field::FieldPayload::Reflect(serde_json::Value::Null),
                ..Field::default()
            },
            Value::Bool(v) => Field::bool(key, v),
            Value::Int(v) => Field::int64(key, v),
            Value::Uint(v) => Field::uint64(key, v),
            Value::Float(v) => Field::float64(key, v),
            Value::Str(v) => Field::string(key, v),
            Value::Bytes(v) => Field::byte_string(key, v),
            Value::Duration(v) => Field::duration(key, v),
            Value::Time(v) => Field::time(key, v),
            Value::Reflect(v) => Field {
                key: key.to_string(),
                tag: super::field::FieldTag::Reflect,
                payload: super::field::FieldPayload::Reflect(v),
                ..Field::default()
            },
        }
    }
}

fn sweeten<'a, I>(kvs: I) -> Vec<Field>
where
    I: IntoIterator<Item = (&'a str, Value)>,
{
    kvs.into_iter()
        .map(|(key, value)| value.into_field(key))
        .collect()
}

/// Wraps the base [`Logger`] with a key/value API.
///
/// ```
/// use fastlog::Logger;
///
/// let sugar = Logger::nop().sugar();
/// sugar.infow(
///     "fetch failed",
///     [("url", "http://example.com".into()), ("attempt", 3.into())],
/// );
/// ```
#[derive(Clone)]
pub struct SugaredLogger {
    base: Logger,
}

impl SugaredLogger {
    pub(crate) fn new(base: Logger) -> Self {
        SugaredLogger { base }
    }

    /// The underlying typed logger.
    pub fn desugar(&self) -> Logger {
        self.base.clone()
    }

    /// A child with the given context, analogous to [`Logger::with`].
    pub fn with<'a, I>(&self, kvs: I) -> SugaredLogger
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        SugaredLogger {
            base: self.base.with(sweeten(kvs)),
        }
    }

    #[track_caller]
    pub fn logw<'a, I>(&self, level: Level, msg: &str, kvs: I)
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        if let Some(ce) = self.base.check(level, msg) {
            ce.write(&sweeten(kvs));
        }
    }

    #[track_caller]
    pub fn debugw<'a, I>(&self, msg: &str, kvs: I)
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        self.logw(Level::Debug, msg, kvs);
    }

    #[track_caller]
    pub fn infow<'a, I>(&self, msg: &str, kvs: I)
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        self.logw(Level::Info, msg, kvs);
    }

    #[track_caller]
    pub fn warnw<'a, I>(&self, msg: &str, kvs: I)
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        self.logw(Level::Warn, msg, kvs);
    }

    #[track_caller]
    pub fn errorw<'a, I>(&self, msg: &str, kvs: I)
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        self.logw(Level::Error, msg, kvs);
    }

    #[track_caller]
    pub fn dpanicw<'a, I>(&self, msg: &str, kvs: I)
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        self.logw(Level::DPanic, msg, kvs);
    }

    #[track_caller]
    pub fn panicw<'a, I>(&self, msg: &str, kvs: I)
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        self.logw(Level::Panic, msg, kvs);
    }

    #[track_caller]
    pub fn fatalw<'a, I>(&self, msg: &str, kvs: I)
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        self.logw(Level::Fatal, msg, kvs);
    }

    pub fn sync(&self) -> super::error::Result<()> {
        self.base.sync()
    }
}
