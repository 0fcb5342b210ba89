//! Structured fields
//!
//! A [`Field`] is a lazily-marshaled key/value operation on an encoder. The
//! struct is a tagged union: the tag picks the slot that carries the payload,
//! and scalar values live inline (booleans, integers, durations, and float
//! bit patterns all share the 64-bit integer slot) so that adding a number to
//! an entry allocates nothing beyond the key.

use super::encoder::{ArrayEncoder, ArrayMarshaler, ObjectEncoder, ObjectMarshaler};
use super::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Discriminant of a [`Field`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldTag {
    /// The default; encoding an unknown field is a programmer error.
    #[default]
    Unknown,
    ArrayMarshaler,
    ObjectMarshaler,
    Binary,
    Bool,
    ByteString,
    Complex128,
    Complex64,
    Duration,
    Float64,
    Float32,
    Int64,
    Int32,
    Int16,
    Int8,
    String,
    Time,
    Uint64,
    Uint32,
    Uint16,
    Uint8,
    Uintptr,
    Reflect,
    Namespace,
    Stringer,
    Error,
    Skip,
}

/// Owning storage for field payloads too large for the inline slots.
#[derive(Clone)]
pub enum FieldPayload {
    None,
    Bytes(Vec<u8>),
    Complex { re: f64, im: f64 },
    Array(Arc<dyn ArrayMarshaler>),
    Object(Arc<dyn ObjectMarshaler>),
    Stringer(Arc<dyn fmt::Display + Send + Sync>),
    Error(Arc<dyn std::error::Error + Send + Sync>),
    Reflect(serde_json::Value),
}

impl fmt::Debug for FieldPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPayload::None => f.write_str("None"),
            FieldPayload::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
            FieldPayload::Complex { re, im } => write!(f, "Complex({}+{}i)", re, im),
            FieldPayload::Array(_) => f.write_str("Array(..)"),
            FieldPayload::Object(_) => f.write_str("Object(..)"),
            FieldPayload::Stringer(s) => write!(f, "Stringer({})", s),
            FieldPayload::Error(e) => write!(f, "Error({})", e),
            FieldPayload::Reflect(v) => write!(f, "Reflect({})", v),
        }
    }
}

/// A marshaling operation on an encoder: key, tag, and payload slots.
#[derive(Debug, Clone, Default)]
pub struct Field {
    pub key: String,
    pub tag: FieldTag,
    pub integer: i64,
    pub string: String,
    pub payload: FieldPayload,
}

impl Default for FieldPayload {
    fn default() -> Self {
        FieldPayload::None
    }
}

impl Field {
    fn scalar(key: &str, tag: FieldTag, integer: i64) -> Field {
        Field {
            key: key.to_string(),
            tag,
            integer,
            string: String::new(),
            payload: FieldPayload::None,
        }
    }

    /// A no-op field, useful for conditionally silencing a value.
    pub fn skip() -> Field {
        Field {
            tag: FieldTag::Skip,
            ..Field::default()
        }
    }

    pub fn bool(key: &str, value: bool) -> Field {
        Field::scalar(key, FieldTag::Bool, i64::from(value))
    }

    /// Opaque binary data, emitted base64-encoded by the JSON encoder.
    pub fn binary(key: &str, value: impl Into<Vec<u8>>) -> Field {
        Field {
            key: key.to_string(),
            tag: FieldTag::Binary,
            payload: FieldPayload::Bytes(value.into()),
            ..Field::default()
        }
    }

    /// UTF-8 text carried as bytes, emitted as an escaped string.
    pub fn byte_string(key: &str, value: impl Into<Vec<u8>>) -> Field {
        Field {
            key: key.to_string(),
            tag: FieldTag::ByteString,
            payload: FieldPayload::Bytes(value.into()),
            ..Field::default()
        }
    }

    pub fn complex128(key: &str, re: f64, im: f64) -> Field {
        Field {
            key: key.to_string(),
            tag: FieldTag::Complex128,
            payload: FieldPayload::Complex { re, im },
            ..Field::default()
        }
    }

    pub fn complex64(key: &str, re: f32, im: f32) -> Field {
        Field {
            key: key.to_string(),
            tag: FieldTag::Complex64,
            payload: FieldPayload::Complex {
                re: f64::from(re),
                im: f64::from(im),
            },
            ..Field::default()
        }
    }

    pub fn float64(key: &str, value: f64) -> Field {
        Field::scalar(key, FieldTag::Float64, value.to_bits() as i64)
    }

    pub fn float32(key: &str, value: f32) -> Field {
        Field::scalar(key, FieldTag::Float32, i64::from(value.to_bits()))
    }

    pub fn int64(key: &str, value: i64) -> Field {
        Field::scalar(key, FieldTag::Int64, value)
    }

    pub fn int32(key: &str, value: i32) -> Field {
        Field::scalar(key, FieldTag::Int32, i64::from(value))
    }

    pub fn int16(key: &str, value: i16) -> Field {
        Field::scalar(key, FieldTag::Int16, i64::from(value))
    }

    pub fn int8(key: &str, value: i8) -> Field {
        Field::scalar(key, FieldTag::Int8, i64::from(value))
    }

    pub fn uint64(key: &str, value: u64) -> Field {
        Field::scalar(key, FieldTag::Uint64, value as i64)
    }

    pub fn uint32(key: &str, value: u32) -> Field {
        Field::scalar(key, FieldTag::Uint32, i64::from(value))
    }

    pub fn uint16(key: &str, value: u16) -> Field {
        Field::scalar(key, FieldTag::Uint16, i64::from(value))
    }

    pub fn uint8(key: &str, value: u8) -> Field {
        Field::scalar(key, FieldTag::Uint8, i64::from(value))
    }

    pub fn uintptr(key: &str, value: usize) -> Field {
        Field::scalar(key, FieldTag::Uintptr, value as i64)
    }

    pub fn string(key: &str, value: impl Into<String>) -> Field {
        Field {
            key: key.to_string(),
            tag: FieldTag::String,
            string: value.into(),
            ..Field::default()
        }
    }

    /// A wall-clock instant, serialized via the configured time policy.
    pub fn time(key: &str, value: DateTime<Utc>) -> Field {
        Field::scalar(
            key,
            FieldTag::Time,
            value.timestamp_nanos_opt().unwrap_or_default(),
        )
    }

    /// An elapsed duration, serialized via the configured duration policy.
    pub fn duration(key: &str, value: Duration) -> Field {
        Field::scalar(key, FieldTag::Duration, value.as_nanos() as i64)
    }

    /// A value that marshals itself as a JSON array.
    pub fn array(key: &str, value: impl ArrayMarshaler + 'static) -> Field {
        Field {
            key: key.to_string(),
            tag: FieldTag::ArrayMarshaler,
            payload: FieldPayload::Array(Arc::new(value)),
            ..Field::default()
        }
    }

    /// A value that marshals itself as a JSON object.
    pub fn object(key: &str, value: impl ObjectMarshaler + 'static) -> Field {
        Field {
            key: key.to_string(),
            tag: FieldTag::ObjectMarshaler,
            payload: FieldPayload::Object(Arc::new(value)),
            ..Field::default()
        }
    }

    /// A value rendered with its `Display` implementation at encode time.
    pub fn stringer(key: &str, value: impl fmt::Display + Send + Sync + 'static) -> Field {
        Field {
            key: key.to_string(),
            tag: FieldTag::Stringer,
            payload: FieldPayload::Stringer(Arc::new(value)),
            ..Field::default()
        }
    }

    /// Any serializable value, encoded through the generic JSON machinery.
    ///
    /// This is the slow path; prefer the typed constructors where possible.
    pub fn reflect<T: Serialize>(key: &str, value: &T) -> Result<Field> {
        Ok(Field {
            key: key.to_string(),
            tag: FieldTag::Reflect,
            payload: FieldPayload::Reflect(serde_json::to_value(value)?),
            ..Field::default()
        })
    }

    /// An error under the conventional `"error"` key.
    pub fn error(err: impl std::error::Error + Send + Sync + 'static) -> Field {
        Field::named_error("error", err)
    }

    /// An error under an explicit key. The error's display text is logged;
    /// when the error exposes a source chain, a `<key>Causes` array of the
    /// causes follows.
    pub fn named_error(key: &str, err: impl std::error::Error + Send + Sync + 'static) -> Field {
        Field {
            key: key.to_string(),
            tag: FieldTag::Error,
            payload: FieldPayload::Error(Arc::new(err)),
            ..Field::default()
        }
    }

    /// Opens a namespace: subsequent fields nest under an object named `key`
    /// until the encoder closes its open scopes.
    pub fn namespace(key: &str) -> Field {
        Field {
            key: key.to_string(),
            tag: FieldTag::Namespace,
            ..Field::default()
        }
    }

    /// Apply this field to an encoder.
    ///
    /// # Panics
    ///
    /// Panics on a field with the `Unknown` tag; such a field can only be
    /// produced by constructing `Field` by hand.
    pub fn add_to(&self, enc: &mut dyn ObjectEncoder) -> Result<()> {
        match (&self.tag, &self.payload) {
            (FieldTag::ArrayMarshaler, FieldPayload::Array(arr)) => {
                enc.add_array(&self.key, arr.as_ref())?;
            }
            (FieldTag::ObjectMarshaler, FieldPayload::Object(obj)) => {
                enc.add_object(&self.key, obj.as_ref())?;
            }
            (FieldTag::Binary, FieldPayload::Bytes(b)) => enc.add_binary(&self.key, b),
            (FieldTag::ByteString, FieldPayload::Bytes(b)) => enc.add_byte_string(&self.key, b),
            (FieldTag::Bool, _) => enc.add_bool(&self.key, self.integer == 1),
            (FieldTag::Complex128, FieldPayload::Complex { re, im })
            | (FieldTag::Complex64, FieldPayload::Complex { re, im }) => {
                enc.add_complex128(&self.key, *re, *im);
            }
            (FieldTag::Duration, _) => {
                enc.add_duration(&self.key, Duration::from_nanos(self.integer.max(0) as u64));
            }
            (FieldTag::Float64, _) => enc.add_float64(&self.key, f64::from_bits(self.integer as u64)),
            (FieldTag::Float32, _) => enc.add_float32(&self.key, f32::from_bits(self.integer as u32)),
            (FieldTag::Int64, _)
            | (FieldTag::Int32, _)
            | (FieldTag::Int16, _)
            | (FieldTag::Int8, _) => enc.add_int64(&self.key, self.integer),
            (FieldTag::String, _) => enc.add_string(&self.key, &self.string),
            (FieldTag::Time, _) => {
                enc.add_time(&self.key, DateTime::from_timestamp_nanos(self.integer));
            }
            (FieldTag::Uint64, _)
            | (FieldTag::Uint32, _)
            | (FieldTag::Uint16, _)
            | (FieldTag::Uint8, _)
            | (FieldTag::Uintptr, _) => enc.add_uint64(&self.key, self.integer as u64),
            (FieldTag::Reflect, FieldPayload::Reflect(v)) => enc.add_reflected(&self.key, v)?,
            (FieldTag::Namespace, _) => enc.open_namespace(&self.key),
            (FieldTag::Stringer, FieldPayload::Stringer(s)) => {
                enc.add_string(&self.key, &s.to_string());
            }
            (FieldTag::Error, FieldPayload::Error(err)) => {
                enc.add_string(&self.key, &err.to_string());
                let causes = collect_causes(err.as_ref());
                if !causes.is_empty() {
                    enc.add_array(&format!("{}Causes", self.key), &StringArray(causes))?;
                }
            }
            (FieldTag::Skip, _) => {}
            (tag, payload) => panic!("unknown field type: {:?}/{:?}", tag, payload),
        }
        Ok(())
    }
}

impl PartialEq for Field {
    /// Compares tag, key, and the payload slots the tag actually uses.
    /// Marshaler payloads compare by handle identity; stringers and errors
    /// by their rendered text.
    fn eq(&self, other: &Self) -> bool {
        if self.tag != other.tag || self.key != other.key {
            return false;
        }
        match (&self.payload, &other.payload) {
            (FieldPayload::Bytes(a), FieldPayload::Bytes(b)) => a == b,
            (
                FieldPayload::Complex { re: ar, im: ai },
                FieldPayload::Complex { re: br, im: bi },
            ) => ar == br && ai == bi,
            (FieldPayload::Array(a), FieldPayload::Array(b)) => Arc::ptr_eq(a, b),
            (FieldPayload::Object(a), FieldPayload::Object(b)) => Arc::ptr_eq(a, b),
            (FieldPayload::Stringer(a), FieldPayload::Stringer(b)) => {
                a.to_string() == b.to_string()
            }
            (FieldPayload::Error(a), FieldPayload::Error(b)) => a.to_string() == b.to_string(),
            (FieldPayload::Reflect(a), FieldPayload::Reflect(b)) => a == b,
            (FieldPayload::None, FieldPayload::None) => {
                self.integer == other.integer && self.string == other.string
            }
            _ => false,
        }
    }
}

fn collect_causes(err: &(dyn std::error::Error + 'static)) -> Vec<String> {
    let mut causes = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = cause.source();
    }
    causes
}

struct StringArray(Vec<String>);

impl ArrayMarshaler for StringArray {
    fn marshal_log_array(&self, enc: &mut dyn ArrayEncoder) -> Result<()> {
        for s in &self.0 {
            enc.append_string(s);
        }
        Ok(())
    }
}

/// Apply a slice of fields to an encoder, stopping at the first failure.
pub fn add_fields(enc: &mut dyn ObjectEncoder, fields: &[Field]) -> Result<()> {
    for field in fields {
        field.add_to(enc)?;
    }
    Ok(())
}

/// Apply fields where no error channel exists (context accumulation): a
/// failing field degrades to a `"<key>Error"` string carrying the failure.
pub(crate) fn add_fields_lossy(enc: &mut dyn ObjectEncoder, fields: &[Field]) {
    for field in fields {
        if let Err(err) = field.add_to(enc) {
            enc.add_string(&format!("{}Error", field.key), &err.to_string());
        }
    }
}
