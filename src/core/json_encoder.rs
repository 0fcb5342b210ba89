//! Low-allocation JSON encoder

use super::encoder::{
    full_name_encoder, ArrayEncoder, ArrayMarshaler, Encoder, EncoderConfig, ObjectEncoder,
    ObjectMarshaler, PrimitiveEncoder, DEFAULT_LINE_ENDING,
};
use super::entry::Entry;
use super::error::Result;
use super::field::{add_fields, Field};
use crate::buffer::{self, Buffer};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

const HEX: &[u8; 16] = b"0123456789abcdef";

/// A fast JSON encoder that escapes all field keys and values and writes
/// values straight into a pooled buffer.
///
/// Keys are not deduplicated: adding the same key twice produces
/// `{"foo":"bar","foo":"baz"}`, which the JSON specification permits but
/// many consumers resolve by keeping only one pair.
pub struct JsonEncoder {
    pub(crate) config: Arc<EncoderConfig>,
    pub(crate) buf: Buffer,
    pub(crate) spaced: bool,
    pub(crate) open_namespaces: usize,

    // Scratch space for encoding reflected values, reused across fields.
    reflect_buf: Option<Buffer>,
}

impl JsonEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        JsonEncoder::with_spacing(Arc::new(config), false)
    }

    pub(crate) fn with_spacing(config: Arc<EncoderConfig>, spaced: bool) -> Self {
        JsonEncoder {
            config,
            buf: buffer::get(),
            spaced,
            open_namespaces: 0,
            reflect_buf: None,
        }
    }

    /// Concrete clone, copying the accumulated context bytes and the open
    /// namespace depth into an independent encoder.
    pub(crate) fn clone_json(&self) -> JsonEncoder {
        let mut clone = JsonEncoder::with_spacing(Arc::clone(&self.config), self.spaced);
        clone.open_namespaces = self.open_namespaces;
        clone.buf.append_bytes(self.buf.as_bytes());
        clone
    }

    // An empty clone: same config and namespace depth, fresh buffer.
    fn blank_clone(&self) -> JsonEncoder {
        let mut clone = JsonEncoder::with_spacing(Arc::clone(&self.config), self.spaced);
        clone.open_namespaces = self.open_namespaces;
        clone
    }

    fn add_key(&mut self, key: &str) {
        self.add_element_separator();
        self.buf.append_byte(b'"');
        self.safe_add_string(key);
        self.buf.append_byte(b'"');
        self.buf.append_byte(b':');
        if self.spaced {
            self.buf.append_byte(b' ');
        }
    }

    fn add_element_separator(&mut self) {
        match self.buf.last_byte() {
            None | Some(b'{') | Some(b'[') | Some(b':') | Some(b',') | Some(b' ') => {}
            _ => {
                self.buf.append_byte(b',');
                if self.spaced {
                    self.buf.append_byte(b' ');
                }
            }
        }
    }

    fn append_float_value(&mut self, value: f64, bits: u32) {
        self.add_element_separator();
        if value.is_nan() {
            self.buf.append_str("\"NaN\"");
        } else if value == f64::INFINITY {
            self.buf.append_str("\"+Inf\"");
        } else if value == f64::NEG_INFINITY {
            self.buf.append_str("\"-Inf\"");
        } else {
            self.buf.append_float(value, bits);
        }
    }

    pub(crate) fn close_open_namespaces(&mut self) {
        for _ in 0..self.open_namespaces {
            self.buf.append_byte(b'}');
        }
        self.open_namespaces = 0;
    }

    /// JSON-escape a string and append it. Unlike the generic serializer,
    /// this makes no attempt to protect consumers from HTML or JSONP issues.
    fn safe_add_string(&mut self, s: &str) {
        self.escape_chunk(s);
    }

    /// Byte-slice equivalent of [`safe_add_string`] with UTF-8 validation:
    /// each invalid sequence becomes a replacement character, nothing is
    /// truncated.
    ///
    /// [`safe_add_string`]: JsonEncoder::safe_add_string
    fn safe_add_byte_string(&mut self, mut s: &[u8]) {
        while !s.is_empty() {
            match std::str::from_utf8(s) {
                Ok(valid) => {
                    self.escape_chunk(valid);
                    return;
                }
                Err(err) => {
                    let (valid, rest) = s.split_at(err.valid_up_to());
                    if let Ok(prefix) = std::str::from_utf8(valid) {
                        self.escape_chunk(prefix);
                    }
                    self.buf.append_str("\\ufffd");
                    let skip = err.error_len().unwrap_or(rest.len());
                    s = &rest[skip..];
                }
            }
        }
    }

    fn escape_chunk(&mut self, s: &str) {
        for &b in s.as_bytes() {
            // Multi-byte sequences are already valid here; pass them through.
            if b >= 0x80 || (b >= 0x20 && b != b'\\' && b != b'"') {
                self.buf.append_byte(b);
                continue;
            }
            match b {
                b'\\' | b'"' => {
                    self.buf.append_byte(b'\\');
                    self.buf.append_byte(b);
                }
                b'\n' => self.buf.append_str("\\n"),
                b'\r' => self.buf.append_str("\\r"),
                b'\t' => self.buf.append_str("\\t"),
                _ => {
                    self.buf.append_str("\\u00");
                    self.buf.append_byte(HEX[(b >> 4) as usize]);
                    self.buf.append_byte(HEX[(b & 0xF) as usize]);
                }
            }
        }
    }

    // Serializes through the generic machinery into the reusable scratch
    // buffer, then splices the raw bytes in after the separator/key.
    fn with_reflected<F>(&mut self, value: &serde_json::Value, splice: F) -> Result<()>
    where
        F: FnOnce(&mut Self),
    {
        let mut rbuf = self.reflect_buf.take().unwrap_or_else(buffer::get);
        rbuf.reset();
        serde_json::to_writer(&mut rbuf, value)?;
        rbuf.truncate_newline();
        splice(self);
        self.buf.append_bytes(rbuf.as_bytes());
        self.reflect_buf = Some(rbuf);
        Ok(())
    }
}

impl PrimitiveEncoder for JsonEncoder {
    fn append_bool(&mut self, value: bool) {
        self.add_element_separator();
        self.buf.append_bool(value);
    }

    fn append_byte_string(&mut self, value: &[u8]) {
        self.add_element_separator();
        self.buf.append_byte(b'"');
        self.safe_add_byte_string(value);
        self.buf.append_byte(b'"');
    }

    fn append_complex128(&mut self, re: f64, im: f64) {
        self.add_element_separator();
        // Inside a quoted string NaN and infinities need no special casing.
        self.buf.append_byte(b'"');
        self.buf.append_float(re, 64);
        self.buf.append_byte(b'+');
        self.buf.append_float(im, 64);
        self.buf.append_byte(b'i');
        self.buf.append_byte(b'"');
    }

    fn append_duration(&mut self, value: Duration) {
        let cur = self.buf.len();
        if let Some(encode) = self.config.encode_duration {
            encode(value, self);
        }
        if cur == self.buf.len() {
            // The duration policy appended nothing; fall back to
            // nanoseconds to keep the output valid JSON.
            self.append_int64(value.as_nanos() as i64);
        }
    }

    fn append_float64(&mut self, value: f64) {
        self.append_float_value(value, 64);
    }

    fn append_float32(&mut self, value: f32) {
        self.append_float_value(f64::from(value), 32);
    }

    fn append_int64(&mut self, value: i64) {
        self.add_element_separator();
        self.buf.append_int(value);
    }

    fn append_uint64(&mut self, value: u64) {
        self.add_element_separator();
        self.buf.append_uint(value);
    }

    fn append_string(&mut self, value: &str) {
        self.add_element_separator();
        self.buf.append_byte(b'"');
        self.safe_add_string(value);
        self.buf.append_byte(b'"');
    }

    fn append_time(&mut self, value: DateTime<Utc>) {
        let cur = self.buf.len();
        if let Some(encode) = self.config.encode_time {
            encode(value, self);
        }
        if cur == self.buf.len() {
            // The time policy appended nothing; fall back to nanoseconds
            // since epoch to keep the output valid JSON.
            self.append_int64(value.timestamp_nanos_opt().unwrap_or_default());
        }
    }
}

impl ArrayEncoder for JsonEncoder {
    fn append_array(&mut self, arr: &dyn ArrayMarshaler) -> Result<()> {
        self.add_element_separator();
        self.buf.append_byte(b'[');
        let result = arr.marshal_log_array(self);
        self.buf.append_byte(b']');
        result
    }

    fn append_object(&mut self, obj: &dyn ObjectMarshaler) -> Result<()> {
        self.add_element_separator();
        self.buf.append_byte(b'{');
        let result = obj.marshal_log_object(self);
        self.buf.append_byte(b'}');
        result
    }

    fn append_reflected(&mut self, value: &serde_json::Value) -> Result<()> {
        self.with_reflected(value, |enc| enc.add_element_separator())
    }
}

impl ObjectEncoder for JsonEncoder {
    fn add_array(&mut self, key: &str, arr: &dyn ArrayMarshaler) -> Result<()> {
        self.add_key(key);
        self.append_array(arr)
    }

    fn add_object(&mut self, key: &str, obj: &dyn ObjectMarshaler) -> Result<()> {
        self.add_key(key);
        self.append_object(obj)
    }

    fn add_binary(&mut self, key: &str, value: &[u8]) {
        self.add_string(key, &BASE64.encode(value));
    }

    fn add_byte_string(&mut self, key: &str, value: &[u8]) {
        self.add_key(key);
        self.append_byte_string(value);
    }

    fn add_bool(&mut self, key: &str, value: bool) {
        self.add_key(key);
        self.append_bool(value);
    }

    fn add_complex128(&mut self, key: &str, re: f64, im: f64) {
        self.add_key(key);
        self.append_complex128(re, im);
    }

    fn add_duration(&mut self, key: &str, value: Duration) {
        self.add_key(key);
        self.append_duration(value);
    }

    fn add_float64(&mut self, key: &str, value: f64) {
        self.add_key(key);
        self.append_float64(value);
    }

    fn add_float32(&mut self, key: &str, value: f32) {
        self.add_key(key);
        self.append_float32(value);
    }

    fn add_int64(&mut self, key: &str, value: i64) {
        self.add_key(key);
        self.append_int64(value);
    }

    fn add_uint64(&mut self, key: &str, value: u64) {
        self.add_key(key);
        self.append_uint64(value);
    }

    fn add_string(&mut self, key: &str, value: &str) {
        self.add_key(key);
        self.append_string(value);
    }

    fn add_time(&mut self, key: &str, value: DateTime<Utc>) {
        self.add_key(key);
        self.append_time(value);
    }

    fn add_reflected(&mut self, key: &str, value: &serde_json::Value) -> Result<()> {
        self.with_reflected(value, |enc| enc.add_key(key))
    }

    fn open_namespace(&mut self, key: &str) {
        self.add_key(key);
        self.buf.append_byte(b'{');
        self.open_namespaces += 1;
    }
}

impl Encoder for JsonEncoder {
    fn clone_encoder(&self) -> Box<dyn Encoder> {
        Box::new(self.clone_json())
    }

    fn encode_entry(&self, entry: &Entry, fields: &[Field]) -> Result<Buffer> {
        let mut out = self.blank_clone();
        let cfg = Arc::clone(&out.config);
        out.buf.append_byte(b'{');

        if !cfg.level_key.is_empty() {
            out.add_key(&cfg.level_key);
            let cur = out.buf.len();
            if let Some(encode) = cfg.encode_level {
                encode(entry.level, &mut out);
            }
            if cur == out.buf.len() {
                // The level policy appended nothing; fall back to the level
                // name to keep the output valid JSON.
                out.append_string(entry.level.as_str());
            }
        }
        if !cfg.time_key.is_empty() {
            out.add_time(&cfg.time_key, entry.time);
        }
        if !entry.logger_name.is_empty() && !cfg.name_key.is_empty() {
            out.add_key(&cfg.name_key);
            let cur = out.buf.len();
            let encode = cfg.encode_name.unwrap_or(full_name_encoder);
            encode(&entry.logger_name, &mut out);
            if cur == out.buf.len() {
                out.append_string(&entry.logger_name);
            }
        }
        if entry.caller.defined && !cfg.caller_key.is_empty() {
            out.add_key(&cfg.caller_key);
            let cur = out.buf.len();
            if let Some(encode) = cfg.encode_caller {
                encode(&entry.caller, &mut out);
            }
            if cur == out.buf.len() {
                out.append_string(&entry.caller.full_path());
            }
        }
        if !cfg.message_key.is_empty() {
            out.add_key(&cfg.message_key);
            out.append_string(&entry.message);
        }
        if !self.buf.is_empty() {
            out.add_element_separator();
            out.buf.append_bytes(self.buf.as_bytes());
        }
        add_fields(&mut out, fields)?;
        out.close_open_namespaces();
        if !entry.stack.is_empty() && !cfg.stacktrace_key.is_empty() {
            out.add_string(&cfg.stacktrace_key, &entry.stack);
        }
        out.buf.append_byte(b'}');
        if cfg.line_ending.is_empty() {
            out.buf.append_str(DEFAULT_LINE_ENDING);
        } else {
            out.buf.append_str(&cfg.line_ending);
        }

        Ok(std::mem::replace(&mut out.buf, Buffer::new()))
    }
}
