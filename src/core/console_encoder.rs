//! Human-readable console encoder

use super::encoder::{
    full_name_encoder, ArrayEncoder, ArrayMarshaler, Encoder, EncoderConfig, ObjectEncoder,
    ObjectMarshaler, PrimitiveEncoder, DEFAULT_LINE_ENDING,
};
use super::entry::Entry;
use super::error::Result;
use super::field::{add_fields, Field};
use super::json_encoder::JsonEncoder;
use crate::buffer::{self, Buffer};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// An encoder whose output is designed for humans rather than machines: the
/// entry metadata (time, level, name, caller) is rendered as plain tab-joined
/// text, followed by the message and a JSON rendering of the structured
/// context.
///
/// The console encoder does not print the configured key names, but it still
/// omits any element whose key is set to the empty string.
pub struct ConsoleEncoder {
    json: JsonEncoder,
}

impl ConsoleEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        ConsoleEncoder {
            json: JsonEncoder::with_spacing(Arc::new(config), true),
        }
    }

    // Renders accumulated context plus call-site fields as a `{...}` block,
    // through a clone of the JSON encoder so this encoder's state is
    // untouched.
    fn write_context(&self, line: &mut Buffer, fields: &[Field]) -> Result<()> {
        let mut context = self.json.clone_json();
        add_fields(&mut context, fields)?;
        context.close_open_namespaces();
        if context.buf.is_empty() {
            return Ok(());
        }

        add_tab_if_necessary(line);
        line.append_byte(b'{');
        line.append_bytes(context.buf.as_bytes());
        line.append_byte(b'}');
        Ok(())
    }
}

fn add_tab_if_necessary(line: &mut Buffer) {
    if !line.is_empty() {
        line.append_byte(b'\t');
    }
}

// Collects plain-text renderings of the metadata pieces. Quoting and
// escaping are deliberately skipped; formatting is whatever the policy
// encoders produce.
struct SliceEncoder {
    elems: Vec<String>,
}

impl SliceEncoder {
    fn new() -> Self {
        SliceEncoder { elems: Vec::new() }
    }
}

impl PrimitiveEncoder for SliceEncoder {
    fn append_bool(&mut self, value: bool) {
        self.elems.push(value.to_string());
    }

    fn append_byte_string(&mut self, value: &[u8]) {
        self.elems
            .push(String::from_utf8_lossy(value).into_owned());
    }

    fn append_complex128(&mut self, re: f64, im: f64) {
        self.elems.push(format!("{}+{}i", re, im));
    }

    fn append_duration(&mut self, value: Duration) {
        self.elems.push(format!("{:?}", value));
    }

    fn append_float64(&mut self, value: f64) {
        self.elems.push(value.to_string());
    }

    fn append_float32(&mut self, value: f32) {
        self.elems.push(value.to_string());
    }

    fn append_int64(&mut self, value: i64) {
        self.elems.push(value.to_string());
    }

    fn append_uint64(&mut self, value: u64) {
        self.elems.push(value.to_string());
    }

    fn append_string(&mut self, value: &str) {
        self.elems.push(value.to_string());
    }

    fn append_time(&mut self, value: DateTime<Utc>) {
        self.elems.push(value.to_rfc3339());
    }
}

impl ArrayEncoder for SliceEncoder {
    fn append_array(&mut self, arr: &dyn ArrayMarshaler) -> Result<()> {
        let mut nested = SliceEncoder::new();
        arr.marshal_log_array(&mut nested)?;
        self.elems.push(format!("[{}]", nested.elems.join(", ")));
        Ok(())
    }

    fn append_object(&mut self, obj: &dyn ObjectMarshaler) -> Result<()> {
        let mut nested = JsonEncoder::new(EncoderConfig::production());
        obj.marshal_log_object(&mut nested)?;
        self.elems.push(format!(
            "{{{}}}",
            String::from_utf8_lossy(nested.buf.as_bytes())
        ));
        Ok(())
    }

    fn append_reflected(&mut self, value: &serde_json::Value) -> Result<()> {
        self.elems.push(serde_json::to_string(value)?);
        Ok(())
    }
}

impl ObjectEncoder for ConsoleEncoder {
    fn add_array(&mut self, key: &str, arr: &dyn ArrayMarshaler) -> Result<()> {
        self.json.add_array(key, arr)
    }

    fn add_object(&mut self, key: &str, obj: &dyn ObjectMarshaler) -> Result<()> {
        self.json.add_object(key, obj)
    }

    fn add_binary(&mut self, key: &str, value: &[u8]) {
        self.json.add_binary(key, value);
    }

    fn add_byte_string(&mut self, key: &str, value: &[u8]) {
        self.json.add_byte_string(key, value);
    }

    fn add_bool(&mut self, key: &str, value: bool) {
        self.json.add_bool(key, value);
    }

    fn add_complex128(&mut self, key: &str, re: f64, im: f64) {
        self.json.add_complex128(key, re, im);
    }

    fn add_duration(&mut self, key: &str, value: Duration) {
        self.json.add_duration(key, value);
    }

    fn add_float64(&mut self, key: &str, value: f64) {
        self.json.add_float64(key, value);
    }

    fn add_float32(&mut self, key: &str, value: f32) {
        self.json.add_float32(key, value);
    }

    fn add_int64(&mut self, key: &str, value: i64) {
        self.json.add_int64(key, value);
    }

    fn add_uint64(&mut self, key: &str, value: u64) {
        self.json.add_uint64(key, value);
    }

    fn add_string(&mut self, key: &str, value: &str) {
        self.json.add_string(key, value);
    }

    fn add_time(&mut self, key: &str, value: DateTime<Utc>) {
        self.json.add_time(key, value);
    }

    fn add_reflected(&mut self, key: &str, value: &serde_json::Value) -> Result<()> {
        self.json.add_reflected(key, value)
    }

    fn open_namespace(&mut self, key: &str) {
        self.json.open_namespace(key);
    }
}

impl Encoder for ConsoleEncoder {
    fn clone_encoder(&self) -> Box<dyn Encoder> {
        Box::new(ConsoleEncoder {
            json: self.json.clone_json(),
        })
    }

    fn encode_entry(&self, entry: &Entry, fields: &[Field]) -> Result<Buffer> {
        let cfg = Arc::clone(&self.json.config);
        let mut line = buffer::get();

        let mut meta = SliceEncoder::new();
        if !cfg.time_key.is_empty() {
            if let Some(encode) = cfg.encode_time {
                encode(entry.time, &mut meta);
            }
        }
        if !cfg.level_key.is_empty() {
            if let Some(encode) = cfg.encode_level {
                encode(entry.level, &mut meta);
            }
        }
        if !entry.logger_name.is_empty() && !cfg.name_key.is_empty() {
            let encode = cfg.encode_name.unwrap_or(full_name_encoder);
            encode(&entry.logger_name, &mut meta);
        }
        if entry.caller.defined && !cfg.caller_key.is_empty() {
            if let Some(encode) = cfg.encode_caller {
                encode(&entry.caller, &mut meta);
            }
        }
        for (i, elem) in meta.elems.iter().enumerate() {
            if i > 0 {
                line.append_byte(b'\t');
            }
            line.append_str(elem);
        }

        if !cfg.message_key.is_empty() {
            add_tab_if_necessary(&mut line);
            line.append_str(&entry.message);
        }

        self.write_context(&mut line, fields)?;

        // An empty stacktrace key forces single-line output.
        if !entry.stack.is_empty() && !cfg.stacktrace_key.is_empty() {
            line.append_byte(b'\n');
            line.append_str(&entry.stack);
        }

        if cfg.line_ending.is_empty() {
            line.append_str(DEFAULT_LINE_ENDING);
        } else {
            line.append_str(&cfg.line_ending);
        }
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::encoder::{capital_level_encoder, short_caller_encoder};
    use crate::core::entry::Caller;
    use crate::core::level::Level;

    fn console_config() -> EncoderConfig {
        EncoderConfig {
            time_key: String::new(),
            encode_level: Some(capital_level_encoder),
            encode_caller: Some(short_caller_encoder),
            ..EncoderConfig::production()
        }
    }

    fn render(enc: &ConsoleEncoder, entry: &Entry, fields: &[Field]) -> String {
        let buf = enc.encode_entry(entry, fields).expect("encode");
        String::from_utf8(buf.to_vec()).expect("utf8")
    }

    #[test]
    fn test_plain_line() {
        let enc = ConsoleEncoder::new(console_config());
        let entry = Entry::new(Level::Info, "ready");
        assert_eq!(render(&enc, &entry, &[]), "INFO\tready\n");
    }

    #[test]
    fn test_metadata_tab_joined() {
        let enc = ConsoleEncoder::new(console_config());
        let mut entry = Entry::new(Level::Warn, "careful");
        entry.logger_name = "server.http".to_string();
        entry.caller = Caller::new("src/server/http.rs", 9);
        assert_eq!(
            render(&enc, &entry, &[]),
            "WARN\tserver.http\tserver/http.rs:9\tcareful\n"
        );
    }

    #[test]
    fn test_context_block_spaced_json() {
        let enc = ConsoleEncoder::new(console_config());
        let entry = Entry::new(Level::Info, "m");
        let out = render(
            &enc,
            &entry,
            &[Field::string("k", "v"), Field::int64("n", 3)],
        );
        assert_eq!(out, "INFO\tm\t{\"k\": \"v\", \"n\": 3}\n");
    }

    #[test]
    fn test_context_includes_accumulated_fields() {
        let mut enc = ConsoleEncoder::new(console_config());
        enc.add_int64("ctx", 1);
        let entry = Entry::new(Level::Info, "m");
        let out = render(&enc, &entry, &[Field::int64("call", 2)]);
        assert_eq!(out, "INFO\tm\t{\"ctx\": 1, \"call\": 2}\n");
    }

    #[test]
    fn test_open_namespace_closed_in_context() {
        let enc = ConsoleEncoder::new(console_config());
        let entry = Entry::new(Level::Info, "m");
        let out = render(
            &enc,
            &entry,
            &[Field::namespace("ns"), Field::int64("x", 1)],
        );
        assert_eq!(out, "INFO\tm\t{\"ns\": {\"x\": 1}}\n");
    }

    #[test]
    fn test_stack_on_own_line() {
        let enc = ConsoleEncoder::new(console_config());
        let mut entry = Entry::new(Level::Error, "boom");
        entry.stack = "frame one\nframe two".to_string();
        assert_eq!(
            render(&enc, &entry, &[]),
            "ERROR\tboom\nframe one\nframe two\n"
        );
    }

    #[test]
    fn test_empty_stack_key_forces_single_line() {
        let mut cfg = console_config();
        cfg.stacktrace_key = String::new();
        let enc = ConsoleEncoder::new(cfg);
        let mut entry = Entry::new(Level::Error, "boom");
        entry.stack = "frame one".to_string();
        assert_eq!(render(&enc, &entry, &[]), "ERROR\tboom\n");
    }

    #[test]
    fn test_nil_level_policy_suppresses_metadata() {
        let mut cfg = console_config();
        cfg.encode_level = None;
        let enc = ConsoleEncoder::new(cfg);
        let entry = Entry::new(Level::Info, "quiet");
        assert_eq!(render(&enc, &entry, &[]), "quiet\n");
    }

    #[test]
    fn test_clone_keeps_context() {
        let mut enc = ConsoleEncoder::new(console_config());
        enc.add_string("app", "api");
        let clone = enc.clone_encoder();
        let entry = Entry::new(Level::Info, "m");
        let buf = clone.encode_entry(&entry, &[]).expect("encode");
        assert_eq!(
            String::from_utf8(buf.to_vec()).unwrap(),
            "INFO\tm\t{\"app\": \"api\"}\n"
        );
    }
}
