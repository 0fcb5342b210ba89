//! Property-based tests using proptest

use fastlog::{Encoder, EncoderConfig, Entry, Field, JsonEncoder, Level, LevelEnabler};
use proptest::prelude::*;

fn no_time_config() -> EncoderConfig {
    EncoderConfig {
        time_key: String::new(),
        ..EncoderConfig::production()
    }
}

fn encode(entry: &Entry, fields: &[Field]) -> String {
    let enc = JsonEncoder::new(no_time_config());
    let buf = enc.encode_entry(entry, fields).expect("encode");
    String::from_utf8(buf.to_vec()).expect("utf8")
}

fn arb_level() -> impl Strategy<Value = Level> {
    prop_oneof![
        Just(Level::Debug),
        Just(Level::Info),
        Just(Level::Warn),
        Just(Level::Error),
        Just(Level::DPanic),
        Just(Level::Panic),
        Just(Level::Fatal),
    ]
}

proptest! {
    /// Level text round-trips through parse on all seven names.
    #[test]
    fn prop_level_text_roundtrip(level in arb_level()) {
        let parsed: Level = level.as_str().parse().unwrap();
        prop_assert_eq!(parsed, level);
    }

    /// Level ordering matches the numeric discriminants.
    #[test]
    fn prop_level_ordering(a in arb_level(), b in arb_level()) {
        prop_assert_eq!(a <= b, (a as i8) <= (b as i8));
        prop_assert_eq!(a.enabled(b), a <= b);
    }

    /// Whatever the message and string fields contain, the encoded line
    /// parses as JSON and preserves the values.
    #[test]
    fn prop_output_is_valid_json(
        msg in ".*",
        key in "[a-zA-Z_][a-zA-Z0-9_]{0,12}",
        value in ".*",
    ) {
        let out = encode(&Entry::new(Level::Info, msg.clone()), &[Field::string(&key, value.clone())]);
        let parsed: serde_json::Value = serde_json::from_str(out.trim_end()).unwrap();
        prop_assert_eq!(parsed["msg"].as_str().unwrap(), msg.as_str());
        prop_assert_eq!(parsed[&key].as_str().unwrap(), value.as_str());
    }

    /// Arbitrary bytes in a byte-string field never break the JSON frame.
    #[test]
    fn prop_byte_strings_stay_valid(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let out = encode(&Entry::new(Level::Info, "m"), &[Field::byte_string("b", bytes)]);
        let parsed: serde_json::Value = serde_json::from_str(out.trim_end()).unwrap();
        prop_assert!(parsed["b"].is_string());
    }

    /// Numbers survive the trip through the buffer formatters.
    #[test]
    fn prop_numeric_fields_roundtrip(i in any::<i64>(), u in any::<u64>(), f in any::<f64>()) {
        prop_assume!(f.is_finite());
        let out = encode(
            &Entry::new(Level::Info, "m"),
            &[Field::int64("i", i), Field::uint64("u", u), Field::float64("f", f)],
        );
        let parsed: serde_json::Value = serde_json::from_str(out.trim_end()).unwrap();
        prop_assert_eq!(parsed["i"].as_i64().unwrap(), i);
        prop_assert_eq!(parsed["u"].as_u64().unwrap(), u);
        let back = parsed["f"].as_f64().unwrap();
        prop_assert!(back == f || (back - f).abs() <= f64::EPSILON * f.abs());
    }

    /// Clones never share buffers: appends to one are invisible to the other.
    #[test]
    fn prop_clone_independence(
        parent_key in "[a-z]{1,8}",
        child_key in "[a-z]{1,8}",
        parent_val in any::<i64>(),
        child_val in any::<i64>(),
    ) {
        use fastlog::ObjectEncoder;

        let mut parent = JsonEncoder::new(no_time_config());
        parent.add_int64(&parent_key, parent_val);
        let parent_bytes_before = {
            let buf = parent.encode_entry(&Entry::new(Level::Info, "m"), &[]).unwrap();
            buf.to_vec()
        };

        let mut child = parent.clone_encoder();
        child.add_int64(&child_key, child_val);

        let parent_bytes_after = {
            let buf = parent.encode_entry(&Entry::new(Level::Info, "m"), &[]).unwrap();
            buf.to_vec()
        };
        prop_assert_eq!(parent_bytes_before, parent_bytes_after);
    }

    /// Any run of namespaces and fields still yields balanced, valid JSON.
    #[test]
    fn prop_namespaces_always_balanced(
        names in proptest::collection::vec("[a-z]{1,6}", 1..5),
    ) {
        let mut fields = Vec::new();
        for name in &names {
            fields.push(Field::namespace(name));
            fields.push(Field::int64(name, 1));
        }
        let out = encode(&Entry::new(Level::Info, "m"), &fields);
        serde_json::from_str::<serde_json::Value>(out.trim_end()).unwrap();
        prop_assert_eq!(out.matches('{').count(), out.matches('}').count());
    }
}
