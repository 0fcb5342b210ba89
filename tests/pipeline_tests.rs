//! Core pipeline behavior: gating, derivation, fan-out, sampling, sinks

use fastlog::sinks::{self, MemorySink, WriteSyncer};
use fastlog::{
    new_sampler, new_tee, Core, EncoderConfig, Entry, Field, IoCore, JsonEncoder, Level,
    LevelEnablerFn,
};
use std::io;
use std::sync::Arc;
use std::time::Duration;

fn no_time_config() -> EncoderConfig {
    EncoderConfig {
        time_key: String::new(),
        ..EncoderConfig::production()
    }
}

fn json_core(sink: Arc<MemorySink>, level: Level) -> Arc<dyn Core> {
    IoCore::new(Box::new(JsonEncoder::new(no_time_config())), sink, level)
}

fn submit(core: &Arc<dyn Core>, entry: &Entry, fields: &[Field]) -> bool {
    match Arc::clone(core).check(entry, None) {
        Some(ce) => {
            ce.write(fields);
            true
        }
        None => false,
    }
}

#[test]
fn test_disabled_core_neither_checks_nor_writes() {
    let sink = Arc::new(MemorySink::new());
    let core = json_core(sink.clone(), Level::Error);

    let entry = Entry::new(Level::Info, "below threshold");
    assert!(!core.enabled(entry.level));
    assert!(!submit(&core, &entry, &[]));

    // Even a direct write on a disabled core produces no output.
    core.write(&entry, &[]).expect("write");
    assert!(sink.contents().is_empty());
}

#[test]
fn test_copy_on_write_with() {
    let sink1 = Arc::new(MemorySink::new());
    let parent = json_core(sink1.clone(), Level::Info);

    // Siblings derived from the same parent stay independent.
    let c1 = parent.with(vec![Field::int64("a", 1)]);
    let c2 = parent.with(vec![Field::int64("b", 2)]);

    submit(&c1, &Entry::new(Level::Info, "x"), &[]);
    submit(&c2, &Entry::new(Level::Info, "x"), &[]);

    let lines = sink1.lines();
    assert!(lines[0].contains("\"a\":1"));
    assert!(!lines[0].contains("\"b\""));
    assert!(lines[1].contains("\"b\":2"));
    assert!(!lines[1].contains("\"a\""));
}

#[test]
fn test_with_enabled_matches_parent() {
    let core = json_core(Arc::new(MemorySink::new()), Level::Warn);
    let derived = core.with(vec![Field::string("k", "v")]);
    for level in Level::ALL {
        assert_eq!(core.enabled(level), derived.enabled(level));
    }
}

#[test]
fn test_tee_routes_by_level() {
    let debug_sink = Arc::new(MemorySink::new());
    let error_sink = Arc::new(MemorySink::new());
    let tee = new_tee(vec![
        json_core(debug_sink.clone(), Level::Debug),
        json_core(error_sink.clone(), Level::Error),
    ]);

    submit(&tee, &Entry::new(Level::Info, "info"), &[]);
    submit(&tee, &Entry::new(Level::Error, "error"), &[]);

    assert_eq!(debug_sink.lines().len(), 2);
    assert_eq!(error_sink.lines().len(), 1);
    assert!(error_sink.lines()[0].contains("\"error\""));
}

#[test]
fn test_tee_with_derives_all_children() {
    let a = Arc::new(MemorySink::new());
    let b = Arc::new(MemorySink::new());
    let tee = new_tee(vec![
        json_core(a.clone(), Level::Debug),
        json_core(b.clone(), Level::Debug),
    ]);

    let derived = tee.with(vec![Field::string("shared", "yes")]);
    submit(&derived, &Entry::new(Level::Info, "m"), &[]);

    assert!(a.lines()[0].contains("\"shared\":\"yes\""));
    assert!(b.lines()[0].contains("\"shared\":\"yes\""));
}

#[test]
fn test_split_streams_with_enabler_fn() {
    // Standard-out for low-severity, standard-error-like sink for the rest.
    let out = Arc::new(MemorySink::new());
    let err = Arc::new(MemorySink::new());
    let tee = new_tee(vec![
        IoCore::new(
            Box::new(JsonEncoder::new(no_time_config())),
            out.clone(),
            LevelEnablerFn(|l| l < Level::Error),
        ),
        IoCore::new(
            Box::new(JsonEncoder::new(no_time_config())),
            err.clone(),
            LevelEnablerFn(|l| l >= Level::Error),
        ),
    ]);

    submit(&tee, &Entry::new(Level::Info, "fine"), &[]);
    submit(&tee, &Entry::new(Level::Error, "broken"), &[]);

    assert_eq!(out.lines().len(), 1);
    assert_eq!(err.lines().len(), 1);
    assert!(out.lines()[0].contains("fine"));
    assert!(err.lines()[0].contains("broken"));
}

#[test]
fn test_sampler_first_thereafter() {
    let sink = Arc::new(MemorySink::new());
    let sampled = new_sampler(
        json_core(sink.clone(), Level::Debug),
        Duration::from_secs(1),
        2,
        3,
    );

    // Ten identical entries within one tick: 1, 2 pass from `first`,
    // then 5 and 8 (n - first divisible by `thereafter`).
    let template = Entry::new(Level::Info, "m");
    let mut passed = Vec::new();
    for i in 1..=10 {
        let entry = template.clone();
        if submit(&sampled, &entry, &[]) {
            passed.push(i);
        }
    }

    assert_eq!(passed, vec![1, 2, 5, 8]);
    assert_eq!(sink.lines().len(), 4);
}

#[test]
fn test_sampler_window_formula() {
    // Exactly min(observed, first + (observed - first) / thereafter)
    // entries reach the child within one window.
    let observed = 25u64;
    let (first, thereafter) = (3u64, 5u64);
    let sink = Arc::new(MemorySink::new());
    let sampled = new_sampler(
        json_core(sink.clone(), Level::Debug),
        Duration::from_secs(60),
        first,
        thereafter,
    );

    let template = Entry::new(Level::Info, "steady");
    for _ in 0..observed {
        submit(&sampled, &template.clone(), &[]);
    }

    let expected = first + (observed - first) / thereafter;
    assert_eq!(sink.lines().len() as u64, expected);
}

#[test]
fn test_multi_write_syncer_failure_keeps_writing() {
    struct FailWriter;
    impl WriteSyncer for FailWriter {
        fn write(&self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "failed"))
        }
        fn sync(&self) -> io::Result<()> {
            Ok(())
        }
    }

    let buffer = Arc::new(MemorySink::new());
    let multi = sinks::multi_write_syncer(vec![
        Arc::new(FailWriter) as Arc<dyn WriteSyncer>,
        buffer.clone(),
    ]);

    let err = multi.write(b"fail").unwrap_err();
    assert!(err.to_string().contains("failed"));
    assert_eq!(buffer.as_string(), "fail");
}

#[test]
fn test_lock_of_lock_is_identity() {
    let sink: Arc<dyn WriteSyncer> = Arc::new(MemorySink::new());
    let locked = sinks::lock(sink);
    let relocked = sinks::lock(locked.clone());
    assert!(Arc::ptr_eq(&locked, &relocked));
}

#[test]
fn test_core_write_failure_propagates() {
    struct FailSink;
    impl WriteSyncer for FailSink {
        fn write(&self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }
        fn sync(&self) -> io::Result<()> {
            Ok(())
        }
    }

    let core = IoCore::new(
        Box::new(JsonEncoder::new(no_time_config())),
        Arc::new(FailSink),
        Level::Debug,
    );
    let err = core.write(&Entry::new(Level::Info, "m"), &[]).unwrap_err();
    assert!(err.to_string().contains("disk full"));
}

#[test]
fn test_concurrent_writes_through_locked_sink() {
    let sink = Arc::new(MemorySink::new());
    let core = IoCore::new(
        Box::new(JsonEncoder::new(no_time_config())),
        sinks::lock(sink.clone()),
        Level::Debug,
    );

    let mut handles = Vec::new();
    for t in 0..4 {
        let core = Arc::clone(&core);
        handles.push(std::thread::spawn(move || {
            for i in 0..100 {
                let entry = Entry::new(Level::Info, format!("t{}-{}", t, i));
                if let Some(ce) = Arc::clone(&core).check(&entry, None) {
                    ce.write(&[]);
                }
            }
        }));
    }
    for handle in handles {
        handle.join().expect("thread");
    }

    let lines = sink.lines();
    assert_eq!(lines.len(), 400);
    for line in lines {
        serde_json::from_str::<serde_json::Value>(&line).expect("each line valid JSON");
    }
}
