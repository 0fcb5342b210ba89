//! Criterion benchmarks for the encoding hot path

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use fastlog::sinks::{self, WriteSyncer};
use fastlog::{Encoder, EncoderConfig, Entry, Field, IoCore, JsonEncoder, Level, Logger};
use std::io;
use std::sync::Arc;
use std::time::Duration;

struct DiscardSyncer;

impl WriteSyncer for DiscardSyncer {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }

    fn sync(&self) -> io::Result<()> {
        Ok(())
    }
}

fn ten_fields() -> Vec<Field> {
    vec![
        Field::int64("one", 1),
        Field::int64("two", 2),
        Field::int64("three", 3),
        Field::uint64("four", 4),
        Field::float64("five", 5.0),
        Field::string("six", "six"),
        Field::bool("seven", true),
        Field::duration("eight", Duration::from_millis(8)),
        Field::string("nine", "nine"),
        Field::int64("ten", 10),
    ]
}

fn bench_encode_entry(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_entry");
    group.throughput(Throughput::Elements(1));

    let enc = JsonEncoder::new(EncoderConfig::production());
    let entry = Entry::new(Level::Info, "a reasonably sized log message");

    group.bench_function("no_fields", |b| {
        b.iter(|| {
            let buf = enc.encode_entry(black_box(&entry), &[]).unwrap();
            black_box(buf.len())
        });
    });

    let fields = ten_fields();
    group.bench_function("ten_fields", |b| {
        b.iter(|| {
            let buf = enc.encode_entry(black_box(&entry), &fields).unwrap();
            black_box(buf.len())
        });
    });

    group.finish();
}

fn bench_accumulated_context(c: &mut Criterion) {
    let mut group = c.benchmark_group("accumulated_context");
    group.throughput(Throughput::Elements(1));

    let core = IoCore::new(
        Box::new(JsonEncoder::new(EncoderConfig::production())),
        Arc::new(DiscardSyncer),
        Level::Info,
    );
    let with_context = core.with(ten_fields());
    let entry = Entry::new(Level::Info, "carrying context");

    group.bench_function("write_with_context", |b| {
        b.iter(|| with_context.write(black_box(&entry), &[]).unwrap());
    });

    group.finish();
}

fn bench_logger(c: &mut Criterion) {
    let mut group = c.benchmark_group("logger");
    group.throughput(Throughput::Elements(1));

    let enabled = Logger::new(IoCore::new(
        Box::new(JsonEncoder::new(EncoderConfig::production())),
        Arc::new(DiscardSyncer),
        Level::Info,
    ));
    group.bench_function("info_two_fields", |b| {
        b.iter(|| {
            enabled.info(
                black_box("request handled"),
                &[Field::string("path", "/api/v1"), Field::int64("status", 200)],
            )
        });
    });

    let disabled = Logger::new(IoCore::new(
        Box::new(JsonEncoder::new(EncoderConfig::production())),
        Arc::new(DiscardSyncer),
        Level::Error,
    ));
    group.bench_function("disabled_level", |b| {
        b.iter(|| disabled.info(black_box("dropped before encoding"), &[]));
    });

    group.finish();
}

fn bench_sampler(c: &mut Criterion) {
    let mut group = c.benchmark_group("sampler");
    group.throughput(Throughput::Elements(1));

    let core = IoCore::new(
        Box::new(JsonEncoder::new(EncoderConfig::production())),
        Arc::new(DiscardSyncer),
        Level::Info,
    );
    let sampled = fastlog::new_sampler(core, Duration::from_secs(1), 10, 1000);
    let logger = Logger::new(sampled);

    group.bench_function("mostly_dropped", |b| {
        b.iter(|| logger.info(black_box("hot loop message"), &[]));
    });

    group.finish();
}

fn bench_multi_syncer(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_syncer");
    group.throughput(Throughput::Bytes(64));

    let line = [b'x'; 64];
    let single: Arc<dyn WriteSyncer> = Arc::new(DiscardSyncer);
    group.bench_function("single", |b| {
        b.iter(|| single.write(black_box(&line)).unwrap());
    });

    let multi = sinks::multi_write_syncer(vec![
        Arc::new(DiscardSyncer) as Arc<dyn WriteSyncer>,
        Arc::new(DiscardSyncer),
        Arc::new(DiscardSyncer),
    ]);
    group.bench_function("multi_three_children", |b| {
        b.iter(|| multi.write(black_box(&line)).unwrap());
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_encode_entry,
    bench_accumulated_context,
    bench_logger,
    bench_sampler,
    bench_multi_syncer
);
criterion_main!(benches);
