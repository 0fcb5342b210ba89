//! Rate-limiting Core wrapper
//!
//! The sampler caps how many entries with the same `(level, message)` pair
//! reach the wrapped core per tick: the first `first` entries pass, then
//! every `thereafter`-th. Counters live in a fixed-size table of atomics,
//! so the hot path takes no locks and the table never grows: pathological
//! message diversity degrades to approximate sampling through shared slots,
//! never to unbounded memory.

use super::checked_entry::CheckedEntry;
use super::entry::Entry;
use super::error::Result;
use super::field::Field;
use super::level::Level;
use super::pipeline::Core;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

const COUNTERS_PER_LEVEL: usize = 4096;

// Only this band is sampled; DPanic and above always pass through.
const MIN_SAMPLED: Level = Level::Debug;
const MAX_SAMPLED: Level = Level::Error;
const NUM_SAMPLED_LEVELS: usize = 4;

#[derive(Default)]
struct Counter {
    reset_at: AtomicI64,
    count: AtomicU64,
}

impl Counter {
    /// Increment and return the running count for the tick containing `t`,
    /// restarting the count when a new tick begins. Wait-free except for
    /// one CAS per tick boundary; losing that race just counts into the
    /// fresh tick.
    fn inc_check_reset(&self, t: DateTime<Utc>, tick: Duration) -> u64 {
        let now = t.timestamp_nanos_opt().unwrap_or_default();
        let reset_after = self.reset_at.load(Ordering::Relaxed);
        if reset_after > now {
            return self.count.fetch_add(1, Ordering::Relaxed) + 1;
        }

        self.count.store(1, Ordering::Relaxed);
        let new_reset = now.saturating_add(tick.as_nanos() as i64);
        if self
            .reset_at
            .compare_exchange(reset_after, new_reset, Ordering::Relaxed, Ordering::Relaxed)
            .is_err()
        {
            return self.count.fetch_add(1, Ordering::Relaxed) + 1;
        }
        1
    }
}

struct Counters {
    slots: Vec<Counter>,
}

impl Counters {
    fn new() -> Self {
        let mut slots = Vec::with_capacity(NUM_SAMPLED_LEVELS * COUNTERS_PER_LEVEL);
        slots.resize_with(NUM_SAMPLED_LEVELS * COUNTERS_PER_LEVEL, Counter::default);
        Counters { slots }
    }

    fn get(&self, level: Level, message: &str) -> &Counter {
        let row = (level as i8 - MIN_SAMPLED as i8) as usize;
        let col = fnv32a(message) as usize % COUNTERS_PER_LEVEL;
        &self.slots[row * COUNTERS_PER_LEVEL + col]
    }
}

fn fnv32a(s: &str) -> u32 {
    const OFFSET: u32 = 2_166_136_261;
    const PRIME: u32 = 16_777_619;
    let mut hash = OFFSET;
    for &b in s.as_bytes() {
        hash ^= u32::from(b);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

struct Sampler {
    core: Arc<dyn Core>,
    counts: Arc<Counters>,
    tick: Duration,
    first: u64,
    thereafter: u64,
}

/// Wrap a core with per-`(level, message)` rate limiting.
///
/// In each window of length `tick`, the first `first` entries for a key
/// pass through, then one of every `thereafter` (a `thereafter` of zero
/// passes only the first `first`). Sampling works best when messages are
/// constant and the variability lives in the fields.
pub fn new_sampler(
    core: Arc<dyn Core>,
    tick: Duration,
    first: u64,
    thereafter: u64,
) -> Arc<dyn Core> {
    Arc::new(Sampler {
        core,
        counts: Arc::new(Counters::new()),
        tick,
        first,
        thereafter,
    })
}

impl Sampler {
    fn sampled(&self, entry: &Entry) -> bool {
        if entry.level < MIN_SAMPLED || entry.level > MAX_SAMPLED {
            return true;
        }
        let counter = self.counts.get(entry.level, &entry.message);
        let n = counter.inc_check_reset(entry.time, self.tick);
        n <= self.first || (self.thereafter > 0 && (n - self.first) % self.thereafter == 0)
    }
}

impl Core for Sampler {
    fn enabled(&self, level: Level) -> bool {
        self.core.enabled(level)
    }

    fn with(&self, fields: Vec<Field>) -> Arc<dyn Core> {
        // Derived cores share the counter table: sampling is keyed by
        // message, not by context.
        Arc::new(Sampler {
            core: self.core.with(fields),
            counts: Arc::clone(&self.counts),
            tick: self.tick,
            first: self.first,
            thereafter: self.thereafter,
        })
    }

    fn check(
        self: Arc<Self>,
        entry: &Entry,
        checked: Option<Box<CheckedEntry>>,
    ) -> Option<Box<CheckedEntry>> {
        if !self.enabled(entry.level) {
            return checked;
        }
        if !self.sampled(entry) {
            return checked;
        }
        Arc::clone(&self.core).check(entry, checked)
    }

    fn write(&self, entry: &Entry, fields: &[Field]) -> Result<()> {
        self.core.write(entry, fields)
    }

    fn sync(&self) -> Result<()> {
        self.core.sync()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::encoder::EncoderConfig;
    use crate::core::json_encoder::JsonEncoder;
    use crate::core::pipeline::IoCore;
    use crate::sinks::MemorySink;

    fn sampled_core(
        tick: Duration,
        first: u64,
        thereafter: u64,
    ) -> (Arc<dyn Core>, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let cfg = EncoderConfig {
            time_key: String::new(),
            ..EncoderConfig::production()
        };
        let inner = IoCore::new(Box::new(JsonEncoder::new(cfg)), sink.clone(), Level::Debug);
        (new_sampler(inner, tick, first, thereafter), sink)
    }

    fn submit(core: &Arc<dyn Core>, entry: &Entry) -> bool {
        match Arc::clone(core).check(entry, None) {
            Some(ce) => {
                ce.write(&[]);
                true
            }
            None => false,
        }
    }

    #[test]
    fn test_first_thereafter_window() {
        let (core, sink) = sampled_core(Duration::from_secs(1), 2, 3);

        let base = Entry::new(Level::Info, "m");
        let mut passed = Vec::new();
        for i in 1..=10 {
            let mut entry = base.clone();
            entry.time = base.time; // same tick for all ten
            if submit(&core, &entry) {
                passed.push(i);
            }
        }

        // 1 and 2 from `first`, then every third: 5 and 8.
        assert_eq!(passed, vec![1, 2, 5, 8]);
        assert_eq!(sink.lines().len(), 4);
    }

    #[test]
    fn test_distinct_messages_counted_separately() {
        let (core, sink) = sampled_core(Duration::from_secs(1), 1, 0);

        assert!(submit(&core, &Entry::new(Level::Info, "alpha")));
        assert!(submit(&core, &Entry::new(Level::Info, "beta")));
        assert!(!submit(&core, &Entry::new(Level::Info, "alpha")));
        assert_eq!(sink.lines().len(), 2);
    }

    #[test]
    fn test_levels_counted_separately() {
        let (core, _sink) = sampled_core(Duration::from_secs(1), 1, 0);

        assert!(submit(&core, &Entry::new(Level::Info, "m")));
        assert!(submit(&core, &Entry::new(Level::Warn, "m")));
        assert!(!submit(&core, &Entry::new(Level::Info, "m")));
    }

    #[test]
    fn test_new_tick_resets_counts() {
        let (core, _sink) = sampled_core(Duration::from_millis(10), 1, 0);

        let mut entry = Entry::new(Level::Info, "m");
        assert!(submit(&core, &entry));
        assert!(!submit(&core, &entry));

        entry.time = entry.time + chrono::Duration::milliseconds(20);
        assert!(submit(&core, &entry));
    }

    #[test]
    fn test_high_levels_never_sampled() {
        let (core, sink) = sampled_core(Duration::from_secs(1), 1, 0);

        for _ in 0..5 {
            assert!(submit(&core, &Entry::new(Level::DPanic, "m")));
        }
        assert_eq!(sink.lines().len(), 5);
    }

    #[test]
    fn test_thereafter_zero_drops_rest() {
        let (core, sink) = sampled_core(Duration::from_secs(1), 2, 0);

        let entry = Entry::new(Level::Info, "m");
        let passed = (0..6).filter(|_| submit(&core, &entry)).count();
        assert_eq!(passed, 2);
        assert_eq!(sink.lines().len(), 2);
    }

    #[test]
    fn test_derived_core_shares_counters() {
        let (core, _sink) = sampled_core(Duration::from_secs(1), 1, 0);
        let derived = core.with(vec![Field::int64("ctx", 1)]);

        assert!(submit(&core, &Entry::new(Level::Info, "m")));
        assert!(!submit(&derived, &Entry::new(Level::Info, "m")));
    }

    #[test]
    fn test_fnv32a_spreads() {
        assert_ne!(fnv32a("a"), fnv32a("b"));
        assert_eq!(fnv32a(""), 2_166_136_261);
    }
}
