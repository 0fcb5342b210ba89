//! In-memory sink for tests and capture

use super::WriteSyncer;
use parking_lot::Mutex;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A syncer that records everything written to it, plus how often it was
/// synced. Intended for unit tests asserting on encoded output.
#[derive(Default)]
pub struct MemorySink {
    bytes: Mutex<Vec<u8>>,
    syncs: AtomicUsize,
}

impl MemorySink {
    pub fn new() -> Self {
        MemorySink::default()
    }

    /// A copy of everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.bytes.lock().clone()
    }

    /// The contents, lossily decoded as UTF-8.
    pub fn as_string(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }

    /// The contents split into lines.
    pub fn lines(&self) -> Vec<String> {
        self.as_string().lines().map(str::to_string).collect()
    }

    /// How many times `sync` was called.
    pub fn sync_count(&self) -> usize {
        self.syncs.load(Ordering::Relaxed)
    }

    /// Discard recorded bytes and reset the sync counter.
    pub fn reset(&self) {
        self.bytes.lock().clear();
        self.syncs.store(0, Ordering::Relaxed);
    }
}

impl WriteSyncer for MemorySink {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn sync(&self) -> io::Result<()> {
        self.syncs.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_writes_and_syncs() {
        let sink = MemorySink::new();
        sink.write(b"one\n").unwrap();
        sink.write(b"two\n").unwrap();
        sink.sync().unwrap();

        assert_eq!(sink.as_string(), "one\ntwo\n");
        assert_eq!(sink.lines(), vec!["one", "two"]);
        assert_eq!(sink.sync_count(), 1);

        sink.reset();
        assert!(sink.contents().is_empty());
        assert_eq!(sink.sync_count(), 0);
    }
}
