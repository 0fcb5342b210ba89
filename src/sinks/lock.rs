//! Mutex combinator for write syncers

use super::WriteSyncer;
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;

struct LockedWriteSyncer {
    mu: Mutex<()>,
    ws: Arc<dyn WriteSyncer>,
}

impl WriteSyncer for LockedWriteSyncer {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let _guard = self.mu.lock();
        self.ws.write(buf)
    }

    fn sync(&self) -> io::Result<()> {
        let _guard = self.mu.lock();
        self.ws.sync()
    }

    fn is_locked(&self) -> bool {
        true
    }
}

/// Wrap a syncer so all writes and syncs are serialized under one mutex,
/// making interleaved output from concurrent threads impossible.
///
/// Locking an already-locked syncer returns it unchanged.
pub fn lock(ws: Arc<dyn WriteSyncer>) -> Arc<dyn WriteSyncer> {
    if ws.is_locked() {
        return ws;
    }
    Arc::new(LockedWriteSyncer {
        mu: Mutex::new(()),
        ws,
    })
}

#[cfg(test)]
mod tests {
    use super::super::MemorySink;
    use super::*;
    use std::thread;

    #[test]
    fn test_lock_passes_writes_through() {
        let sink = Arc::new(MemorySink::new());
        let locked = lock(sink.clone());
        locked.write(b"hello").unwrap();
        locked.sync().unwrap();
        assert_eq!(sink.as_string(), "hello");
        assert_eq!(sink.sync_count(), 1);
    }

    #[test]
    fn test_double_lock_is_identity() {
        let sink = Arc::new(MemorySink::new());
        let once = lock(sink);
        let twice = lock(once.clone());
        assert!(Arc::ptr_eq(&once, &twice));
    }

    #[test]
    fn test_concurrent_writes_stay_whole() {
        let sink = Arc::new(MemorySink::new());
        let locked = lock(sink.clone());

        let mut handles = Vec::new();
        for i in 0..8 {
            let ws = locked.clone();
            handles.push(thread::spawn(move || {
                let line = format!("line-{}\n", i);
                for _ in 0..50 {
                    ws.write(line.as_bytes()).unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let contents = sink.as_string();
        assert_eq!(contents.lines().count(), 400);
        for line in contents.lines() {
            assert!(line.starts_with("line-"), "torn line: {:?}", line);
        }
    }
}
