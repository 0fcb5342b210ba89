//! Fan-out combinator for write syncers

use super::{discard, lock, WriteSyncer};
use std::io;
use std::sync::Arc;

struct MultiWriteSyncer {
    syncers: Vec<Arc<dyn WriteSyncer>>,
}

impl WriteSyncer for MultiWriteSyncer {
    /// Writes to every child even after a failure, reports the largest
    /// count any child consumed, and aggregates the errors. A short write
    /// counts as an error but does not stop later children.
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let mut written = 0;
        let mut errs: Vec<String> = Vec::new();
        for ws in &self.syncers {
            match ws.write(buf) {
                Ok(n) => {
                    written = written.max(n);
                    if n < buf.len() {
                        errs.push(format!("short write: {} of {} bytes", n, buf.len()));
                    }
                }
                Err(err) => errs.push(err.to_string()),
            }
        }
        if errs.is_empty() {
            Ok(written)
        } else {
            Err(io::Error::new(io::ErrorKind::Other, errs.join("; ")))
        }
    }

    fn sync(&self) -> io::Result<()> {
        let mut errs: Vec<String> = Vec::new();
        for ws in &self.syncers {
            if let Err(err) = ws.sync() {
                errs.push(err.to_string());
            }
        }
        if errs.is_empty() {
            Ok(())
        } else {
            Err(io::Error::new(io::ErrorKind::Other, errs.join("; ")))
        }
    }
}

/// Duplicate writes and syncs to all the given syncers.
///
/// A single syncer is returned unchanged; an empty list collapses to a
/// discarding sink.
pub fn multi_write_syncer(mut syncers: Vec<Arc<dyn WriteSyncer>>) -> Arc<dyn WriteSyncer> {
    match syncers.len() {
        0 => discard(),
        1 => syncers.remove(0),
        _ => Arc::new(MultiWriteSyncer { syncers }),
    }
}

/// Combine several syncers into a single locked fan-out, the usual shape
/// for a sink shared by every core in a process.
pub fn combine(syncers: Vec<Arc<dyn WriteSyncer>>) -> Arc<dyn WriteSyncer> {
    if syncers.is_empty() {
        return discard();
    }
    lock(multi_write_syncer(syncers))
}
