//! Output sinks
//!
//! A [`WriteSyncer`] is the pipeline's output contract: byte-slice writes
//! plus a best-effort flush. Sinks are shared across threads, so the trait
//! takes `&self`; adapters provide the interior mutability a plain writer
//! needs.

mod lock;
mod memory;
mod multi;

pub use lock::lock;
pub use memory::MemorySink;
pub use multi::{combine, multi_write_syncer};

use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;

/// A destination for encoded log bytes.
pub trait WriteSyncer: Send + Sync {
    /// Write the bytes, returning the count consumed. Partial writes are
    /// allowed; errors propagate to the caller.
    fn write(&self, buf: &[u8]) -> io::Result<usize>;

    /// Best-effort flush of buffered bytes to the underlying medium.
    fn sync(&self) -> io::Result<()>;

    /// Whether this syncer already serializes its writes under a lock.
    /// Used by [`lock`] to avoid wrapping a lock in another lock.
    fn is_locked(&self) -> bool {
        false
    }
}

struct WriterSyncer<W: Write + Send> {
    inner: Mutex<W>,
}

impl<W: Write + Send> WriteSyncer for WriterSyncer<W> {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().write(buf)
    }

    fn sync(&self) -> io::Result<()> {
        self.inner.lock().flush()
    }
}

/// Adapt any writer into a [`WriteSyncer`] whose `sync` flushes the writer.
pub fn add_sync<W: Write + Send + 'static>(w: W) -> Arc<dyn WriteSyncer> {
    Arc::new(WriterSyncer {
        inner: Mutex::new(w),
    })
}

struct StdoutSyncer;

impl WriteSyncer for StdoutSyncer {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        io::stdout().lock().write(buf)
    }

    fn sync(&self) -> io::Result<()> {
        io::stdout().lock().flush()
    }
}

struct StderrSyncer;

impl WriteSyncer for StderrSyncer {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().lock().write(buf)
    }

    fn sync(&self) -> io::Result<()> {
        io::stderr().lock().flush()
    }
}

/// A syncer for standard output.
pub fn stdout() -> Arc<dyn WriteSyncer> {
    Arc::new(StdoutSyncer)
}

/// A syncer for standard error.
pub fn stderr() -> Arc<dyn WriteSyncer> {
    Arc::new(StderrSyncer)
}

struct NopSyncer;

impl WriteSyncer for NopSyncer {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }

    fn sync(&self) -> io::Result<()> {
        Ok(())
    }
}

/// A syncer that discards everything written to it.
pub fn discard() -> Arc<dyn WriteSyncer> {
    Arc::new(NopSyncer)
}
