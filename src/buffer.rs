//! Reusable byte buffers for encoder hot paths
//!
//! Encoding a log entry is a long series of small appends; going through a
//! fresh `Vec` (or the `fmt` machinery) for each entry dominates the cost of
//! a write. `Buffer` is a thin wrapper over `Vec<u8>` with typed append
//! methods, and the process-wide pool recycles backing storage so steady-state
//! encoding does not allocate.

use crossbeam_queue::ArrayQueue;
use std::io;
use std::sync::{Arc, OnceLock};

/// Initial capacity of pooled buffers, sized for a typical log line.
const BUFFER_SIZE: usize = 1024;

/// Number of buffers the shared pool retains.
const POOL_SLOTS: usize = 64;

/// A growable byte buffer with append operations for the types encoders emit.
///
/// Buffers obtained from a [`BufferPool`] return their backing storage to the
/// pool when dropped; the contents are truncated but capacity is preserved.
pub struct Buffer {
    bytes: Vec<u8>,
    pool: Option<Arc<PoolShared>>,
}

impl Buffer {
    /// Create an unpooled buffer. Mostly useful in tests; production paths
    /// should go through [`pool()`].
    pub fn new() -> Self {
        Buffer {
            bytes: Vec::with_capacity(BUFFER_SIZE),
            pool: None,
        }
    }

    /// Append a slice of bytes.
    #[inline]
    pub fn append_bytes(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
    }

    /// Append a single byte.
    #[inline]
    pub fn append_byte(&mut self, b: u8) {
        self.bytes.push(b);
    }

    /// Append a string slice.
    #[inline]
    pub fn append_str(&mut self, s: &str) {
        self.bytes.extend_from_slice(s.as_bytes());
    }

    /// Append the base-10 representation of a signed integer.
    #[inline]
    pub fn append_int(&mut self, v: i64) {
        let mut fmt = itoa::Buffer::new();
        self.bytes.extend_from_slice(fmt.format(v).as_bytes());
    }

    /// Append the base-10 representation of an unsigned integer.
    #[inline]
    pub fn append_uint(&mut self, v: u64) {
        let mut fmt = itoa::Buffer::new();
        self.bytes.extend_from_slice(fmt.format(v).as_bytes());
    }

    /// Append a floating-point value, formatted at the given bit width.
    ///
    /// The value must be finite; callers handle NaN and infinities before
    /// reaching the buffer.
    #[inline]
    pub fn append_float(&mut self, v: f64, bits: u32) {
        let mut fmt = ryu::Buffer::new();
        let s = if bits == 32 {
            fmt.format_finite(v as f32)
        } else {
            fmt.format_finite(v)
        };
        self.bytes.extend_from_slice(s.as_bytes());
    }

    /// Append `true` or `false`.
    #[inline]
    pub fn append_bool(&mut self, v: bool) {
        self.bytes
            .extend_from_slice(if v { b"true" } else { b"false" });
    }

    /// Number of bytes currently in the buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The accumulated bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Last byte in the buffer, if any.
    #[inline]
    pub fn last_byte(&self) -> Option<u8> {
        self.bytes.last().copied()
    }

    /// Truncate to zero length, keeping capacity.
    #[inline]
    pub fn reset(&mut self) {
        self.bytes.clear();
    }

    /// Remove a single trailing newline, if present.
    pub fn truncate_newline(&mut self) {
        if self.bytes.last() == Some(&b'\n') {
            self.bytes.pop();
        }
    }

    /// Copy the contents into an owned `Vec<u8>`.
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("len", &self.bytes.len())
            .field("capacity", &self.bytes.capacity())
            .finish()
    }
}

impl io::Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            let mut bytes = std::mem::take(&mut self.bytes);
            bytes.clear();
            // If the pool is full the storage is simply freed.
            let _ = pool.slots.push(bytes);
        }
    }
}

struct PoolShared {
    slots: ArrayQueue<Vec<u8>>,
}

/// A bounded pool of byte buffers.
///
/// `get` pops recycled storage when available and allocates otherwise; the
/// returned [`Buffer`] re-enters the pool on drop.
#[derive(Clone)]
pub struct BufferPool {
    shared: Arc<PoolShared>,
}

impl BufferPool {
    pub fn new() -> Self {
        BufferPool {
            shared: Arc::new(PoolShared {
                slots: ArrayQueue::new(POOL_SLOTS),
            }),
        }
    }

    pub fn get(&self) -> Buffer {
        let bytes = self
            .shared
            .slots
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(BUFFER_SIZE));
        Buffer {
            bytes,
            pool: Some(Arc::clone(&self.shared)),
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide pool shared by all encoders.
pub fn pool() -> &'static BufferPool {
    static POOL: OnceLock<BufferPool> = OnceLock::new();
    POOL.get_or_init(BufferPool::new)
}

/// Shorthand for `pool().get()`.
pub fn get() -> Buffer {
    pool().get()
}
