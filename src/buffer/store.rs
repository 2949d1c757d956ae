//! Fixed-capacity overwrite buffer.

use std::sync::Mutex;

use crate::error::ChardevError;
use crate::Result;

/// Capacity of the device buffer in bytes.
///
/// A write must be strictly smaller than this: the capacity itself is
/// never fully fillable, so the largest accepted payload is 255 bytes.
pub const BUFFER_CAPACITY: usize = 256;

/// Buffer content and its valid length, guarded as one unit.
///
/// `valid_len` must always describe `data`: a reader taking the lock sees
/// a length and bytes that came from the same write.
#[derive(Debug)]
struct BufferInner {
    data: [u8; BUFFER_CAPACITY],
    valid_len: usize,
}

/// The device's shared byte buffer.
///
/// Process-wide singleton shared by all sessions; no session owns it
/// exclusively. Created empty, reset only by a subsequent write,
/// dropped at device unload.
#[derive(Debug)]
pub struct BufferStore {
    inner: Mutex<BufferInner>,
}

impl BufferStore {
    /// Create a new empty buffer.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BufferInner {
                data: [0; BUFFER_CAPACITY],
                valid_len: 0,
            }),
        }
    }

    /// Capacity of the buffer in bytes.
    pub fn capacity(&self) -> usize {
        BUFFER_CAPACITY
    }

    /// Number of bytes currently holding meaningful data.
    pub fn valid_len(&self) -> Result<usize> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| ChardevError::AccessFault("buffer lock poisoned".into()))?;
        Ok(inner.valid_len)
    }

    /// Replace the buffer's visible content with `data`.
    ///
    /// Fails with [`ChardevError::TooLarge`] when `data.len()` meets or
    /// exceeds the capacity, leaving the prior content untouched. On
    /// success the bytes are copied in at offset 0, the valid length is
    /// set to `data.len()`, and that length is returned.
    ///
    /// Stale bytes beyond the new length are not zeroed; they are simply
    /// unreadable because reads are bounded by the valid length.
    pub fn write(&self, data: &[u8]) -> Result<usize> {
        if data.len() >= BUFFER_CAPACITY {
            return Err(ChardevError::TooLarge {
                len: data.len(),
                capacity: BUFFER_CAPACITY,
            });
        }

        let mut inner = self
            .inner
            .lock()
            .map_err(|_| ChardevError::AccessFault("buffer lock poisoned".into()))?;

        inner.data[..data.len()].copy_from_slice(data);
        inner.valid_len = data.len();
        Ok(data.len())
    }

    /// Read up to `max_len` bytes starting at `offset`.
    ///
    /// Returns an empty vec when `offset` is at or past the valid length
    /// (end-of-stream, not an error). Otherwise returns
    /// `min(max_len, valid_len - offset)` bytes. Never mutates the buffer.
    pub fn read(&self, offset: usize, max_len: usize) -> Result<Vec<u8>> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| ChardevError::AccessFault("buffer lock poisoned".into()))?;

        if offset >= inner.valid_len {
            return Ok(Vec::new());
        }

        let len = max_len.min(inner.valid_len - offset);
        Ok(inner.data[offset..offset + len].to_vec())
    }
}

impl Default for BufferStore {
    fn default() -> Self {
        Self::new()
    }
}
