use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::models::error::StreamError;

struct BufferInner {
    data: Box<[u8]>,
    size: usize,
    closed: bool,
}

/// Bounded byte staging area between the producer and the processing thread.
///
/// Appends block while the buffer lacks room and resume once the consumer has
/// taken enough bytes. Bytes leave in the order they arrived.
///
/// Both blocking points are wait/notify pairs on one mutex:
/// - producers wait on `space_available`, signalled after every `take`
/// - the consumer waits on `data_available`, signalled after every `write`
pub struct CaptureBuffer {
    inner: Mutex<BufferInner>,
    space_available: Condvar,
    data_available: Condvar,
    capacity: usize,
}

impl CaptureBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(BufferInner {
                data: vec![0u8; capacity].into_boxed_slice(),
                size: 0,
                closed: false,
            }),
            space_available: Condvar::new(),
            data_available: Condvar::new(),
            capacity,
        }
    }

    /// Append `bytes` to the tail, blocking until there is room.
    ///
    /// Returns the number of bytes accepted, which is always `bytes.len()`.
    pub fn write(&self, bytes: &[u8]) -> Result<usize, StreamError> {
        if bytes.is_empty() {
            return Err(StreamError::InvalidArgument("empty audio payload".into()));
        }
        if bytes.len() > self.capacity {
            return Err(StreamError::InvalidArgument(format!(
                "payload of {} bytes exceeds buffer capacity {}",
                bytes.len(),
                self.capacity
            )));
        }

        let mut inner = self.inner.lock();
        while !inner.closed && inner.size + bytes.len() > self.capacity {
            self.space_available.wait(&mut inner);
        }
        if inner.closed {
            return Err(StreamError::Closed);
        }

        let start = inner.size;
        inner.data[start..start + bytes.len()].copy_from_slice(bytes);
        inner.size += bytes.len();
        drop(inner);

        self.data_available.notify_one();
        Ok(bytes.len())
    }

    /// Move the first `dest.len()` bytes into `dest`.
    ///
    /// Returns false without touching the buffer if fewer bytes are staged.
    pub fn take(&self, dest: &mut [u8]) -> bool {
        let mut inner = self.inner.lock();
        if !Self::take_locked(&mut inner, dest) {
            return false;
        }
        drop(inner);

        self.space_available.notify_all();
        true
    }

    /// Wait until at least `min_bytes` are staged, then move exactly
    /// `dest.len()` bytes into `dest`.
    ///
    /// Gives up after `timeout` or once the buffer is closed, returning false.
    pub fn wait_take(&self, dest: &mut [u8], timeout: Duration) -> bool {
        let mut inner = self.inner.lock();
        if inner.size < dest.len() && !inner.closed {
            // One bounded wait: the caller re-checks its own shutdown flag between calls.
            let _ = self.data_available.wait_for(&mut inner, timeout);
        }
        if !Self::take_locked(&mut inner, dest) {
            return false;
        }
        drop(inner);

        self.space_available.notify_all();
        true
    }

    fn take_locked(inner: &mut BufferInner, dest: &mut [u8]) -> bool {
        let n = dest.len();
        if n > inner.size {
            return false;
        }
        dest.copy_from_slice(&inner.data[..n]);
        let size = inner.size;
        inner.data.copy_within(n..size, 0);
        inner.size -= n;
        true
    }

    /// Refuse further writes and wake every waiting thread.
    ///
    /// Bytes already staged can still be taken.
    pub fn close(&self) {
        self.inner.lock().closed = true;
        self.space_available.notify_all();
        self.data_available.notify_all();
    }

    /// Discard everything staged.
    pub fn clear(&self) {
        self.inner.lock().size = 0;
        self.space_available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Number of bytes currently staged.
    pub fn len(&self) -> usize {
        self.inner.lock().size
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
