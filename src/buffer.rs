//! Growable circular byte buffer.
//!
//! Staging area for serialized payloads that are handed to (or received
//! from) a transport instead of a file. Writers append at the write cursor;
//! readers consume from the read cursor. Both cursors run modulo the
//! current capacity, so a run that crosses the end of the allocation wraps
//! around to the front exactly once.
//!
//! The buffer never overwrites unread data: a write that does not fit
//! doubles the capacity first. A read that asks for more than is buffered
//! fails with [`FlowError::Underrun`] and consumes nothing, which callers
//! treat as "not enough data yet".

use crate::error::{FlowError, Result};

/// Default capacity used when none is configured.
pub const DEFAULT_CAPACITY: usize = 4096;

/// Cursor snapshot taken by [`CircularBuffer::mark`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferMark {
    read_cursor: usize,
    filled: usize,
    writes: u64,
}

/// Append/consume byte ring.
pub struct CircularBuffer {
    storage: Vec<u8>,
    filled: usize,
    write_cursor: usize,
    read_cursor: usize,
    /// Bumped on every write; a mark is only valid while no write happened.
    writes: u64,
}

impl CircularBuffer {
    /// Create an empty buffer. A zero capacity is rounded up to one byte.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: vec![0; capacity.max(1)],
            filled: 0,
            write_cursor: 0,
            read_cursor: 0,
            writes: 0,
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Number of bytes currently held.
    #[inline]
    pub fn len(&self) -> usize {
        self.filled
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// Append `data`, doubling the capacity as often as needed to fit it.
    pub fn write(&mut self, data: &[u8]) {
        let n = data.len();
        if n == 0 {
            return;
        }
        if self.filled + n > self.capacity() {
            let mut new_capacity = self.capacity() * 2;
            while self.filled + n > new_capacity {
                new_capacity *= 2;
            }
            self.grow(new_capacity);
        }

        let capacity = self.capacity();
        let first = n.min(capacity - self.write_cursor);
        self.storage[self.write_cursor..self.write_cursor + first].copy_from_slice(&data[..first]);
        if first < n {
            self.storage[..n - first].copy_from_slice(&data[first..]);
        }
        self.write_cursor = (self.write_cursor + n) % capacity;
        self.filled += n;
        self.writes += 1;
    }

    /// Fill `buf` completely or fail without consuming anything.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        let n = buf.len();
        if self.filled < n {
            return Err(FlowError::Underrun {
                needed: n,
                available: self.filled,
            });
        }
        self.copy_out(self.read_cursor, buf);
        self.read_cursor = (self.read_cursor + n) % self.capacity();
        self.filled -= n;
        Ok(())
    }

    /// Consume a single byte.
    pub fn read_byte(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        self.read(&mut byte)?;
        Ok(byte[0])
    }

    /// Look at the next byte without consuming it.
    pub fn peek_byte(&self) -> Option<u8> {
        if self.filled == 0 {
            None
        } else {
            Some(self.storage[self.read_cursor])
        }
    }

    /// Drop all buffered bytes. The allocation is kept.
    pub fn clear(&mut self) {
        self.filled = 0;
        self.read_cursor = 0;
        self.write_cursor = 0;
        self.writes += 1;
    }

    /// Snapshot the read position so a multi-step decode can be undone.
    pub fn mark(&self) -> BufferMark {
        BufferMark {
            read_cursor: self.read_cursor,
            filled: self.filled,
            writes: self.writes,
        }
    }

    /// Restore the read position captured by `mark`.
    ///
    /// # Panics
    ///
    /// Panics if the buffer was written to since the mark was taken.
    pub fn rollback(&mut self, mark: BufferMark) {
        assert_eq!(
            mark.writes, self.writes,
            "circular buffer written to between mark and rollback"
        );
        self.read_cursor = mark.read_cursor;
        self.filled = mark.filled;
    }

    /// Copy the buffered bytes out in logical order without consuming them.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = vec![0; self.filled];
        self.copy_out(self.read_cursor, &mut out);
        out
    }

    fn copy_out(&self, start: usize, buf: &mut [u8]) {
        let n = buf.len();
        let first = n.min(self.capacity() - start);
        buf[..first].copy_from_slice(&self.storage[start..start + first]);
        if first < n {
            buf[first..].copy_from_slice(&self.storage[..n - first]);
        }
    }

    /// Reallocate, laying the unread bytes out from offset zero.
    fn grow(&mut self, new_capacity: usize) {
        let mut storage = vec![0; new_capacity];
        self.copy_out(self.read_cursor, &mut storage[..self.filled]);
        tracing::trace!(
            "Circular buffer grown {} -> {} bytes",
            self.capacity(),
            new_capacity
        );
        self.storage = storage;
        self.read_cursor = 0;
        self.write_cursor = self.filled % new_capacity;
    }
}

impl Default for CircularBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CircularBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircularBuffer")
            .field("capacity", &self.capacity())
            .field("filled", &self.filled)
            .field("write_cursor", &self.write_cursor)
            .field("read_cursor", &self.read_cursor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let mut buf = CircularBuffer::with_capacity(16);
        buf.write(b"hello");
        assert_eq!(buf.len(), 5);

        let mut out = [0u8; 5];
        buf.read(&mut out).unwrap();
        assert_eq!(&out, b"hello");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_wraparound() {
        let mut buf = CircularBuffer::with_capacity(8);
        buf.write(&[1, 2, 3, 4, 5, 6]);

        let mut head = [0u8; 4];
        buf.read(&mut head).unwrap();
        assert_eq!(head, [1, 2, 3, 4]);

        // 2 bytes left + 6 new = 8: fits without growing, crosses the end
        buf.write(&[7, 8, 9, 10, 11, 12]);
        assert_eq!(buf.capacity(), 8);
        assert_eq!(buf.len(), 8);

        let mut rest = [0u8; 8];
        buf.read(&mut rest).unwrap();
        assert_eq!(rest, [5, 6, 7, 8, 9, 10, 11, 12]);
    }

    #[test]
    fn test_underrun_consumes_nothing() {
        let mut buf = CircularBuffer::with_capacity(8);
        buf.write(&[1, 2, 3]);

        let mut out = [0u8; 4];
        let err = buf.read(&mut out).unwrap_err();
        assert!(err.is_underrun());
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.read_byte().unwrap(), 1);
    }

    #[test]
    fn test_grow_preserves_wrapped_bytes() {
        let mut buf = CircularBuffer::with_capacity(4);
        buf.write(&[1, 2, 3]);
        assert_eq!(buf.read_byte().unwrap(), 1);
        assert_eq!(buf.read_byte().unwrap(), 2);
        buf.write(&[4, 5]); // wraps: storage holds [5, _, 3, 4]

        buf.write(&[6, 7, 8, 9]); // 4 + 4 > 4 -> 8
        assert_eq!(buf.capacity(), 8);
        assert_eq!(buf.to_vec(), vec![3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_grow_doubles_until_fit() {
        let mut buf = CircularBuffer::with_capacity(2);
        buf.write(&[0; 9]);
        assert_eq!(buf.capacity(), 16);
        assert_eq!(buf.len(), 9);
    }

    #[test]
    fn test_mark_and_rollback() {
        let mut buf = CircularBuffer::with_capacity(8);
        buf.write(&[10, 20, 30]);
        let mark = buf.mark();
        buf.read_byte().unwrap();
        buf.read_byte().unwrap();
        buf.rollback(mark);
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.peek_byte(), Some(10));
    }

    #[test]
    #[should_panic(expected = "written to between mark and rollback")]
    fn test_rollback_after_write_panics() {
        let mut buf = CircularBuffer::with_capacity(8);
        let mark = buf.mark();
        buf.write(&[1]);
        buf.rollback(mark);
    }

    #[test]
    fn test_zero_capacity_is_usable() {
        let mut buf = CircularBuffer::with_capacity(0);
        buf.write(&[1, 2, 3]);
        assert_eq!(buf.to_vec(), vec![1, 2, 3]);
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_fifo_order_under_interleaving(
            chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..20), 1..20),
            reads in prop::collection::vec(0usize..24, 1..20),
        ) {
            let mut buf = CircularBuffer::with_capacity(4);
            let mut expected = std::collections::VecDeque::new();
            let mut reads = reads.into_iter().cycle();

            for chunk in &chunks {
                buf.write(chunk);
                expected.extend(chunk.iter().copied());

                let n = reads.next().unwrap_or(0);
                let mut out = vec![0u8; n];
                if n <= expected.len() {
                    buf.read(&mut out).unwrap();
                    let want: Vec<u8> = expected.drain(..n).collect();
                    prop_assert_eq!(out, want);
                } else {
                    prop_assert!(buf.read(&mut out).is_err());
                }
                prop_assert_eq!(buf.len(), expected.len());
            }

            let rest: Vec<u8> = expected.into_iter().collect();
            prop_assert_eq!(buf.to_vec(), rest);
        }
    }
}
