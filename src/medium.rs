//! Byte mediums targeted by schema serialization.
//!
//! A schema writes to a [`ByteSink`] and reads from a [`ByteSource`]. Two
//! mediums matter: a sequential byte stream (files and sockets, wrapped by
//! [`IoSink`] / [`IoSource`]) and the in-memory [`CircularBuffer`].

use crate::buffer::CircularBuffer;
use crate::error::{FlowError, Result};
use std::io::{ErrorKind, Read, Write};

/// Destination for serialized bytes.
pub trait ByteSink {
    fn put(&mut self, bytes: &[u8]) -> Result<()>;
}

/// Origin of serialized bytes. `take` fills the whole slice or fails;
/// running out of input is reported as [`FlowError::Underrun`].
pub trait ByteSource {
    fn take(&mut self, buf: &mut [u8]) -> Result<()>;
}

impl ByteSink for CircularBuffer {
    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        self.write(bytes);
        Ok(())
    }
}

impl ByteSource for CircularBuffer {
    fn take(&mut self, buf: &mut [u8]) -> Result<()> {
        self.read(buf)
    }
}

impl ByteSink for Vec<u8> {
    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// Sequential-stream sink over any [`Write`].
pub struct IoSink<W: Write> {
    inner: W,
}

impl<W: Write> IoSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> ByteSink for IoSink<W> {
    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        Ok(())
    }
}

/// Sequential-stream source over any [`Read`].
pub struct IoSource<R: Read> {
    inner: R,
}

impl<R: Read> IoSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> ByteSource for IoSource<R> {
    fn take(&mut self, buf: &mut [u8]) -> Result<()> {
        match self.inner.read_exact(buf) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(FlowError::Underrun {
                needed: buf.len(),
                available: 0,
            }),
            Err(e) => Err(e.into()),
        }
    }
}
