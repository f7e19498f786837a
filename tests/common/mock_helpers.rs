//! Mock transport and I/O helpers for testing

use std::io::Read;
use std::sync::{Arc, Mutex};
use tagflow::{
    transport::{OutboundHook, OutboundPacket},
    Result,
};

/// Outbound hook that records every packet it is handed
#[derive(Default, Clone)]
pub struct RecordingHook {
    packets: Arc<Mutex<Vec<OutboundPacket>>>,
}

impl RecordingHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn packets(&self) -> Vec<OutboundPacket> {
        self.packets.lock().unwrap().clone()
    }
}

impl OutboundHook for RecordingHook {
    fn deliver(&self, packet: OutboundPacket) -> Result<()> {
        self.packets.lock().unwrap().push(packet);
        Ok(())
    }
}

/// Reader that hands out at most `chunk` bytes per call, the way a socket
/// delivers a stream in pieces.
pub struct ChunkedReader {
    data: Vec<u8>,
    pos: usize,
    chunk: usize,
}

impl ChunkedReader {
    pub fn new(data: impl Into<Vec<u8>>, chunk: usize) -> Self {
        Self {
            data: data.into(),
            pos: 0,
            chunk: chunk.max(1),
        }
    }
}

impl Read for ChunkedReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.chunk.min(buf.len()).min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}
