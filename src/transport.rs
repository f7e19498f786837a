//! Boundary to the (external) tree-network transport.
//!
//! Outbound: an operator serializes values into a circular buffer and hands
//! the bytes plus routing metadata to an [`OutboundHook`]. Inbound: an
//! [`InboundSession`] is the per-connection state slot. It buffers payload
//! bytes per peer rank and decodes complete values as they become
//! available, optionally pushing them into a flow graph.
//!
//! Each worker thread owns its own sessions and graphs; only the registries
//! are shared.

use crate::buffer::CircularBuffer;
use crate::data::{Data, Schema};
use crate::error::{FlowError, Result};
use crate::pipeline::{FlowGraph, GraphResult, StreamId};
use crossbeam_channel::Sender;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Serialized bytes bound for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundPacket {
    pub stream_id: u32,
    pub tag_id: u32,
    pub payload: Vec<u8>,
}

/// Hands packets to the transport for delivery.
pub trait OutboundHook: Send + Sync {
    fn deliver(&self, packet: OutboundPacket) -> Result<()>;
}

impl OutboundHook for Sender<OutboundPacket> {
    fn deliver(&self, packet: OutboundPacket) -> Result<()> {
        self.send(packet)
            .map_err(|_| FlowError::Transport("outbound channel disconnected".to_string()))
    }
}

/// Per-connection decode state for inbound payloads.
pub struct InboundSession {
    schema: Arc<Schema>,
    capacity: usize,
    buffers: BTreeMap<u32, CircularBuffer>,
    decoded: u64,
}

impl InboundSession {
    /// Session decoding values of `schema`; per-rank buffers start at
    /// `capacity` bytes.
    pub fn new(schema: Arc<Schema>, capacity: usize) -> Self {
        Self {
            schema,
            capacity,
            buffers: BTreeMap::new(),
            decoded: 0,
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Append `bytes` from peer `rank` and decode every complete value.
    /// A trailing partial value stays buffered until more bytes arrive.
    pub fn receive(&mut self, rank: u32, bytes: &[u8]) -> Result<Vec<Data>> {
        let capacity = self.capacity;
        let buffer = self
            .buffers
            .entry(rank)
            .or_insert_with(|| CircularBuffer::with_capacity(capacity));
        buffer.write(bytes);

        let mut values = Vec::new();
        while let Some(value) = self.schema.try_deserialize_buffered(buffer)? {
            values.push(value);
        }
        self.decoded += values.len() as u64;
        tracing::trace!(
            "Rank {}: {} bytes in, {} values decoded, {} bytes pending",
            rank,
            bytes.len(),
            values.len(),
            buffer.len()
        );
        Ok(values)
    }

    /// Like [`receive`](Self::receive), then transfer each decoded value on
    /// `stream` of `graph`. Returns the number of values transferred.
    pub fn receive_into(
        &mut self,
        rank: u32,
        bytes: &[u8],
        graph: &mut FlowGraph,
        stream: StreamId,
    ) -> GraphResult<usize> {
        let values = self.receive(rank, bytes)?;
        let count = values.len();
        for value in values {
            graph.transfer(stream, value)?;
        }
        Ok(count)
    }

    /// Bytes of an incomplete value still buffered for `rank`.
    pub fn pending_bytes(&self, rank: u32) -> usize {
        self.buffers.get(&rank).map_or(0, CircularBuffer::len)
    }

    /// Peer ranks that have sent anything.
    pub fn ranks(&self) -> impl Iterator<Item = u32> + '_ {
        self.buffers.keys().copied()
    }

    /// Values decoded over the life of the session.
    pub fn decoded(&self) -> u64 {
        self.decoded
    }
}
