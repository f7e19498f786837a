//! Outbound - serializes values and hands them to the transport.

use super::optional;
use crate::buffer::CircularBuffer;
use crate::data::{Data, Schema};
use crate::pipeline::error::{GraphError, GraphResult};
use crate::pipeline::graph::Outputs;
use crate::pipeline::operator::{AnyOperator, AsynchOperator, Operator, OperatorHeader};
use crate::pipeline::registry::FactoryContext;
use crate::tag::{PropertiesCursor, PropertyLevel};
use crate::transport::{OutboundHook, OutboundPacket};
use std::sync::Arc;

/// One packet per value. `streamId` defaults to the operator ID and
/// `tagId` to the configured transport tag.
pub struct Outbound {
    header: OperatorHeader,
    stream_id: u32,
    tag_id: u32,
    hook: Arc<dyn OutboundHook>,
    buffer: CircularBuffer,
    schema: Option<Arc<Schema>>,
}

impl Outbound {
    pub const TYPE_NAME: &'static str = "Outbound";

    pub fn new(
        header: OperatorHeader,
        stream_id: u32,
        tag_id: u32,
        hook: Arc<dyn OutboundHook>,
        buffer_capacity: usize,
    ) -> GraphResult<Self> {
        header.expect_arity(Self::TYPE_NAME, Some(1), Some(0))?;
        Ok(Self {
            header,
            stream_id,
            tag_id,
            hook,
            buffer: CircularBuffer::with_capacity(buffer_capacity),
            schema: None,
        })
    }

    pub fn from_properties(cursor: PropertiesCursor<'_>, ctx: &FactoryContext<'_>) -> GraphResult<AnyOperator> {
        let header = OperatorHeader::from_chain(cursor)?;
        let hook = ctx
            .resources
            .outbound
            .clone()
            .ok_or_else(|| GraphError::operator(header.id, "no outbound hook configured"))?;
        let stream_id = optional(&cursor, "streamId")?.unwrap_or(header.id.0);
        let tag_id = optional(&cursor, "tagId")?.unwrap_or(ctx.resources.tag_id);
        Ok(AnyOperator::asynch(Self::new(
            header,
            stream_id,
            tag_id,
            hook,
            ctx.resources.buffer_capacity,
        )?))
    }
}

impl Operator for Outbound {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn header(&self) -> &OperatorHeader {
        &self.header
    }

    fn describe_level(&self, level: &mut PropertyLevel) {
        level.set("streamId", self.stream_id).set("tagId", self.tag_id);
    }

    fn in_connections_complete(&mut self, inputs: &[Arc<Schema>]) -> GraphResult<Vec<Arc<Schema>>> {
        self.schema = Some(inputs[0].clone());
        Ok(Vec::new())
    }
}

impl AsynchOperator for Outbound {
    fn work(&mut self, _port: usize, value: Data, _out: &mut Outputs<'_>) -> GraphResult<()> {
        let schema = self
            .schema
            .as_ref()
            .ok_or_else(|| GraphError::operator(self.header.id, "value arrived before wiring"))?;
        if let Err(e) = schema.serialize(&value, &mut self.buffer) {
            // Drop the partial encoding so it cannot prefix the next packet
            self.buffer.clear();
            return Err(e.into());
        }

        let mut payload = vec![0; self.buffer.len()];
        self.buffer.read(&mut payload)?;
        self.hook.deliver(OutboundPacket {
            stream_id: self.stream_id,
            tag_id: self.tag_id,
            payload,
        })?;
        Ok(())
    }
}
