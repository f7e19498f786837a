//! Collect - hands every arriving value to a channel.

use crate::data::{Data, Schema};
use crate::pipeline::error::{GraphError, GraphResult};
use crate::pipeline::graph::Outputs;
use crate::pipeline::id::OperatorId;
use crate::pipeline::operator::{AnyOperator, AsynchOperator, Operator, OperatorHeader};
use crate::pipeline::registry::FactoryContext;
use crate::tag::PropertiesCursor;
use crossbeam_channel::Sender;
use std::sync::Arc;

/// A value that reached a `Collect` sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Collected {
    pub operator: OperatorId,
    pub port: usize,
    pub value: Data,
}

pub struct Collect {
    header: OperatorHeader,
    sender: Sender<Collected>,
}

impl Collect {
    pub const TYPE_NAME: &'static str = "Collect";

    pub fn new(header: OperatorHeader, sender: Sender<Collected>) -> GraphResult<Self> {
        header.expect_arity(Self::TYPE_NAME, None, Some(0))?;
        Ok(Self { header, sender })
    }

    pub fn from_properties(cursor: PropertiesCursor<'_>, ctx: &FactoryContext<'_>) -> GraphResult<AnyOperator> {
        let header = OperatorHeader::from_chain(cursor)?;
        let sender = ctx.resources.collector.clone().ok_or_else(|| {
            GraphError::operator(header.id, "no collector channel configured for Collect")
        })?;
        Ok(AnyOperator::asynch(Self::new(header, sender)?))
    }
}

impl Operator for Collect {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn header(&self) -> &OperatorHeader {
        &self.header
    }

    fn in_connections_complete(&mut self, _inputs: &[Arc<Schema>]) -> GraphResult<Vec<Arc<Schema>>> {
        Ok(Vec::new())
    }
}

impl AsynchOperator for Collect {
    fn work(&mut self, port: usize, value: Data, _out: &mut Outputs<'_>) -> GraphResult<()> {
        self.sender
            .send(Collected {
                operator: self.header.id,
                port,
                value,
            })
            .map_err(|_| GraphError::operator(self.header.id, "collector channel disconnected"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::graph::FlowGraph;

    fn wired(sender: Sender<Collected>, inputs: usize) -> (FlowGraph, Vec<crate::pipeline::id::StreamId>) {
        let op = Collect::new(OperatorHeader::new(OperatorId(4), inputs, 0), sender).unwrap();
        let mut graph = FlowGraph::new();
        let id = graph.add_operator(AnyOperator::asynch(op)).unwrap();
        let streams: Vec<_> = (0..inputs)
            .map(|port| {
                let stream = graph.create_stream(Schema::long().shared());
                graph.in_connect(id, port, stream).unwrap();
                stream
            })
            .collect();
        graph.in_connections_complete(id).unwrap();
        graph.out_connections_complete(id).unwrap();
        (graph, streams)
    }

    #[test]
    fn test_forwards_operator_port_and_value() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let (mut graph, streams) = wired(tx, 2);
        graph.transfer(streams[1], Data::Long(5)).unwrap();
        graph.transfer(streams[0], Data::Long(6)).unwrap();

        let got: Vec<Collected> = rx.try_iter().collect();
        assert_eq!(
            got,
            vec![
                Collected { operator: OperatorId(4), port: 1, value: Data::Long(5) },
                Collected { operator: OperatorId(4), port: 0, value: Data::Long(6) },
            ]
        );
    }

    #[test]
    fn test_dropped_receiver_is_an_error() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let (mut graph, streams) = wired(tx, 1);
        drop(rx);
        let err = graph.transfer(streams[0], Data::Long(1)).unwrap_err();
        assert!(matches!(err, GraphError::Operator { id: OperatorId(4), .. }), "{}", err);
    }

    #[test]
    fn test_rejects_output_ports() {
        let (tx, _rx) = crossbeam_channel::unbounded();
        assert!(Collect::new(OperatorHeader::new(OperatorId(4), 1, 1), tx).is_err());
    }
}
