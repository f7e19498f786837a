//! Flow graph arena and the synchronous transfer engine.
//!
//! Operators live in slots indexed through their [`OperatorId`]; streams
//! live in a flat arena indexed by [`StreamId`] and refer to operators by
//! ID only, so the graph owns everything and teardown is a plain drop.
//!
//! Execution is call-stack driven. [`FlowGraph::transfer`] hands a value to
//! the destination operator before returning, so driving the source runs
//! the whole pipeline on the current thread. While an operator runs it is
//! taken out of its slot; the graph stays mutably available to the
//! [`Outputs`] handle it is given.
//!
//! # Wiring lifecycle
//!
//! ```text
//! Created --in_connect*--> in_connections_complete --> InputsComplete
//! InputsComplete --out_connect*--> out_connections_complete --> Wired
//! Wired --(drive | all inputs finished)--> Finished
//! ```

use crate::data::{Data, Schema};
use crate::pipeline::error::{GraphError, GraphResult};
use crate::pipeline::id::{OperatorId, StreamId};
use crate::pipeline::operator::{AnyOperator, Dispatch, OperatorHeader};
use crate::pipeline::port::{PortDirection, PortRef};
use crate::tag::Properties;
use std::collections::HashMap;
use std::sync::Arc;

/// Where an operator stands in the wiring lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    InputsComplete,
    Wired,
    Finished,
}

impl Lifecycle {
    pub fn as_str(self) -> &'static str {
        match self {
            Lifecycle::Created => "created",
            Lifecycle::InputsComplete => "inputs complete",
            Lifecycle::Wired => "wired",
            Lifecycle::Finished => "finished",
        }
    }
}

/// A typed edge between two operator ports.
#[derive(Debug, Clone)]
pub struct Stream {
    id: StreamId,
    schema: Arc<Schema>,
    source: Option<PortRef>,
    destination: Option<PortRef>,
    finished: bool,
    transferred: u64,
}

impl Stream {
    pub fn id(&self) -> StreamId {
        self.id
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn source(&self) -> Option<PortRef> {
        self.source
    }

    pub fn destination(&self) -> Option<PortRef> {
        self.destination
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Values delivered so far.
    pub fn transferred(&self) -> u64 {
        self.transferred
    }
}

struct OperatorSlot {
    header: OperatorHeader,
    /// `None` while the operator is running.
    operator: Option<AnyOperator>,
    dispatch: Dispatch,
    lifecycle: Lifecycle,
    inputs: Vec<Option<StreamId>>,
    outputs: Vec<Option<StreamId>>,
    output_schemas: Vec<Arc<Schema>>,
    finished_inputs: Vec<bool>,
}

/// Output side of a running operator.
pub struct Outputs<'g> {
    graph: &'g mut FlowGraph,
    operator: OperatorId,
    streams: Vec<StreamId>,
}

impl<'g> Outputs<'g> {
    pub fn operator(&self) -> OperatorId {
        self.operator
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    pub fn schema(&self, port: usize) -> Option<&Arc<Schema>> {
        let stream = self.streams.get(port)?;
        self.graph.stream(*stream).map(Stream::schema)
    }

    /// Transfer `value` on output `port`; returns once the downstream
    /// operators are done with it.
    pub fn emit(&mut self, port: usize, value: Data) -> GraphResult<()> {
        let stream = *self
            .streams
            .get(port)
            .ok_or(GraphError::PortOutOfRange {
                operator: self.operator,
                direction: PortDirection::Output,
                port,
                arity: self.streams.len(),
            })?;
        self.graph.transfer(stream, value)
    }

    /// Transfer a copy of `value` on every output port.
    pub fn emit_all(&mut self, value: &Data) -> GraphResult<()> {
        for port in 0..self.streams.len() {
            self.emit(port, value.clone())?;
        }
        Ok(())
    }
}

/// Arena of operators and streams.
#[derive(Default)]
pub struct FlowGraph {
    slots: Vec<OperatorSlot>,
    index: HashMap<OperatorId, usize>,
    streams: Vec<Stream>,
}

impl FlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Arena ──

    /// Add an operator. IDs are unique within a graph.
    pub fn add_operator(&mut self, operator: AnyOperator) -> GraphResult<OperatorId> {
        let header = *operator.header();
        if self.index.contains_key(&header.id) {
            return Err(GraphError::DuplicateOperator(header.id));
        }
        tracing::debug!(
            "Added operator {} [{}] ({} in / {} out)",
            header.id,
            operator.type_name(),
            header.num_inputs,
            header.num_outputs
        );
        self.index.insert(header.id, self.slots.len());
        self.slots.push(OperatorSlot {
            header,
            dispatch: operator.dispatch(),
            operator: Some(operator),
            lifecycle: Lifecycle::Created,
            inputs: vec![None; header.num_inputs],
            outputs: vec![None; header.num_outputs],
            output_schemas: Vec::new(),
            finished_inputs: vec![false; header.num_inputs],
        });
        Ok(header.id)
    }

    /// Create an unbound stream carrying `schema`.
    pub fn create_stream(&mut self, schema: Arc<Schema>) -> StreamId {
        let id = StreamId(self.streams.len() as u32);
        self.streams.push(Stream {
            id,
            schema,
            source: None,
            destination: None,
            finished: false,
            transferred: 0,
        });
        id
    }

    pub fn contains(&self, id: OperatorId) -> bool {
        self.index.contains_key(&id)
    }

    /// Operator IDs in insertion order.
    pub fn operator_ids(&self) -> impl Iterator<Item = OperatorId> + '_ {
        self.slots.iter().map(|slot| slot.header.id)
    }

    pub fn operator_count(&self) -> usize {
        self.slots.len()
    }

    pub fn header(&self, id: OperatorId) -> GraphResult<&OperatorHeader> {
        Ok(&self.slots[self.position(id)?].header)
    }

    pub fn dispatch(&self, id: OperatorId) -> GraphResult<Dispatch> {
        Ok(self.slots[self.position(id)?].dispatch)
    }

    pub fn lifecycle(&self, id: OperatorId) -> GraphResult<Lifecycle> {
        Ok(self.slots[self.position(id)?].lifecycle)
    }

    pub fn stream(&self, id: StreamId) -> Option<&Stream> {
        self.streams.get(id.index())
    }

    pub fn streams(&self) -> &[Stream] {
        &self.streams
    }

    /// Tag description of an operator.
    pub fn describe(&self, id: OperatorId) -> GraphResult<Properties> {
        self.slots[self.position(id)?]
            .operator
            .as_ref()
            .map(AnyOperator::describe)
            .ok_or(GraphError::Reentrant(id))
    }

    /// Schemas of the streams bound to `id`'s inputs, in port order.
    pub fn input_schemas(&self, id: OperatorId) -> GraphResult<Vec<Arc<Schema>>> {
        let slot = &self.slots[self.position(id)?];
        slot.inputs
            .iter()
            .enumerate()
            .map(|(port, input)| -> GraphResult<Arc<Schema>> {
                let stream = input.ok_or(GraphError::UnconnectedPort {
                    operator: id,
                    direction: PortDirection::Input,
                    port,
                })?;
                Ok(self.streams[stream.index()].schema.clone())
            })
            .collect()
    }

    /// Output typing declared by `in_connections_complete`.
    pub fn output_schemas(&self, id: OperatorId) -> GraphResult<&[Arc<Schema>]> {
        Ok(&self.slots[self.position(id)?].output_schemas)
    }

    // ── Wiring ──

    /// Bind `stream` as input `port` of `id`.
    pub fn in_connect(&mut self, id: OperatorId, port: usize, stream: StreamId) -> GraphResult<()> {
        let pos = self.position(id)?;
        self.expect_state(pos, Lifecycle::Created, "connect an input")?;
        let slot = &self.slots[pos];
        check_port(id, PortDirection::Input, port, &slot.inputs)?;

        let target = self
            .streams
            .get_mut(stream.index())
            .ok_or(GraphError::UnknownStream(stream))?;
        if let Some(existing) = target.destination {
            return Err(GraphError::operator(
                id,
                format!("stream {} already feeds {}", stream, existing),
            ));
        }
        target.destination = Some(PortRef::new(id, port));
        self.slots[pos].inputs[port] = Some(stream);
        tracing::debug!("Stream {} -> input {}:{}", stream, id, port);
        Ok(())
    }

    /// Let `id` inspect its input schemas and declare its output typing.
    pub fn in_connections_complete(&mut self, id: OperatorId) -> GraphResult<Vec<Arc<Schema>>> {
        let pos = self.position(id)?;
        self.expect_state(pos, Lifecycle::Created, "complete its inputs")?;
        let inputs = self.input_schemas(id)?;

        let slot = &mut self.slots[pos];
        let operator = slot.operator.as_mut().ok_or(GraphError::Reentrant(id))?;
        let declared = operator.in_connections_complete(&inputs)?;
        if declared.len() != slot.header.num_outputs {
            return Err(GraphError::operator(
                id,
                format!(
                    "declared {} output schemas for {} output ports",
                    declared.len(),
                    slot.header.num_outputs
                ),
            ));
        }
        slot.output_schemas = declared.clone();
        slot.lifecycle = Lifecycle::InputsComplete;
        Ok(declared)
    }

    /// Bind `stream` as output `port` of `id`. The stream must carry the
    /// schema declared for that port.
    pub fn out_connect(&mut self, id: OperatorId, port: usize, stream: StreamId) -> GraphResult<()> {
        let pos = self.position(id)?;
        self.expect_state(pos, Lifecycle::InputsComplete, "connect an output")?;
        let slot = &self.slots[pos];
        check_port(id, PortDirection::Output, port, &slot.outputs)?;

        let target = self
            .streams
            .get_mut(stream.index())
            .ok_or(GraphError::UnknownStream(stream))?;
        let expected = &slot.output_schemas[port];
        if !target.schema.same_as(expected) {
            return Err(GraphError::SchemaMismatch {
                operator: id,
                port,
                expected: expected.to_string(),
                actual: target.schema.to_string(),
            });
        }
        if let Some(existing) = target.source {
            return Err(GraphError::operator(
                id,
                format!("stream {} is already fed by {}", stream, existing),
            ));
        }
        target.source = Some(PortRef::new(id, port));
        self.slots[pos].outputs[port] = Some(stream);
        tracing::debug!("Output {}:{} -> stream {}", id, port, stream);
        Ok(())
    }

    /// Finish wiring `id`; processing may start afterwards.
    pub fn out_connections_complete(&mut self, id: OperatorId) -> GraphResult<()> {
        let pos = self.position(id)?;
        self.expect_state(pos, Lifecycle::InputsComplete, "complete its outputs")?;
        let slot = &mut self.slots[pos];
        if let Some(port) = slot.outputs.iter().position(Option::is_none) {
            return Err(GraphError::UnconnectedPort {
                operator: id,
                direction: PortDirection::Output,
                port,
            });
        }
        slot.operator
            .as_mut()
            .ok_or(GraphError::Reentrant(id))?
            .out_connections_complete()?;
        slot.lifecycle = Lifecycle::Wired;
        Ok(())
    }

    // ── Execution ──

    /// Run a wired source operator to completion, then finish its outputs.
    pub fn drive(&mut self, id: OperatorId) -> GraphResult<()> {
        let pos = self.position(id)?;
        self.expect_state(pos, Lifecycle::Wired, "be driven")?;
        if self.slots[pos].dispatch != Dispatch::Source {
            return Err(GraphError::operator(id, "only source operators can be driven"));
        }

        tracing::info!("Driving source {}", id);
        let streams = self.output_streams(pos);
        let mut operator = self.take_operator(pos)?;
        let result = match &mut operator {
            AnyOperator::Source(op) => op.work(&mut Outputs {
                graph: self,
                operator: id,
                streams,
            }),
            _ => Ok(()),
        };
        self.slots[pos].operator = Some(operator);
        result?;
        self.finish_operator(pos)
    }

    /// Deliver `value` to the destination of `stream`.
    ///
    /// Values sent on a finished stream are dropped with a warning.
    pub fn transfer(&mut self, stream: StreamId, value: Data) -> GraphResult<()> {
        let target = self
            .streams
            .get_mut(stream.index())
            .ok_or(GraphError::UnknownStream(stream))?;
        if target.finished {
            tracing::warn!("Transfer on finished stream {}; value dropped", stream);
            return Ok(());
        }
        debug_assert!(
            target.schema.conforms(&value),
            "value {} does not match stream schema {}",
            value.type_name(),
            target.schema
        );
        let Some(destination) = target.destination else {
            tracing::trace!("Stream {} has no destination; value dropped", stream);
            return Ok(());
        };
        target.transferred += 1;
        tracing::trace!("Stream {} -> {}", stream, destination);
        self.deliver(destination, value)
    }

    /// Signal end of data on `stream`. Finishing twice is a no-op.
    pub fn finish(&mut self, stream: StreamId) -> GraphResult<()> {
        let target = self
            .streams
            .get_mut(stream.index())
            .ok_or(GraphError::UnknownStream(stream))?;
        if target.finished {
            return Ok(());
        }
        target.finished = true;
        tracing::debug!(
            "Stream {} finished after {} values",
            stream,
            target.transferred
        );
        match target.destination {
            Some(destination) => self.input_finished(destination),
            None => Ok(()),
        }
    }

    fn deliver(&mut self, destination: PortRef, value: Data) -> GraphResult<()> {
        let PortRef { operator: id, port } = destination;
        let pos = self.position(id)?;
        match self.slots[pos].lifecycle {
            Lifecycle::Wired => {}
            Lifecycle::Finished => {
                tracing::warn!(
                    "Operator {} already finished; value on input {} discarded",
                    id,
                    port
                );
                return Ok(());
            }
            state => {
                return Err(GraphError::Lifecycle {
                    operator: id,
                    action: "receive data",
                    state: state.as_str(),
                })
            }
        }

        let streams = self.output_streams(pos);
        let mut operator = self.take_operator(pos)?;
        let mut out = Outputs {
            graph: self,
            operator: id,
            streams,
        };
        let result = match &mut operator {
            AnyOperator::Source(_) => Err(GraphError::PortOutOfRange {
                operator: id,
                direction: PortDirection::Input,
                port,
                arity: 0,
            }),
            AnyOperator::Asynch(op) => op.work(port, value, &mut out),
            AnyOperator::Synch { operator: op, state } => match state.arrive(port, value) {
                Some(values) => {
                    tracing::trace!("Operator {} watermark reached, firing", id);
                    op.work(values, &mut out)
                }
                None => Ok(()),
            },
        };
        self.slots[pos].operator = Some(operator);
        result
    }

    fn input_finished(&mut self, destination: PortRef) -> GraphResult<()> {
        let PortRef { operator: id, port } = destination;
        let pos = self.position(id)?;
        let slot = &mut self.slots[pos];
        match slot.lifecycle {
            Lifecycle::Wired => {}
            Lifecycle::Finished => return Ok(()),
            state => {
                return Err(GraphError::Lifecycle {
                    operator: id,
                    action: "finish an input",
                    state: state.as_str(),
                })
            }
        }
        if std::mem::replace(&mut slot.finished_inputs[port], true) {
            return Ok(());
        }
        let all_finished = slot.finished_inputs.iter().all(|&done| done);

        let streams = self.output_streams(pos);
        let mut operator = self.take_operator(pos)?;
        let mut out = Outputs {
            graph: self,
            operator: id,
            streams,
        };
        let (result, close) = match &mut operator {
            AnyOperator::Source(_) => (Ok(()), true),
            AnyOperator::Asynch(op) => (op.finish(port, &mut out), all_finished),
            AnyOperator::Synch { operator: op, state } => {
                let dropped = state.clear();
                if dropped > 0 {
                    tracing::debug!(
                        "Operator {} finished with {} unmatched values buffered",
                        id,
                        dropped
                    );
                }
                (op.finish(&mut out), true)
            }
        };
        self.slots[pos].operator = Some(operator);
        result?;
        if close {
            self.finish_operator(pos)?;
        }
        Ok(())
    }

    fn finish_operator(&mut self, pos: usize) -> GraphResult<()> {
        self.slots[pos].lifecycle = Lifecycle::Finished;
        tracing::debug!("Operator {} finished", self.slots[pos].header.id);
        for stream in self.output_streams(pos) {
            self.finish(stream)?;
        }
        Ok(())
    }

    fn position(&self, id: OperatorId) -> GraphResult<usize> {
        self.index
            .get(&id)
            .copied()
            .ok_or(GraphError::UnknownOperatorId(id))
    }

    fn expect_state(&self, pos: usize, expected: Lifecycle, action: &'static str) -> GraphResult<()> {
        let slot = &self.slots[pos];
        if slot.lifecycle == expected {
            Ok(())
        } else {
            Err(GraphError::Lifecycle {
                operator: slot.header.id,
                action,
                state: slot.lifecycle.as_str(),
            })
        }
    }

    fn take_operator(&mut self, pos: usize) -> GraphResult<AnyOperator> {
        let slot = &mut self.slots[pos];
        slot.operator
            .take()
            .ok_or(GraphError::Reentrant(slot.header.id))
    }

    fn output_streams(&self, pos: usize) -> Vec<StreamId> {
        self.slots[pos].outputs.iter().flatten().copied().collect()
    }
}

fn check_port(
    id: OperatorId,
    direction: PortDirection,
    port: usize,
    bound: &[Option<StreamId>],
) -> GraphResult<()> {
    match bound.get(port) {
        None => Err(GraphError::PortOutOfRange {
            operator: id,
            direction,
            port,
            arity: bound.len(),
        }),
        Some(Some(_)) => Err(GraphError::PortAlreadyConnected {
            operator: id,
            direction,
            port,
        }),
        Some(None) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::operator::{AsynchOperator, Operator, SourceOperator, SynchOperator};
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<String>>>;

    struct Counter {
        header: OperatorHeader,
        upto: i64,
    }

    impl Operator for Counter {
        fn type_name(&self) -> &'static str {
            "Counter"
        }
        fn header(&self) -> &OperatorHeader {
            &self.header
        }
        fn in_connections_complete(&mut self, _: &[Arc<Schema>]) -> GraphResult<Vec<Arc<Schema>>> {
            Ok(vec![Schema::long().shared(); self.header.num_outputs])
        }
    }

    impl SourceOperator for Counter {
        fn work(&mut self, out: &mut Outputs<'_>) -> GraphResult<()> {
            for i in 0..self.upto {
                out.emit_all(&Data::Long(i))?;
            }
            Ok(())
        }
    }

    struct Recorder {
        header: OperatorHeader,
        log: Log,
    }

    impl Operator for Recorder {
        fn type_name(&self) -> &'static str {
            "Recorder"
        }
        fn header(&self) -> &OperatorHeader {
            &self.header
        }
        fn in_connections_complete(&mut self, _: &[Arc<Schema>]) -> GraphResult<Vec<Arc<Schema>>> {
            Ok(Vec::new())
        }
    }

    impl AsynchOperator for Recorder {
        fn work(&mut self, port: usize, value: Data, _: &mut Outputs<'_>) -> GraphResult<()> {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:{:?}", port, value.as_long()));
            Ok(())
        }
        fn finish(&mut self, port: usize, _: &mut Outputs<'_>) -> GraphResult<()> {
            self.log.lock().unwrap().push(format!("end {}", port));
            Ok(())
        }
    }

    struct Pairs {
        header: OperatorHeader,
        log: Log,
    }

    impl Operator for Pairs {
        fn type_name(&self) -> &'static str {
            "Pairs"
        }
        fn header(&self) -> &OperatorHeader {
            &self.header
        }
        fn in_connections_complete(&mut self, _: &[Arc<Schema>]) -> GraphResult<Vec<Arc<Schema>>> {
            Ok(Vec::new())
        }
    }

    impl SynchOperator for Pairs {
        fn work(&mut self, values: Vec<Data>, _: &mut Outputs<'_>) -> GraphResult<()> {
            let rendered: Vec<String> = values.iter().map(|v| format!("{:?}", v.as_long())).collect();
            self.log.lock().unwrap().push(rendered.join("+"));
            Ok(())
        }
        fn finish(&mut self, _: &mut Outputs<'_>) -> GraphResult<()> {
            self.log.lock().unwrap().push("end".to_string());
            Ok(())
        }
    }

    fn counter(id: u32, upto: i64, outputs: usize) -> AnyOperator {
        AnyOperator::source(Counter {
            header: OperatorHeader::new(OperatorId(id), 0, outputs),
            upto,
        })
    }

    fn recorder(id: u32, inputs: usize, log: &Log) -> AnyOperator {
        AnyOperator::asynch(Recorder {
            header: OperatorHeader::new(OperatorId(id), inputs, 0),
            log: log.clone(),
        })
    }

    fn pairs(id: u32, log: &Log) -> AnyOperator {
        AnyOperator::synch(Pairs {
            header: OperatorHeader::new(OperatorId(id), 2, 0),
            log: log.clone(),
        })
    }

    /// Wire `from`'s outputs to consecutive inputs of `to`.
    fn wire(graph: &mut FlowGraph, from: OperatorId, to: OperatorId) {
        let schemas = graph.in_connections_complete(from).unwrap();
        for (port, schema) in schemas.into_iter().enumerate() {
            let stream = graph.create_stream(schema);
            graph.out_connect(from, port, stream).unwrap();
            graph.in_connect(to, port, stream).unwrap();
        }
        graph.out_connections_complete(from).unwrap();
        graph.in_connections_complete(to).unwrap();
        graph.out_connections_complete(to).unwrap();
    }

    #[test]
    fn test_source_to_asynch_sink() {
        let log = Log::default();
        let mut graph = FlowGraph::new();
        let src = graph.add_operator(counter(1, 3, 1)).unwrap();
        let sink = graph.add_operator(recorder(2, 1, &log)).unwrap();
        wire(&mut graph, src, sink);

        graph.drive(src).unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["0:Some(0)", "0:Some(1)", "0:Some(2)", "end 0"]
        );
        assert_eq!(graph.lifecycle(sink).unwrap(), Lifecycle::Finished);
        assert_eq!(graph.streams()[0].transferred(), 3);
        assert!(graph.streams()[0].is_finished());
    }

    #[test]
    fn test_asynch_finishes_per_port() {
        let log = Log::default();
        let mut graph = FlowGraph::new();
        let src = graph.add_operator(counter(1, 1, 2)).unwrap();
        let sink = graph.add_operator(recorder(2, 2, &log)).unwrap();
        wire(&mut graph, src, sink);

        graph.drive(src).unwrap();
        let log = log.lock().unwrap();
        assert_eq!(log.iter().filter(|l| l.starts_with("end")).count(), 2);
    }

    #[test]
    fn test_synch_watermark_through_graph() {
        let log = Log::default();
        let mut graph = FlowGraph::new();
        let zip = graph.add_operator(pairs(9, &log)).unwrap();
        let left = graph.create_stream(Schema::long().shared());
        let right = graph.create_stream(Schema::long().shared());
        graph.in_connect(zip, 0, left).unwrap();
        graph.in_connect(zip, 1, right).unwrap();
        graph.in_connections_complete(zip).unwrap();
        graph.out_connections_complete(zip).unwrap();

        for v in [10, 11, 12] {
            graph.transfer(left, Data::Long(v)).unwrap();
        }
        graph.transfer(right, Data::Long(20)).unwrap();
        assert_eq!(log.lock().unwrap().len(), 1);
        graph.transfer(right, Data::Long(21)).unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["Some(10)+Some(20)", "Some(11)+Some(21)"]
        );

        graph.finish(right).unwrap();
        assert_eq!(log.lock().unwrap().last().map(String::as_str), Some("end"));
        assert_eq!(graph.lifecycle(zip).unwrap(), Lifecycle::Finished);

        // late arrivals after finish are discarded
        graph.transfer(left, Data::Long(13)).unwrap();
        graph.finish(left).unwrap();
        assert_eq!(log.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_transfer_on_finished_stream_is_dropped() {
        let log = Log::default();
        let mut graph = FlowGraph::new();
        let sink = graph.add_operator(recorder(2, 1, &log)).unwrap();
        let stream = graph.create_stream(Schema::long().shared());
        graph.in_connect(sink, 0, stream).unwrap();
        graph.in_connections_complete(sink).unwrap();
        graph.out_connections_complete(sink).unwrap();

        graph.finish(stream).unwrap();
        graph.transfer(stream, Data::Long(1)).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["end 0"]);
        assert_eq!(graph.stream(stream).unwrap().transferred(), 0);
    }

    #[test]
    fn test_lifecycle_order_enforced() {
        let log = Log::default();
        let mut graph = FlowGraph::new();
        let src = graph.add_operator(counter(1, 1, 1)).unwrap();
        let sink = graph.add_operator(recorder(2, 1, &log)).unwrap();

        // outputs before inputs are complete
        let stream = graph.create_stream(Schema::long().shared());
        assert!(matches!(
            graph.out_connect(src, 0, stream),
            Err(GraphError::Lifecycle { .. })
        ));
        // driving before wiring
        assert!(matches!(graph.drive(src), Err(GraphError::Lifecycle { .. })));
        // completing inputs with an unbound port
        assert!(matches!(
            graph.in_connections_complete(sink),
            Err(GraphError::UnconnectedPort { .. })
        ));
        // completing outputs with an unbound port
        graph.in_connections_complete(src).unwrap();
        assert!(matches!(
            graph.out_connections_complete(src),
            Err(GraphError::UnconnectedPort { .. })
        ));
    }

    #[test]
    fn test_port_checks() {
        let log = Log::default();
        let mut graph = FlowGraph::new();
        let sink = graph.add_operator(recorder(2, 1, &log)).unwrap();
        let a = graph.create_stream(Schema::long().shared());
        let b = graph.create_stream(Schema::long().shared());

        assert!(matches!(
            graph.in_connect(sink, 1, a),
            Err(GraphError::PortOutOfRange { port: 1, arity: 1, .. })
        ));
        graph.in_connect(sink, 0, a).unwrap();
        assert!(matches!(
            graph.in_connect(sink, 0, b),
            Err(GraphError::PortAlreadyConnected { .. })
        ));
        assert!(matches!(
            graph.in_connect(OperatorId(77), 0, b),
            Err(GraphError::UnknownOperatorId(_))
        ));
    }

    #[test]
    fn test_out_connect_schema_mismatch() {
        let mut graph = FlowGraph::new();
        let src = graph.add_operator(counter(1, 1, 1)).unwrap();
        graph.in_connections_complete(src).unwrap();
        let wrong = graph.create_stream(Schema::int().shared());
        let err = graph.out_connect(src, 0, wrong).unwrap_err();
        assert!(matches!(err, GraphError::SchemaMismatch { port: 0, .. }));
        assert!(err.to_string().contains("expected schema long"));
    }

    #[test]
    fn test_duplicate_operator_id() {
        let log = Log::default();
        let mut graph = FlowGraph::new();
        graph.add_operator(recorder(5, 1, &log)).unwrap();
        assert!(matches!(
            graph.add_operator(recorder(5, 1, &log)),
            Err(GraphError::DuplicateOperator(OperatorId(5)))
        ));
    }

    #[test]
    fn test_drive_twice_is_rejected() {
        let log = Log::default();
        let mut graph = FlowGraph::new();
        let src = graph.add_operator(counter(1, 2, 1)).unwrap();
        let sink = graph.add_operator(recorder(2, 1, &log)).unwrap();
        wire(&mut graph, src, sink);
        graph.drive(src).unwrap();
        assert!(matches!(graph.drive(src), Err(GraphError::Lifecycle { .. })));
        assert!(matches!(graph.drive(sink), Err(GraphError::Lifecycle { .. })));
    }
}
