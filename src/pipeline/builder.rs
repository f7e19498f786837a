//! Builds a wired [`FlowGraph`] from a flow description.
//!
//! A flow file holds two top-level tags:
//!
//! ```text
//! [Operators]
//!   [|Sequence ...][Operator id="1" numInputs="0" numOutputs="1"][/Operator]
//!   [|Print][Operator id="2" numInputs="1" numOutputs="0"][/Operator]
//! [/Operators]
//! [Streams]
//!   [Edge from="1" fromPort="0" to="2" toPort="0"][/Edge]
//! [/Streams]
//! ```
//!
//! (attribute lists abbreviated; the wire form uses `numProperties` and
//! `nameI`/`valI` pairs).
//!
//! Building runs in phases:
//! 1. Create every operator through the operator registry.
//! 2. Validate edges against port arities and build forward and reverse
//!    adjacency, reserving one reverse slot per destination input port.
//! 3. Exactly one operator may lack incoming edges; it is the source.
//!    Operators without outgoing edges are sinks.
//! 4. Wire in dependency order: an operator is wired once every reserved
//!    input slot holds a stream.

use crate::data::{Schema, SchemaRegistry};
use crate::error::FlowError;
use crate::pipeline::error::{GraphError, GraphResult};
use crate::pipeline::graph::FlowGraph;
use crate::pipeline::id::{OperatorId, StreamId};
use crate::pipeline::operators::{Collected, PrintTarget};
use crate::pipeline::port::PortDirection;
use crate::pipeline::registry::{FactoryContext, FlowResources, OperatorRegistry};
use crate::tag::{parse_str, Properties, PropertiesCursor, TagReader};
use crate::transport::OutboundHook;
use crossbeam_channel::Sender;
use std::collections::{HashMap, HashSet, VecDeque};
use std::io::Read;
use std::sync::Arc;

pub const OPERATORS_TAG: &str = "Operators";
pub const STREAMS_TAG: &str = "Streams";
pub const EDGE_TAG: &str = "Edge";

/// One declared connection: output `from_port` of `from` feeds input
/// `to_port` of `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeSpec {
    pub from: OperatorId,
    pub from_port: usize,
    pub to: OperatorId,
    pub to_port: usize,
}

impl EdgeSpec {
    pub fn new(from: OperatorId, from_port: usize, to: OperatorId, to_port: usize) -> Self {
        Self {
            from,
            from_port,
            to,
            to_port,
        }
    }

    pub fn from_properties(cursor: PropertiesCursor<'_>) -> GraphResult<Self> {
        if cursor.name() != EDGE_TAG {
            return Err(FlowError::MalformedTag(format!(
                "[{}] holds [{}], expected [{}]",
                STREAMS_TAG,
                cursor.name(),
                EDGE_TAG
            ))
            .into());
        }
        Ok(Self {
            from: OperatorId(cursor.parse("from")?),
            from_port: cursor.parse("fromPort")?,
            to: OperatorId(cursor.parse("to")?),
            to_port: cursor.parse("toPort")?,
        })
    }

    pub fn describe(&self) -> Properties {
        Properties::new(EDGE_TAG)
            .with("from", self.from.0)
            .with("fromPort", self.from_port)
            .with("to", self.to.0)
            .with("toPort", self.to_port)
    }
}

/// Input typing of one sink, reported after a run.
#[derive(Debug, Clone)]
pub struct SinkTyping {
    pub operator: OperatorId,
    pub inputs: Vec<Arc<Schema>>,
}

impl SinkTyping {
    /// `[Sink id=..]` with one schema description per input port.
    pub fn describe(&self) -> Properties {
        self.inputs.iter().fold(
            Properties::new("Sink").with("id", self.operator.0),
            |props, schema| props.with_child(schema.describe()),
        )
    }
}

/// A wired graph together with its execution root.
pub struct Flow {
    graph: FlowGraph,
    source: OperatorId,
    sinks: Vec<OperatorId>,
}

impl Flow {
    /// Drive the source to completion. Everything downstream runs inside
    /// this call.
    pub fn run(&mut self) -> GraphResult<()> {
        self.graph.drive(self.source)
    }

    pub fn source(&self) -> OperatorId {
        self.source
    }

    pub fn sinks(&self) -> &[OperatorId] {
        &self.sinks
    }

    /// Input schemas of every sink, in declaration order.
    pub fn sink_schemas(&self) -> GraphResult<Vec<SinkTyping>> {
        self.sinks
            .iter()
            .map(|&operator| {
                Ok(SinkTyping {
                    operator,
                    inputs: self.graph.input_schemas(operator)?,
                })
            })
            .collect()
    }

    pub fn graph(&self) -> &FlowGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut FlowGraph {
        &mut self.graph
    }

    pub fn into_graph(self) -> FlowGraph {
        self.graph
    }

    /// Describe the flow back into its `Operators` and `Streams` tags.
    pub fn describe(&self) -> GraphResult<Vec<Properties>> {
        let mut operators = Properties::new(OPERATORS_TAG);
        for id in self.graph.operator_ids() {
            operators.add_child(self.graph.describe(id)?);
        }
        let mut streams = Properties::new(STREAMS_TAG);
        for stream in self.graph.streams() {
            if let (Some(from), Some(to)) = (stream.source(), stream.destination()) {
                streams.add_child(EdgeSpec::new(from.operator, from.port, to.operator, to.port).describe());
            }
        }
        Ok(vec![operators, streams])
    }
}

impl std::fmt::Debug for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flow")
            .field("source", &self.source)
            .field("sinks", &self.sinks)
            .field("operators", &self.graph.operator_count())
            .field("streams", &self.graph.streams().len())
            .finish()
    }
}

/// Builds flows from tag descriptions against a pair of registries.
pub struct FlowBuilder<'r> {
    operators: &'r OperatorRegistry,
    schemas: &'r SchemaRegistry,
    resources: FlowResources,
}

impl<'r> FlowBuilder<'r> {
    pub fn new(operators: &'r OperatorRegistry, schemas: &'r SchemaRegistry) -> Self {
        Self {
            operators,
            schemas,
            resources: FlowResources::default(),
        }
    }

    pub fn with_resources(mut self, resources: FlowResources) -> Self {
        self.resources = resources;
        self
    }

    /// Channel that `Collect` sinks send into.
    pub fn collect_into(mut self, sender: Sender<Collected>) -> Self {
        self.resources.collector = Some(sender);
        self
    }

    /// Hook that `Outbound` sinks deliver to.
    pub fn outbound(mut self, hook: Arc<dyn OutboundHook>) -> Self {
        self.resources.outbound = Some(hook);
        self
    }

    pub fn print_to(mut self, target: PrintTarget) -> Self {
        self.resources.print = target;
        self
    }

    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.resources.buffer_capacity = capacity;
        self
    }

    pub fn tag_id(mut self, tag_id: u32) -> Self {
        self.resources.tag_id = tag_id;
        self
    }

    pub fn build_str(&self, text: &str) -> GraphResult<Flow> {
        self.build(&parse_str(text)?)
    }

    pub fn build_reader<R: Read>(&self, reader: R) -> GraphResult<Flow> {
        self.build(&TagReader::new(reader).read_all()?)
    }

    /// Build, run, and report sink typings in one call.
    pub fn build_and_run(&self, objects: &[Properties]) -> GraphResult<Vec<SinkTyping>> {
        let mut flow = self.build(objects)?;
        flow.run()?;
        flow.sink_schemas()
    }

    pub fn build(&self, objects: &[Properties]) -> GraphResult<Flow> {
        let (operator_tags, edge_tags) = split_sections(objects)?;

        let ctx = FactoryContext {
            schemas: self.schemas,
            resources: &self.resources,
        };
        let mut graph = FlowGraph::new();
        for tag in operator_tags {
            let operator = self.operators.create(tag, &ctx)?;
            graph.add_operator(operator)?;
        }

        let edges = edge_tags
            .iter()
            .map(|tag| EdgeSpec::from_properties(tag.cursor()))
            .collect::<GraphResult<Vec<_>>>()?;

        let plan = WiringPlan::new(&graph, &edges)?;
        let source = plan.source(&graph)?;
        plan.check_inputs(&graph)?;
        let sinks = plan.sinks(&graph);
        plan.wire(&mut graph)?;

        tracing::info!(
            "Flow built: {} operators, {} streams, source {}, {} sink(s)",
            graph.operator_count(),
            graph.streams().len(),
            source,
            sinks.len()
        );
        Ok(Flow {
            graph,
            source,
            sinks,
        })
    }
}

fn split_sections(objects: &[Properties]) -> GraphResult<(Vec<&Properties>, Vec<&Properties>)> {
    let mut operators = Vec::new();
    let mut edges = Vec::new();
    for object in objects {
        match object.name() {
            OPERATORS_TAG => operators.extend(object.contents()),
            STREAMS_TAG => edges.extend(object.contents()),
            other => {
                return Err(FlowError::MalformedTag(format!(
                    "unexpected top-level tag [{}]",
                    other
                ))
                .into())
            }
        }
    }
    Ok((operators, edges))
}

/// Validated adjacency for a set of edges.
struct WiringPlan {
    /// Outgoing edges by source operator.
    forward: HashMap<OperatorId, Vec<EdgeSpec>>,
    /// Destinations that have at least one incoming edge.
    has_incoming: HashSet<OperatorId>,
    connected_inputs: HashSet<(OperatorId, usize)>,
}

impl WiringPlan {
    fn new(graph: &FlowGraph, edges: &[EdgeSpec]) -> GraphResult<Self> {
        let mut forward: HashMap<OperatorId, Vec<EdgeSpec>> = HashMap::new();
        let mut has_incoming = HashSet::new();
        let mut connected_inputs = HashSet::new();
        let mut connected_outputs = HashSet::new();

        for edge in edges {
            let from = graph.header(edge.from)?;
            let to = graph.header(edge.to)?;
            if edge.from_port >= from.num_outputs {
                return Err(GraphError::PortOutOfRange {
                    operator: edge.from,
                    direction: PortDirection::Output,
                    port: edge.from_port,
                    arity: from.num_outputs,
                });
            }
            if edge.to_port >= to.num_inputs {
                return Err(GraphError::PortOutOfRange {
                    operator: edge.to,
                    direction: PortDirection::Input,
                    port: edge.to_port,
                    arity: to.num_inputs,
                });
            }
            if !connected_outputs.insert((edge.from, edge.from_port)) {
                return Err(GraphError::PortAlreadyConnected {
                    operator: edge.from,
                    direction: PortDirection::Output,
                    port: edge.from_port,
                });
            }
            if !connected_inputs.insert((edge.to, edge.to_port)) {
                return Err(GraphError::PortAlreadyConnected {
                    operator: edge.to,
                    direction: PortDirection::Input,
                    port: edge.to_port,
                });
            }
            forward.entry(edge.from).or_default().push(*edge);
            has_incoming.insert(edge.to);
        }
        tracing::debug!("Validated {} edges", edges.len());

        Ok(Self {
            forward,
            has_incoming,
            connected_inputs,
        })
    }

    /// The single operator without incoming edges.
    fn source(&self, graph: &FlowGraph) -> GraphResult<OperatorId> {
        let mut candidates: Vec<OperatorId> = graph
            .operator_ids()
            .filter(|id| !self.has_incoming.contains(id))
            .collect();
        match candidates.len() {
            0 => Err(GraphError::NoSourceOperator),
            1 => Ok(candidates[0]),
            _ => {
                candidates.sort();
                Err(GraphError::MultipleSourceOperators(
                    candidates.into_iter().map(|id| id.0).collect(),
                ))
            }
        }
    }

    fn check_inputs(&self, graph: &FlowGraph) -> GraphResult<()> {
        for id in graph.operator_ids() {
            let header = graph.header(id)?;
            if let Some(port) = (0..header.num_inputs).find(|&p| !self.connected_inputs.contains(&(id, p))) {
                return Err(GraphError::UnconnectedPort {
                    operator: id,
                    direction: PortDirection::Input,
                    port,
                });
            }
        }
        Ok(())
    }

    fn sinks(&self, graph: &FlowGraph) -> Vec<OperatorId> {
        graph
            .operator_ids()
            .filter(|id| !self.forward.contains_key(id))
            .collect()
    }

    /// Worklist wiring: an operator becomes ready once every reserved input
    /// slot has been filled by its upstream operator.
    fn wire(&self, graph: &mut FlowGraph) -> GraphResult<()> {
        let ids: Vec<OperatorId> = graph.operator_ids().collect();
        let mut reserved: HashMap<OperatorId, Vec<Option<StreamId>>> = HashMap::new();
        let mut remaining: HashMap<OperatorId, usize> = HashMap::new();
        let mut ready = VecDeque::new();
        for &id in &ids {
            let inputs = graph.header(id)?.num_inputs;
            reserved.insert(id, vec![None; inputs]);
            remaining.insert(id, inputs);
            if inputs == 0 {
                ready.push_back(id);
            }
        }

        let mut wired = 0;
        while let Some(id) = ready.pop_front() {
            let slots = reserved.remove(&id).unwrap_or_default();
            for (port, stream) in slots.into_iter().enumerate() {
                let stream = stream.ok_or(GraphError::UnconnectedPort {
                    operator: id,
                    direction: PortDirection::Input,
                    port,
                })?;
                graph.in_connect(id, port, stream)?;
            }

            let schemas = graph.in_connections_complete(id)?;
            let outgoing = self.forward.get(&id).map(Vec::as_slice).unwrap_or_default();
            for (port, schema) in schemas.into_iter().enumerate() {
                let stream = graph.create_stream(schema);
                graph.out_connect(id, port, stream)?;
                let Some(edge) = outgoing.iter().find(|e| e.from_port == port) else {
                    continue;
                };
                if let Some(slot) = reserved.get_mut(&edge.to).and_then(|s| s.get_mut(edge.to_port)) {
                    *slot = Some(stream);
                }
                if let Some(count) = remaining.get_mut(&edge.to) {
                    *count -= 1;
                    if *count == 0 {
                        ready.push_back(edge.to);
                    }
                }
            }
            graph.out_connections_complete(id)?;
            wired += 1;
        }

        if wired < ids.len() {
            return Err(GraphError::CycleDetected);
        }
        Ok(())
    }
}
