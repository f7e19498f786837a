//! Operator abstraction for the flow graph.
//!
//! Two-layer design, mirroring how the graph drives operators:
//! - **[`Operator`] trait** - identity, self-description and output typing,
//!   common to every operator.
//! - **Dispatch traits** - [`SourceOperator`], [`AsynchOperator`] and
//!   [`SynchOperator`] decide *when* processing logic runs.
//!
//! [`AnyOperator`] wraps one of the three so the graph can handle them
//! uniformly.

use crate::data::{Data, Schema};
use crate::pipeline::error::{GraphError, GraphResult};
use crate::pipeline::graph::Outputs;
use crate::pipeline::id::OperatorId;
use crate::pipeline::synch::SynchState;
use crate::tag::{Properties, PropertiesCursor, PropertyLevel};
use std::sync::Arc;

/// Identity and port arity, stored in the `Operator` base level of every
/// operator tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorHeader {
    pub id: OperatorId,
    pub num_inputs: usize,
    pub num_outputs: usize,
}

impl OperatorHeader {
    /// Name of the base inheritance level.
    pub const LEVEL: &'static str = "Operator";

    pub fn new(id: OperatorId, num_inputs: usize, num_outputs: usize) -> Self {
        Self {
            id,
            num_inputs,
            num_outputs,
        }
    }

    /// Header with a freshly generated ID.
    pub fn generated(num_inputs: usize, num_outputs: usize) -> Self {
        Self::new(OperatorId::next(), num_inputs, num_outputs)
    }

    /// Read the base level that follows `derived` in the inheritance chain.
    pub fn from_chain(derived: PropertiesCursor<'_>) -> GraphResult<Self> {
        let base = derived.expect_level(Self::LEVEL)?;
        Ok(Self {
            id: OperatorId(base.parse("id")?),
            num_inputs: base.parse("numInputs")?,
            num_outputs: base.parse("numOutputs")?,
        })
    }

    pub fn describe_into(&self, level: &mut PropertyLevel) {
        level
            .set("id", self.id.0)
            .set("numInputs", self.num_inputs)
            .set("numOutputs", self.num_outputs);
    }

    /// Reject arities an operator type cannot work with. `None` accepts
    /// any count.
    pub fn expect_arity(
        &self,
        type_name: &str,
        inputs: Option<usize>,
        outputs: Option<usize>,
    ) -> GraphResult<()> {
        let wrong = |what: &str, expected: usize, actual: usize| {
            GraphError::operator(
                self.id,
                format!(
                    "{} takes {} {} port(s), {} declared",
                    type_name, expected, what, actual
                ),
            )
        };
        if let Some(n) = inputs.filter(|&n| n != self.num_inputs) {
            return Err(wrong("input", n, self.num_inputs));
        }
        if let Some(n) = outputs.filter(|&n| n != self.num_outputs) {
            return Err(wrong("output", n, self.num_outputs));
        }
        Ok(())
    }
}

/// Behaviour shared by every operator.
pub trait Operator: Send {
    /// Registry name; also the most-derived tag level.
    fn type_name(&self) -> &'static str;

    fn header(&self) -> &OperatorHeader;

    /// Write this type's own properties into its tag level.
    fn describe_level(&self, _level: &mut PropertyLevel) {}

    /// Tag form: `[|TypeName ...][Operator id= numInputs= numOutputs=]`.
    fn describe(&self) -> Properties {
        let mut props = Properties::empty();
        self.describe_level(props.push_level(self.type_name()));
        self.header().describe_into(props.push_level(OperatorHeader::LEVEL));
        props
    }

    /// Called once every input port is connected. Returns one schema per
    /// output port; this is the only place output typing is declared.
    fn in_connections_complete(&mut self, inputs: &[Arc<Schema>]) -> GraphResult<Vec<Arc<Schema>>>;

    /// Called once every output port is connected.
    fn out_connections_complete(&mut self) -> GraphResult<()> {
        Ok(())
    }
}

/// Zero inputs. `work` runs exactly once and pushes values until its data
/// is exhausted; the graph then finishes every output.
pub trait SourceOperator: Operator {
    fn work(&mut self, out: &mut Outputs<'_>) -> GraphResult<()>;
}

/// `work` fires once per arriving value, independently per port.
pub trait AsynchOperator: Operator {
    fn work(&mut self, port: usize, value: Data, out: &mut Outputs<'_>) -> GraphResult<()>;

    /// Called once when input `port` reaches end of data.
    fn finish(&mut self, _port: usize, _out: &mut Outputs<'_>) -> GraphResult<()> {
        Ok(())
    }
}

/// `work` fires once a value is pending on every input port.
pub trait SynchOperator: Operator {
    /// `values` holds one value per input port, oldest generation first.
    fn work(&mut self, values: Vec<Data>, out: &mut Outputs<'_>) -> GraphResult<()>;

    /// Called once, when the first input reaches end of data.
    fn finish(&mut self, _out: &mut Outputs<'_>) -> GraphResult<()> {
        Ok(())
    }
}

/// How the graph invokes an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Source,
    Asynch,
    Synch,
}

/// An operator together with its dispatch policy.
pub enum AnyOperator {
    Source(Box<dyn SourceOperator>),
    Asynch(Box<dyn AsynchOperator>),
    Synch {
        operator: Box<dyn SynchOperator>,
        state: SynchState,
    },
}

impl AnyOperator {
    pub fn source(operator: impl SourceOperator + 'static) -> Self {
        AnyOperator::Source(Box::new(operator))
    }

    pub fn asynch(operator: impl AsynchOperator + 'static) -> Self {
        AnyOperator::Asynch(Box::new(operator))
    }

    pub fn synch(operator: impl SynchOperator + 'static) -> Self {
        let state = SynchState::new(operator.header().num_inputs);
        AnyOperator::Synch {
            operator: Box::new(operator),
            state,
        }
    }

    pub fn dispatch(&self) -> Dispatch {
        match self {
            AnyOperator::Source(_) => Dispatch::Source,
            AnyOperator::Asynch(_) => Dispatch::Asynch,
            AnyOperator::Synch { .. } => Dispatch::Synch,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            AnyOperator::Source(op) => op.type_name(),
            AnyOperator::Asynch(op) => op.type_name(),
            AnyOperator::Synch { operator, .. } => operator.type_name(),
        }
    }

    pub fn header(&self) -> &OperatorHeader {
        match self {
            AnyOperator::Source(op) => op.header(),
            AnyOperator::Asynch(op) => op.header(),
            AnyOperator::Synch { operator, .. } => operator.header(),
        }
    }

    pub fn id(&self) -> OperatorId {
        self.header().id
    }

    pub fn describe(&self) -> Properties {
        match self {
            AnyOperator::Source(op) => op.describe(),
            AnyOperator::Asynch(op) => op.describe(),
            AnyOperator::Synch { operator, .. } => operator.describe(),
        }
    }

    pub fn in_connections_complete(
        &mut self,
        inputs: &[Arc<Schema>],
    ) -> GraphResult<Vec<Arc<Schema>>> {
        match self {
            AnyOperator::Source(op) => op.in_connections_complete(inputs),
            AnyOperator::Asynch(op) => op.in_connections_complete(inputs),
            AnyOperator::Synch { operator, .. } => operator.in_connections_complete(inputs),
        }
    }

    pub fn out_connections_complete(&mut self) -> GraphResult<()> {
        match self {
            AnyOperator::Source(op) => op.out_connections_complete(),
            AnyOperator::Asynch(op) => op.out_connections_complete(),
            AnyOperator::Synch { operator, .. } => operator.out_connections_complete(),
        }
    }
}

impl std::fmt::Debug for AnyOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnyOperator")
            .field("type", &self.type_name())
            .field("dispatch", &self.dispatch())
            .field("header", self.header())
            .finish()
    }
}
