//! Zip - pairs up one value from each input into a tuple.

use crate::data::{Data, Schema};
use crate::pipeline::error::{GraphError, GraphResult};
use crate::pipeline::graph::Outputs;
use crate::pipeline::operator::{AnyOperator, Operator, OperatorHeader, SynchOperator};
use crate::pipeline::registry::FactoryContext;
use crate::tag::PropertiesCursor;
use std::sync::Arc;

/// Synch operator: the N-th output tuple holds the N-th value of every
/// input. Values left unpaired when an input ends are dropped.
pub struct Zip {
    header: OperatorHeader,
    emitted: u64,
}

impl Zip {
    pub const TYPE_NAME: &'static str = "Zip";

    pub fn new(header: OperatorHeader) -> GraphResult<Self> {
        header.expect_arity(Self::TYPE_NAME, None, Some(1))?;
        if header.num_inputs == 0 {
            return Err(GraphError::operator(header.id, "Zip needs at least one input port"));
        }
        Ok(Self { header, emitted: 0 })
    }

    pub fn from_properties(cursor: PropertiesCursor<'_>, _: &FactoryContext<'_>) -> GraphResult<AnyOperator> {
        let header = OperatorHeader::from_chain(cursor)?;
        Ok(AnyOperator::synch(Self::new(header)?))
    }
}

impl Operator for Zip {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn header(&self) -> &OperatorHeader {
        &self.header
    }

    fn in_connections_complete(&mut self, inputs: &[Arc<Schema>]) -> GraphResult<Vec<Arc<Schema>>> {
        Ok(vec![Schema::tuple(inputs.iter().cloned()).shared()])
    }
}

impl SynchOperator for Zip {
    fn work(&mut self, values: Vec<Data>, out: &mut Outputs<'_>) -> GraphResult<()> {
        self.emitted += 1;
        out.emit(0, Data::tuple(values))
    }

    fn finish(&mut self, _out: &mut Outputs<'_>) -> GraphResult<()> {
        tracing::debug!("Zip {} emitted {} tuples", self.header.id, self.emitted);
        Ok(())
    }
}
