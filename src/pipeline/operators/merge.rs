//! Merge - interleaves N inputs of one schema into a single output, in
//! arrival order.

use crate::data::{Data, Schema};
use crate::pipeline::error::{GraphError, GraphResult};
use crate::pipeline::graph::Outputs;
use crate::pipeline::operator::{AnyOperator, AsynchOperator, Operator, OperatorHeader};
use crate::pipeline::registry::FactoryContext;
use crate::tag::PropertiesCursor;
use std::sync::Arc;

pub struct Merge {
    header: OperatorHeader,
}

impl Merge {
    pub const TYPE_NAME: &'static str = "Merge";

    pub fn new(header: OperatorHeader) -> GraphResult<Self> {
        header.expect_arity(Self::TYPE_NAME, None, Some(1))?;
        if header.num_inputs == 0 {
            return Err(GraphError::operator(header.id, "Merge needs at least one input port"));
        }
        Ok(Self { header })
    }

    pub fn from_properties(cursor: PropertiesCursor<'_>, _: &FactoryContext<'_>) -> GraphResult<AnyOperator> {
        let header = OperatorHeader::from_chain(cursor)?;
        Ok(AnyOperator::asynch(Self::new(header)?))
    }
}

impl Operator for Merge {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn header(&self) -> &OperatorHeader {
        &self.header
    }

    fn in_connections_complete(&mut self, inputs: &[Arc<Schema>]) -> GraphResult<Vec<Arc<Schema>>> {
        let first = &inputs[0];
        if let Some((port, other)) = inputs.iter().enumerate().find(|(_, s)| !s.same_as(first)) {
            return Err(GraphError::operator(
                self.header.id,
                format!("input {} has schema {}, input 0 has {}", port, other, first),
            ));
        }
        Ok(vec![first.clone()])
    }
}

impl AsynchOperator for Merge {
    fn work(&mut self, _port: usize, value: Data, out: &mut Outputs<'_>) -> GraphResult<()> {
        out.emit(0, value)
    }
}
