//! PassThrough - forwards each value unchanged.

use crate::data::{Data, Schema};
use crate::pipeline::error::GraphResult;
use crate::pipeline::graph::Outputs;
use crate::pipeline::operator::{AnyOperator, AsynchOperator, Operator, OperatorHeader};
use crate::pipeline::registry::FactoryContext;
use crate::tag::PropertiesCursor;
use std::sync::Arc;

pub struct PassThrough {
    header: OperatorHeader,
    forwarded: u64,
}

impl PassThrough {
    pub const TYPE_NAME: &'static str = "PassThrough";

    pub fn new(header: OperatorHeader) -> GraphResult<Self> {
        header.expect_arity(Self::TYPE_NAME, Some(1), Some(1))?;
        Ok(Self {
            header,
            forwarded: 0,
        })
    }

    pub fn from_properties(cursor: PropertiesCursor<'_>, _: &FactoryContext<'_>) -> GraphResult<AnyOperator> {
        let header = OperatorHeader::from_chain(cursor)?;
        Ok(AnyOperator::asynch(Self::new(header)?))
    }
}

impl Operator for PassThrough {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn header(&self) -> &OperatorHeader {
        &self.header
    }

    fn in_connections_complete(&mut self, inputs: &[Arc<Schema>]) -> GraphResult<Vec<Arc<Schema>>> {
        Ok(inputs.to_vec())
    }
}

impl AsynchOperator for PassThrough {
    fn work(&mut self, _port: usize, value: Data, out: &mut Outputs<'_>) -> GraphResult<()> {
        self.forwarded += 1;
        out.emit(0, value)
    }

    fn finish(&mut self, _port: usize, _out: &mut Outputs<'_>) -> GraphResult<()> {
        tracing::debug!("PassThrough {} forwarded {} values", self.header.id, self.forwarded);
        Ok(())
    }
}
