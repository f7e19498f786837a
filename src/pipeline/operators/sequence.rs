//! Sequence - source of consecutive `long` values.

use super::optional;
use crate::data::{Data, Schema};
use crate::pipeline::error::{GraphError, GraphResult};
use crate::pipeline::graph::Outputs;
use crate::pipeline::operator::{AnyOperator, Operator, OperatorHeader, SourceOperator};
use crate::pipeline::registry::FactoryContext;
use crate::tag::{PropertiesCursor, PropertyLevel};
use std::sync::Arc;

/// Emits `start, start + 1, ..., start + count - 1`.
pub struct Sequence {
    header: OperatorHeader,
    start: i64,
    count: i64,
}

impl Sequence {
    pub const TYPE_NAME: &'static str = "Sequence";

    pub fn new(header: OperatorHeader, start: i64, count: i64) -> GraphResult<Self> {
        header.expect_arity(Self::TYPE_NAME, Some(0), None)?;
        if header.num_outputs == 0 {
            return Err(GraphError::operator(header.id, "Sequence needs an output port"));
        }
        if count < 0 || start.checked_add(count).is_none() {
            return Err(GraphError::operator(
                header.id,
                format!("invalid range start={} count={}", start, count),
            ));
        }
        Ok(Self {
            header,
            start,
            count,
        })
    }

    pub fn from_properties(cursor: PropertiesCursor<'_>, _: &FactoryContext<'_>) -> GraphResult<AnyOperator> {
        let header = OperatorHeader::from_chain(cursor)?;
        let start = optional(&cursor, "start")?.unwrap_or(0);
        let count = cursor.parse("count")?;
        Ok(AnyOperator::source(Self::new(header, start, count)?))
    }
}

impl Operator for Sequence {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn header(&self) -> &OperatorHeader {
        &self.header
    }

    fn describe_level(&self, level: &mut PropertyLevel) {
        level.set("start", self.start).set("count", self.count);
    }

    fn in_connections_complete(&mut self, _inputs: &[Arc<Schema>]) -> GraphResult<Vec<Arc<Schema>>> {
        Ok(vec![Schema::long().shared(); self.header.num_outputs])
    }
}

impl SourceOperator for Sequence {
    fn work(&mut self, out: &mut Outputs<'_>) -> GraphResult<()> {
        for value in self.start..self.start + self.count {
            out.emit_all(&Data::Long(value))?;
        }
        tracing::debug!("Sequence {} emitted {} values", self.header.id, self.count);
        Ok(())
    }
}
