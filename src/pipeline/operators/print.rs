//! Print - renders each value through its schema's printer.

use crate::data::{Data, Schema};
use crate::error::FlowError;
use crate::pipeline::error::{GraphError, GraphResult};
use crate::pipeline::graph::Outputs;
use crate::pipeline::operator::{AnyOperator, AsynchOperator, Operator, OperatorHeader};
use crate::pipeline::registry::FactoryContext;
use crate::tag::{PropertiesCursor, PropertyLevel};
use crossbeam_channel::Sender;
use std::io::Write;
use std::sync::Arc;

/// Where `Print` writes its lines.
#[derive(Debug, Clone, Default)]
pub enum PrintTarget {
    #[default]
    Stdout,
    Discard,
    Lines(Sender<String>),
}

impl PrintTarget {
    fn write_line(&self, line: String) -> GraphResult<()> {
        match self {
            PrintTarget::Stdout => {
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{}", line).map_err(FlowError::from)?;
            }
            PrintTarget::Discard => {}
            PrintTarget::Lines(sender) => {
                sender
                    .send(line)
                    .map_err(|_| FlowError::Transport("print channel disconnected".to_string()))?;
            }
        }
        Ok(())
    }
}

/// With several inputs each line is tagged with its port.
pub struct Print {
    header: OperatorHeader,
    prefix: String,
    target: PrintTarget,
    schemas: Vec<Arc<Schema>>,
}

impl Print {
    pub const TYPE_NAME: &'static str = "Print";

    pub fn new(header: OperatorHeader, prefix: impl Into<String>, target: PrintTarget) -> GraphResult<Self> {
        header.expect_arity(Self::TYPE_NAME, None, Some(0))?;
        Ok(Self {
            header,
            prefix: prefix.into(),
            target,
            schemas: Vec::new(),
        })
    }

    pub fn from_properties(cursor: PropertiesCursor<'_>, ctx: &FactoryContext<'_>) -> GraphResult<AnyOperator> {
        let header = OperatorHeader::from_chain(cursor)?;
        let prefix = cursor.get("prefix").unwrap_or_default();
        Ok(AnyOperator::asynch(Self::new(
            header,
            prefix,
            ctx.resources.print.clone(),
        )?))
    }

    fn render(&self, port: usize, value: &Data) -> String {
        let body = self.schemas[port].to_display_string(value);
        if self.schemas.len() > 1 {
            format!("{}{}: {}", self.prefix, port, body)
        } else {
            format!("{}{}", self.prefix, body)
        }
    }
}

impl Operator for Print {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn header(&self) -> &OperatorHeader {
        &self.header
    }

    fn describe_level(&self, level: &mut PropertyLevel) {
        if !self.prefix.is_empty() {
            level.set("prefix", &self.prefix);
        }
    }

    fn in_connections_complete(&mut self, inputs: &[Arc<Schema>]) -> GraphResult<Vec<Arc<Schema>>> {
        self.schemas = inputs.to_vec();
        Ok(Vec::new())
    }
}

impl AsynchOperator for Print {
    fn work(&mut self, port: usize, value: Data, _out: &mut Outputs<'_>) -> GraphResult<()> {
        if port >= self.schemas.len() {
            return Err(GraphError::operator(self.header.id, format!("value on unknown port {}", port)));
        }
        let line = self.render(port, &value);
        self.target.write_line(line)
    }
}
