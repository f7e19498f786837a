//! Port addressing for operators.
//!
//! Ports are positional: an operator with `n` inputs has input ports
//! `0..n`. A [`PortRef`] names one end of a stream.

use crate::pipeline::id::OperatorId;
use std::fmt;

/// Whether a port is an input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDirection::Input => f.write_str("input"),
            PortDirection::Output => f.write_str("output"),
        }
    }
}

/// One port of one operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortRef {
    pub operator: OperatorId,
    pub port: usize,
}

impl PortRef {
    pub const fn new(operator: OperatorId, port: usize) -> Self {
        Self { operator, port }
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.operator, self.port)
    }
}
