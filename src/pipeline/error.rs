//! Pipeline-specific error types.

use crate::error::FlowError;
use crate::pipeline::id::{OperatorId, StreamId};
use crate::pipeline::port::PortDirection;
use thiserror::Error;

/// Graph configuration and execution failures.
///
/// All of these describe a broken flow description or a misuse of the
/// wiring lifecycle; the binary reports them and exits.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Operator id {0} declared twice")]
    DuplicateOperator(OperatorId),

    #[error("no source operators in flow graph")]
    NoSourceOperator,

    #[error("multiple source operators in flow graph: {0:?}")]
    MultipleSourceOperators(Vec<u32>),

    #[error("Unknown operator id {0}")]
    UnknownOperatorId(OperatorId),

    #[error("Unknown stream {0}")]
    UnknownStream(StreamId),

    #[error("Operator {operator} has no {direction} port {port} (arity {arity})")]
    PortOutOfRange {
        operator: OperatorId,
        direction: PortDirection,
        port: usize,
        arity: usize,
    },

    #[error("Operator {operator} {direction} port {port} is already connected")]
    PortAlreadyConnected {
        operator: OperatorId,
        direction: PortDirection,
        port: usize,
    },

    #[error("Operator {operator} {direction} port {port} is not connected")]
    UnconnectedPort {
        operator: OperatorId,
        direction: PortDirection,
        port: usize,
    },

    #[error("Operator {operator}: cannot {action} while {state}")]
    Lifecycle {
        operator: OperatorId,
        action: &'static str,
        state: &'static str,
    },

    #[error("Operator {operator} output port {port}: expected schema {expected}, got {actual}")]
    SchemaMismatch {
        operator: OperatorId,
        port: usize,
        expected: String,
        actual: String,
    },

    #[error("Operator {0} re-entered while already running")]
    Reentrant(OperatorId),

    #[error("Cycle detected in flow graph")]
    CycleDetected,

    #[error("Operator {id} error: {message}")]
    Operator { id: OperatorId, message: String },

    #[error(transparent)]
    Flow(#[from] FlowError),
}

pub type GraphResult<T> = std::result::Result<T, GraphError>;

impl GraphError {
    pub fn operator(id: OperatorId, message: impl Into<String>) -> Self {
        GraphError::Operator {
            id,
            message: message.into(),
        }
    }
}
