//! Operator/stream dataflow graph.
//!
//! Operators are nodes with typed input and output ports; streams are typed
//! single-producer single-consumer edges. The graph is an arena: streams
//! refer to operators by ID and dropping the [`FlowGraph`] tears down
//! everything.
//!
//! # Architecture
//!
//! ```text
//! [Sequence] ──► [PassThrough] ──► [Zip] ──► [Collect]
//!      └──────────────────────────►──┘
//! ```
//!
//! # Design
//!
//! - **Enum dispatch** - `AnyOperator` selects the source, asynch or synch
//!   policy; the per-type logic sits behind trait objects.
//! - **Synchronous push** - `transfer` runs the destination before
//!   returning, so one `drive` call on the source runs the whole flow.
//! - **Explicit lifecycle** - `Created → InputsComplete → Wired → Finished`
//!   is checked on every wiring call.
//! - **One graph per thread** - only the registries are shared.

pub mod builder;
pub mod error;
pub mod graph;
pub mod id;
pub mod operator;
pub mod operators;
pub mod port;
pub mod registry;
pub mod synch;

pub use builder::{EdgeSpec, Flow, FlowBuilder, SinkTyping};
pub use error::{GraphError, GraphResult};
pub use graph::{FlowGraph, Lifecycle, Outputs, Stream};
pub use id::{OperatorId, StreamId};
pub use operator::{
    AnyOperator, AsynchOperator, Dispatch, Operator, OperatorHeader, SourceOperator,
    SynchOperator,
};
pub use operators::{Collected, PrintTarget};
pub use port::{PortDirection, PortRef};
pub use registry::{FactoryContext, FlowResources, OperatorFactory, OperatorRegistry};
pub use synch::SynchState;
