//! # tagflow: typed dataflow engine
//!
//! A small set of composable stream-processing operators connected by typed
//! streams, driven by a polymorphic data/schema model that serializes itself
//! to byte streams and circular buffers, and configured through a
//! self-describing tag format.
//!
//! ## Architecture
//!
//! - **Data**: `Data` values and the `Schema` tree that types, compares,
//!   prints and serializes them
//! - **Tag**: the bracketed property format, a resumable parser and writer
//! - **Pipeline**: operator/stream arena, dispatch policies, registries and
//!   the flow builder
//! - **Transport**: outbound hook and per-connection inbound sessions
//!
//! ## Example
//!
//! ```ignore
//! use tagflow::{data::SchemaRegistry, pipeline::{FlowBuilder, OperatorRegistry}};
//!
//! let operators = OperatorRegistry::with_builtins();
//! let schemas = SchemaRegistry::with_builtins();
//! let (tx, rx) = crossbeam_channel::unbounded();
//!
//! let mut flow = FlowBuilder::new(&operators, &schemas)
//!     .collect_into(tx)
//!     .build_str(&std::fs::read_to_string("flow.tags")?)?;
//! flow.run()?;
//! for collected in rx.try_iter() {
//!     println!("{:?}", collected.value);
//! }
//! ```

pub mod buffer;
pub mod config;
pub mod data;
pub mod error;
pub mod medium;
pub mod pipeline;
pub mod tag;
pub mod transport;

// Re-export commonly used types
pub use buffer::CircularBuffer;
pub use config::EngineConfig;
pub use data::{Data, Schema, SchemaRegistry};
pub use error::{FlowError, Result};
pub use pipeline::{Flow, FlowBuilder, FlowGraph, GraphError, GraphResult, OperatorRegistry};
pub use tag::{Properties, TagParser, TagReader, TagWriter};
