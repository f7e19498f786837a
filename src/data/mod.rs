//! Data/Schema model
//!
//! Values ([`Data`]) and their paired type descriptors ([`Schema`]). The
//! schema is the only authority on how a value is compared, serialized and
//! printed; values carry no codec logic of their own.
//!
//! - `value` - the [`Data`] sum type and [`Record`]
//! - `schema` - [`Schema`], [`ScalarType`] and the binary codec
//! - `record` - two-phase [`RecordSchema`]
//! - `keyval` - [`ExplicitKeyValMap`] and the [`align_maps`] join
//! - `histogram` - [`Histogram`] and [`HistogramBin`]
//! - `registry` - [`SchemaRegistry`] for rebuilding schemas from tags

pub mod histogram;
pub mod keyval;
pub mod record;
pub mod registry;
pub mod schema;
pub mod value;

pub use histogram::{Histogram, HistogramBin};
pub use keyval::{align_maps, ExplicitKeyValMap, KeyValMap};
pub use record::RecordSchema;
pub use registry::{SchemaFactory, SchemaRegistry};
pub use schema::{ScalarType, Schema};
pub use value::{Data, Record};
