//! Built-in operator implementations.
//!
//! - **Sources** - `Sequence`, `Literal`. Every value is sent on every
//!   output port.
//! - **Transforms** - `PassThrough` (asynch 1→1), `Merge` (asynch N→1),
//!   `Zip` (synch N→1, emits tuples).
//! - **Sinks** - `Collect` (channel), `Print` (schema printer), `Outbound`
//!   (serialized bytes to the transport hook).
//!
//! Each type exposes `TYPE_NAME` and a `from_properties` factory that the
//! operator registry stores under that name.

pub mod collect;
pub mod literal;
pub mod merge;
pub mod outbound;
pub mod passthrough;
pub mod print;
pub mod sequence;
pub mod zip;

pub use collect::{Collect, Collected};
pub use literal::Literal;
pub use merge::Merge;
pub use outbound::Outbound;
pub use passthrough::PassThrough;
pub use print::{Print, PrintTarget};
pub use sequence::Sequence;
pub use zip::Zip;

use crate::error::Result;
use crate::tag::PropertiesCursor;
use std::str::FromStr;

/// Parse `key` when present.
pub(crate) fn optional<T: FromStr>(cursor: &PropertiesCursor<'_>, key: &str) -> Result<Option<T>> {
    match cursor.get(key) {
        Some(_) => cursor.parse(key).map(Some),
        None => Ok(None),
    }
}
