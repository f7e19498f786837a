//! Self-describing tag format.
//!
//! The same syntax carries flow graph descriptions and schema descriptors:
//!
//! ```text
//! [Name numProperties="N" name0="k0" val0="v0" ...] children... [/Name]
//! ```
//!
//! Objects built through an inheritance chain are written as one opening
//! tag per level, most-derived first; every level except the base carries a
//! `|` prefix and only the base level is closed.

pub mod escape;
pub mod parser;
pub mod properties;
pub mod writer;

pub use escape::escape;
pub use parser::{parse_str, ParseStep, TagEvent, TagParser, TagReader};
pub use properties::{Properties, PropertiesCursor, PropertyLevel};
pub use writer::TagWriter;
