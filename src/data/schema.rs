//! Schemas: the type side of the data model.
//!
//! A [`Schema`] decides how its paired [`Data`] variant is compared,
//! serialized, described and printed. Composite schemas delegate to their
//! child schemas field by field, so the shape of a schema tree is the shape
//! of the recursion.
//!
//! # Binary layout
//!
//! Native endianness, no embedded type information:
//!
//! | Variant      | Bytes                                                     |
//! |--------------|-----------------------------------------------------------|
//! | char         | 1                                                         |
//! | int / float  | 4                                                         |
//! | long / double| 8                                                         |
//! | string       | raw bytes followed by a NUL                               |
//! | tuple/record | fields in order                                           |
//! | key-val map  | u32 key count, then per key: key, u32 value count, values |
//! | bin          | start f64, end f64, count i64                             |
//! | histogram    | min f64, max f64, then the bin map (double → bin)         |

use crate::buffer::CircularBuffer;
use crate::data::histogram::{Histogram, HistogramBin};
use crate::data::keyval::ExplicitKeyValMap;
use crate::data::record::RecordSchema;
use crate::data::value::{Data, Record};
use crate::error::{FlowError, Result};
use crate::medium::{ByteSink, ByteSource};
use crate::tag::Properties;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Element type of a scalar schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Char,
    String,
    Int,
    Long,
    Float,
    Double,
}

impl ScalarType {
    pub const ALL: [ScalarType; 6] = [
        ScalarType::Char,
        ScalarType::String,
        ScalarType::Int,
        ScalarType::Long,
        ScalarType::Float,
        ScalarType::Double,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ScalarType::Char => "char",
            ScalarType::String => "string",
            ScalarType::Int => "int",
            ScalarType::Long => "long",
            ScalarType::Float => "float",
            ScalarType::Double => "double",
        }
    }

    /// Encoded width in bytes; `None` for variable-width strings.
    pub fn width(self) -> Option<usize> {
        match self {
            ScalarType::Char => Some(1),
            ScalarType::String => None,
            ScalarType::Int | ScalarType::Float => Some(4),
            ScalarType::Long | ScalarType::Double => Some(8),
        }
    }

    pub fn matches(self, value: &Data) -> bool {
        matches!(
            (self, value),
            (ScalarType::Char, Data::Char(_))
                | (ScalarType::String, Data::Str(_))
                | (ScalarType::Int, Data::Int(_))
                | (ScalarType::Long, Data::Long(_))
                | (ScalarType::Float, Data::Float(_))
                | (ScalarType::Double, Data::Double(_))
        )
    }

    /// Parse the textual form of a value of this type.
    pub fn parse_value(self, text: &str) -> Result<Data> {
        let invalid = || FlowError::InvalidProperty {
            key: self.name().to_string(),
            value: text.to_string(),
        };
        let trimmed = text.trim();
        Ok(match self {
            // A lone char is taken as is, so " " is a space. Chars print as
            // Latin-1, so any code point up to U+00FF reads back as its byte.
            ScalarType::Char => match single_char(text).or_else(|| single_char(trimmed)) {
                Some(c) => Data::Char(u8::try_from(c).map_err(|_| invalid())?),
                None => return Err(invalid()),
            },
            ScalarType::String => Data::Str(text.to_string()),
            ScalarType::Int => Data::Int(trimmed.parse().map_err(|_| invalid())?),
            ScalarType::Long => Data::Long(trimmed.parse().map_err(|_| invalid())?),
            ScalarType::Float => Data::Float(trimmed.parse().map_err(|_| invalid())?),
            ScalarType::Double => Data::Double(trimmed.parse().map_err(|_| invalid())?),
        })
    }
}

impl FromStr for ScalarType {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self> {
        ScalarType::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| FlowError::UnknownSchema(format!("scalar type '{}'", s)))
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Type descriptor and codec for one [`Data`] variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    Scalar(ScalarType),
    Tuple(Vec<Arc<Schema>>),
    Record(RecordSchema),
    KeyVal { key: Arc<Schema>, value: Arc<Schema> },
    HistogramBin,
    Histogram,
}

impl Schema {
    pub fn char() -> Self {
        Schema::Scalar(ScalarType::Char)
    }

    pub fn string() -> Self {
        Schema::Scalar(ScalarType::String)
    }

    pub fn int() -> Self {
        Schema::Scalar(ScalarType::Int)
    }

    pub fn long() -> Self {
        Schema::Scalar(ScalarType::Long)
    }

    pub fn float() -> Self {
        Schema::Scalar(ScalarType::Float)
    }

    pub fn double() -> Self {
        Schema::Scalar(ScalarType::Double)
    }

    pub fn tuple(fields: impl IntoIterator<Item = Arc<Schema>>) -> Self {
        Schema::Tuple(fields.into_iter().collect())
    }

    pub fn key_val(key: Arc<Schema>, value: Arc<Schema>) -> Self {
        Schema::KeyVal { key, value }
    }

    /// Wrap for sharing between streams and values.
    pub fn shared(self) -> Arc<Schema> {
        Arc::new(self)
    }

    /// Registry name of this variant.
    pub fn name(&self) -> &'static str {
        match self {
            Schema::Scalar(_) => "Scalar",
            Schema::Tuple(_) => "Tuple",
            Schema::Record(_) => "Record",
            Schema::KeyVal { .. } => "KeyVal",
            Schema::HistogramBin => "HistogramBin",
            Schema::Histogram => "Histogram",
        }
    }

    /// Structural schema equality.
    pub fn same_as(&self, other: &Schema) -> bool {
        self == other
    }

    /// Whether `value` has the shape this schema describes.
    pub fn conforms(&self, value: &Data) -> bool {
        match (self, value) {
            (Schema::Scalar(t), v) => t.matches(v),
            (Schema::Tuple(fields), Data::Tuple(values)) => {
                fields.len() == values.len()
                    && fields.iter().zip(values).all(|(s, v)| s.conforms(v))
            }
            (Schema::Record(rs), Data::Record(r)) => {
                rs.len() == r.len() && rs.fields().zip(r.values()).all(|((_, s), v)| s.conforms(v))
            }
            (Schema::KeyVal { key, value: vs }, Data::KeyValMap(map)) => map
                .iter()
                .all(|(k, list)| key.conforms(k) && list.iter().all(|v| vs.conforms(v))),
            (Schema::HistogramBin, Data::HistogramBin(_)) => true,
            (Schema::Histogram, Data::Histogram(_)) => true,
            _ => false,
        }
    }

    /// Total order of two values of this schema.
    ///
    /// # Panics
    ///
    /// Panics if either value does not conform to the schema.
    pub fn compare(&self, a: &Data, b: &Data) -> Ordering {
        self.assert_conforms(a);
        self.assert_conforms(b);
        a.compare(b)
    }

    pub fn equals(&self, a: &Data, b: &Data) -> bool {
        self.compare(a, b) == Ordering::Equal
    }

    fn assert_conforms(&self, value: &Data) {
        assert!(
            self.conforms(value),
            "value of type {} does not conform to schema {}",
            value.type_name(),
            self
        );
    }

    /// Encode `value` into `sink`.
    ///
    /// Values that are not yet well-formed (unset histogram bins, strings
    /// holding NUL) are errors. A value whose variant does not match the
    /// schema at all is a programming error and panics.
    pub fn serialize(&self, value: &Data, sink: &mut dyn ByteSink) -> Result<()> {
        match (self, value) {
            (Schema::Scalar(ScalarType::Char), Data::Char(v)) => sink.put(&[*v]),
            (Schema::Scalar(ScalarType::String), Data::Str(v)) => {
                if v.as_bytes().contains(&0) {
                    return Err(FlowError::Encoding(
                        "string values cannot contain NUL bytes".to_string(),
                    ));
                }
                sink.put(v.as_bytes())?;
                sink.put(&[0])
            }
            (Schema::Scalar(ScalarType::Int), Data::Int(v)) => sink.put(&v.to_ne_bytes()),
            (Schema::Scalar(ScalarType::Long), Data::Long(v)) => sink.put(&v.to_ne_bytes()),
            (Schema::Scalar(ScalarType::Float), Data::Float(v)) => sink.put(&v.to_ne_bytes()),
            (Schema::Scalar(ScalarType::Double), Data::Double(v)) => sink.put(&v.to_ne_bytes()),
            (Schema::Tuple(fields), Data::Tuple(values)) => {
                check_arity(fields.len(), values.len())?;
                for (schema, v) in fields.iter().zip(values) {
                    schema.serialize(v, sink)?;
                }
                Ok(())
            }
            (Schema::Record(rs), Data::Record(record)) => {
                check_arity(rs.len(), record.len())?;
                for ((_, schema), v) in rs.fields().zip(record.values()) {
                    schema.serialize(v, sink)?;
                }
                Ok(())
            }
            (Schema::KeyVal { key, value: vs }, Data::KeyValMap(map)) => {
                put_count(sink, map.len())?;
                for (k, list) in map.iter() {
                    key.serialize(k, sink)?;
                    put_count(sink, list.len())?;
                    for v in list {
                        vs.serialize(v, sink)?;
                    }
                }
                Ok(())
            }
            (Schema::HistogramBin, Data::HistogramBin(bin)) => put_bin(bin, sink),
            (Schema::Histogram, Data::Histogram(h)) => put_histogram(h, sink),
            _ => panic!(
                "schema {} cannot serialize a value of type {}",
                self,
                value.type_name()
            ),
        }
    }

    /// Decode one value from `source`.
    ///
    /// Running out of bytes surfaces as [`FlowError::Underrun`], possibly
    /// after part of the value was consumed. Use
    /// [`try_deserialize_buffered`](Self::try_deserialize_buffered) when the
    /// partial read must be undone.
    pub fn deserialize(&self, source: &mut dyn ByteSource) -> Result<Data> {
        match self {
            Schema::Scalar(t) => take_scalar(*t, source),
            Schema::Tuple(fields) => {
                let mut values = Vec::with_capacity(fields.len());
                for schema in fields {
                    values.push(schema.deserialize(source)?);
                }
                Ok(Data::Tuple(values))
            }
            Schema::Record(rs) => {
                let mut values = Vec::with_capacity(rs.len());
                for (_, schema) in rs.fields() {
                    values.push(schema.deserialize(source)?);
                }
                Ok(Data::Record(Record::from_values(values)))
            }
            Schema::KeyVal { key, value } => {
                let mut map = ExplicitKeyValMap::new();
                let keys = take_count(source)?;
                for _ in 0..keys {
                    let k = key.deserialize(source)?;
                    let n = take_count(source)?;
                    let mut list = Vec::with_capacity(n.min(1024));
                    for _ in 0..n {
                        list.push(value.deserialize(source)?);
                    }
                    map.insert_all(k, list);
                }
                Ok(Data::KeyValMap(map))
            }
            Schema::HistogramBin => Ok(Data::HistogramBin(take_bin(source)?)),
            Schema::Histogram => {
                let min = f64::from_ne_bytes(take_array(source)?);
                let max = f64::from_ne_bytes(take_array(source)?);
                let mut bins = ExplicitKeyValMap::new();
                let keys = take_count(source)?;
                for _ in 0..keys {
                    let k = f64::from_ne_bytes(take_array(source)?);
                    // Each key holds exactly one bin
                    let n = take_count(source)?;
                    if n != 1 {
                        return Err(FlowError::ArityMismatch { expected: 1, actual: n });
                    }
                    bins.insert(Data::Double(k), Data::HistogramBin(take_bin(source)?));
                }
                Ok(Data::Histogram(Histogram::from_parts(min, max, bins)))
            }
        }
    }

    /// Decode one value from a circular buffer, or `Ok(None)` when the
    /// buffer does not yet hold a complete value. Nothing is consumed in
    /// that case.
    pub fn try_deserialize_buffered(&self, buffer: &mut CircularBuffer) -> Result<Option<Data>> {
        let mark = buffer.mark();
        match self.deserialize(buffer) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_underrun() => {
                buffer.rollback(mark);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Self-description in tag form; the schema registry reverses it.
    pub fn describe(&self) -> Properties {
        match self {
            Schema::Scalar(t) => Properties::new("Scalar").with("type", t.name()),
            Schema::Tuple(fields) => fields.iter().fold(
                Properties::new("Tuple").with("arity", fields.len()),
                |props, f| props.with_child(f.describe()),
            ),
            Schema::Record(rs) => {
                let mut props = Properties::new("Record");
                props.set("numFields", rs.len());
                for (i, (name, schema)) in rs.fields().enumerate() {
                    props.set(format!("field{}", i), name);
                    props.add_child(schema.describe());
                }
                props
            }
            Schema::KeyVal { key, value } => Properties::new("KeyVal")
                .with_child(key.describe())
                .with_child(value.describe()),
            Schema::HistogramBin => Properties::new("HistogramBin"),
            Schema::Histogram => Properties::new("Histogram"),
        }
    }

    /// Human-readable rendering of `value`.
    pub fn print(&self, value: &Data, out: &mut dyn fmt::Write) -> fmt::Result {
        match (self, value) {
            (Schema::Scalar(_), v) => print_scalar(v, out),
            (Schema::Tuple(fields), Data::Tuple(values)) => {
                out.write_char('(')?;
                for (i, (schema, v)) in fields.iter().zip(values).enumerate() {
                    if i > 0 {
                        out.write_str(", ")?;
                    }
                    schema.print(v, out)?;
                }
                out.write_char(')')
            }
            (Schema::Record(rs), Data::Record(record)) => {
                out.write_char('{')?;
                for (i, ((name, schema), v)) in rs.fields().zip(record.values()).enumerate() {
                    if i > 0 {
                        out.write_str(", ")?;
                    }
                    write!(out, "{}: ", name)?;
                    schema.print(v, out)?;
                }
                out.write_char('}')
            }
            (Schema::KeyVal { key, value: vs }, Data::KeyValMap(map)) => {
                out.write_char('{')?;
                for (i, (k, list)) in map.iter().enumerate() {
                    if i > 0 {
                        out.write_str(", ")?;
                    }
                    key.print(k, out)?;
                    out.write_str(" => [")?;
                    for (j, v) in list.iter().enumerate() {
                        if j > 0 {
                            out.write_str(", ")?;
                        }
                        vs.print(v, out)?;
                    }
                    out.write_char(']')?;
                }
                out.write_char('}')
            }
            (Schema::HistogramBin, Data::HistogramBin(bin)) => print_bin(bin, out),
            (Schema::Histogram, Data::Histogram(h)) => {
                write!(out, "Histogram[{}, {}] {{", OrUnset(h.min()), OrUnset(h.max()))?;
                for (i, (_, bin)) in h.bins().enumerate() {
                    if i > 0 {
                        out.write_str(", ")?;
                    }
                    print_bin(bin, out)?;
                }
                out.write_char('}')
            }
            _ => write!(out, "<{} as {}>", value.type_name(), self),
        }
    }

    pub fn to_display_string(&self, value: &Data) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = self.print(value, &mut out);
        out
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schema::Scalar(t) => write!(f, "{}", t),
            Schema::Tuple(fields) => {
                f.write_str("(")?;
                for (i, s) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", s)?;
                }
                f.write_str(")")
            }
            Schema::Record(rs) => {
                f.write_str("{")?;
                for (i, (name, s)) in rs.fields().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", name, s)?;
                }
                f.write_str("}")
            }
            Schema::KeyVal { key, value } => write!(f, "{{{} => {}}}", key, value),
            Schema::HistogramBin => f.write_str("HistogramBin"),
            Schema::Histogram => f.write_str("Histogram"),
        }
    }
}

fn check_arity(expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(FlowError::ArityMismatch { expected, actual })
    }
}

fn put_count(sink: &mut dyn ByteSink, n: usize) -> Result<()> {
    let n = u32::try_from(n)
        .map_err(|_| FlowError::Encoding(format!("count {} exceeds u32", n)))?;
    sink.put(&n.to_ne_bytes())
}

fn put_bin(bin: &HistogramBin, sink: &mut dyn ByteSink) -> Result<()> {
    match (bin.start(), bin.end(), bin.count()) {
        (Some(start), Some(end), Some(count)) => {
            sink.put(&start.to_ne_bytes())?;
            sink.put(&end.to_ne_bytes())?;
            sink.put(&count.to_ne_bytes())
        }
        _ => Err(FlowError::IncompleteValue("histogram bin")),
    }
}

fn put_histogram(h: &Histogram, sink: &mut dyn ByteSink) -> Result<()> {
    let (Some(min), Some(max)) = (h.min(), h.max()) else {
        return Err(FlowError::IncompleteValue("histogram"));
    };
    sink.put(&min.to_ne_bytes())?;
    sink.put(&max.to_ne_bytes())?;

    let bins = h.as_map();
    put_count(sink, bins.len())?;
    for (key, list) in bins.iter() {
        let Data::Double(start) = key else {
            unreachable!("histogram keys are doubles")
        };
        sink.put(&start.to_ne_bytes())?;
        put_count(sink, list.len())?;
        for entry in list {
            let Data::HistogramBin(bin) = entry else {
                unreachable!("histogram entries are bins")
            };
            put_bin(bin, sink)?;
        }
    }
    Ok(())
}

fn take_array<const N: usize>(source: &mut dyn ByteSource) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    source.take(&mut buf)?;
    Ok(buf)
}

fn take_count(source: &mut dyn ByteSource) -> Result<usize> {
    Ok(u32::from_ne_bytes(take_array(source)?) as usize)
}

fn take_scalar(t: ScalarType, source: &mut dyn ByteSource) -> Result<Data> {
    Ok(match t {
        ScalarType::Char => Data::Char(take_array::<1>(source)?[0]),
        ScalarType::String => {
            let mut bytes = Vec::new();
            loop {
                let [b] = take_array::<1>(source)?;
                if b == 0 {
                    break;
                }
                bytes.push(b);
            }
            Data::Str(String::from_utf8(bytes).map_err(|e| FlowError::Encoding(e.to_string()))?)
        }
        ScalarType::Int => Data::Int(i32::from_ne_bytes(take_array(source)?)),
        ScalarType::Long => Data::Long(i64::from_ne_bytes(take_array(source)?)),
        ScalarType::Float => Data::Float(f32::from_ne_bytes(take_array(source)?)),
        ScalarType::Double => Data::Double(f64::from_ne_bytes(take_array(source)?)),
    })
}

fn take_bin(source: &mut dyn ByteSource) -> Result<HistogramBin> {
    let start = f64::from_ne_bytes(take_array(source)?);
    let end = f64::from_ne_bytes(take_array(source)?);
    let count = i64::from_ne_bytes(take_array(source)?);
    Ok(HistogramBin::with(start, end, count))
}

fn single_char(text: &str) -> Option<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn print_scalar(value: &Data, out: &mut dyn fmt::Write) -> fmt::Result {
    match value {
        Data::Char(v) => out.write_char(char::from(*v)),
        Data::Str(v) => out.write_str(v),
        Data::Int(v) => write!(out, "{}", v),
        Data::Long(v) => write!(out, "{}", v),
        Data::Float(v) => write!(out, "{}", v),
        Data::Double(v) => write!(out, "{}", v),
        other => write!(out, "<{}>", other.type_name()),
    }
}

fn print_bin(bin: &HistogramBin, out: &mut dyn fmt::Write) -> fmt::Result {
    write!(
        out,
        "[{}, {}): {}",
        OrUnset(bin.start()),
        OrUnset(bin.end()),
        OrUnset(bin.count())
    )
}

struct OrUnset<T>(Option<T>);

impl<T: fmt::Display> fmt::Display for OrUnset<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(v) => write!(f, "{}", v),
            None => f.write_str("?"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::medium::IoSource;
    use proptest::prelude::*;

    fn round_trip_vec(schema: &Schema, value: &Data) -> Data {
        let mut bytes = Vec::new();
        schema.serialize(value, &mut bytes).unwrap();
        schema.deserialize(&mut IoSource::new(&bytes[..])).unwrap()
    }

    fn round_trip_buffer(schema: &Schema, value: &Data) -> Data {
        let mut buffer = CircularBuffer::with_capacity(8);
        schema.serialize(value, &mut buffer).unwrap();
        let out = schema.deserialize(&mut buffer).unwrap();
        assert!(buffer.is_empty());
        out
    }

    fn point_schema() -> RecordSchema {
        RecordSchema::new()
            .with_field("x", Schema::double().shared())
            .with_field("name", Schema::string().shared())
            .finalized()
    }

    fn sample_histogram() -> Histogram {
        let mut h = Histogram::with_bounds(0.0, 20.0);
        h.aggregate_bin(0.0, &HistogramBin::with(0.0, 10.0, 3));
        h.aggregate_bin(10.0, &HistogramBin::with(10.0, 20.0, 1));
        h
    }

    #[test]
    fn test_scalar_layout() {
        let mut bytes = Vec::new();
        Schema::int().serialize(&Data::Int(7), &mut bytes).unwrap();
        assert_eq!(bytes, 7i32.to_ne_bytes());

        bytes.clear();
        Schema::string().serialize(&Data::string("ab"), &mut bytes).unwrap();
        assert_eq!(bytes, b"ab\0");

        bytes.clear();
        Schema::char().serialize(&Data::Char(b'z'), &mut bytes).unwrap();
        assert_eq!(bytes, b"z");
    }

    #[test]
    fn test_map_layout() {
        let schema = Schema::key_val(Schema::int().shared(), Schema::char().shared());
        let map: ExplicitKeyValMap = [(Data::Int(1), Data::Char(b'a')), (Data::Int(1), Data::Char(b'b'))]
            .into_iter()
            .collect();
        let mut bytes = Vec::new();
        schema.serialize(&Data::KeyValMap(map), &mut bytes).unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(&1u32.to_ne_bytes());
        expected.extend_from_slice(&1i32.to_ne_bytes());
        expected.extend_from_slice(&2u32.to_ne_bytes());
        expected.extend_from_slice(b"ab");
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_composite_round_trips_on_both_mediums() {
        let cases = vec![
            (
                Schema::tuple([Schema::int().shared(), Schema::string().shared()]),
                Data::tuple([Data::Int(-4), Data::string("four")]),
            ),
            (
                Schema::Record(point_schema()),
                point_schema().make_record(vec![Data::Double(2.5), Data::string("p")]),
            ),
            (
                Schema::key_val(Schema::string().shared(), Schema::long().shared()),
                Data::KeyValMap(
                    [
                        (Data::string("a"), Data::Long(1)),
                        (Data::string("a"), Data::Long(2)),
                        (Data::string("b"), Data::Long(3)),
                    ]
                    .into_iter()
                    .collect(),
                ),
            ),
            (
                Schema::HistogramBin,
                Data::HistogramBin(HistogramBin::with(1.0, 2.0, 9)),
            ),
            (Schema::Histogram, Data::Histogram(sample_histogram())),
        ];

        for (schema, value) in cases {
            assert_eq!(round_trip_vec(&schema, &value), value, "{}", schema);
            assert_eq!(round_trip_buffer(&schema, &value), value, "{}", schema);
        }
    }

    #[test]
    fn test_partial_value_is_not_consumed() {
        let schema = Schema::tuple([Schema::long().shared(), Schema::string().shared()]);
        let mut bytes = Vec::new();
        schema
            .serialize(&Data::tuple([Data::Long(9), Data::string("tail")]), &mut bytes)
            .unwrap();

        let mut buffer = CircularBuffer::with_capacity(4);
        buffer.write(&bytes[..10]);
        assert_eq!(schema.try_deserialize_buffered(&mut buffer).unwrap(), None);
        assert_eq!(buffer.len(), 10);

        buffer.write(&bytes[10..]);
        let value = schema.try_deserialize_buffered(&mut buffer).unwrap();
        assert_eq!(value, Some(Data::tuple([Data::Long(9), Data::string("tail")])));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_histogram_key_with_two_bins_is_rejected() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0.0f64.to_ne_bytes());
        bytes.extend_from_slice(&20.0f64.to_ne_bytes());
        bytes.extend_from_slice(&1u32.to_ne_bytes());
        bytes.extend_from_slice(&0.0f64.to_ne_bytes());
        bytes.extend_from_slice(&2u32.to_ne_bytes());
        for _ in 0..2 {
            bytes.extend_from_slice(&0.0f64.to_ne_bytes());
            bytes.extend_from_slice(&10.0f64.to_ne_bytes());
            bytes.extend_from_slice(&1i64.to_ne_bytes());
        }
        let err = Schema::Histogram
            .deserialize(&mut IoSource::new(bytes.as_slice()))
            .unwrap_err();
        assert!(matches!(err, FlowError::ArityMismatch { expected: 1, actual: 2 }));
    }

    #[test]
    fn test_short_stream_is_underrun() {
        let err = Schema::long()
            .deserialize(&mut IoSource::new(&[1u8, 2, 3][..]))
            .unwrap_err();
        assert!(err.is_underrun());
    }

    #[test]
    fn test_incomplete_values_are_rejected() {
        let mut bytes = Vec::new();
        let err = Schema::HistogramBin
            .serialize(&Data::HistogramBin(HistogramBin::new()), &mut bytes)
            .unwrap_err();
        assert!(matches!(err, FlowError::IncompleteValue(_)));

        let err = Schema::Histogram
            .serialize(&Data::Histogram(Histogram::new()), &mut bytes)
            .unwrap_err();
        assert!(matches!(err, FlowError::IncompleteValue("histogram")));
    }

    #[test]
    fn test_nul_in_string_is_rejected() {
        let mut bytes = Vec::new();
        let err = Schema::string()
            .serialize(&Data::string("a\0b"), &mut bytes)
            .unwrap_err();
        assert!(matches!(err, FlowError::Encoding(_)));
    }

    #[test]
    fn test_tuple_arity_mismatch() {
        let schema = Schema::tuple([Schema::int().shared(), Schema::int().shared()]);
        let mut bytes = Vec::new();
        let err = schema
            .serialize(&Data::tuple([Data::Int(1)]), &mut bytes)
            .unwrap_err();
        assert!(matches!(
            err,
            FlowError::ArityMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    #[should_panic(expected = "cannot serialize")]
    fn test_wrong_variant_panics() {
        let mut bytes = Vec::new();
        let _ = Schema::int().serialize(&Data::Long(1), &mut bytes);
    }

    #[test]
    fn test_print_formats() {
        let tuple = Schema::tuple([Schema::int().shared(), Schema::string().shared()]);
        assert_eq!(
            tuple.to_display_string(&Data::tuple([Data::Int(1), Data::string("x")])),
            "(1, x)"
        );

        let record = Schema::Record(point_schema());
        let value = point_schema().make_record(vec![Data::Double(1.5), Data::string("p")]);
        assert_eq!(record.to_display_string(&value), "{x: 1.5, name: p}");

        let map = Schema::key_val(Schema::int().shared(), Schema::char().shared());
        let value = Data::KeyValMap(
            [(Data::Int(1), Data::Char(b'a')), (Data::Int(1), Data::Char(b'b'))]
                .into_iter()
                .collect(),
        );
        assert_eq!(map.to_display_string(&value), "{1 => [a, b]}");

        assert_eq!(
            Schema::Histogram.to_display_string(&Data::Histogram(sample_histogram())),
            "Histogram[0, 20] {[0, 10): 3, [10, 20): 1}"
        );
        assert_eq!(
            Schema::HistogramBin.to_display_string(&Data::HistogramBin(HistogramBin::new())),
            "[?, ?): ?"
        );
    }

    #[test]
    fn test_schema_compare() {
        let schema = Schema::tuple([Schema::int().shared()]);
        let a = Data::tuple([Data::Int(1)]);
        let b = Data::tuple([Data::Int(2)]);
        assert_eq!(schema.compare(&a, &b), Ordering::Less);
        assert!(schema.equals(&a, &a.clone()));
    }

    #[test]
    #[should_panic(expected = "does not conform")]
    fn test_compare_nonconforming_panics() {
        let _ = Schema::int().compare(&Data::Int(1), &Data::string("x"));
    }

    #[test]
    fn test_describe_shapes() {
        let schema = Schema::Record(point_schema());
        let props = schema.describe();
        assert_eq!(props.name(), "Record");
        assert_eq!(props.cursor().get("numFields"), Some("2"));
        assert_eq!(props.cursor().get("field1"), Some("name"));
        assert_eq!(props.contents().len(), 2);
        assert_eq!(props.contents()[0].cursor().get("type"), Some("double"));
    }

    #[test]
    fn test_scalar_parse_value() {
        assert_eq!(ScalarType::Int.parse_value(" 12 ").unwrap(), Data::Int(12));
        assert_eq!(ScalarType::Char.parse_value("q").unwrap(), Data::Char(b'q'));
        assert!(ScalarType::Char.parse_value("qq").is_err());
        assert_eq!(ScalarType::Char.parse_value(" ").unwrap(), Data::Char(b' '));
        assert_eq!(ScalarType::Char.parse_value(" q ").unwrap(), Data::Char(b'q'));
        assert_eq!(ScalarType::Char.parse_value("\u{e9}").unwrap(), Data::Char(0xE9));
        assert!(ScalarType::Char.parse_value("\u{263a}").is_err());
        assert!(ScalarType::Double.parse_value("x").is_err());
        assert_eq!("long".parse::<ScalarType>().unwrap(), ScalarType::Long);
        assert!("int64".parse::<ScalarType>().is_err());
    }

    proptest! {
        #[test]
        fn prop_tuple_round_trip(
            a in any::<i32>(),
            b in any::<i64>(),
            c in "[a-zA-Z0-9 ]{0,24}",
            d in any::<f64>().prop_filter("comparable", |v| !v.is_nan()),
        ) {
            let schema = Schema::tuple([
                Schema::int().shared(),
                Schema::long().shared(),
                Schema::string().shared(),
                Schema::double().shared(),
            ]);
            let value = Data::tuple([Data::Int(a), Data::Long(b), Data::string(c), Data::Double(d)]);
            prop_assert_eq!(round_trip_vec(&schema, &value), value.clone());
            prop_assert_eq!(round_trip_buffer(&schema, &value), value);
        }

        #[test]
        fn prop_map_round_trip(entries in proptest::collection::vec((0i32..8, any::<i64>()), 0..32)) {
            let schema = Schema::key_val(Schema::int().shared(), Schema::long().shared());
            let map: ExplicitKeyValMap = entries
                .into_iter()
                .map(|(k, v)| (Data::Int(k), Data::Long(v)))
                .collect();
            let value = Data::KeyValMap(map);
            prop_assert_eq!(round_trip_buffer(&schema, &value), value);
        }
    }
}
