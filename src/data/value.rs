//! Runtime values.
//!
//! [`Data`] is a closed sum over every value variant the engine knows.
//! Values are immutable once built and carry no serialization logic; the
//! paired [`Schema`](crate::data::Schema) decides how they are encoded and
//! printed.
//!
//! Values of compatible variants have structural equality and a total
//! order. Comparing incompatible variants (an `Int` with a `Tuple`, say) is
//! a programming error and panics.

use crate::data::histogram::{Histogram, HistogramBin};
use crate::data::keyval::ExplicitKeyValMap;
use crate::data::schema::Schema;
use std::cmp::Ordering;

/// Positional values of a finalized [`RecordSchema`](crate::data::RecordSchema).
///
/// Only the schema can build one, which keeps the value count equal to the
/// schema's field count.
#[derive(Debug, Clone)]
pub struct Record {
    values: Vec<Data>,
}

impl Record {
    pub(crate) fn from_values(values: Vec<Data>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Data] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&Data> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A polymorphic value.
#[derive(Debug, Clone)]
pub enum Data {
    Char(u8),
    Str(String),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Tuple(Vec<Data>),
    Record(Record),
    KeyValMap(ExplicitKeyValMap),
    HistogramBin(HistogramBin),
    Histogram(Histogram),
}

impl Data {
    pub fn string(value: impl Into<String>) -> Self {
        Data::Str(value.into())
    }

    pub fn tuple(values: impl IntoIterator<Item = Data>) -> Self {
        Data::Tuple(values.into_iter().collect())
    }

    /// Variant chain from the most general name to the most specific.
    pub fn name_path(&self) -> &'static [&'static str] {
        match self {
            Data::Char(_) => &["Data", "Scalar", "char"],
            Data::Str(_) => &["Data", "Scalar", "string"],
            Data::Int(_) => &["Data", "Scalar", "int"],
            Data::Long(_) => &["Data", "Scalar", "long"],
            Data::Float(_) => &["Data", "Scalar", "float"],
            Data::Double(_) => &["Data", "Scalar", "double"],
            Data::Tuple(_) => &["Data", "Tuple"],
            Data::Record(_) => &["Data", "Tuple", "Record"],
            Data::KeyValMap(_) => &["Data", "KeyValMap", "ExplicitKeyValMap"],
            Data::HistogramBin(_) => &["Data", "HistogramBin"],
            Data::Histogram(_) => &["Data", "KeyValMap", "ExplicitKeyValMap", "Histogram"],
        }
    }

    /// Dotted form of [`name_path`](Self::name_path).
    pub fn type_name(&self) -> String {
        self.name_path().join(".")
    }

    pub fn is_scalar(&self) -> bool {
        self.name_path()[1] == "Scalar"
    }

    /// Total order against a value of the same variant.
    ///
    /// # Panics
    ///
    /// Panics when the variants are incompatible.
    pub fn compare(&self, other: &Data) -> Ordering {
        match (self, other) {
            (Data::Char(a), Data::Char(b)) => a.cmp(b),
            (Data::Str(a), Data::Str(b)) => a.cmp(b),
            (Data::Int(a), Data::Int(b)) => a.cmp(b),
            (Data::Long(a), Data::Long(b)) => a.cmp(b),
            (Data::Float(a), Data::Float(b)) => a.total_cmp(b),
            (Data::Double(a), Data::Double(b)) => a.total_cmp(b),
            (Data::Tuple(a), Data::Tuple(b)) => compare_slices(a, b),
            (Data::Record(a), Data::Record(b)) => compare_slices(&a.values, &b.values),
            (Data::KeyValMap(a), Data::KeyValMap(b)) => a.compare(b),
            (Data::HistogramBin(a), Data::HistogramBin(b)) => a.compare(b),
            (Data::Histogram(a), Data::Histogram(b)) => a.compare(b),
            _ => incompatible(self, other),
        }
    }

    /// Human-readable form, as directed by `schema`.
    pub fn display_with(&self, schema: &Schema) -> String {
        schema.to_display_string(self)
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Data::Char(v) => Some(i64::from(*v)),
            Data::Int(v) => Some(i64::from(*v)),
            Data::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Data::Float(v) => Some(f64::from(*v)),
            Data::Double(v) => Some(*v),
            other => other.as_long().map(|v| v as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Data::Str(v) => Some(v),
            _ => None,
        }
    }
}

/// Lexicographic, then shorter first.
pub(crate) fn compare_slices(a: &[Data], b: &[Data]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        match x.compare(y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

pub(crate) fn incompatible(a: &Data, b: &Data) -> ! {
    panic!(
        "incompatible data variants: {} vs {}",
        a.type_name(),
        b.type_name()
    )
}

impl PartialEq for Data {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for Data {}

impl PartialOrd for Data {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Data {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl From<i32> for Data {
    fn from(v: i32) -> Self {
        Data::Int(v)
    }
}

impl From<i64> for Data {
    fn from(v: i64) -> Self {
        Data::Long(v)
    }
}

impl From<f64> for Data {
    fn from(v: f64) -> Self {
        Data::Double(v)
    }
}

impl From<&str> for Data {
    fn from(v: &str) -> Self {
        Data::Str(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_order() {
        assert!(Data::Int(1) < Data::Int(2));
        assert!(Data::string("abc") < Data::string("abd"));
        assert_eq!(Data::Double(0.5), Data::Double(0.5));
        assert!(Data::Double(f64::NEG_INFINITY) < Data::Double(-1.0));
    }

    #[test]
    fn test_tuple_order_is_lexicographic() {
        let a = Data::tuple([Data::Int(1), Data::string("b")]);
        let b = Data::tuple([Data::Int(1), Data::string("c")]);
        let c = Data::tuple([Data::Int(0), Data::string("z")]);
        assert!(a < b);
        assert!(c < a);
        assert_eq!(a.compare(&a.clone()), Ordering::Equal);
    }

    #[test]
    fn test_name_path() {
        assert_eq!(Data::Int(3).name_path(), &["Data", "Scalar", "int"]);
        assert_eq!(Data::Int(3).type_name(), "Data.Scalar.int");
        assert!(Data::Char(b'x').is_scalar());
        assert!(!Data::tuple([]).is_scalar());
        assert_eq!(
            Data::Histogram(Histogram::new()).name_path().last(),
            Some(&"Histogram")
        );
    }

    #[test]
    #[should_panic(expected = "incompatible data variants")]
    fn test_incompatible_compare_panics() {
        let _ = Data::Int(1).compare(&Data::Long(1));
    }

    #[test]
    fn test_numeric_views() {
        assert_eq!(Data::Int(7).as_long(), Some(7));
        assert_eq!(Data::Long(7).as_double(), Some(7.0));
        assert_eq!(Data::Float(1.5).as_double(), Some(1.5));
        assert_eq!(Data::string("x").as_long(), None);
    }
}
