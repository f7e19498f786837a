//! Record schemas.
//!
//! A [`RecordSchema`] is built in two phases: fields are added, then
//! [`finalize`](RecordSchema::finalize) fixes the field → index mapping.
//! Adding after finalization, finalizing twice, or building a record
//! before finalization are programming errors and panic.

use crate::data::schema::Schema;
use crate::data::value::{Data, Record};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct RecordSchema {
    fields: Vec<(String, Arc<Schema>)>,
    index: HashMap<String, usize>,
    finalized: bool,
}

impl RecordSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named field and return its position.
    ///
    /// # Panics
    ///
    /// Panics after [`finalize`](Self::finalize) or on a duplicate name.
    pub fn add(&mut self, name: impl Into<String>, schema: Arc<Schema>) -> usize {
        let name = name.into();
        assert!(
            !self.finalized,
            "cannot add field '{}' to a finalized record schema",
            name
        );
        assert!(
            self.fields.iter().all(|(existing, _)| *existing != name),
            "duplicate record field '{}'",
            name
        );
        self.fields.push((name, schema));
        self.fields.len() - 1
    }

    /// Builder form of [`add`](Self::add).
    pub fn with_field(mut self, name: impl Into<String>, schema: Arc<Schema>) -> Self {
        self.add(name, schema);
        self
    }

    /// Freeze the field set.
    ///
    /// # Panics
    ///
    /// Panics when called a second time.
    pub fn finalize(&mut self) {
        assert!(!self.finalized, "record schema finalized twice");
        self.index = self
            .fields
            .iter()
            .enumerate()
            .map(|(i, (name, _))| (name.clone(), i))
            .collect();
        self.finalized = true;
    }

    /// Builder form of [`finalize`](Self::finalize).
    pub fn finalized(mut self) -> Self {
        self.finalize();
        self
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Position of `name`; only known once finalized.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn field_schema(&self, index: usize) -> Option<&Arc<Schema>> {
        self.fields.get(index).map(|(_, schema)| schema)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Arc<Schema>)> {
        self.fields.iter().map(|(name, schema)| (name.as_str(), schema))
    }

    /// Build a record value.
    ///
    /// # Panics
    ///
    /// Panics if the schema is not finalized or `values` has the wrong
    /// arity.
    pub fn make_record(&self, values: Vec<Data>) -> Data {
        assert!(
            self.finalized,
            "record constructed before its schema was finalized"
        );
        assert_eq!(
            values.len(),
            self.fields.len(),
            "record arity does not match its schema"
        );
        Data::Record(Record::from_values(values))
    }

    /// Value of field `name` in `record`.
    pub fn field<'a>(&self, record: &'a Data, name: &str) -> Option<&'a Data> {
        match record {
            Data::Record(r) => r.get(self.index_of(name)?),
            _ => None,
        }
    }
}

impl PartialEq for RecordSchema {
    fn eq(&self, other: &Self) -> bool {
        self.finalized == other.finalized && self.fields == other.fields
    }
}
