//! Name → factory table for rebuilding schemas from tags.
//!
//! The registry is filled once at startup and then only read, so a single
//! instance can be shared between worker threads behind an `Arc`.

use crate::data::record::RecordSchema;
use crate::data::schema::{ScalarType, Schema};
use crate::error::{FlowError, Result, ResultExt};
use crate::tag::{Properties, PropertiesCursor};
use std::collections::HashMap;
use std::sync::Arc;

/// Builds a schema from its tag. Child schemas are rebuilt through the
/// registry that is passed in.
pub type SchemaFactory =
    Box<dyn Fn(PropertiesCursor<'_>, &SchemaRegistry) -> Result<Schema> + Send + Sync>;

pub struct SchemaRegistry {
    factories: HashMap<String, SchemaFactory>,
}

impl SchemaRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A registry holding every built-in schema variant.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .register_builtins()
            .expect("built-in schema names are distinct");
        registry
    }

    fn register_builtins(&mut self) -> Result<()> {
        self.register("Scalar", |cursor, _| {
            let ty: ScalarType = cursor.require("type")?.parse()?;
            Ok(Schema::Scalar(ty))
        })?;
        self.register("Tuple", |cursor, registry| {
            let fields = registry.children(cursor)?;
            if let Some(arity) = cursor.get("arity") {
                expect_count(cursor, "arity", arity, fields.len())?;
            }
            Ok(Schema::Tuple(fields))
        })?;
        self.register("Record", |cursor, registry| {
            let fields = registry.children(cursor)?;
            expect_count(cursor, "numFields", cursor.require("numFields")?, fields.len())?;
            let mut record = RecordSchema::new();
            for (i, schema) in fields.into_iter().enumerate() {
                let name = cursor.require(&format!("field{}", i))?;
                if record.field_names().any(|existing| existing == name) {
                    return Err(FlowError::MalformedTag(format!(
                        "record field '{}' appears twice",
                        name
                    )));
                }
                record.add(name, schema);
            }
            record.finalize();
            Ok(Schema::Record(record))
        })?;
        self.register("KeyVal", |cursor, registry| {
            let mut children = registry.children(cursor)?.into_iter();
            match (children.next(), children.next(), children.next()) {
                (Some(key), Some(value), None) => Ok(Schema::KeyVal { key, value }),
                _ => Err(FlowError::MalformedTag(
                    "[KeyVal] needs exactly a key and a value schema".to_string(),
                )),
            }
        })?;
        self.register("HistogramBin", |_, _| Ok(Schema::HistogramBin))?;
        self.register("Histogram", |_, _| Ok(Schema::Histogram))?;
        Ok(())
    }

    /// Add a factory. Names can only be registered once.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> Result<()>
    where
        F: Fn(PropertiesCursor<'_>, &SchemaRegistry) -> Result<Schema> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(FlowError::DuplicateRegistration(name));
        }
        tracing::debug!("Registered schema factory '{}'", name);
        self.factories.insert(name, Box::new(factory));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Rebuild a schema from its description.
    pub fn deserialize(&self, props: &Properties) -> Result<Arc<Schema>> {
        let cursor = props.cursor();
        let factory = self
            .factories
            .get(cursor.name())
            .ok_or_else(|| FlowError::UnknownSchema(cursor.name().to_string()))?;
        let schema = factory(cursor, self).with_context(|| format!("schema [{}]", cursor.name()))?;
        Ok(Arc::new(schema))
    }

    fn children(&self, cursor: PropertiesCursor<'_>) -> Result<Vec<Arc<Schema>>> {
        cursor
            .contents()
            .iter()
            .map(|child| self.deserialize(child))
            .collect()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("names", &self.names())
            .finish()
    }
}

fn expect_count(cursor: PropertiesCursor<'_>, key: &str, raw: &str, actual: usize) -> Result<()> {
    let declared: usize = raw.trim().parse().map_err(|_| FlowError::InvalidProperty {
        key: key.to_string(),
        value: raw.to_string(),
    })?;
    if declared != actual {
        return Err(FlowError::MalformedTag(format!(
            "[{}] declares {}={} but holds {} child schemas",
            cursor.name(),
            key,
            declared,
            actual
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::parse_str;

    fn nested_schema() -> Schema {
        let record = RecordSchema::new()
            .with_field("id", Schema::long().shared())
            .with_field(
                "pair",
                Schema::tuple([Schema::char().shared(), Schema::float().shared()]).shared(),
            )
            .finalized();
        Schema::key_val(Schema::string().shared(), Schema::Record(record).shared())
    }

    #[test]
    fn test_describe_then_deserialize() {
        let registry = SchemaRegistry::with_builtins();
        for schema in [
            nested_schema(),
            Schema::Histogram,
            Schema::HistogramBin,
            Schema::double(),
        ] {
            let rebuilt = registry.deserialize(&schema.describe()).unwrap();
            assert!(rebuilt.same_as(&schema), "{}", schema);
        }
    }

    #[test]
    fn test_through_tag_text() {
        let registry = SchemaRegistry::with_builtins();
        let text = nested_schema().describe().to_tag_string();
        let parsed = parse_str(&text).unwrap();
        assert_eq!(parsed.len(), 1);
        let rebuilt = registry.deserialize(&parsed[0]).unwrap();
        assert_eq!(*rebuilt, nested_schema());
    }

    #[test]
    fn test_unknown_schema() {
        let registry = SchemaRegistry::with_builtins();
        let err = registry.deserialize(&Properties::new("Matrix")).unwrap_err();
        assert!(matches!(err, FlowError::UnknownSchema(name) if name == "Matrix"));
    }

    #[test]
    fn test_unknown_scalar_type() {
        let registry = SchemaRegistry::with_builtins();
        let props = Properties::new("Scalar").with("type", "quad");
        assert!(registry.deserialize(&props).is_err());
    }

    #[test]
    fn test_child_count_must_match() {
        let registry = SchemaRegistry::with_builtins();
        let props = Properties::new("Tuple")
            .with("arity", 2)
            .with_child(Schema::int().describe());
        let err = registry.deserialize(&props).unwrap_err();
        assert!(err.to_string().contains("arity=2"));

        let props = Properties::new("KeyVal").with_child(Schema::int().describe());
        assert!(registry.deserialize(&props).is_err());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = SchemaRegistry::with_builtins();
        let err = registry
            .register("Scalar", |_, _| Ok(Schema::int()))
            .unwrap_err();
        assert!(matches!(err, FlowError::DuplicateRegistration(_)));
    }

    #[test]
    fn test_custom_factory() {
        let mut registry = SchemaRegistry::new();
        registry
            .register("Point", |_, _| {
                Ok(Schema::tuple([Schema::double().shared(), Schema::double().shared()]))
            })
            .unwrap();
        assert!(registry.contains("Point"));
        assert_eq!(registry.names(), vec!["Point"]);
        let schema = registry.deserialize(&Properties::new("Point")).unwrap();
        assert_eq!(schema.to_string(), "(double, double)");
    }
}
