//! Literal - source of values listed in its tag.
//!
//! ```text
//! [|Literal numProperties="2" name0="type" val0="int" name1="values" val1="1,2,3"]
//! [Operator ...][/Operator]
//! ```
//!
//! Instead of `type`, the element type may be given as a nested `Scalar`
//! schema tag. `values` is a hand-written shorthand; `describe` writes one
//! property per value so that any string or char survives:
//!
//! ```text
//! [|Literal numProperties="4" name0="type" val0="string" name1="count" val1="2"
//!   name2="value0" val2="a,b" name3="value1" val3=""]
//! ```

use crate::data::{Data, ScalarType, Schema};
use crate::error::FlowError;
use crate::pipeline::error::{GraphError, GraphResult};
use crate::pipeline::graph::Outputs;
use crate::pipeline::operator::{AnyOperator, Operator, OperatorHeader, SourceOperator};
use crate::pipeline::registry::FactoryContext;
use crate::tag::{PropertiesCursor, PropertyLevel};
use std::sync::Arc;

pub struct Literal {
    header: OperatorHeader,
    ty: ScalarType,
    values: Vec<Data>,
}

impl Literal {
    pub const TYPE_NAME: &'static str = "Literal";

    pub fn new(header: OperatorHeader, ty: ScalarType, values: Vec<Data>) -> GraphResult<Self> {
        header.expect_arity(Self::TYPE_NAME, Some(0), None)?;
        if header.num_outputs == 0 {
            return Err(GraphError::operator(header.id, "Literal needs an output port"));
        }
        if let Some(bad) = values.iter().find(|v| !ty.matches(v)) {
            return Err(GraphError::operator(
                header.id,
                format!("value of type {} in a {} literal", bad.type_name(), ty),
            ));
        }
        Ok(Self { header, ty, values })
    }

    /// Parse a comma-separated list of `ty` values. An empty list is
    /// allowed.
    pub fn parse_values(ty: ScalarType, raw: &str) -> GraphResult<Vec<Data>> {
        if raw.is_empty() {
            return Ok(Vec::new());
        }
        raw.split(',')
            .map(|item| ty.parse_value(item).map_err(GraphError::from))
            .collect()
    }

    pub fn from_properties(cursor: PropertiesCursor<'_>, ctx: &FactoryContext<'_>) -> GraphResult<AnyOperator> {
        let header = OperatorHeader::from_chain(cursor)?;
        let ty = match (cursor.get("type"), cursor.contents().first()) {
            (Some(name), _) => name.parse::<ScalarType>()?,
            (None, Some(child)) => match &*ctx.schemas.deserialize(child)? {
                Schema::Scalar(ty) => *ty,
                other => {
                    return Err(GraphError::operator(
                        header.id,
                        format!("Literal values must be scalar, not {}", other),
                    ))
                }
            },
            (None, None) => {
                return Err(FlowError::MissingProperty {
                    tag: Self::TYPE_NAME.to_string(),
                    key: "type".to_string(),
                }
                .into())
            }
        };
        let values = Self::read_values(cursor, ty)?;
        Ok(AnyOperator::source(Self::new(header, ty, values)?))
    }

    /// Values from either the `values` list or `count` plus `value0..N`.
    pub fn read_values(cursor: PropertiesCursor<'_>, ty: ScalarType) -> GraphResult<Vec<Data>> {
        if let Some(raw) = cursor.get("values") {
            return Self::parse_values(ty, raw);
        }
        let count: usize = match cursor.get("count") {
            Some(_) => cursor.parse("count")?,
            None => {
                return Err(FlowError::MissingProperty {
                    tag: Self::TYPE_NAME.to_string(),
                    key: "values".to_string(),
                }
                .into())
            }
        };
        (0..count)
            .map(|i| {
                let raw = cursor.require(&format!("value{}", i))?;
                ty.parse_value(raw).map_err(GraphError::from)
            })
            .collect()
    }
}

impl Operator for Literal {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn header(&self) -> &OperatorHeader {
        &self.header
    }

    fn describe_level(&self, level: &mut PropertyLevel) {
        let schema = Schema::Scalar(self.ty);
        level.set("type", self.ty).set("count", self.values.len());
        for (i, value) in self.values.iter().enumerate() {
            level.set(format!("value{}", i), schema.to_display_string(value));
        }
    }

    fn in_connections_complete(&mut self, _inputs: &[Arc<Schema>]) -> GraphResult<Vec<Arc<Schema>>> {
        Ok(vec![Schema::Scalar(self.ty).shared(); self.header.num_outputs])
    }
}

impl SourceOperator for Literal {
    fn work(&mut self, out: &mut Outputs<'_>) -> GraphResult<()> {
        for value in &self.values {
            out.emit_all(value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::id::OperatorId;

    #[test]
    fn test_parse_values() {
        assert_eq!(
            Literal::parse_values(ScalarType::Int, "1, 2,3").unwrap(),
            vec![Data::Int(1), Data::Int(2), Data::Int(3)]
        );
        assert_eq!(
            Literal::parse_values(ScalarType::String, "a,b c").unwrap(),
            vec![Data::string("a"), Data::string("b c")]
        );
        assert!(Literal::parse_values(ScalarType::String, "").unwrap().is_empty());
        assert!(Literal::parse_values(ScalarType::Long, "1,x").is_err());
    }

    #[test]
    fn test_rejects_mismatched_values() {
        let header = OperatorHeader::new(OperatorId(1), 0, 1);
        assert!(Literal::new(header, ScalarType::Int, vec![Data::Long(1)]).is_err());
    }

    fn reread(ty: ScalarType, values: Vec<Data>) -> Vec<Data> {
        let header = OperatorHeader::new(OperatorId(1), 0, 1);
        let props = Literal::new(header, ty, values).unwrap().describe();
        Literal::read_values(props.cursor(), ty).unwrap()
    }

    #[test]
    fn test_describe_keeps_values() {
        let header = OperatorHeader::new(OperatorId(1), 0, 1);
        let lit = Literal::new(header, ScalarType::Double, vec![Data::Double(1.5), Data::Double(-2.0)]).unwrap();
        let props = lit.describe();
        assert_eq!(props.cursor().get("type"), Some("double"));
        assert_eq!(props.cursor().get("count"), Some("2"));
        assert_eq!(props.cursor().get("value0"), Some("1.5"));
        assert_eq!(props.cursor().get("value1"), Some("-2"));
    }

    #[test]
    fn test_describe_round_trips_awkward_strings() {
        let values = vec![Data::string("a,b"), Data::string(""), Data::string(" padded ")];
        assert_eq!(reread(ScalarType::String, values.clone()), values);
        assert_eq!(reread(ScalarType::String, vec![Data::string("")]), vec![Data::string("")]);
        assert!(reread(ScalarType::String, Vec::new()).is_empty());
    }

    #[test]
    fn test_describe_round_trips_chars() {
        let values = vec![Data::Char(b','), Data::Char(b' '), Data::Char(0xE9), Data::Char(b'x')];
        assert_eq!(reread(ScalarType::Char, values.clone()), values);
    }

    #[test]
    fn test_missing_value_property() {
        let mut props = crate::tag::Properties::new("Literal");
        props.set("count", 2).set("value0", "1");
        assert!(Literal::read_values(props.cursor(), ScalarType::Int).is_err());
    }
}
