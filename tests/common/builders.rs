//! Test data builders for flow descriptions

use tagflow::{
    pipeline::{EdgeSpec, OperatorId},
    tag::TagWriter,
    Properties,
};

/// Builder for flow description tags
#[derive(Default)]
pub struct FlowSpec {
    operators: Vec<Properties>,
    edges: Vec<EdgeSpec>,
}

impl FlowSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an operator of type `kind` with its own properties.
    pub fn operator(
        mut self,
        kind: &str,
        props: &[(&str, &str)],
        id: u32,
        inputs: usize,
        outputs: usize,
    ) -> Self {
        let mut p = Properties::empty();
        let level = p.push_level(kind);
        for (key, value) in props {
            level.set(*key, *value);
        }
        p.push_level("Operator")
            .set("id", id)
            .set("numInputs", inputs)
            .set("numOutputs", outputs);
        self.operators.push(p);
        self
    }

    /// Like [`operator`](Self::operator) but with a nested child tag.
    pub fn operator_with_child(
        mut self,
        kind: &str,
        props: &[(&str, &str)],
        id: u32,
        outputs: usize,
        child: Properties,
    ) -> Self {
        self = self.operator(kind, props, id, 0, outputs);
        if let Some(last) = self.operators.last_mut() {
            last.add_child(child);
        }
        self
    }

    pub fn edge(mut self, from: u32, from_port: usize, to: u32, to_port: usize) -> Self {
        self.edges
            .push(EdgeSpec::new(OperatorId(from), from_port, OperatorId(to), to_port));
        self
    }

    pub fn build(self) -> Vec<Properties> {
        let operators = self
            .operators
            .into_iter()
            .fold(Properties::new("Operators"), Properties::with_child);
        let streams = self
            .edges
            .iter()
            .fold(Properties::new("Streams"), |p, e| p.with_child(e.describe()));
        vec![operators, streams]
    }

    /// Normalised tag text, as a flow file would hold it.
    pub fn to_text(self) -> String {
        let mut text = String::new();
        TagWriter::pretty()
            .write_all(&self.build(), &mut text)
            .expect("writing to a String cannot fail");
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_spec_builder() {
        let objects = FlowSpec::new()
            .operator("Sequence", &[("count", "2")], 1, 0, 1)
            .operator("Print", &[], 2, 1, 0)
            .edge(1, 0, 2, 0)
            .build();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].contents().len(), 2);
        assert_eq!(objects[1].contents()[0].cursor().get("to"), Some("2"));
    }
}
