//! Name → factory table for building operators from tags.
//!
//! Like the schema registry, it is filled at startup and then shared
//! read-only. Per-flow resources (channels, the outbound hook) travel in a
//! [`FactoryContext`] rather than in the registry itself.

use crate::buffer::DEFAULT_CAPACITY;
use crate::data::SchemaRegistry;
use crate::error::FlowError;
use crate::pipeline::error::{GraphError, GraphResult};
use crate::pipeline::operator::AnyOperator;
use crate::pipeline::operators::{
    Collect, Collected, Literal, Merge, Outbound, PassThrough, Print, PrintTarget, Sequence, Zip,
};
use crate::tag::{Properties, PropertiesCursor};
use crate::transport::OutboundHook;
use crossbeam_channel::Sender;
use std::collections::HashMap;
use std::sync::Arc;

/// Builds an operator from the most-derived level of its tag.
pub type OperatorFactory =
    Box<dyn Fn(PropertiesCursor<'_>, &FactoryContext<'_>) -> GraphResult<AnyOperator> + Send + Sync>;

/// Resources a flow's operators may attach to.
#[derive(Clone)]
pub struct FlowResources {
    pub collector: Option<Sender<Collected>>,
    pub outbound: Option<Arc<dyn OutboundHook>>,
    pub print: PrintTarget,
    pub buffer_capacity: usize,
    pub tag_id: u32,
}

impl Default for FlowResources {
    fn default() -> Self {
        Self {
            collector: None,
            outbound: None,
            print: PrintTarget::Stdout,
            buffer_capacity: DEFAULT_CAPACITY,
            tag_id: 0,
        }
    }
}

impl std::fmt::Debug for FlowResources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowResources")
            .field("collector", &self.collector.is_some())
            .field("outbound", &self.outbound.is_some())
            .field("print", &self.print)
            .field("buffer_capacity", &self.buffer_capacity)
            .field("tag_id", &self.tag_id)
            .finish()
    }
}

/// What a factory can see while building one operator.
pub struct FactoryContext<'a> {
    pub schemas: &'a SchemaRegistry,
    pub resources: &'a FlowResources,
}

pub struct OperatorRegistry {
    factories: HashMap<String, OperatorFactory>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A registry holding every built-in operator type.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .register_builtins()
            .expect("built-in operator names are distinct");
        registry
    }

    fn register_builtins(&mut self) -> GraphResult<()> {
        self.register(Sequence::TYPE_NAME, Sequence::from_properties)?;
        self.register(Literal::TYPE_NAME, Literal::from_properties)?;
        self.register(PassThrough::TYPE_NAME, PassThrough::from_properties)?;
        self.register(Merge::TYPE_NAME, Merge::from_properties)?;
        self.register(Zip::TYPE_NAME, Zip::from_properties)?;
        self.register(Collect::TYPE_NAME, Collect::from_properties)?;
        self.register(Print::TYPE_NAME, Print::from_properties)?;
        self.register(Outbound::TYPE_NAME, Outbound::from_properties)?;
        Ok(())
    }

    /// Add a factory. Names can only be registered once.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> GraphResult<()>
    where
        F: Fn(PropertiesCursor<'_>, &FactoryContext<'_>) -> GraphResult<AnyOperator>
            + Send
            + Sync
            + 'static,
    {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(FlowError::DuplicateRegistration(name).into());
        }
        tracing::debug!("Registered operator factory '{}'", name);
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

    /// Build an operator from its description. The factory is chosen by
    /// the most-derived level name.
    pub fn create(&self, props: &Properties, ctx: &FactoryContext<'_>) -> GraphResult<AnyOperator> {
        let cursor = props.cursor();
        let name = cursor.name();
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| FlowError::UnknownOperator(name.to_string()))?;
        let operator = factory(cursor, ctx).map_err(|e| match e {
            GraphError::Flow(inner) => GraphError::Flow(inner.with_context(format!("operator [{}]", name))),
            other => other,
        })?;
        tracing::trace!("Created {} {}", name, operator.id());
        Ok(operator)
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OperatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorRegistry")
            .field("names", &self.names())
            .finish()
    }
}
