//! Error handling for the tagflow engine
//!
//! This module defines the error type shared by the data model, the tag
//! parser, the registries and the circular buffer, plus a Result alias.
//!
//! Two kinds of failure travel through [`FlowError`]:
//!
//! - **Configuration errors** (malformed tags, unknown registry names,
//!   missing properties). These describe a broken deployment; the binary
//!   reports them and exits.
//! - **Data-path underruns** ([`FlowError::Underrun`]). Not enough bytes have
//!   arrived yet; callers retry once more input is available.

use thiserror::Error;

/// Main error type for tagflow operations
#[derive(Error, Debug)]
pub enum FlowError {
    /// Not enough buffered bytes to satisfy a read
    #[error("Buffer underrun: needed {needed} bytes, {available} available")]
    Underrun { needed: usize, available: usize },

    /// Tag stream does not follow the tag grammar
    #[error("Malformed tag: {0}")]
    MalformedTag(String),

    /// Input ended in the middle of a tag or before a closing tag
    #[error("Unexpected end of tag stream")]
    UnexpectedEof,

    /// No schema factory registered under this name
    #[error("Unknown schema type: {0}")]
    UnknownSchema(String),

    /// No operator factory registered under this name
    #[error("Unknown operator type: {0}")]
    UnknownOperator(String),

    /// Registries are append-only; a name can be registered once
    #[error("Duplicate registration: {0}")]
    DuplicateRegistration(String),

    /// A required property is absent from a tag
    #[error("Tag [{tag}] is missing property '{key}'")]
    MissingProperty { tag: String, key: String },

    /// A property value could not be converted
    #[error("Invalid value '{value}' for property '{key}'")]
    InvalidProperty { key: String, value: String },

    /// A value is not yet well-formed (e.g. an unset histogram bin)
    #[error("Incomplete value: {0}")]
    IncompleteValue(&'static str),

    /// Composite value does not match its schema's arity
    #[error("Arity mismatch: expected {expected}, found {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    /// Bytes cannot be represented in (or decoded from) the binary format
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// The transport side of an outbound hook has gone away
    #[error("Transport error: {0}")]
    Transport(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors related to configuration loading
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<FlowError>,
    },
}

impl FlowError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        FlowError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error only signals that more input is needed.
    pub fn is_underrun(&self) -> bool {
        match self {
            FlowError::Underrun { .. } => true,
            FlowError::WithContext { source, .. } => source.is_underrun(),
            _ => false,
        }
    }
}

/// Result type alias for tagflow operations
pub type Result<T> = std::result::Result<T, FlowError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FlowError::UnknownSchema("Matrix".to_string());
        assert_eq!(err.to_string(), "Unknown schema type: Matrix");
    }

    #[test]
    fn test_error_with_context() {
        let err = FlowError::MalformedTag("missing ]".to_string());
        let with_ctx = err.with_context("Failed to read flow");
        assert!(with_ctx.to_string().contains("Failed to read flow"));
        assert!(with_ctx.to_string().contains("missing ]"));
    }

    #[test]
    fn test_underrun_survives_context() {
        let err = FlowError::Underrun {
            needed: 4,
            available: 1,
        };
        assert!(err.is_underrun());
        assert!(err.with_context("decoding int").is_underrun());
        assert!(!FlowError::UnexpectedEof.is_underrun());
    }

    #[test]
    fn test_missing_property_message() {
        let err = FlowError::MissingProperty {
            tag: "Sequence".to_string(),
            key: "count".to_string(),
        };
        assert!(err.to_string().contains("[Sequence]"));
        assert!(err.to_string().contains("'count'"));
    }
}
