//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use tagflow::{data::SchemaRegistry, pipeline::OperatorRegistry};

/// Registries holding every built-in schema and operator.
pub fn registries() -> (OperatorRegistry, SchemaRegistry) {
    (
        OperatorRegistry::with_builtins(),
        SchemaRegistry::with_builtins(),
    )
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}
