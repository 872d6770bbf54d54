//! Function registry: trait, signatures, and the built-in library

pub mod function;
pub mod functions;
pub mod signature;

pub use function::{CalcFunction, FunctionError, FunctionRegistry, FunctionResult};
pub use signature::FunctionSignature;

use once_cell::sync::Lazy;
use std::sync::Arc;

/// Shared standard registry; built once, cloned cheaply per calculator
static STANDARD_REGISTRY: Lazy<Arc<FunctionRegistry>> =
    Lazy::new(|| Arc::new(FunctionRegistry::standard()));

/// Handle to the shared standard function library
pub fn standard_registry() -> Arc<FunctionRegistry> {
    Arc::clone(&STANDARD_REGISTRY)
}
