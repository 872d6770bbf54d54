//! Function trait and registry for built-in decimal functions

use crate::error::CalcError;
use crate::registry::signature::FunctionSignature;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Result type for function evaluation
pub type FunctionResult<T> = Result<T, FunctionError>;

/// Function evaluation errors
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FunctionError {
    /// Invalid number of arguments
    #[error("Function '{name}' expects {min}{} arguments, got {actual}",
            max.map(|m| if m == *min { String::new() } else { format!("-{m}") })
               .unwrap_or_else(|| String::from(" or more")))]
    InvalidArity {
        /// Function name
        name: String,
        /// Minimum arguments
        min: usize,
        /// Maximum arguments (None for unlimited)
        max: Option<usize>,
        /// Actual arguments provided
        actual: usize,
    },

    /// Invalid argument value
    #[error("Function '{name}' argument {index}: {message}")]
    InvalidArgument {
        /// Function name
        name: String,
        /// 0-based argument index
        index: usize,
        /// Error message
        message: String,
    },

    /// Runtime evaluation error
    #[error("Function '{name}' evaluation error: {message}")]
    EvaluationError {
        /// Function name
        name: String,
        /// Error message
        message: String,
    },
}

impl From<FunctionError> for CalcError {
    fn from(err: FunctionError) -> Self {
        // The full message keeps the function name for the caller.
        CalcError::evaluation_error(err.to_string())
    }
}

/// A pure function over decimal arguments
pub trait CalcFunction: Send + Sync {
    /// Function name as written in expressions
    fn name(&self) -> &str;

    /// Arity contract
    fn signature(&self) -> &FunctionSignature;

    /// Short documentation string
    fn documentation(&self) -> &str {
        ""
    }

    /// Evaluate with already-validated arguments
    fn evaluate(&self, args: &[Decimal]) -> FunctionResult<Decimal>;

    /// Check the argument count against the signature
    fn validate_args(&self, args: &[Decimal]) -> FunctionResult<()> {
        let sig = self.signature();
        if sig.matches(args.len()) {
            Ok(())
        } else {
            Err(FunctionError::InvalidArity {
                name: self.name().to_string(),
                min: sig.min_arity,
                max: sig.max_arity,
                actual: args.len(),
            })
        }
    }
}

/// Registry of built-in functions, keyed by name
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: FxHashMap<String, Arc<dyn CalcFunction>>,
}

impl FunctionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry populated with the standard function library
    pub fn standard() -> Self {
        let mut registry = Self::new();
        crate::registry::functions::register_builtins(&mut registry);
        registry
    }

    /// Register a function, replacing any previous entry with the same name
    pub fn register<F: CalcFunction + 'static>(&mut self, function: F) {
        self.functions
            .insert(function.name().to_string(), Arc::new(function));
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn CalcFunction>> {
        self.functions.get(name)
    }

    /// Check whether a function is registered
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Number of registered functions
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Check whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Registered function names, sorted for stable output
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("len", &self.functions.len())
            .finish()
    }
}
