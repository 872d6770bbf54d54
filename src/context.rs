//! Variable and function resolution context
//!
//! An [`EvalScope`] is the read-only view a single evaluation sees: the
//! calculator's persistent bindings, an optional transient overlay supplied
//! for that call, and the three function-resolution tiers. Building the
//! scope per call (instead of merging into shared state and rolling back)
//! is what makes one calculator instance safe to share across threads.

use crate::error::{CalcError, Result};
use crate::registry::FunctionRegistry;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use std::collections::HashMap;
use std::sync::Arc;

/// Externally-resolved payroll functions and variables
///
/// The calculator routes reserved three-character codes (a letter followed
/// by two digits, e.g. `F01`..`F24`) exclusively through this collaborator;
/// its implementation lives outside the calculator.
pub trait PayrollContext: Send + Sync {
    /// Execute a payroll function by code with already-evaluated arguments
    fn execute_function(&self, code: &str, args: &[Decimal]) -> Result<Decimal>;

    /// Resolve a variable the calculator itself has no binding for
    fn variable(&self, _name: &str) -> Option<Decimal> {
        None
    }
}

/// User-registered custom function
pub type CustomFunction = Arc<dyn Fn(&[Decimal]) -> Result<Decimal> + Send + Sync>;

/// Check whether a function name is a reserved payroll code:
/// exactly three characters, a letter followed by two digits
pub fn is_payroll_code(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() == 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1].is_ascii_digit()
        && bytes[2].is_ascii_digit()
}

/// Read-only resolution scope for one evaluation
pub struct EvalScope<'a> {
    /// Calculator-owned bindings (constants plus `set_variable` values)
    persistent: &'a FxHashMap<String, Decimal>,
    /// Bindings supplied for this call only; they shadow persistent ones
    transient: Option<&'a HashMap<String, Decimal>>,
    /// Built-in function library
    registry: &'a FunctionRegistry,
    /// User-registered custom functions
    custom: &'a FxHashMap<String, CustomFunction>,
    /// External payroll collaborator, if attached
    external: Option<&'a dyn PayrollContext>,
}

impl<'a> EvalScope<'a> {
    /// Assemble a scope from its parts
    pub fn new(
        persistent: &'a FxHashMap<String, Decimal>,
        transient: Option<&'a HashMap<String, Decimal>>,
        registry: &'a FunctionRegistry,
        custom: &'a FxHashMap<String, CustomFunction>,
        external: Option<&'a dyn PayrollContext>,
    ) -> Self {
        Self {
            persistent,
            transient,
            registry,
            custom,
            external,
        }
    }

    /// Resolve a variable: transient overlay, then persistent bindings,
    /// then the external context
    pub fn variable(&self, name: &str) -> Option<Decimal> {
        if let Some(overlay) = self.transient
            && let Some(&value) = overlay.get(name)
        {
            return Some(value);
        }
        if let Some(&value) = self.persistent.get(name) {
            return Some(value);
        }
        self.external.and_then(|ext| ext.variable(name))
    }

    /// Resolve and call a function through the three tiers: external
    /// payroll dispatch for reserved codes, then the built-in library,
    /// then user-registered custom functions
    pub fn call_function(&self, name: &str, args: &[Decimal]) -> Result<Decimal> {
        if let Some(external) = self.external
            && is_payroll_code(name)
        {
            return external.execute_function(name, args);
        }
        if let Some(function) = self.registry.get(name) {
            return function.evaluate(args).map_err(CalcError::from);
        }
        if let Some(custom) = self.custom.get(name) {
            return (**custom)(args);
        }
        Err(CalcError::function_not_found(name))
    }
}
