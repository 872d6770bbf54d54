//! Calculator facade: the public entry point for formula evaluation
//!
//! Wires together the tokenizer, the fused parser/evaluator, the function
//! registry, and the result cache. All shared state sits behind locks and
//! every evaluation builds a read-only [`EvalScope`], so one `Calculator`
//! can be shared freely across threads.

use crate::cache::{CacheConfig, CacheSnapshot, ResultCache};
use crate::context::{CustomFunction, EvalScope, PayrollContext};
use crate::error::{CalcError, Result};
use crate::parser::tokenizer::TokenKind;
use crate::parser::{evaluate_tokens, evaluate_tokens_lenient, tokenize};
use crate::registry::{FunctionRegistry, standard_registry};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Calculator construction options
#[derive(Debug, Clone)]
pub struct CalculatorConfig {
    /// Result cache sizing and expiry
    pub cache: CacheConfig,
    /// Maximum expression nesting depth before parsing is aborted
    pub max_depth: usize,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            max_depth: 64,
        }
    }
}

#[derive(Debug, Default)]
struct PerfCounters {
    evaluations: u64,
    errors: u64,
    total_time: Duration,
}

/// Snapshot of the calculator's performance counters
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceStats {
    /// Total `evaluate` calls, successful or not
    pub evaluations: u64,
    /// Number of calls that returned an error
    pub errors: u64,
    /// Cache hits since the last cache clear
    pub cache_hits: u64,
    /// Cache misses since the last cache clear
    pub cache_misses: u64,
    /// Cache hit rate in [0, 1]
    pub cache_hit_rate: f64,
    /// Current number of cached results
    pub cache_size: usize,
    /// Cumulative evaluation time in milliseconds
    pub total_evaluation_time_ms: f64,
    /// Mean evaluation time in milliseconds
    pub avg_evaluation_time_ms: f64,
}

/// Variables and functions an expression refers to, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExpressionDependencies {
    /// Distinct variable names
    pub variables: Vec<String>,
    /// Distinct function names
    pub functions: Vec<String>,
}

/// Normalize an expression before cache-key construction and tokenizing:
/// collapse whitespace runs and rewrite `**` to `^`, so spelling
/// differences do not defeat the cache or change the token stream
pub fn normalize_expression(expression: &str) -> String {
    expression
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace("**", "^")
}

/// Safe expression calculator over arbitrary-precision decimals
pub struct Calculator {
    /// Persistent bindings; constants are seeded at construction
    variables: RwLock<FxHashMap<String, Decimal>>,
    registry: Arc<FunctionRegistry>,
    custom: RwLock<FxHashMap<String, CustomFunction>>,
    external: RwLock<Option<Arc<dyn PayrollContext>>>,
    cache: ResultCache,
    counters: Mutex<PerfCounters>,
    max_depth: usize,
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator {
    /// Create a calculator with default configuration
    pub fn new() -> Self {
        Self::with_config(CalculatorConfig::default())
    }

    /// Create a calculator with explicit configuration
    pub fn with_config(config: CalculatorConfig) -> Self {
        let mut variables = FxHashMap::default();
        variables.insert("PI".to_string(), Decimal::PI);
        variables.insert("E".to_string(), Decimal::E);
        variables.insert("TAU".to_string(), Decimal::TWO_PI);

        Self {
            variables: RwLock::new(variables),
            registry: standard_registry(),
            custom: RwLock::new(FxHashMap::default()),
            external: RwLock::new(None),
            cache: ResultCache::new(config.cache),
            counters: Mutex::new(PerfCounters::default()),
            max_depth: config.max_depth,
        }
    }

    /// Evaluate an expression to a decimal
    ///
    /// `variables` is a transient override set merged over the persistent
    /// bindings for this call only; persistent bindings are never touched,
    /// on success or failure. With `use_cache`, a hit returns the cached
    /// decimal without tokenizing or parsing at all.
    pub fn evaluate(
        &self,
        expression: &str,
        variables: Option<&HashMap<String, Decimal>>,
        use_cache: bool,
    ) -> Result<Decimal> {
        let started = Instant::now();
        let result = self.evaluate_inner(expression, variables, use_cache);

        let mut counters = self.counters.lock();
        counters.evaluations += 1;
        counters.total_time += started.elapsed();
        if let Err(err) = &result {
            counters.errors += 1;
            log::warn!("evaluation of '{expression}' failed: {err}");
        }
        result
    }

    fn evaluate_inner(
        &self,
        expression: &str,
        variables: Option<&HashMap<String, Decimal>>,
        use_cache: bool,
    ) -> Result<Decimal> {
        let normalized = normalize_expression(expression);

        let persistent = self.variables.read();
        let key = use_cache.then(|| cache_key(&normalized, &persistent, variables));
        if let Some(key) = &key
            && let Some(value) = self.cache.get(key)
        {
            log::debug!("cache hit for '{normalized}'");
            return Ok(value);
        }

        let tokens = tokenize(&normalized)?;
        let external = self.external.read().clone();
        let custom = self.custom.read();
        let scope = EvalScope::new(
            &persistent,
            variables,
            &self.registry,
            &custom,
            external.as_deref(),
        );
        let value = evaluate_tokens(&tokens, &scope, self.max_depth)?;

        if let Some(key) = key {
            self.cache.put(key, value);
        }
        Ok(value)
    }

    /// Check an expression without requiring its variables to be bound
    ///
    /// Undefined variables are bound to zero for the duration of the check
    /// only, so grammar-level problems are found independently of whether
    /// the caller has supplied real values yet. An expression that parses
    /// but references unbound variables is still reported invalid, listing
    /// the missing names.
    pub fn validate_expression(&self, expression: &str) -> (bool, String) {
        let normalized = normalize_expression(expression);
        let tokens = match tokenize(&normalized) {
            Ok(tokens) => tokens,
            Err(err) => return (false, err.to_string()),
        };

        let persistent = self.variables.read();
        let external = self.external.read().clone();
        let custom = self.custom.read();
        let scope = EvalScope::new(
            &persistent,
            None,
            &self.registry,
            &custom,
            external.as_deref(),
        );

        match evaluate_tokens_lenient(&tokens, &scope, self.max_depth) {
            Err(err) => (false, err.to_string()),
            Ok((_, missing)) if missing.is_empty() => (true, "expression is valid".to_string()),
            Ok((_, missing)) => (false, format!("undefined variables: {}", missing.join(", "))),
        }
    }

    /// Static analysis of what an expression requires: distinct variable
    /// and function names in first-seen order, with no evaluation
    pub fn expression_dependencies(&self, expression: &str) -> Result<ExpressionDependencies> {
        let normalized = normalize_expression(expression);
        let tokens = tokenize(&normalized)?;

        let mut deps = ExpressionDependencies::default();
        for token in &tokens {
            match token.kind {
                TokenKind::Variable => {
                    if !deps.variables.iter().any(|name| name == token.text) {
                        deps.variables.push(token.text.to_string());
                    }
                }
                TokenKind::Function => {
                    if !deps.functions.iter().any(|name| name == token.text) {
                        deps.functions.push(token.text.to_string());
                    }
                }
                _ => {}
            }
        }
        Ok(deps)
    }

    /// Set a persistent variable binding
    pub fn set_variable(&self, name: impl Into<String>, value: impl Into<Decimal>) {
        self.variables.write().insert(name.into(), value.into());
    }

    /// Set several persistent variable bindings at once
    pub fn set_variables(&self, bindings: &HashMap<String, Decimal>) {
        let mut variables = self.variables.write();
        for (name, &value) in bindings {
            variables.insert(name.clone(), value);
        }
    }

    /// Look up a variable in the persistent bindings, then the external
    /// context
    pub fn get_variable(&self, name: &str) -> Result<Decimal> {
        if let Some(&value) = self.variables.read().get(name) {
            return Ok(value);
        }
        if let Some(external) = self.external.read().as_ref()
            && let Some(value) = external.variable(name)
        {
            return Ok(value);
        }
        Err(CalcError::variable_not_found(name))
    }

    /// Register a custom function; the callable receives positional decimal
    /// arguments
    pub fn add_custom_function<F>(&self, name: impl Into<String>, function: F)
    where
        F: Fn(&[Decimal]) -> Result<Decimal> + Send + Sync + 'static,
    {
        self.custom.write().insert(name.into(), Arc::new(function));
    }

    /// Attach the external payroll context; reserved three-character codes
    /// route exclusively through it from then on
    pub fn set_payroll_context(&self, context: Arc<dyn PayrollContext>) {
        *self.external.write() = Some(context);
    }

    /// Snapshot the performance counters
    pub fn performance_stats(&self) -> PerformanceStats {
        let counters = self.counters.lock();
        let cache = self.cache.snapshot();
        let total_ms = counters.total_time.as_secs_f64() * 1000.0;

        PerformanceStats {
            evaluations: counters.evaluations,
            errors: counters.errors,
            cache_hits: cache.hits,
            cache_misses: cache.misses,
            cache_hit_rate: cache.hit_rate,
            cache_size: cache.size,
            total_evaluation_time_ms: total_ms,
            avg_evaluation_time_ms: if counters.evaluations == 0 {
                0.0
            } else {
                total_ms / counters.evaluations as f64
            },
        }
    }

    /// Zero the evaluation and error counters; cache counters are reset by
    /// [`Calculator::clear_cache`]
    pub fn reset_performance_stats(&self) {
        *self.counters.lock() = PerfCounters::default();
    }

    /// Drop all cached results and reset cache counters
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Snapshot the result cache
    pub fn cache_stats(&self) -> CacheSnapshot {
        self.cache.snapshot()
    }
}

impl std::fmt::Debug for Calculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Calculator")
            .field("variables", &self.variables.read().len())
            .field("max_depth", &self.max_depth)
            .field("cache", &self.cache)
            .finish()
    }
}

/// Deterministic cache key: the normalized expression plus a sorted
/// rendering of the merged bindings (persistent layered under transient)
fn cache_key(
    normalized: &str,
    persistent: &FxHashMap<String, Decimal>,
    transient: Option<&HashMap<String, Decimal>>,
) -> String {
    let mut merged: BTreeMap<&str, Decimal> = persistent
        .iter()
        .map(|(name, &value)| (name.as_str(), value))
        .collect();
    if let Some(overlay) = transient {
        for (name, &value) in overlay {
            merged.insert(name.as_str(), value);
        }
    }

    let mut key = String::with_capacity(normalized.len() + merged.len() * 16);
    key.push_str(normalized);
    for (name, value) in merged {
        key.push('|');
        key.push_str(name);
        key.push('=');
        key.push_str(&value.to_string());
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_constants_seeded() {
        let calc = Calculator::new();
        assert_eq!(calc.get_variable("PI").unwrap(), Decimal::PI);
        assert_eq!(calc.get_variable("E").unwrap(), Decimal::E);
        assert_eq!(calc.get_variable("TAU").unwrap(), Decimal::TWO_PI);
    }

    #[test]
    fn test_normalization() {
        assert_eq!(normalize_expression("  2   +\t3 "), "2 + 3");
        assert_eq!(normalize_expression("2 ** 3"), "2 ^ 3");
    }

    #[test]
    fn test_variable_round_trip() {
        let calc = Calculator::new();
        calc.set_variable("GROSS", dec("2500.75"));
        assert_eq!(
            calc.evaluate("GROSS", None, true).unwrap(),
            dec("2500.75")
        );
    }

    #[test]
    fn test_transient_override_isolation() {
        let calc = Calculator::new();
        calc.set_variable("X", Decimal::ONE);

        let mut overrides = HashMap::new();
        overrides.insert("X".to_string(), Decimal::TWO);
        assert_eq!(
            calc.evaluate("X", Some(&overrides), true).unwrap(),
            Decimal::TWO
        );

        // Persistent binding unaffected, and not defeated by the cache.
        assert_eq!(calc.evaluate("X", None, true).unwrap(), Decimal::ONE);
        assert_eq!(calc.get_variable("X").unwrap(), Decimal::ONE);
    }

    #[test]
    fn test_transient_does_not_leak_on_error() {
        let calc = Calculator::new();
        let mut overrides = HashMap::new();
        overrides.insert("Y".to_string(), Decimal::ONE);

        assert!(calc.evaluate("Y / 0", Some(&overrides), true).is_err());
        assert!(calc.get_variable("Y").is_err());
    }

    #[test]
    fn test_cache_hit_and_clear() {
        let calc = Calculator::new();

        let first = calc.evaluate("2 + 3 * 4", None, true).unwrap();
        let stats = calc.cache_stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 1);

        let second = calc.evaluate("2 + 3 * 4", None, true).unwrap();
        assert_eq!(first, second);
        let stats = calc.cache_stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);

        calc.clear_cache();
        calc.evaluate("2 + 3 * 4", None, true).unwrap();
        let stats = calc.cache_stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_whitespace_and_operator_spelling_share_cache_entry() {
        let calc = Calculator::new();
        calc.evaluate("2 ** 3", None, true).unwrap();
        calc.evaluate("2   ^ 3", None, true).unwrap();

        let stats = calc.cache_stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_persistent_change_invalidates_by_key() {
        let calc = Calculator::new();
        calc.set_variable("RATE", Decimal::ONE);
        assert_eq!(calc.evaluate("RATE * 10", None, true).unwrap(), dec("10"));

        calc.set_variable("RATE", Decimal::TWO);
        assert_eq!(calc.evaluate("RATE * 10", None, true).unwrap(), dec("20"));
    }

    #[test]
    fn test_uncached_evaluation() {
        let calc = Calculator::new();
        calc.evaluate("1 + 1", None, false).unwrap();
        calc.evaluate("1 + 1", None, false).unwrap();

        let stats = calc.cache_stats();
        assert_eq!(stats.hits + stats.misses, 0);
        assert_eq!(stats.size, 0);
    }

    #[test]
    fn test_validation_reports_missing_without_binding() {
        let calc = Calculator::new();
        let (valid, message) = calc.validate_expression("UNDEFINED_VAR + 5");
        assert!(!valid);
        assert!(message.contains("UNDEFINED_VAR"));

        // The zero binding used during validation must not leak.
        assert!(calc.get_variable("UNDEFINED_VAR").is_err());
        assert!(calc.evaluate("UNDEFINED_VAR + 5", None, true).is_err());
    }

    #[test]
    fn test_validation_accepts_bound_expression() {
        let calc = Calculator::new();
        calc.set_variable("BONUS", dec("100"));
        let (valid, _) = calc.validate_expression("BONUS * 1.5 + sqrt(16)");
        assert!(valid);
    }

    #[test]
    fn test_validation_rejects_syntax_errors() {
        let calc = Calculator::new();
        let (valid, message) = calc.validate_expression("(2 + 3");
        assert!(!valid);
        assert!(message.contains("Parse error"));
    }

    #[test]
    fn test_dependencies() {
        let calc = Calculator::new();
        let deps = calc
            .expression_dependencies("max(A, B) + A * sqrt(C) - sqrt(D)")
            .unwrap();
        assert_eq!(deps.variables, vec!["A", "B", "C", "D"]);
        assert_eq!(deps.functions, vec!["max", "sqrt"]);
    }

    #[test]
    fn test_custom_function() {
        let calc = Calculator::new();
        calc.add_custom_function("double", |args: &[Decimal]| {
            if args.len() != 1 {
                return Err(CalcError::evaluation_error("double expects 1 argument"));
            }
            Ok(args[0] * Decimal::TWO)
        });
        assert_eq!(
            calc.evaluate("double(21)", None, true).unwrap(),
            dec("42")
        );
    }

    #[test]
    fn test_performance_counters() {
        let calc = Calculator::new();
        calc.evaluate("1 + 1", None, true).unwrap();
        calc.evaluate("1 / 0", None, true).unwrap_err();

        let stats = calc.performance_stats();
        assert_eq!(stats.evaluations, 2);
        assert_eq!(stats.errors, 1);
        assert!(stats.total_evaluation_time_ms >= 0.0);

        calc.reset_performance_stats();
        let stats = calc.performance_stats();
        assert_eq!(stats.evaluations, 0);
        assert_eq!(stats.errors, 0);
    }

    #[test]
    fn test_error_is_calc_error_family() {
        let calc = Calculator::new();
        assert!(matches!(
            calc.evaluate("1 / 0", None, true).unwrap_err(),
            CalcError::DivisionByZero
        ));
        assert!(matches!(
            calc.evaluate("nope(1)", None, true).unwrap_err(),
            CalcError::FunctionNotFound { .. }
        ));
        assert!(matches!(
            calc.evaluate("sqrt(-1)", None, true).unwrap_err(),
            CalcError::EvaluationError { .. }
        ));
    }
}
