//! Safe expression calculator for payroll formulas
//!
//! A hand-written tokenizer and recursive-descent evaluator over
//! arbitrary-precision decimals ([`rust_decimal::Decimal`]), for currency
//! computation where float drift is unacceptable. No `eval`, no floats in
//! the arithmetic core; parse and evaluation errors carry positions and
//! human-readable messages.
//!
//! ```
//! use paycalc::Calculator;
//! use rust_decimal::Decimal;
//!
//! let calc = Calculator::new();
//! calc.set_variable("GROSS", Decimal::from(3000));
//! let net = calc.evaluate("GROSS * 0.78", None, true).unwrap();
//! assert_eq!(net, Decimal::from(2340));
//! ```

pub mod cache;
pub mod context;
pub mod engine;
pub mod error;
pub mod parser;
pub mod registry;

// Re-export main types
pub use cache::{CacheConfig, CacheSnapshot, CacheStats, ResultCache};
pub use context::{CustomFunction, PayrollContext, is_payroll_code};
pub use engine::{
    Calculator, CalculatorConfig, ExpressionDependencies, PerformanceStats, normalize_expression,
};
pub use error::{CalcError, Result};
pub use parser::{Token, TokenKind, tokenize};
pub use registry::{CalcFunction, FunctionRegistry, FunctionSignature};

// Re-export the decimal type callers exchange values in
pub use rust_decimal::Decimal;
