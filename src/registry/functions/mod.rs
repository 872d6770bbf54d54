//! Built-in decimal function library
//!
//! Trigonometric and logarithmic functions are computed with binary
//! floating-point primitives and converted back to decimal. The precision
//! loss from that translation is a known limitation of the library, not
//! hidden: results are exact decimals, but only as accurate as the `f64`
//! computation behind them. Rounding, aggregates, and number theory operate
//! on decimals directly.

pub mod aggregate;
pub mod exp_log;
pub mod number_theory;
pub mod rounding;
pub mod trig;

use crate::registry::function::{FunctionError, FunctionRegistry, FunctionResult};
use rust_decimal::prelude::*;

/// Register the whole standard library into a registry
pub fn register_builtins(registry: &mut FunctionRegistry) {
    trig::register(registry);
    exp_log::register(registry);
    rounding::register(registry);
    aggregate::register(registry);
    number_theory::register(registry);
}

/// Bridge a decimal argument into `f64` for a float-backed function
pub(crate) fn to_f64(name: &str, index: usize, value: Decimal) -> FunctionResult<f64> {
    value.to_f64().ok_or_else(|| FunctionError::InvalidArgument {
        name: name.to_string(),
        index,
        message: format!("value {value} is not representable as a float"),
    })
}

/// Bridge a float result back into decimal, rejecting NaN and infinity
pub(crate) fn from_f64(name: &str, value: f64) -> FunctionResult<Decimal> {
    if !value.is_finite() {
        return Err(FunctionError::EvaluationError {
            name: name.to_string(),
            message: "result is not a finite number".to_string(),
        });
    }
    Decimal::from_f64(value).ok_or_else(|| FunctionError::EvaluationError {
        name: name.to_string(),
        message: format!("result {value} does not fit in a decimal"),
    })
}

/// Decimal exponentiation shared by the `^` operator and `pow()`
///
/// Returns an error message on overflow or on a negative base with a
/// fractional exponent, which has no real-valued result.
pub(crate) fn checked_pow(base: Decimal, exponent: Decimal) -> Result<Decimal, String> {
    if base.is_zero() && exponent.is_sign_negative() {
        return Err(format!("zero cannot be raised to negative power {exponent}"));
    }
    if exponent.fract() == Decimal::ZERO {
        let overflow = || format!("power operation {base} ^ {exponent} overflowed");
        let i = exponent.to_i64().ok_or_else(overflow)?;
        return base.checked_powi(i).ok_or_else(overflow);
    }
    if base.is_sign_negative() {
        return Err(format!(
            "negative base {base} with fractional exponent {exponent}"
        ));
    }
    base.checked_powd(exponent)
        .ok_or_else(|| format!("power operation {base} ^ {exponent} overflowed"))
}

/// Require an argument to be a whole number and convert it to `i64`
pub(crate) fn to_integer(name: &str, index: usize, value: Decimal) -> FunctionResult<i64> {
    if value.fract() != Decimal::ZERO {
        return Err(FunctionError::InvalidArgument {
            name: name.to_string(),
            index,
            message: format!("expected an integer, got {value}"),
        });
    }
    value.to_i64().ok_or_else(|| FunctionError::InvalidArgument {
        name: name.to_string(),
        index,
        message: format!("value {value} is out of integer range"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_pow_integer_exponent() {
        let result = checked_pow(Decimal::TWO, Decimal::from(10)).unwrap();
        assert_eq!(result, Decimal::from(1024));
    }

    #[test]
    fn test_checked_pow_rejects_negative_base_fractional_exponent() {
        let err = checked_pow(Decimal::from(-8), Decimal::new(5, 1)).unwrap_err();
        assert!(err.contains("fractional exponent"));
    }

    #[test]
    fn test_from_f64_rejects_non_finite() {
        assert!(from_f64("exp", f64::INFINITY).is_err());
        assert!(from_f64("exp", f64::NAN).is_err());
    }

    #[test]
    fn test_to_integer() {
        assert_eq!(to_integer("factorial", 0, Decimal::from(5)).unwrap(), 5);
        assert!(to_integer("factorial", 0, Decimal::new(25, 1)).is_err());
    }
}
