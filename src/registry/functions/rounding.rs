//! Roots, absolute value, and rounding functions

use super::{from_f64, to_f64, to_integer};
use crate::registry::function::{CalcFunction, FunctionError, FunctionRegistry, FunctionResult};
use crate::registry::signature::FunctionSignature;
use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use std::sync::LazyLock;

/// Register root and rounding functions
pub fn register(registry: &mut FunctionRegistry) {
    registry.register(SqrtFunction);
    registry.register(CbrtFunction);
    registry.register(AbsFunction);
    registry.register(FloorFunction);
    registry.register(CeilFunction);
    registry.register(RoundFunction);
}

/// Square root in decimal arithmetic
pub struct SqrtFunction;

impl CalcFunction for SqrtFunction {
    fn name(&self) -> &str {
        "sqrt"
    }

    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> =
            LazyLock::new(|| FunctionSignature::fixed("sqrt", 1));
        &SIG
    }

    fn evaluate(&self, args: &[Decimal]) -> FunctionResult<Decimal> {
        self.validate_args(args)?;
        if args[0].is_sign_negative() {
            return Err(FunctionError::InvalidArgument {
                name: self.name().to_string(),
                index: 0,
                message: format!("square root of negative value {}", args[0]),
            });
        }
        args[0].sqrt().ok_or_else(|| FunctionError::EvaluationError {
            name: self.name().to_string(),
            message: format!("square root of {} failed", args[0]),
        })
    }
}

/// Cube root, defined for negative arguments as well
pub struct CbrtFunction;

impl CalcFunction for CbrtFunction {
    fn name(&self) -> &str {
        "cbrt"
    }

    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> =
            LazyLock::new(|| FunctionSignature::fixed("cbrt", 1));
        &SIG
    }

    fn evaluate(&self, args: &[Decimal]) -> FunctionResult<Decimal> {
        self.validate_args(args)?;
        let x = to_f64(self.name(), 0, args[0])?;
        from_f64(self.name(), x.cbrt())
    }
}

/// Absolute value
pub struct AbsFunction;

impl CalcFunction for AbsFunction {
    fn name(&self) -> &str {
        "abs"
    }

    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> =
            LazyLock::new(|| FunctionSignature::fixed("abs", 1));
        &SIG
    }

    fn evaluate(&self, args: &[Decimal]) -> FunctionResult<Decimal> {
        self.validate_args(args)?;
        Ok(args[0].abs())
    }
}

/// Round towards negative infinity
pub struct FloorFunction;

impl CalcFunction for FloorFunction {
    fn name(&self) -> &str {
        "floor"
    }

    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> =
            LazyLock::new(|| FunctionSignature::fixed("floor", 1));
        &SIG
    }

    fn evaluate(&self, args: &[Decimal]) -> FunctionResult<Decimal> {
        self.validate_args(args)?;
        Ok(args[0].floor())
    }
}

/// Round towards positive infinity
pub struct CeilFunction;

impl CalcFunction for CeilFunction {
    fn name(&self) -> &str {
        "ceil"
    }

    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> =
            LazyLock::new(|| FunctionSignature::fixed("ceil", 1));
        &SIG
    }

    fn evaluate(&self, args: &[Decimal]) -> FunctionResult<Decimal> {
        self.validate_args(args)?;
        Ok(args[0].ceil())
    }
}

/// Half-up rounding to a whole number or to a digit count
pub struct RoundFunction;

impl CalcFunction for RoundFunction {
    fn name(&self) -> &str {
        "round"
    }

    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> =
            LazyLock::new(|| FunctionSignature::ranged("round", 1, 2));
        &SIG
    }

    fn documentation(&self) -> &str {
        "round(x) rounds half-up to a whole number; round(x, digits) keeps the given number of decimal places"
    }

    fn evaluate(&self, args: &[Decimal]) -> FunctionResult<Decimal> {
        self.validate_args(args)?;
        let digits = match args.get(1) {
            None => 0,
            Some(&d) => {
                let d = to_integer(self.name(), 1, d)?;
                u32::try_from(d).map_err(|_| FunctionError::InvalidArgument {
                    name: self.name().to_string(),
                    index: 1,
                    message: format!("digit count must be non-negative, got {d}"),
                })?
            }
        };
        Ok(args[0].round_dp_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_sqrt() {
        let result = SqrtFunction.evaluate(&[Decimal::from(16)]).unwrap();
        assert_eq!(result, Decimal::from(4));
    }

    #[test]
    fn test_sqrt_negative_is_domain_error() {
        let err = SqrtFunction.evaluate(&[Decimal::from(-1)]).unwrap_err();
        assert!(err.to_string().contains("negative"));
    }

    #[test]
    fn test_cbrt_negative() {
        let result = CbrtFunction.evaluate(&[Decimal::from(-8)]).unwrap();
        assert_eq!(result, Decimal::from(-2));
    }

    #[test]
    fn test_floor_ceil() {
        let x = Decimal::from_str("2.5").unwrap();
        assert_eq!(FloorFunction.evaluate(&[x]).unwrap(), Decimal::TWO);
        assert_eq!(CeilFunction.evaluate(&[x]).unwrap(), Decimal::from(3));

        let neg = Decimal::from_str("-2.5").unwrap();
        assert_eq!(FloorFunction.evaluate(&[neg]).unwrap(), Decimal::from(-3));
    }

    #[test]
    fn test_round_half_up() {
        let x = Decimal::from_str("2.5").unwrap();
        assert_eq!(RoundFunction.evaluate(&[x]).unwrap(), Decimal::from(3));

        let pi = Decimal::from_str("3.14159").unwrap();
        let rounded = RoundFunction.evaluate(&[pi, Decimal::TWO]).unwrap();
        assert_eq!(rounded, Decimal::from_str("3.14").unwrap());
    }

    #[test]
    fn test_round_rejects_fractional_digit_count() {
        let x = Decimal::ONE;
        let digits = Decimal::from_str("1.5").unwrap();
        assert!(RoundFunction.evaluate(&[x, digits]).is_err());
        assert!(RoundFunction.evaluate(&[x, Decimal::from(-1)]).is_err());
    }
}
