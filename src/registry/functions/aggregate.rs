//! Variadic aggregate functions

use crate::registry::function::{CalcFunction, FunctionError, FunctionRegistry, FunctionResult};
use crate::registry::signature::FunctionSignature;
use rust_decimal::Decimal;
use std::sync::LazyLock;

/// Register aggregate functions
pub fn register(registry: &mut FunctionRegistry) {
    registry.register(MinFunction);
    registry.register(MaxFunction);
    registry.register(SumFunction);
    registry.register(AvgFunction);
}

fn checked_sum(name: &str, args: &[Decimal]) -> FunctionResult<Decimal> {
    let mut total = Decimal::ZERO;
    for &arg in args {
        total = total
            .checked_add(arg)
            .ok_or_else(|| FunctionError::EvaluationError {
                name: name.to_string(),
                message: "sum overflowed the decimal range".to_string(),
            })?;
    }
    Ok(total)
}

/// Smallest of one or more arguments
pub struct MinFunction;

impl CalcFunction for MinFunction {
    fn name(&self) -> &str {
        "min"
    }

    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> =
            LazyLock::new(|| FunctionSignature::variadic("min", 1));
        &SIG
    }

    fn evaluate(&self, args: &[Decimal]) -> FunctionResult<Decimal> {
        self.validate_args(args)?;
        Ok(args.iter().copied().min().unwrap())
    }
}

/// Largest of one or more arguments
pub struct MaxFunction;

impl CalcFunction for MaxFunction {
    fn name(&self) -> &str {
        "max"
    }

    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> =
            LazyLock::new(|| FunctionSignature::variadic("max", 1));
        &SIG
    }

    fn evaluate(&self, args: &[Decimal]) -> FunctionResult<Decimal> {
        self.validate_args(args)?;
        Ok(args.iter().copied().max().unwrap())
    }
}

/// Sum of the arguments; zero when called with none
pub struct SumFunction;

impl CalcFunction for SumFunction {
    fn name(&self) -> &str {
        "sum"
    }

    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> =
            LazyLock::new(|| FunctionSignature::variadic("sum", 0));
        &SIG
    }

    fn evaluate(&self, args: &[Decimal]) -> FunctionResult<Decimal> {
        self.validate_args(args)?;
        checked_sum(self.name(), args)
    }
}

/// Arithmetic mean of one or more arguments
pub struct AvgFunction;

impl CalcFunction for AvgFunction {
    fn name(&self) -> &str {
        "avg"
    }

    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> =
            LazyLock::new(|| FunctionSignature::variadic("avg", 1));
        &SIG
    }

    fn evaluate(&self, args: &[Decimal]) -> FunctionResult<Decimal> {
        self.validate_args(args)?;
        let total = checked_sum(self.name(), args)?;
        total
            .checked_div(Decimal::from(args.len()))
            .ok_or_else(|| FunctionError::EvaluationError {
                name: self.name().to_string(),
                message: "average overflowed the decimal range".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_min_max() {
        let args = [dec("1"), dec("5"), dec("3")];
        assert_eq!(MinFunction.evaluate(&args).unwrap(), dec("1"));
        assert_eq!(MaxFunction.evaluate(&args).unwrap(), dec("5"));
    }

    #[test]
    fn test_min_requires_an_argument() {
        assert!(MinFunction.evaluate(&[]).is_err());
        assert!(MaxFunction.evaluate(&[]).is_err());
        assert!(AvgFunction.evaluate(&[]).is_err());
    }

    #[test]
    fn test_sum_of_nothing_is_zero() {
        assert_eq!(SumFunction.evaluate(&[]).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_avg_is_exact_decimal() {
        let args = [dec("1"), dec("2")];
        assert_eq!(AvgFunction.evaluate(&args).unwrap(), dec("1.5"));
    }

    #[test]
    fn test_sum_overflow() {
        let near_max = Decimal::MAX;
        assert!(SumFunction.evaluate(&[near_max, near_max]).is_err());
    }
}
