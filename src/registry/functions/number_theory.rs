//! Number-theoretic functions over whole-number arguments

use super::to_integer;
use crate::registry::function::{CalcFunction, FunctionError, FunctionRegistry, FunctionResult};
use crate::registry::signature::FunctionSignature;
use rust_decimal::Decimal;
use std::sync::LazyLock;

/// Register number-theoretic functions
pub fn register(registry: &mut FunctionRegistry) {
    registry.register(FactorialFunction);
    registry.register(GcdFunction);
    registry.register(LcmFunction);
}

fn gcd_i64(mut a: i64, mut b: i64) -> i64 {
    a = a.abs();
    b = b.abs();
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn integer_args(name: &str, args: &[Decimal]) -> FunctionResult<Vec<i64>> {
    args.iter()
        .enumerate()
        .map(|(i, &arg)| to_integer(name, i, arg))
        .collect()
}

/// Factorial of a non-negative integer
pub struct FactorialFunction;

impl CalcFunction for FactorialFunction {
    fn name(&self) -> &str {
        "factorial"
    }

    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> =
            LazyLock::new(|| FunctionSignature::fixed("factorial", 1));
        &SIG
    }

    fn documentation(&self) -> &str {
        "factorial(n) for non-negative integer n; fractional or negative arguments are rejected"
    }

    fn evaluate(&self, args: &[Decimal]) -> FunctionResult<Decimal> {
        self.validate_args(args)?;
        let n = to_integer(self.name(), 0, args[0])?;
        if n < 0 {
            return Err(FunctionError::InvalidArgument {
                name: self.name().to_string(),
                index: 0,
                message: format!("factorial of negative number {n}"),
            });
        }

        let mut result = Decimal::ONE;
        for factor in 2..=n {
            result = result.checked_mul(Decimal::from(factor)).ok_or_else(|| {
                FunctionError::EvaluationError {
                    name: self.name().to_string(),
                    message: format!("factorial({n}) overflows the decimal range"),
                }
            })?;
        }
        Ok(result)
    }
}

/// Greatest common divisor of two or more integers
pub struct GcdFunction;

impl CalcFunction for GcdFunction {
    fn name(&self) -> &str {
        "gcd"
    }

    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> =
            LazyLock::new(|| FunctionSignature::variadic("gcd", 2));
        &SIG
    }

    fn evaluate(&self, args: &[Decimal]) -> FunctionResult<Decimal> {
        self.validate_args(args)?;
        let values = integer_args(self.name(), args)?;
        let gcd = values.into_iter().reduce(gcd_i64).unwrap();
        Ok(Decimal::from(gcd))
    }
}

/// Least common multiple of two or more integers
pub struct LcmFunction;

impl CalcFunction for LcmFunction {
    fn name(&self) -> &str {
        "lcm"
    }

    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> =
            LazyLock::new(|| FunctionSignature::variadic("lcm", 2));
        &SIG
    }

    fn evaluate(&self, args: &[Decimal]) -> FunctionResult<Decimal> {
        self.validate_args(args)?;
        let values = integer_args(self.name(), args)?;

        let mut lcm: i64 = 1;
        for value in values {
            if value == 0 {
                lcm = 0;
                break;
            }
            let gcd = gcd_i64(lcm, value);
            lcm = (lcm / gcd).checked_mul(value.abs()).ok_or_else(|| {
                FunctionError::EvaluationError {
                    name: self.name().to_string(),
                    message: "least common multiple overflows the integer range".to_string(),
                }
            })?;
        }
        Ok(Decimal::from(lcm))
    }
}
