//! Logarithmic and exponential functions

use super::{checked_pow, from_f64, to_f64};
use crate::registry::function::{CalcFunction, FunctionError, FunctionRegistry, FunctionResult};
use crate::registry::signature::FunctionSignature;
use rust_decimal::Decimal;
use std::sync::LazyLock;

/// Register all logarithmic/exponential functions
pub fn register(registry: &mut FunctionRegistry) {
    registry.register(LogFunction);
    registry.register(Log10Function);
    registry.register(Log2Function);
    registry.register(ExpFunction);
    registry.register(PowFunction);
}

fn require_positive(name: &str, index: usize, value: Decimal) -> FunctionResult<()> {
    if value <= Decimal::ZERO {
        return Err(FunctionError::InvalidArgument {
            name: name.to_string(),
            index,
            message: format!("logarithm of non-positive value {value}"),
        });
    }
    Ok(())
}

/// Natural logarithm, or logarithm to an explicit base
pub struct LogFunction;

impl CalcFunction for LogFunction {
    fn name(&self) -> &str {
        "log"
    }

    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> =
            LazyLock::new(|| FunctionSignature::ranged("log", 1, 2));
        &SIG
    }

    fn documentation(&self) -> &str {
        "log(x) is the natural logarithm of x; log(x, base) uses the given base"
    }

    fn evaluate(&self, args: &[Decimal]) -> FunctionResult<Decimal> {
        self.validate_args(args)?;
        require_positive(self.name(), 0, args[0])?;
        let x = to_f64(self.name(), 0, args[0])?;

        let result = match args.get(1) {
            None => x.ln(),
            Some(&base) => {
                require_positive(self.name(), 1, base)?;
                if base == Decimal::ONE {
                    return Err(FunctionError::InvalidArgument {
                        name: self.name().to_string(),
                        index: 1,
                        message: "logarithm base cannot be 1".to_string(),
                    });
                }
                x.log(to_f64(self.name(), 1, base)?)
            }
        };
        from_f64(self.name(), result)
    }
}

/// Base-10 logarithm
pub struct Log10Function;

impl CalcFunction for Log10Function {
    fn name(&self) -> &str {
        "log10"
    }

    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> =
            LazyLock::new(|| FunctionSignature::fixed("log10", 1));
        &SIG
    }

    fn evaluate(&self, args: &[Decimal]) -> FunctionResult<Decimal> {
        self.validate_args(args)?;
        require_positive(self.name(), 0, args[0])?;
        let x = to_f64(self.name(), 0, args[0])?;
        from_f64(self.name(), x.log10())
    }
}

/// Base-2 logarithm
pub struct Log2Function;

impl CalcFunction for Log2Function {
    fn name(&self) -> &str {
        "log2"
    }

    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> =
            LazyLock::new(|| FunctionSignature::fixed("log2", 1));
        &SIG
    }

    fn evaluate(&self, args: &[Decimal]) -> FunctionResult<Decimal> {
        self.validate_args(args)?;
        require_positive(self.name(), 0, args[0])?;
        let x = to_f64(self.name(), 0, args[0])?;
        from_f64(self.name(), x.log2())
    }
}

/// e raised to the given power
pub struct ExpFunction;

impl CalcFunction for ExpFunction {
    fn name(&self) -> &str {
        "exp"
    }

    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> =
            LazyLock::new(|| FunctionSignature::fixed("exp", 1));
        &SIG
    }

    fn evaluate(&self, args: &[Decimal]) -> FunctionResult<Decimal> {
        self.validate_args(args)?;
        let x = to_f64(self.name(), 0, args[0])?;
        from_f64(self.name(), x.exp())
    }
}

/// Base raised to an exponent, in exact decimal arithmetic
pub struct PowFunction;

impl CalcFunction for PowFunction {
    fn name(&self) -> &str {
        "pow"
    }

    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> =
            LazyLock::new(|| FunctionSignature::fixed("pow", 2));
        &SIG
    }

    fn documentation(&self) -> &str {
        "pow(base, exponent); equivalent to the ^ operator"
    }

    fn evaluate(&self, args: &[Decimal]) -> FunctionResult<Decimal> {
        self.validate_args(args)?;
        checked_pow(args[0], args[1]).map_err(|message| FunctionError::EvaluationError {
            name: self.name().to_string(),
            message,
        })
    }
}
