//! Trigonometric and hyperbolic functions
//!
//! All of these go through the f64 bridge; see the module documentation in
//! [`crate::registry::functions`] for the precision caveat.

use super::{from_f64, to_f64};
use crate::registry::function::{CalcFunction, FunctionError, FunctionRegistry, FunctionResult};
use crate::registry::signature::FunctionSignature;
use rust_decimal::Decimal;
use std::sync::LazyLock;

/// Register all trigonometric functions
pub fn register(registry: &mut FunctionRegistry) {
    registry.register(SinFunction);
    registry.register(CosFunction);
    registry.register(TanFunction);
    registry.register(AsinFunction);
    registry.register(AcosFunction);
    registry.register(AtanFunction);
    registry.register(SinhFunction);
    registry.register(CoshFunction);
    registry.register(TanhFunction);
}

macro_rules! unary_bridge {
    ($struct_name:ident, $name:literal, $op:expr, $doc:literal) => {
        #[doc = $doc]
        pub struct $struct_name;

        impl CalcFunction for $struct_name {
            fn name(&self) -> &str {
                $name
            }

            fn signature(&self) -> &FunctionSignature {
                static SIG: LazyLock<FunctionSignature> =
                    LazyLock::new(|| FunctionSignature::fixed($name, 1));
                &SIG
            }

            fn documentation(&self) -> &str {
                $doc
            }

            fn evaluate(&self, args: &[Decimal]) -> FunctionResult<Decimal> {
                self.validate_args(args)?;
                let x = to_f64($name, 0, args[0])?;
                from_f64($name, ($op)(x))
            }
        }
    };
}

unary_bridge!(SinFunction, "sin", f64::sin, "Sine of an angle in radians");
unary_bridge!(CosFunction, "cos", f64::cos, "Cosine of an angle in radians");
unary_bridge!(TanFunction, "tan", f64::tan, "Tangent of an angle in radians");
unary_bridge!(AtanFunction, "atan", f64::atan, "Arc tangent, in radians");
unary_bridge!(SinhFunction, "sinh", f64::sinh, "Hyperbolic sine");
unary_bridge!(CoshFunction, "cosh", f64::cosh, "Hyperbolic cosine");
unary_bridge!(TanhFunction, "tanh", f64::tanh, "Hyperbolic tangent");

/// Arc sine, in radians; the argument must lie in [-1, 1]
pub struct AsinFunction;

impl CalcFunction for AsinFunction {
    fn name(&self) -> &str {
        "asin"
    }

    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> =
            LazyLock::new(|| FunctionSignature::fixed("asin", 1));
        &SIG
    }

    fn documentation(&self) -> &str {
        "Arc sine, in radians; the argument must lie in [-1, 1]"
    }

    fn evaluate(&self, args: &[Decimal]) -> FunctionResult<Decimal> {
        self.validate_args(args)?;
        if args[0].abs() > Decimal::ONE {
            return Err(FunctionError::InvalidArgument {
                name: self.name().to_string(),
                index: 0,
                message: format!("argument {} is outside [-1, 1]", args[0]),
            });
        }
        let x = to_f64(self.name(), 0, args[0])?;
        from_f64(self.name(), x.asin())
    }
}

/// Arc cosine, in radians; the argument must lie in [-1, 1]
pub struct AcosFunction;

impl CalcFunction for AcosFunction {
    fn name(&self) -> &str {
        "acos"
    }

    fn signature(&self) -> &FunctionSignature {
        static SIG: LazyLock<FunctionSignature> =
            LazyLock::new(|| FunctionSignature::fixed("acos", 1));
        &SIG
    }

    fn documentation(&self) -> &str {
        "Arc cosine, in radians; the argument must lie in [-1, 1]"
    }

    fn evaluate(&self, args: &[Decimal]) -> FunctionResult<Decimal> {
        self.validate_args(args)?;
        if args[0].abs() > Decimal::ONE {
            return Err(FunctionError::InvalidArgument {
                name: self.name().to_string(),
                index: 0,
                message: format!("argument {} is outside [-1, 1]", args[0]),
            });
        }
        let x = to_f64(self.name(), 0, args[0])?;
        from_f64(self.name(), x.acos())
    }
}
