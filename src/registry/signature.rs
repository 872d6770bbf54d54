//! Function signatures for arity checking
//!
//! Every calculator function takes and returns decimals, so a signature
//! only carries the accepted argument range.

use serde::Serialize;

/// Arity contract of a registered function
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FunctionSignature {
    /// Function name
    pub name: String,
    /// Minimum number of arguments
    pub min_arity: usize,
    /// Maximum number of arguments (None for variadic)
    pub max_arity: Option<usize>,
}

impl FunctionSignature {
    /// Signature with an exact argument count
    pub fn fixed(name: impl Into<String>, arity: usize) -> Self {
        Self {
            name: name.into(),
            min_arity: arity,
            max_arity: Some(arity),
        }
    }

    /// Signature accepting a bounded range of arguments
    pub fn ranged(name: impl Into<String>, min_arity: usize, max_arity: usize) -> Self {
        Self {
            name: name.into(),
            min_arity,
            max_arity: Some(max_arity),
        }
    }

    /// Variadic signature with a lower bound only
    pub fn variadic(name: impl Into<String>, min_arity: usize) -> Self {
        Self {
            name: name.into(),
            min_arity,
            max_arity: None,
        }
    }

    /// Check whether the given argument count satisfies this signature
    pub fn matches(&self, arg_count: usize) -> bool {
        if arg_count < self.min_arity {
            return false;
        }
        match self.max_arity {
            Some(max) => arg_count <= max,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_signature() {
        let sig = FunctionSignature::fixed("sqrt", 1);
        assert!(!sig.matches(0));
        assert!(sig.matches(1));
        assert!(!sig.matches(2));
    }

    #[test]
    fn test_ranged_signature() {
        let sig = FunctionSignature::ranged("round", 1, 2);
        assert!(!sig.matches(0));
        assert!(sig.matches(1));
        assert!(sig.matches(2));
        assert!(!sig.matches(3));
    }

    #[test]
    fn test_variadic_signature() {
        let sig = FunctionSignature::variadic("max", 1);
        assert!(!sig.matches(0));
        assert!(sig.matches(1));
        assert!(sig.matches(64));

        let sum = FunctionSignature::variadic("sum", 0);
        assert!(sum.matches(0));
    }
}
