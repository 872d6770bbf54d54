//! Error types for calculator operations
//!
//! All failures surface as one `CalcError` family so callers can catch
//! broadly or match on a specific kind. Messages are human-readable; there
//! are no numeric error codes.

use thiserror::Error;

/// Result type alias for calculator operations
pub type Result<T> = std::result::Result<T, CalcError>;

/// Error type covering every calculator failure mode
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    /// Malformed syntax: unknown character, unbalanced parentheses,
    /// unexpected or trailing tokens, empty expression
    #[error("Parse error at position {position}: {message}")]
    ParseError {
        /// 0-based offset in the input where the error occurred
        position: usize,
        /// Human-readable error message
        message: String,
    },

    /// Identifier with no resolvable binding anywhere (persistent,
    /// transient, or external context)
    #[error("Variable '{name}' not found")]
    VariableNotFound {
        /// Name of the unresolved variable
        name: String,
    },

    /// Function-call identifier matching none of the resolution tiers
    #[error("Function '{name}' not found")]
    FunctionNotFound {
        /// Name of the unresolved function
        name: String,
    },

    /// Denominator or modulus evaluating to exactly zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Domain violations in library functions, custom/external function
    /// failures, and power-operation overflow, with the originating
    /// message preserved
    #[error("Evaluation error: {message}")]
    EvaluationError {
        /// Human-readable evaluation error message
        message: String,
    },
}

impl CalcError {
    /// Create a parse error
    pub fn parse_error(position: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            position,
            message: message.into(),
        }
    }

    /// Create a variable-not-found error
    pub fn variable_not_found(name: impl Into<String>) -> Self {
        Self::VariableNotFound { name: name.into() }
    }

    /// Create a function-not-found error
    pub fn function_not_found(name: impl Into<String>) -> Self {
        Self::FunctionNotFound { name: name.into() }
    }

    /// Create a division-by-zero error
    pub fn division_by_zero() -> Self {
        Self::DivisionByZero
    }

    /// Create an evaluation error
    pub fn evaluation_error(message: impl Into<String>) -> Self {
        Self::EvaluationError {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_constructors() {
        let parse_err = CalcError::parse_error(5, "unexpected token");
        assert!(matches!(
            parse_err,
            CalcError::ParseError { position: 5, .. }
        ));

        let var_err = CalcError::variable_not_found("GROSS");
        assert!(matches!(var_err, CalcError::VariableNotFound { .. }));

        let func_err = CalcError::function_not_found("frobnicate");
        assert!(matches!(func_err, CalcError::FunctionNotFound { .. }));

        let div_err = CalcError::division_by_zero();
        assert!(matches!(div_err, CalcError::DivisionByZero));
    }

    #[test]
    fn test_error_display() {
        let err = CalcError::parse_error(2, "unexpected character '&'");
        assert_eq!(
            err.to_string(),
            "Parse error at position 2: unexpected character '&'"
        );

        let err = CalcError::variable_not_found("NET_SALARY");
        assert!(err.to_string().contains("NET_SALARY"));

        let err = CalcError::evaluation_error("factorial of negative number");
        assert!(err.to_string().contains("factorial of negative number"));
    }
}
