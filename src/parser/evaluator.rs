//! Fused recursive-descent parser and evaluator
//!
//! Parsing and evaluation happen in one pass over the token vector; no AST
//! is retained. One method per grammar level, lowest precedence first:
//!
//! ```text
//! expression := term (('+'|'-') term)*
//! term       := factor (('*'|'/'|'%') factor)*
//! factor     := unary ('^' factor)?            right-associative
//! unary      := ('+'|'-')? unary | atom
//! atom       := NUMBER | FUNCTION '(' args ')' | VARIABLE | '(' expression ')'
//! ```
//!
//! Nesting depth is bounded; exceeding the limit is reported as a parse
//! error instead of overflowing the stack on adversarial input.

use super::tokenizer::{Token, TokenKind};
use crate::context::EvalScope;
use crate::error::{CalcError, Result};
use crate::registry::functions::checked_pow;
use rust_decimal::Decimal;
use std::str::FromStr;

struct Evaluator<'a, 'input> {
    tokens: &'a [Token<'input>],
    pos: usize,
    scope: &'a EvalScope<'a>,
    depth: usize,
    max_depth: usize,
    /// When set, undefined variables evaluate to zero and are recorded
    /// instead of failing (validation mode)
    lenient: bool,
    missing: Vec<String>,
}

/// Evaluate a token sequence to a single decimal
///
/// The entire stream must be consumed; leftover tokens are a parse error
/// citing the position of the first unconsumed one.
pub fn evaluate_tokens(
    tokens: &[Token<'_>],
    scope: &EvalScope<'_>,
    max_depth: usize,
) -> Result<Decimal> {
    let (value, _) = run(tokens, scope, max_depth, false)?;
    Ok(value)
}

/// Evaluate with undefined variables transparently bound to zero
///
/// Returns the result together with the distinct undefined variable names
/// in first-seen order. Used by expression validation, never by a real
/// evaluation.
pub fn evaluate_tokens_lenient(
    tokens: &[Token<'_>],
    scope: &EvalScope<'_>,
    max_depth: usize,
) -> Result<(Decimal, Vec<String>)> {
    run(tokens, scope, max_depth, true)
}

fn run(
    tokens: &[Token<'_>],
    scope: &EvalScope<'_>,
    max_depth: usize,
    lenient: bool,
) -> Result<(Decimal, Vec<String>)> {
    if tokens.is_empty() {
        return Err(CalcError::parse_error(0, "empty expression"));
    }

    let mut evaluator = Evaluator {
        tokens,
        pos: 0,
        scope,
        depth: 0,
        max_depth,
        lenient,
        missing: Vec::new(),
    };

    let value = evaluator.expression()?;
    if let Some(token) = evaluator.peek() {
        return Err(CalcError::parse_error(
            token.position,
            format!("unexpected token '{}'", token.text),
        ));
    }
    Ok((value, evaluator.missing))
}

impl<'a, 'input> Evaluator<'a, 'input> {
    #[inline]
    fn peek(&self) -> Option<&Token<'input>> {
        self.tokens.get(self.pos)
    }

    /// Position just past the last token, for end-of-input errors
    fn end_position(&self) -> usize {
        self.tokens
            .last()
            .map(|t| t.position + t.text.len())
            .unwrap_or(0)
    }

    fn current_position(&self) -> usize {
        self.peek()
            .map(|t| t.position)
            .unwrap_or_else(|| self.end_position())
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(CalcError::parse_error(
                self.current_position(),
                format!("expression nesting exceeds maximum depth {}", self.max_depth),
            ));
        }
        Ok(())
    }

    #[inline]
    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// If the next token is one of the given operators, consume and return it
    fn take_operator(&mut self, ops: &[&'static str]) -> Option<&'static str> {
        let token = self.peek()?;
        let (kind, text) = (token.kind, token.text);
        for &op in ops {
            if kind == TokenKind::Operator && text == op {
                self.pos += 1;
                return Some(op);
            }
        }
        None
    }

    fn overflow(&self, operation: &str) -> CalcError {
        CalcError::evaluation_error(format!("{operation} overflowed the decimal range"))
    }

    fn expression(&mut self) -> Result<Decimal> {
        self.enter()?;
        let mut value = self.term()?;
        while let Some(op) = self.take_operator(&["+", "-"]) {
            let rhs = self.term()?;
            value = match op {
                "+" => value.checked_add(rhs).ok_or_else(|| self.overflow("addition"))?,
                _ => value.checked_sub(rhs).ok_or_else(|| self.overflow("subtraction"))?,
            };
        }
        self.leave();
        Ok(value)
    }

    fn term(&mut self) -> Result<Decimal> {
        let mut value = self.factor()?;
        while let Some(op) = self.take_operator(&["*", "/", "%"]) {
            let rhs = self.factor()?;
            value = match op {
                "*" => value
                    .checked_mul(rhs)
                    .ok_or_else(|| self.overflow("multiplication"))?,
                "/" => {
                    if rhs.is_zero() {
                        return Err(CalcError::division_by_zero());
                    }
                    value.checked_div(rhs).ok_or_else(|| self.overflow("division"))?
                }
                _ => {
                    if rhs.is_zero() {
                        return Err(CalcError::division_by_zero());
                    }
                    value.checked_rem(rhs).ok_or_else(|| self.overflow("modulo"))?
                }
            };
        }
        Ok(value)
    }

    /// Exponentiation recurses on the right operand, so `2^3^2` is
    /// `2^(3^2)` = 512
    fn factor(&mut self) -> Result<Decimal> {
        let base = self.unary()?;
        if self.take_operator(&["^"]).is_some() {
            let exponent = self.factor()?;
            return checked_pow(base, exponent).map_err(CalcError::evaluation_error);
        }
        Ok(base)
    }

    /// Unary operators chain: `--5` negates twice, `+-5` is -5
    fn unary(&mut self) -> Result<Decimal> {
        self.enter()?;
        let value = if let Some(op) = self.take_operator(&["+", "-"]) {
            let operand = self.unary()?;
            if op == "-" { -operand } else { operand }
        } else {
            self.atom()?
        };
        self.leave();
        Ok(value)
    }

    fn atom(&mut self) -> Result<Decimal> {
        let Some(token) = self.peek() else {
            return Err(CalcError::parse_error(
                self.end_position(),
                "unexpected end of expression",
            ));
        };
        let (kind, text, position) = (token.kind, token.text, token.position);

        match kind {
            TokenKind::Number => {
                self.pos += 1;
                Decimal::from_str(text).map_err(|_| {
                    CalcError::parse_error(position, format!("invalid number literal '{text}'"))
                })
            }
            TokenKind::Variable => {
                self.pos += 1;
                match self.scope.variable(text) {
                    Some(value) => Ok(value),
                    None if self.lenient => {
                        if !self.missing.iter().any(|name| name == text) {
                            self.missing.push(text.to_string());
                        }
                        Ok(Decimal::ZERO)
                    }
                    None => Err(CalcError::variable_not_found(text)),
                }
            }
            TokenKind::Function => {
                self.pos += 1;
                self.call(text)
            }
            TokenKind::LeftParen => {
                self.pos += 1;
                let value = self.expression()?;
                match self.peek() {
                    Some(t) if t.kind == TokenKind::RightParen => {
                        self.pos += 1;
                        Ok(value)
                    }
                    _ => Err(CalcError::parse_error(
                        self.current_position(),
                        "missing closing parenthesis",
                    )),
                }
            }
            _ => Err(CalcError::parse_error(
                position,
                format!("unexpected token '{text}'"),
            )),
        }
    }

    /// Parse `'(' [expression (',' expression)*] ')'` and dispatch through
    /// the scope's three resolution tiers
    fn call(&mut self, name: &str) -> Result<Decimal> {
        match self.peek() {
            Some(t) if t.kind == TokenKind::LeftParen => self.pos += 1,
            _ => {
                return Err(CalcError::parse_error(
                    self.current_position(),
                    format!("expected '(' after function name '{name}'"),
                ));
            }
        }

        let mut args = Vec::new();
        if matches!(self.peek(), Some(t) if t.kind == TokenKind::RightParen) {
            self.pos += 1;
        } else {
            loop {
                args.push(self.expression()?);
                match self.peek() {
                    Some(t) if t.kind == TokenKind::Comma => self.pos += 1,
                    Some(t) if t.kind == TokenKind::RightParen => {
                        self.pos += 1;
                        break;
                    }
                    _ => {
                        return Err(CalcError::parse_error(
                            self.current_position(),
                            format!("expected ',' or ')' in call to '{name}'"),
                        ));
                    }
                }
            }
        }

        self.scope.call_function(name, &args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CustomFunction;
    use crate::parser::tokenizer::tokenize;
    use crate::registry::standard_registry;
    use rustc_hash::FxHashMap;

    fn eval(expr: &str) -> Result<Decimal> {
        let mut persistent = FxHashMap::default();
        persistent.insert("PI".to_string(), Decimal::PI);
        persistent.insert("X".to_string(), Decimal::from(7));
        eval_with(expr, &persistent)
    }

    fn eval_with(expr: &str, persistent: &FxHashMap<String, Decimal>) -> Result<Decimal> {
        let tokens = tokenize(expr)?;
        let registry = standard_registry();
        let custom: FxHashMap<String, CustomFunction> = FxHashMap::default();
        let scope = EvalScope::new(persistent, None, &registry, &custom, None);
        evaluate_tokens(&tokens, &scope, 64)
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("2 + 3 * 4").unwrap(), Decimal::from(14));
        assert_eq!(eval("(2 + 3) * 4").unwrap(), Decimal::from(20));
        assert_eq!(eval("10 - 4 - 3").unwrap(), Decimal::from(3));
        assert_eq!(eval("100 / 10 / 2").unwrap(), Decimal::from(5));
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_eq!(eval("2 ^ 3 ^ 2").unwrap(), Decimal::from(512));
        assert_eq!(eval("2 ^ 10").unwrap(), Decimal::from(1024));
    }

    #[test]
    fn test_unary_chaining() {
        assert_eq!(eval("--5").unwrap(), Decimal::from(5));
        assert_eq!(eval("+-5").unwrap(), Decimal::from(-5));
        assert_eq!(eval("-X").unwrap(), Decimal::from(-7));
        assert_eq!(eval("3 * -2").unwrap(), Decimal::from(-6));
    }

    #[test]
    fn test_modulo() {
        assert_eq!(eval("10 % 3").unwrap(), Decimal::ONE);
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval("1 / 0").unwrap_err(), CalcError::DivisionByZero);
        assert_eq!(eval("5 % 0").unwrap_err(), CalcError::DivisionByZero);
        assert_eq!(eval("1 / (2 - 2)").unwrap_err(), CalcError::DivisionByZero);
    }

    #[test]
    fn test_variable_resolution() {
        assert_eq!(eval("X + 1").unwrap(), Decimal::from(8));
        let err = eval("UNDEFINED + 1").unwrap_err();
        assert_eq!(
            err,
            CalcError::VariableNotFound {
                name: "UNDEFINED".to_string()
            }
        );
    }

    #[test]
    fn test_function_calls() {
        assert_eq!(eval("sqrt(16)").unwrap(), Decimal::from(4));
        assert_eq!(eval("max(1, 5, 3)").unwrap(), Decimal::from(5));
        assert_eq!(eval("sum()").unwrap(), Decimal::ZERO);
        assert_eq!(eval("min(2 + 3, 4)").unwrap(), Decimal::from(4));
    }

    #[test]
    fn test_unknown_function() {
        let err = eval("frobnicate(1)").unwrap_err();
        assert!(matches!(err, CalcError::FunctionNotFound { .. }));
    }

    #[test]
    fn test_empty_expression() {
        let err = eval("").unwrap_err();
        assert!(matches!(err, CalcError::ParseError { .. }));
    }

    #[test]
    fn test_unbalanced_parentheses() {
        assert!(matches!(
            eval("(2 + 3 * 4").unwrap_err(),
            CalcError::ParseError { .. }
        ));
        assert!(matches!(
            eval("2 + 3) * 4").unwrap_err(),
            CalcError::ParseError { .. }
        ));
    }

    #[test]
    fn test_leftover_tokens_cite_position() {
        let err = eval("1 2").unwrap_err();
        assert_eq!(
            err,
            CalcError::ParseError {
                position: 2,
                message: "unexpected token '2'".to_string()
            }
        );
    }

    #[test]
    fn test_trailing_operator() {
        let err = eval("1 +").unwrap_err();
        assert!(matches!(err, CalcError::ParseError { .. }));
    }

    #[test]
    fn test_depth_limit() {
        let deep = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        let err = eval(&deep).unwrap_err();
        assert!(matches!(err, CalcError::ParseError { .. }));
        assert!(err.to_string().contains("depth"));

        // A reasonable nesting level stays well under the limit.
        assert_eq!(eval("((((1))))").unwrap(), Decimal::ONE);
    }

    #[test]
    fn test_lenient_mode_records_missing() {
        let tokens = tokenize("UNDEF_A + UNDEF_B + UNDEF_A + 5").unwrap();
        let persistent = FxHashMap::default();
        let registry = standard_registry();
        let custom: FxHashMap<String, CustomFunction> = FxHashMap::default();
        let scope = EvalScope::new(&persistent, None, &registry, &custom, None);

        let (value, missing) = evaluate_tokens_lenient(&tokens, &scope, 64).unwrap();
        assert_eq!(value, Decimal::from(5));
        assert_eq!(missing, vec!["UNDEF_A".to_string(), "UNDEF_B".to_string()]);
    }

    #[test]
    fn test_power_overflow_is_evaluation_error() {
        let err = eval("10 ^ 100").unwrap_err();
        assert!(matches!(err, CalcError::EvaluationError { .. }));
        assert!(err.to_string().contains("overflow"));
    }
}
