//! Evaluates the constant expression that follows `#if`/`#elif`, after macro expansion and
//! `defined` substitution have already reduced the line to a flat run of tokens.
//!
//! Arithmetic is performed in wrapping `i64`, matching what a 64-bit C preprocessor does;
//! division and modulo by zero are reported as directive errors rather than panicking. `&&`
//! and `||` short-circuit, so a division by zero that's never reached (e.g. the right-hand
//! side of `0 && 1 / 0`) is not an error. String literals are accepted as atoms too, the same
//! way GNU cpp's `#if` grammar admits them: `==`/`!=` compare them directly, and a bare string
//! used as the whole condition is truthy iff it's non-empty, the same rule applied to a bare
//! integer.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalToken {
    Int(i64),
    Str(String),
    Ident(String),
    Punct(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("unexpected token `{0}` in `#if` expression")]
    UnexpectedToken(String),
    #[error("`#if` expression ends unexpectedly")]
    UnexpectedEnd,
    #[error("division or modulo by zero in `#if` expression")]
    DivisionByZero,
    #[error("`{0}` is not a macro and evaluates to 0 in `#if` expression")]
    UnknownIdentifier(String),
    #[error("string literal `{0}` used where `#if` expects a number")]
    StringInArithmeticContext(String),
}

#[derive(Debug, Clone)]
enum Expr {
    Int(i64),
    Str(String),
    Ident(String),
    Unary(&'static str, Box<Expr>),
    Binary(&'static str, Box<Expr>, Box<Expr>),
}

/// What an [`Expr`] reduces to. Kept separate from the `i64` `apply_binary` deals in so that
/// `==`/`!=` between two strings can compare spellings instead of forcing both sides through
/// [`Value::as_int`] first.
#[derive(Debug, Clone)]
enum Value {
    Int(i64),
    Str(String),
}

impl Value {
    fn as_int(self) -> Result<i64, EvalError> {
        match self {
            Value::Int(value) => Ok(value),
            Value::Str(s) => Err(EvalError::StringInArithmeticContext(s)),
        }
    }
}

struct Parser<'a> {
    tokens: &'a [EvalToken],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&EvalToken> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<EvalToken> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn expect_punct(&mut self, p: &'static str) -> Result<(), EvalError> {
        match self.bump() {
            Some(EvalToken::Punct(found)) if found == p => Ok(()),
            Some(other) => Err(EvalError::UnexpectedToken(format!("{other:?}"))),
            None => Err(EvalError::UnexpectedEnd),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, EvalError> {
        self.parse_binary(0)
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let Some(EvalToken::Punct(op)) = self.peek() else {
                break;
            };
            let Some(prec) = binary_precedence(op) else {
                break;
            };
            if prec < min_precedence {
                break;
            }
            let op = *op;
            self.bump();
            let rhs = self.parse_binary(prec + 1)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, EvalError> {
        match self.peek() {
            Some(EvalToken::Punct(op @ ("!" | "~" | "-" | "+"))) => {
                let op = *op;
                self.bump();
                Ok(Expr::Unary(op, Box::new(self.parse_unary()?)))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, EvalError> {
        match self.bump() {
            Some(EvalToken::Int(value)) => Ok(Expr::Int(value)),
            Some(EvalToken::Str(value)) => Ok(Expr::Str(value)),
            Some(EvalToken::Ident(name)) => Ok(Expr::Ident(name)),
            Some(EvalToken::Punct("(")) => {
                let value = self.parse_expr()?;
                self.expect_punct(")")?;
                Ok(value)
            }
            Some(other) => Err(EvalError::UnexpectedToken(format!("{other:?}"))),
            None => Err(EvalError::UnexpectedEnd),
        }
    }
}

fn binary_precedence(op: &str) -> Option<u8> {
    Some(match op {
        "||" => 1,
        "&&" => 2,
        "|" => 3,
        "^" => 4,
        "&" => 5,
        "==" | "!=" => 6,
        "<" | "<=" | ">" | ">=" => 7,
        "<<" | ">>" => 8,
        "+" | "-" => 9,
        "*" | "/" | "%" => 10,
        _ => return None,
    })
}

fn eval_value(expr: &Expr) -> Result<Value, EvalError> {
    match expr {
        Expr::Int(value) => Ok(Value::Int(*value)),
        Expr::Str(value) => Ok(Value::Str(value.clone())),
        Expr::Ident(name) => Err(EvalError::UnknownIdentifier(name.clone())),
        Expr::Unary(op, operand) => {
            let value = eval_value(operand)?.as_int()?;
            Ok(Value::Int(match *op {
                "!" => (value == 0) as i64,
                "~" => !value,
                "-" => value.wrapping_neg(),
                "+" => value,
                _ => unreachable!("unhandled unary operator {op}"),
            }))
        }
        Expr::Binary("&&", lhs, rhs) => {
            if eval_value(lhs)?.as_int()? == 0 {
                Ok(Value::Int(0))
            } else {
                Ok(Value::Int((eval_value(rhs)?.as_int()? != 0) as i64))
            }
        }
        Expr::Binary("||", lhs, rhs) => {
            if eval_value(lhs)?.as_int()? != 0 {
                Ok(Value::Int(1))
            } else {
                Ok(Value::Int((eval_value(rhs)?.as_int()? != 0) as i64))
            }
        }
        Expr::Binary(op @ ("==" | "!="), lhs, rhs) => {
            let lhs = eval_value(lhs)?;
            let rhs = eval_value(rhs)?;
            let equal = if let (Value::Str(a), Value::Str(b)) = (&lhs, &rhs) {
                a == b
            } else {
                lhs.as_int()? == rhs.as_int()?
            };
            Ok(Value::Int((equal == (*op == "==")) as i64))
        }
        Expr::Binary(op, lhs, rhs) => {
            let lhs = eval_value(lhs)?.as_int()?;
            let rhs = eval_value(rhs)?.as_int()?;
            Ok(Value::Int(apply_binary(op, lhs, rhs)?))
        }
    }
}

fn apply_binary(op: &str, lhs: i64, rhs: i64) -> Result<i64, EvalError> {
    Ok(match op {
        "|" => lhs | rhs,
        "^" => lhs ^ rhs,
        "&" => lhs & rhs,
        "==" => (lhs == rhs) as i64,
        "!=" => (lhs != rhs) as i64,
        "<" => (lhs < rhs) as i64,
        "<=" => (lhs <= rhs) as i64,
        ">" => (lhs > rhs) as i64,
        ">=" => (lhs >= rhs) as i64,
        "<<" => lhs.wrapping_shl(rhs as u32 & 63),
        ">>" => lhs.wrapping_shr(rhs as u32 & 63),
        "+" => lhs.wrapping_add(rhs),
        "-" => lhs.wrapping_sub(rhs),
        "*" => lhs.wrapping_mul(rhs),
        "/" => {
            if rhs == 0 {
                return Err(EvalError::DivisionByZero);
            }
            lhs.wrapping_div(rhs)
        }
        "%" => {
            if rhs == 0 {
                return Err(EvalError::DivisionByZero);
            }
            lhs.wrapping_rem(rhs)
        }
        _ => unreachable!("unhandled binary operator {op}"),
    })
}

/// Evaluates a fully macro-expanded, `defined`-resolved `#if`/`#elif` condition.
pub fn evaluate(tokens: &[EvalToken]) -> Result<i64, EvalError> {
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expr()?;
    if parser.pos != tokens.len() {
        return Err(EvalError::UnexpectedToken(format!(
            "{:?}",
            tokens[parser.pos]
        )));
    }
    match eval_value(&expr)? {
        Value::Int(value) => Ok(value),
        Value::Str(s) => Ok(!s.is_empty() as i64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> EvalToken {
        EvalToken::Int(n)
    }
    fn p(s: &'static str) -> EvalToken {
        EvalToken::Punct(s)
    }

    #[test]
    fn precedence_and_associativity() {
        let tokens = [int(1), p("+"), int(2), p("*"), int(3)];
        assert_eq!(evaluate(&tokens), Ok(7));
    }

    #[test]
    fn parens_override_precedence() {
        let tokens = [p("("), int(1), p("+"), int(2), p(")"), p("*"), int(3)];
        assert_eq!(evaluate(&tokens), Ok(9));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let tokens = [int(1), p("/"), int(0)];
        assert_eq!(evaluate(&tokens), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn and_short_circuits_past_division_by_zero() {
        let tokens = [int(0), p("&&"), int(1), p("/"), int(0)];
        assert_eq!(evaluate(&tokens), Ok(0));
    }

    #[test]
    fn or_short_circuits_past_division_by_zero() {
        let tokens = [int(1), p("||"), int(1), p("/"), int(0)];
        assert_eq!(evaluate(&tokens), Ok(1));
    }

    #[test]
    fn bitwise_and_comparison_operators() {
        let tokens = [int(6), p("&"), int(3), p("=="), int(2)];
        assert_eq!(evaluate(&tokens), Ok(1));
    }

    #[test]
    fn equal_string_literals_evaluate_to_true() {
        let tokens = [EvalToken::Str("a".to_string()), p("=="), EvalToken::Str("a".to_string())];
        assert_eq!(evaluate(&tokens), Ok(1));
    }

    #[test]
    fn unequal_string_literals_evaluate_to_false() {
        let tokens = [EvalToken::Str("a".to_string()), p("!="), EvalToken::Str("b".to_string())];
        assert_eq!(evaluate(&tokens), Ok(0));
    }

    #[test]
    fn a_bare_nonempty_string_is_truthy() {
        let tokens = [EvalToken::Str("a".to_string())];
        assert_eq!(evaluate(&tokens), Ok(1));
    }

    #[test]
    fn a_bare_empty_string_is_falsy() {
        let tokens = [EvalToken::Str(String::new())];
        assert_eq!(evaluate(&tokens), Ok(0));
    }

    #[test]
    fn a_string_in_arithmetic_context_is_an_error() {
        let tokens = [EvalToken::Str("a".to_string()), p("+"), int(1)];
        assert_eq!(
            evaluate(&tokens),
            Err(EvalError::StringInArithmeticContext("a".to_string()))
        );
    }
}
