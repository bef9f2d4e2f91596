//! Expression evaluation for Kconfig.
//!
//! The evaluator reduces an [`Expr`] to a [`Value`] against a caller-supplied
//! [`SymbolEnv`]. It runs on demand and never during parsing.
//!
//! Semantics:
//! - `!n = y`, `!m = n`, `!y = n`
//! - `a && b = min(a, b)`, `a || b = max(a, b)` with `n < m < y`
//! - `=`/`!=` compare tristates when both sides are tristates, otherwise
//!   the string forms (numerically when both are numbers)
//! - unknown symbols are `n`

mod env;
mod value;

pub use env::{Env, SymbolEnv};
pub use value::{ParseTristateError, Tristate, Value};

use std::cmp::Ordering;

use crate::ast::{BinaryOp, Expr};
use crate::span::Span;

/// Errors that can occur during expression evaluation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// Operand of the wrong kind, only raised in [`TypeCheck::Strict`] mode.
    #[error("{span}: type mismatch in '{op}': expected {expected}, found {found}")]
    TypeMismatch {
        op: &'static str,
        expected: &'static str,
        found: &'static str,
        span: Span,
    },
}

/// Result type for evaluation.
pub type EvalResult<T> = Result<T, EvalError>;

/// How operands of the wrong kind are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeCheck {
    /// Coerce: strings in logic are `n` unless they spell `y`/`m`/`n`,
    /// mixed comparisons compare string forms.
    #[default]
    Lenient,
    /// Reject mixing tristate and string operands.
    Strict,
}

/// Expression evaluator.
pub struct Evaluator<'a, E: SymbolEnv + ?Sized> {
    env: &'a E,
    check: TypeCheck,
}

impl<'a, E: SymbolEnv + ?Sized> Evaluator<'a, E> {
    pub fn new(env: &'a E) -> Self {
        Self {
            env,
            check: TypeCheck::Lenient,
        }
    }

    pub fn strict(env: &'a E) -> Self {
        Self {
            env,
            check: TypeCheck::Strict,
        }
    }

    pub fn with_check(mut self, check: TypeCheck) -> Self {
        self.check = check;
        self
    }

    /// Evaluate an expression to a value.
    pub fn eval(&self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Symbol(id) => Ok(self
                .env
                .lookup(&id.name)
                .unwrap_or(Value::Tristate(Tristate::No))),
            Expr::Bool { value, .. } => Ok(Value::Tristate(Tristate::from(*value))),
            Expr::Tristate { value, .. } => Ok(Value::Tristate(*value)),
            Expr::Int { value, .. } => Ok(Value::String(value.to_string())),
            Expr::Hex { value, .. } => Ok(Value::String(format!("{value:#x}"))),
            Expr::String(s) => Ok(Value::String(s.value.clone())),
            Expr::Not { operand, .. } => {
                let t = self.logic_operand("!", operand)?;
                Ok(Value::Tristate(!t))
            }
            Expr::Binary { lhs, op, rhs, .. } => self.eval_binary(lhs, *op, rhs),
        }
    }

    /// Evaluate and view the result as a tristate.
    pub fn eval_tristate(&self, expr: &Expr) -> EvalResult<Tristate> {
        self.logic_operand("condition", expr)
    }

    fn eval_binary(&self, lhs: &Expr, op: BinaryOp, rhs: &Expr) -> EvalResult<Value> {
        let result = match op {
            BinaryOp::And => {
                let a = self.logic_operand("&&", lhs)?;
                let b = self.logic_operand("&&", rhs)?;
                a & b
            }
            BinaryOp::Or => {
                let a = self.logic_operand("||", lhs)?;
                let b = self.logic_operand("||", rhs)?;
                a | b
            }
            cmp => {
                let ordering = self.compare(cmp, lhs, rhs)?;
                let holds = match cmp {
                    BinaryOp::Equal => ordering == Ordering::Equal,
                    BinaryOp::NotEqual => ordering != Ordering::Equal,
                    BinaryOp::Less => ordering == Ordering::Less,
                    BinaryOp::LessEqual => ordering != Ordering::Greater,
                    BinaryOp::Greater => ordering == Ordering::Greater,
                    BinaryOp::GreaterEqual => ordering != Ordering::Less,
                    BinaryOp::And | BinaryOp::Or => false,
                };
                Tristate::from(holds)
            }
        };
        Ok(Value::Tristate(result))
    }

    fn compare(&self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> EvalResult<Ordering> {
        let a = self.eval(lhs)?;
        let b = self.eval(rhs)?;
        match (&a, &b) {
            (Value::Tristate(x), Value::Tristate(y)) => Ok(x.cmp(y)),
            (Value::String(x), Value::String(y)) => Ok(value::compare_strings(x, y)),
            (Value::Tristate(_), Value::String(_)) | (Value::String(_), Value::Tristate(_)) => {
                if self.check == TypeCheck::Strict {
                    let span = if a.as_tristate().is_some() {
                        rhs.span()
                    } else {
                        lhs.span()
                    };
                    return Err(EvalError::TypeMismatch {
                        op: op.symbol(),
                        expected: "tristate",
                        found: "string",
                        span,
                    });
                }
                Ok(value::compare_strings(&a.to_string(), &b.to_string()))
            }
        }
    }

    fn logic_operand(&self, op: &'static str, expr: &Expr) -> EvalResult<Tristate> {
        let value = self.eval(expr)?;
        match value {
            Value::Tristate(t) => Ok(t),
            Value::String(_) if self.check == TypeCheck::Strict => Err(EvalError::TypeMismatch {
                op,
                expected: "tristate",
                found: value.type_name(),
                span: expr.span(),
            }),
            Value::String(_) => Ok(value.to_tristate()),
        }
    }
}

/// Evaluate `expr` against `env` with lenient typing.
pub fn evaluate<E: SymbolEnv + ?Sized>(expr: &Expr, env: &E) -> EvalResult<Value> {
    Evaluator::new(env).eval(expr)
}

/// Evaluate `expr` as a condition, e.g. a `depends on` or `if` block.
pub fn evaluate_tristate<E: SymbolEnv + ?Sized>(expr: &Expr, env: &E) -> EvalResult<Tristate> {
    Evaluator::new(env).eval_tristate(expr)
}
