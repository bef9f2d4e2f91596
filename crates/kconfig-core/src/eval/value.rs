//! Runtime values and tristate arithmetic.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{BitAnd, BitOr, Not};
use std::str::FromStr;

use serde::Serialize;

pub use crate::ast::Tristate;

/// The result of evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Value {
    Tristate(Tristate),
    /// Strings and numbers; numbers keep their literal spelling.
    String(String),
}

impl Value {
    /// Interpret user input: `y`/`m`/`n` become tristates, anything else a string.
    pub fn parse(text: &str) -> Value {
        match text.parse::<Tristate>() {
            Ok(t) => Value::Tristate(t),
            Err(_) => Value::String(text.to_string()),
        }
    }

    pub fn as_tristate(&self) -> Option<Tristate> {
        match self {
            Value::Tristate(t) => Some(*t),
            Value::String(_) => None,
        }
    }

    /// Tristate view of any value; strings other than `y`/`m`/`n` are `n`.
    pub fn to_tristate(&self) -> Tristate {
        match self {
            Value::Tristate(t) => *t,
            Value::String(s) => s.parse().unwrap_or(Tristate::No),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Tristate(_) => "tristate",
            Value::String(_) => "string",
        }
    }
}

impl From<Tristate> for Value {
    fn from(t: Tristate) -> Self {
        Value::Tristate(t)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Tristate(Tristate::from(b))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Tristate(t) => write!(f, "{t}"),
            Value::String(s) => write!(f, "{s}"),
        }
    }
}

fn parse_number(s: &str) -> Option<i128> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        i128::from_str_radix(hex, 16).ok()
    } else {
        s.parse().ok()
    }
}

/// Compare two strings, numerically when both are numbers.
pub(crate) fn compare_strings(a: &str, b: &str) -> Ordering {
    match (parse_number(a), parse_number(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

impl Tristate {
    /// `a && b`: the smaller value.
    pub fn and(self, other: Tristate) -> Tristate {
        self.min(other)
    }

    /// `a || b`: the larger value.
    pub fn or(self, other: Tristate) -> Tristate {
        self.max(other)
    }
}

/// `!n = y`, `!m = n`, `!y = n`.
impl Not for Tristate {
    type Output = Tristate;

    fn not(self) -> Tristate {
        match self {
            Tristate::No => Tristate::Yes,
            Tristate::Module | Tristate::Yes => Tristate::No,
        }
    }
}

impl BitAnd for Tristate {
    type Output = Tristate;

    fn bitand(self, rhs: Tristate) -> Tristate {
        self.and(rhs)
    }
}

impl BitOr for Tristate {
    type Output = Tristate;

    fn bitor(self, rhs: Tristate) -> Tristate {
        self.or(rhs)
    }
}

impl From<bool> for Tristate {
    fn from(b: bool) -> Self {
        if b { Tristate::Yes } else { Tristate::No }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a tristate value: {0:?}")]
pub struct ParseTristateError(String);

impl FromStr for Tristate {
    type Err = ParseTristateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "y" => Ok(Tristate::Yes),
            "m" => Ok(Tristate::Module),
            "n" => Ok(Tristate::No),
            other => Err(ParseTristateError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_table() {
        assert_eq!(!Tristate::No, Tristate::Yes);
        assert_eq!(!Tristate::Module, Tristate::No);
        assert_eq!(!Tristate::Yes, Tristate::No);
    }

    #[test]
    fn double_negation_of_module_is_yes() {
        assert_eq!(!!Tristate::Module, Tristate::Yes);
    }

    #[test]
    fn value_parse() {
        assert_eq!(Value::parse("m"), Value::Tristate(Tristate::Module));
        assert_eq!(Value::parse("yes"), Value::String("yes".into()));
    }

    #[test]
    fn numeric_string_compare() {
        assert_eq!(compare_strings("0x10", "16"), Ordering::Equal);
        assert_eq!(compare_strings("9", "10"), Ordering::Less);
        assert_eq!(compare_strings("abc", "abd"), Ordering::Less);
    }
}
