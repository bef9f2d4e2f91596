//! Symbol environments.
//!
//! The evaluator never owns symbol values; it asks a [`SymbolEnv`]. Unknown
//! names are answered with `None` and evaluate to `n`.

use std::collections::HashMap;

use super::Value;

/// Looks up the current value of a symbol.
pub trait SymbolEnv {
    fn lookup(&self, name: &str) -> Option<Value>;
}

impl SymbolEnv for HashMap<String, Value> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl<F> SymbolEnv for F
where
    F: Fn(&str) -> Option<Value>,
{
    fn lookup(&self, name: &str) -> Option<Value> {
        self(name)
    }
}

/// An owned symbol table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Env {
    values: HashMap<String, Value>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Builder form of [`Env::set`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Parse a `NAME=VALUE` assignment, as given on a command line.
    pub fn assign(&mut self, assignment: &str) -> Result<(), String> {
        let (name, value) = assignment
            .split_once('=')
            .ok_or_else(|| format!("expected NAME=VALUE, got {assignment:?}"))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("missing symbol name in {assignment:?}"));
        }
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .map_or_else(|| Value::parse(value), Value::from);
        self.set(name, value);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl SymbolEnv for Env {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Env {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut env = Env::new();
        for (k, v) in iter {
            env.set(k, v);
        }
        env
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Tristate;

    #[test]
    fn assign_parses_values() {
        let mut env = Env::new();
        env.assign("A=y").ok();
        env.assign("B = m").ok();
        env.assign("C=\"y\"").ok();
        env.assign("D=0x10").ok();
        assert_eq!(env.lookup("A"), Some(Value::Tristate(Tristate::Yes)));
        assert_eq!(env.lookup("B"), Some(Value::Tristate(Tristate::Module)));
        assert_eq!(env.lookup("C"), Some(Value::String("y".into())));
        assert_eq!(env.lookup("D"), Some(Value::String("0x10".into())));
    }

    #[test]
    fn assign_rejects_garbage() {
        let mut env = Env::new();
        assert!(env.assign("novalue").is_err());
        assert!(env.assign("=y").is_err());
        assert!(env.is_empty());
    }

    #[test]
    fn closures_are_environments() {
        let env = |name: &str| (name == "X").then(|| Value::from(Tristate::Module));
        assert_eq!(env.lookup("X"), Some(Value::Tristate(Tristate::Module)));
        assert_eq!(env.lookup("Y"), None);
    }
}
