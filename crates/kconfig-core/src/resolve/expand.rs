//! Variable expansion in `source` paths.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Rewrites the raw path of a `source` statement before it is resolved.
pub trait PathResolver {
    fn expand(&self, raw: &str) -> String;
}

impl<F> PathResolver for F
where
    F: Fn(&str) -> String,
{
    fn expand(&self, raw: &str) -> String {
        self(raw)
    }
}

/// Leaves paths untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbatim;

impl PathResolver for Verbatim {
    fn expand(&self, raw: &str) -> String {
        raw.to_string()
    }
}

/// Expands `$VAR`, `${VAR}` and `$(VAR)`.
///
/// Values come from explicit overrides first, then (unless isolated) the
/// process environment. Unset variables expand to the empty string.
#[derive(Debug, Clone)]
pub struct EnvExpander {
    vars: HashMap<String, String>,
    inherit: bool,
}

impl Default for EnvExpander {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvExpander {
    /// Overrides on top of the process environment.
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
            inherit: true,
        }
    }

    /// Overrides only; the process environment is ignored.
    pub fn isolated() -> Self {
        Self {
            vars: HashMap::new(),
            inherit: false,
        }
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    fn lookup(&self, name: &str) -> Option<String> {
        if let Some(value) = self.vars.get(name) {
            return Some(value.clone());
        }
        if self.inherit {
            std::env::var(name).ok()
        } else {
            None
        }
    }
}

fn variable_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(
                r"\$(?:\(([A-Za-z_][A-Za-z0-9_]*)\)|\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))",
            )
            .ok()
        })
        .as_ref()
}

impl PathResolver for EnvExpander {
    fn expand(&self, raw: &str) -> String {
        let Some(pattern) = variable_pattern() else {
            return raw.to_string();
        };
        pattern
            .replace_all(raw, |caps: &Captures<'_>| {
                let name = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .or_else(|| caps.get(3))
                    .map_or("", |m| m.as_str());
                self.lookup(name).unwrap_or_else(|| {
                    tracing::trace!(variable = name, "unset variable in source path");
                    String::new()
                })
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_all_forms() {
        let env = EnvExpander::isolated().var("SRCARCH", "x86").var("KCONFIG_EXT", "ext");
        assert_eq!(env.expand("arch/$SRCARCH/Kconfig"), "arch/x86/Kconfig");
        assert_eq!(env.expand("arch/${SRCARCH}/Kconfig"), "arch/x86/Kconfig");
        assert_eq!(env.expand("arch/$(SRCARCH)/Kconfig.$(KCONFIG_EXT)"), "arch/x86/Kconfig.ext");
    }

    #[test]
    fn unset_variables_are_empty() {
        let env = EnvExpander::isolated();
        assert_eq!(env.expand("$(NOPE)/Kconfig"), "/Kconfig");
    }

    #[test]
    fn plain_paths_unchanged() {
        assert_eq!(EnvExpander::isolated().expand("init/Kconfig"), "init/Kconfig");
        assert_eq!(Verbatim.expand("$X"), "$X");
    }

    #[test]
    fn closures_resolve() {
        let upper = |raw: &str| raw.to_uppercase();
        assert_eq!(upper.expand("kconfig"), "KCONFIG");
    }
}
