//! `config.toml` for the `kconfig` binary.
//!
//! Every field is optional. Command-line flags win over the file, the file
//! wins over built-in defaults.
//!
//! ```toml
//! srctree = "/usr/src/linux"
//! max_include_depth = 32
//! cache = true
//! time_limit_ms = 5000
//! log_level = "info"
//!
//! [env]
//! SRCARCH = "x86"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use kconfig_core::resolve::{DEFAULT_MAX_DEPTH, ResolveOptions};

/// Log filter used when neither `RUST_LOG` nor the file sets one.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Directory `source` paths are relative to.
    pub srctree: Option<PathBuf>,
    pub max_include_depth: Option<usize>,
    /// Parse each sourced file once per run.
    pub cache: Option<bool>,
    pub time_limit_ms: Option<u64>,
    pub log_level: Option<String>,
    /// Variables for `$VAR` in source paths, on top of the process environment.
    pub env: BTreeMap<String, String>,
}

impl CliConfig {
    /// Load from `path`, or from the default location when `None`.
    ///
    /// An explicit path must exist. A missing default file yields the
    /// built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_file(path),
            None => {
                let path = config_path();
                if path.exists() {
                    Self::load_file(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn load_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Resolver options, with `max_depth` from the command line taking
    /// precedence over the file.
    pub fn resolve_options(&self, max_depth: Option<usize>) -> ResolveOptions {
        ResolveOptions {
            max_depth: max_depth
                .or(self.max_include_depth)
                .unwrap_or(DEFAULT_MAX_DEPTH),
            cache: self.cache.unwrap_or(true),
            time_limit: self.time_limit_ms.map(Duration::from_millis),
            cancel: None,
        }
    }
}

/// Default config file: `kconfig/config.toml` under the platform config
/// directory.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

fn config_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|d| d.config_dir().to_path_buf())
        .unwrap_or_else(|| home_fallback().join(".config"))
        .join("kconfig")
}

fn home_fallback() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = CliConfig::from_toml("").unwrap();
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.log_level(), "warn");

        let options = config.resolve_options(None);
        assert_eq!(options.max_depth, DEFAULT_MAX_DEPTH);
        assert!(options.cache);
        assert!(options.time_limit.is_none());
    }

    #[test]
    fn full_file() {
        let config = CliConfig::from_toml(
            r#"
srctree = "/usr/src/linux"
max_include_depth = 8
cache = false
time_limit_ms = 250
log_level = "debug"

[env]
SRCARCH = "arm64"
"#,
        )
        .unwrap();

        assert_eq!(config.srctree, Some(PathBuf::from("/usr/src/linux")));
        assert_eq!(config.log_level(), "debug");
        assert_eq!(config.env.get("SRCARCH").map(String::as_str), Some("arm64"));

        let options = config.resolve_options(None);
        assert_eq!(options.max_depth, 8);
        assert!(!options.cache);
        assert_eq!(options.time_limit, Some(Duration::from_millis(250)));
    }

    #[test]
    fn flag_overrides_file() {
        let config = CliConfig::from_toml("max_include_depth = 8").unwrap();
        assert_eq!(config.resolve_options(Some(3)).max_depth, 3);
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(CliConfig::from_toml("srctre = \"typo\"").is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CliConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(format!("{err:#}").contains("nope.toml"), "{err:#}");
    }

    #[test]
    fn explicit_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "cache = false\n").unwrap();
        let config = CliConfig::load(Some(&path)).unwrap();
        assert_eq!(config.cache, Some(false));
    }

    #[test]
    fn default_path_is_namespaced() {
        let path = config_path();
        assert!(path.ends_with("kconfig/config.toml"), "{}", path.display());
    }
}
