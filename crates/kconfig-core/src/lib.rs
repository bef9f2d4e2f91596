//! kconfig-core: parsing and evaluation of the Kconfig language.
//!
//! This crate provides:
//!
//! - **Lexer**: Tokenizes Kconfig source using logos
//! - **Parser**: Builds the AST from tokens using chumsky
//! - **AST**: Statements, properties and expressions, each with a span
//! - **Evaluator**: Tristate logic over expressions against a symbol environment
//! - **Resolver**: Splices `source`d files into one tree, rejecting cycles
//!
//! Loading a `.config`, menu front ends and select/imply propagation are
//! left to callers; this crate gives them the tree and the evaluator.

pub mod ast;
pub mod diagnostic;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod resolve;
pub mod source_map;
pub mod span;

use std::path::{Path, PathBuf};

pub use ast::{Expr, Root, Stmt, Tristate};
pub use error::{LoadError, SyntaxError};
pub use eval::{EvalError, Evaluator, SymbolEnv, Value, evaluate, evaluate_tristate};
pub use parser::{ParseError, parse, parse_expr};
pub use resolve::{
    CancelFlag, PathResolver, ResolveError, ResolveOptions, ResolvedTree, Resolver,
};
pub use span::{FileId, Span};

/// Read and parse one file. `source` statements are left in place.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Root, LoadError> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "parsing file");
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut root = parser::parse(&text).map_err(|error| LoadError::Syntax {
        path: path.to_path_buf(),
        error,
    })?;
    root.path = Some(path.to_path_buf());
    Ok(root)
}

/// Parse `root_path` and resolve its inclusions from disk.
///
/// `source` paths are relative to `base_dir` and may use `$VAR` from the
/// process environment.
pub fn resolve(
    root_path: impl AsRef<Path>,
    base_dir: impl Into<PathBuf>,
) -> Result<ResolvedTree, ResolveError> {
    Resolver::new(base_dir).resolve_file(root_path.as_ref())
}

/// Resolve the inclusions of an already parsed tree.
pub fn resolve_includes<P: PathResolver>(
    root: Root,
    base_dir: impl Into<PathBuf>,
    path_resolver: P,
) -> Result<ResolvedTree, ResolveError> {
    Resolver::with_parts(resolve::LocalFs, path_resolver, base_dir).resolve_root(root)
}
