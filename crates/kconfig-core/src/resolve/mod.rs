//! `source` inclusion.
//!
//! The resolver walks a parsed tree, replaces every `source` statement with
//! the statements of the file it names and returns a new tree. Sourced files
//! are parsed on demand through a [`SourceLoader`]; paths are expanded by a
//! [`PathResolver`] before they are resolved.
//!
//! A file may be sourced any number of times from independent branches. It
//! may not source itself, directly or through other files.

mod expand;
mod loader;

pub use expand::{EnvExpander, PathResolver, Verbatim};
pub use loader::{LocalFs, MemoryFs, SourceLoader};

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::ast::{self, Config, MainMenu, Root, Source, Stmt};
use crate::error::LoadError;
use crate::parser;
use crate::source_map::SourceMap;
use crate::span::{FileId, Span};

/// Default limit on nested `source` depth.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Errors that abort a resolution session.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("{}:{span}: cannot source {}: {source}", referring_file.display(), path.display())]
    Include {
        path: PathBuf,
        referring_file: PathBuf,
        span: Span,
        #[source]
        source: io::Error,
    },

    #[error("{}:{span}: cyclic inclusion: {}", referring_file.display(), format_cycle(cycle))]
    CyclicInclusion {
        /// The inclusion stack, outermost first, ending with the repeated file.
        cycle: Vec<PathBuf>,
        referring_file: PathBuf,
        span: Span,
    },

    #[error(
        "{}:{span}: sourcing {} exceeds the inclusion depth limit of {limit}",
        referring_file.display(),
        path.display()
    )]
    DepthExceeded {
        limit: usize,
        path: PathBuf,
        referring_file: PathBuf,
        span: Span,
    },

    #[error("resolution cancelled")]
    Cancelled,

    #[error("resolution exceeded its time limit of {0:?}")]
    TimedOut(Duration),

    #[error("{}:{span}: choice has no entries", path.display())]
    EmptyChoice { path: PathBuf, span: Span },

    #[error(transparent)]
    Load(#[from] LoadError),
}

impl ResolveError {
    /// Location of the offending statement, when there is one.
    pub fn span(&self) -> Option<Span> {
        match self {
            ResolveError::Include { span, .. }
            | ResolveError::CyclicInclusion { span, .. }
            | ResolveError::DepthExceeded { span, .. }
            | ResolveError::EmptyChoice { span, .. } => Some(*span),
            ResolveError::Load(LoadError::Syntax { error, .. }) => Some(error.span()),
            ResolveError::Load(LoadError::Io { .. })
            | ResolveError::Cancelled
            | ResolveError::TimedOut(_) => None,
        }
    }

    /// The file [`ResolveError::span`] points into.
    pub fn file(&self) -> Option<&Path> {
        match self {
            ResolveError::Include { referring_file, .. }
            | ResolveError::CyclicInclusion { referring_file, .. }
            | ResolveError::DepthExceeded { referring_file, .. } => Some(referring_file),
            ResolveError::EmptyChoice { path, .. } => Some(path),
            ResolveError::Load(err) => Some(err.path()),
            ResolveError::Cancelled | ResolveError::TimedOut(_) => None,
        }
    }
}

fn format_cycle(cycle: &[PathBuf]) -> String {
    cycle
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Shared flag for aborting a session from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Limits and switches for a resolution session.
///
/// Cancellation and the time limit are checked before each `source`
/// statement, never in the middle of a file.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    pub max_depth: usize,
    /// Parse each distinct file once and clone the tree for later sources.
    pub cache: bool,
    pub time_limit: Option<Duration>,
    pub cancel: Option<CancelFlag>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            cache: true,
            time_limit: None,
            cancel: None,
        }
    }
}

/// A tree with every `source` statement replaced by the sourced statements.
#[derive(Debug, Clone)]
pub struct ResolvedTree {
    /// File id of the root file.
    pub root: FileId,
    pub main_menu: Option<MainMenu>,
    pub statements: Vec<Stmt>,
    /// Every file that contributed statements.
    pub sources: SourceMap,
}

impl ResolvedTree {
    pub fn configs(&self) -> Vec<&Config> {
        ast::configs(&self.statements)
    }

    pub fn root_path(&self) -> Option<&Path> {
        self.sources.path(self.root)
    }

    /// The resolved tree as a single [`Root`].
    pub fn into_root(self) -> Root {
        let path = self.sources.path(self.root).map(Path::to_path_buf);
        Root {
            file: self.root,
            path,
            main_menu: self.main_menu,
            statements: self.statements,
        }
    }
}

/// Resolves `source` statements against a base directory.
#[derive(Debug, Clone)]
pub struct Resolver<L = LocalFs, P = EnvExpander> {
    loader: L,
    paths: P,
    base_dir: PathBuf,
    options: ResolveOptions,
}

impl Resolver {
    /// Resolver over the local filesystem, expanding variables from the
    /// process environment.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Resolver::with_parts(LocalFs, EnvExpander::new(), base_dir)
    }
}

impl<L: SourceLoader, P: PathResolver> Resolver<L, P> {
    pub fn with_parts(loader: L, paths: P, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            loader,
            paths,
            base_dir: base_dir.into(),
            options: ResolveOptions::default(),
        }
    }

    pub fn options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Read, parse and resolve the file at `path`.
    pub fn resolve_file(&self, path: &Path) -> Result<ResolvedTree, ResolveError> {
        let _span = tracing::debug_span!("resolve", root = %path.display()).entered();
        let mut session = Session::new(self, path.to_path_buf());

        let canonical = self
            .loader
            .canonicalize(path)
            .map_err(|source| LoadError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let root = session.load(&canonical)?;
        session.finish(root, Some(canonical))
    }

    /// Resolve an already parsed tree.
    ///
    /// When `root.path` is set it takes part in cycle detection and anchors
    /// `rsource` statements; otherwise those resolve against the base dir.
    pub fn resolve_root(&self, root: Root) -> Result<ResolvedTree, ResolveError> {
        let label = root
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("<input>"));
        let _span = tracing::debug_span!("resolve", root = %label.display()).entered();
        let mut session = Session::new(self, label.clone());

        let canonical = root
            .path
            .as_deref()
            .map(|p| self.loader.canonicalize(p).unwrap_or_else(|_| p.to_path_buf()));
        session
            .sources
            .insert(root.file, canonical.clone().unwrap_or(label), None);
        session.finish(root, canonical)
    }
}

struct Session<'r, L, P> {
    resolver: &'r Resolver<L, P>,
    /// Canonical paths of the files being expanded, outermost first.
    stack: Vec<PathBuf>,
    sources: SourceMap,
    cache: HashMap<PathBuf, Root>,
    deadline: Option<Instant>,
    /// Name used for the root when it has no file on the stack.
    label: PathBuf,
}

impl<'r, L: SourceLoader, P: PathResolver> Session<'r, L, P> {
    fn new(resolver: &'r Resolver<L, P>, label: PathBuf) -> Self {
        Self {
            resolver,
            stack: Vec::new(),
            sources: SourceMap::new(),
            cache: HashMap::new(),
            deadline: resolver.options.time_limit.map(|limit| Instant::now() + limit),
            label,
        }
    }

    fn finish(mut self, root: Root, canonical: Option<PathBuf>) -> Result<ResolvedTree, ResolveError> {
        let file = root.file;
        let pushed = canonical.is_some();
        if let Some(path) = canonical {
            self.stack.push(path);
        }
        let statements = self.expand_block(root.statements)?;
        if pushed {
            self.stack.pop();
        }

        tracing::debug!(files = self.sources.len(), "resolution complete");
        Ok(ResolvedTree {
            root: file,
            main_menu: root.main_menu,
            statements,
            sources: self.sources,
        })
    }

    fn expand_block(&mut self, statements: Vec<Stmt>) -> Result<Vec<Stmt>, ResolveError> {
        let mut out = Vec::with_capacity(statements.len());
        for stmt in statements {
            match stmt {
                Stmt::Source(source) => out.extend(self.include(source)?),
                Stmt::Menu(mut menu) => {
                    menu.body = self.expand_block(menu.body)?;
                    out.push(Stmt::Menu(menu));
                }
                Stmt::If(mut block) => {
                    block.body = self.expand_block(block.body)?;
                    out.push(Stmt::If(block));
                }
                Stmt::Choice(choice) if choice.configs.is_empty() => {
                    let path = self
                        .sources
                        .path(choice.span.file)
                        .map_or_else(|| self.referring_file(), Path::to_path_buf);
                    return Err(ResolveError::EmptyChoice {
                        path,
                        span: choice.span,
                    });
                }
                other => out.push(other),
            }
        }
        Ok(out)
    }

    fn include(&mut self, source: Source) -> Result<Vec<Stmt>, ResolveError> {
        self.checkpoint()?;

        let expanded = self.resolver.paths.expand(&source.path.value);
        let target = self.target_path(&source, &expanded);
        let referring_file = self.referring_file();

        let canonical = match self.resolver.loader.canonicalize(&target) {
            Ok(path) => path,
            Err(err) if source.kind.is_optional() && err.kind() == io::ErrorKind::NotFound => {
                tracing::trace!(path = %target.display(), "optional source not found, skipping");
                return Ok(Vec::new());
            }
            Err(err) => {
                return Err(ResolveError::Include {
                    path: target,
                    referring_file,
                    span: source.span,
                    source: err,
                });
            }
        };

        if self.stack.contains(&canonical) {
            let mut cycle = self.stack.clone();
            cycle.push(canonical);
            return Err(ResolveError::CyclicInclusion {
                cycle,
                referring_file,
                span: source.span,
            });
        }

        let limit = self.resolver.options.max_depth;
        if self.stack.len() >= limit {
            return Err(ResolveError::DepthExceeded {
                limit,
                path: canonical,
                referring_file,
                span: source.span,
            });
        }

        tracing::debug!(
            path = %canonical.display(),
            depth = self.stack.len(),
            kind = source.kind.keyword(),
            "sourcing file"
        );
        let root = self.load(&canonical)?;
        if let Some(menu) = &root.main_menu {
            tracing::warn!(
                path = %canonical.display(),
                title = %menu.title.value,
                "ignoring mainmenu in sourced file"
            );
        }

        self.stack.push(canonical);
        let statements = self.expand_block(root.statements)?;
        self.stack.pop();
        Ok(statements)
    }

    /// Parse a file, or clone its tree if it was parsed before.
    fn load(&mut self, path: &Path) -> Result<Root, ResolveError> {
        if let Some(root) = self.cache.get(path) {
            tracing::trace!(path = %path.display(), "parsed file cache hit");
            return Ok(root.clone());
        }

        let text = self
            .resolver
            .loader
            .read_to_string(path)
            .map_err(|source| LoadError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let text: Arc<str> = Arc::from(text);
        let id = self.sources.add(path, Some(Arc::clone(&text)));
        let mut root = parser::parse_source(&text, id).map_err(|error| LoadError::Syntax {
            path: path.to_path_buf(),
            error,
        })?;
        root.path = Some(path.to_path_buf());

        if self.resolver.options.cache {
            self.cache.insert(path.to_path_buf(), root.clone());
        }
        Ok(root)
    }

    fn target_path(&self, source: &Source, expanded: &str) -> PathBuf {
        let raw = Path::new(expanded);
        if raw.is_absolute() {
            return raw.to_path_buf();
        }
        if source.kind.is_relative() {
            if let Some(dir) = self.stack.last().and_then(|p| p.parent()) {
                return dir.join(raw);
            }
        }
        self.resolver.base_dir.join(raw)
    }

    fn referring_file(&self) -> PathBuf {
        self.stack
            .last()
            .cloned()
            .unwrap_or_else(|| self.label.clone())
    }

    fn checkpoint(&self) -> Result<(), ResolveError> {
        if let Some(cancel) = &self.resolver.options.cancel {
            if cancel.is_cancelled() {
                return Err(ResolveError::Cancelled);
            }
        }
        if let (Some(deadline), Some(limit)) = (self.deadline, self.resolver.options.time_limit) {
            if Instant::now() >= deadline {
                return Err(ResolveError::TimedOut(limit));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_resolver(fs: MemoryFs) -> Resolver<MemoryFs, Verbatim> {
        Resolver::with_parts(fs, Verbatim, "/")
    }

    #[test]
    fn splices_in_declaration_order() {
        let fs = MemoryFs::new()
            .with("Kconfig", "config A\n\tbool\nsource \"b/Kconfig\"\nconfig C\n\tbool\n")
            .with("b/Kconfig", "config B\n\tbool\n");
        let tree = memory_resolver(fs)
            .resolve_file(Path::new("/Kconfig"))
            .map_err(|e| e.to_string());
        let names: Vec<String> = tree
            .map(|t| t.configs().iter().map(|c| c.symbol.name.clone()).collect())
            .unwrap_or_default();
        assert_eq!(names, ["A", "B", "C"]);
    }

    #[test]
    fn sourced_spans_point_at_their_file() {
        let fs = MemoryFs::new()
            .with("Kconfig", "source \"sub\"\n")
            .with("sub", "\nconfig SUB\n\tbool\n");
        let Ok(tree) = memory_resolver(fs).resolve_file(Path::new("/Kconfig")) else {
            panic!("resolution failed");
        };
        let config = tree.configs()[0];
        assert_eq!(config.span.line, 2);
        assert_eq!(tree.sources.path(config.span.file), Some(Path::new("/sub")));
    }

    #[test]
    fn cancelled_before_first_source() {
        let fs = MemoryFs::new()
            .with("Kconfig", "source \"a\"\n")
            .with("a", "");
        let cancel = CancelFlag::new();
        cancel.cancel();
        let result = memory_resolver(fs)
            .options(ResolveOptions {
                cancel: Some(cancel),
                ..ResolveOptions::default()
            })
            .resolve_file(Path::new("/Kconfig"));
        assert!(matches!(result, Err(ResolveError::Cancelled)));
    }
}
