//! The `kconfig` command line.
//!
//! Subcommands:
//! - `parse`: one file, `source` statements left in place
//! - `resolve`: the whole tree with inclusions spliced in
//! - `symbols`: every declared symbol with its type and location
//! - `eval`: a standalone expression against `--set` assignments

pub mod config;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use kconfig_core::ast::sexpr::format_root;
use kconfig_core::diagnostic;
use kconfig_core::eval::{Env, TypeCheck};
use kconfig_core::resolve::{EnvExpander, LocalFs};
use kconfig_core::{EvalError, Evaluator, ResolveError, ResolvedTree, Resolver};

pub use config::CliConfig;

/// Inspect Kconfig trees.
#[derive(Debug, Parser)]
#[command(name = "kconfig", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (default: kconfig/config.toml in the user config directory).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse one file without following `source` statements.
    Parse(ParseArgs),
    /// Parse a file and splice in every file it sources.
    Resolve(ResolveArgs),
    /// List the symbols declared in a resolved tree.
    Symbols(SymbolsArgs),
    /// Evaluate an expression.
    Eval(EvalArgs),
}

#[derive(Debug, Parser)]
pub struct ParseArgs {
    pub file: PathBuf,

    /// Print the tree as JSON instead of an S-expression.
    #[arg(long)]
    pub json: bool,
}

/// Options shared by the subcommands that follow `source`.
#[derive(Debug, Clone, Default, Parser)]
pub struct TreeArgs {
    /// Directory `source` paths are relative to.
    #[arg(long, env = "srctree")]
    pub srctree: Option<PathBuf>,

    /// Variable for `$VAR` in source paths, as NAME=VALUE.
    #[arg(long = "env", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    pub env: Vec<(String, String)>,

    /// Maximum nesting of `source` statements.
    #[arg(long)]
    pub max_depth: Option<usize>,
}

#[derive(Debug, Parser)]
pub struct ResolveArgs {
    pub file: PathBuf,

    #[command(flatten)]
    pub tree: TreeArgs,

    /// Print the tree as JSON instead of an S-expression.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct SymbolsArgs {
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub tree: TreeArgs,
}

#[derive(Debug, Parser)]
pub struct EvalArgs {
    pub expr: String,

    /// Symbol value, as SYM=VALUE.
    #[arg(long = "set", value_name = "SYM=VALUE")]
    pub set: Vec<String>,

    /// Reject mixing tristate and string operands.
    #[arg(long)]
    pub strict: bool,
}

fn parse_assignment(text: &str) -> Result<(String, String), String> {
    match text.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got {text:?}")),
    }
}

/// An error already rendered against its source text.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct Reported(pub String);

/// Run one command, writing results to `out`.
pub fn run(cli: Cli, config: &CliConfig, out: &mut dyn Write) -> Result<()> {
    match cli.command {
        Command::Parse(args) => parse(&args, out),
        Command::Resolve(args) => resolve(&args, config, out),
        Command::Symbols(args) => symbols(&args, config, out),
        Command::Eval(args) => eval(&args, out),
    }
}

fn parse(args: &ParseArgs, out: &mut dyn Write) -> Result<()> {
    let root = kconfig_core::parse_file(&args.file)
        .map_err(|err| report_resolve_error(ResolveError::Load(err)))?;
    if args.json {
        serde_json::to_writer_pretty(&mut *out, &root).context("writing JSON")?;
        writeln!(out)?;
    } else {
        writeln!(out, "{}", format_root(&root))?;
    }
    Ok(())
}

fn resolve(args: &ResolveArgs, config: &CliConfig, out: &mut dyn Write) -> Result<()> {
    let tree = resolve_tree(&args.file, &args.tree, config)?;
    let root = tree.into_root();
    if args.json {
        serde_json::to_writer_pretty(&mut *out, &root).context("writing JSON")?;
        writeln!(out)?;
    } else {
        writeln!(out, "{}", format_root(&root))?;
    }
    Ok(())
}

fn symbols(args: &SymbolsArgs, config: &CliConfig, out: &mut dyn Write) -> Result<()> {
    for file in &args.files {
        let tree = resolve_tree(file, &args.tree, config)?;
        for symbol in tree.configs() {
            let kind = symbol
                .symbol_type()
                .map_or_else(|| "unknown".to_string(), |t| t.to_string());
            writeln!(
                out,
                "{}\t{}\t{}",
                symbol.symbol.name,
                kind,
                tree.sources.describe(&symbol.span)
            )?;
        }
    }
    Ok(())
}

fn eval(args: &EvalArgs, out: &mut dyn Write) -> Result<()> {
    let expr = kconfig_core::parse_expr(&args.expr).map_err(|err| {
        anyhow::Error::new(Reported(diagnostic::render_syntax_error(&err, &args.expr)))
    })?;

    let mut env = Env::new();
    for assignment in &args.set {
        env.assign(assignment).map_err(anyhow::Error::msg)?;
    }

    let check = if args.strict {
        TypeCheck::Strict
    } else {
        TypeCheck::Lenient
    };
    let value = Evaluator::new(&env)
        .with_check(check)
        .eval(&expr)
        .map_err(|err| report_eval_error(&err, &args.expr))?;
    writeln!(out, "{value}")?;
    Ok(())
}

fn resolve_tree(file: &Path, args: &TreeArgs, config: &CliConfig) -> Result<ResolvedTree> {
    let base_dir = args
        .srctree
        .clone()
        .or_else(|| config.srctree.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    let mut paths = EnvExpander::new();
    for (name, value) in config.env.iter().chain(args.env.iter().map(|(k, v)| (k, v))) {
        paths.set(name.as_str(), value.as_str());
    }

    tracing::debug!(file = %file.display(), base_dir = %base_dir.display(), "resolving");
    Resolver::with_parts(LocalFs, paths, base_dir)
        .options(config.resolve_options(args.max_depth))
        .resolve_file(file)
        .map_err(report_resolve_error)
}

/// Render a resolution failure against the file it points into, falling
/// back to the plain message when that file cannot be read again.
fn report_resolve_error(err: ResolveError) -> anyhow::Error {
    let Some((file, span)) = err.file().map(Path::to_path_buf).zip(err.span()) else {
        return err.into();
    };
    let Ok(text) = std::fs::read_to_string(&file) else {
        return err.into();
    };
    let label = match &err {
        ResolveError::Include { .. } => "cannot read this file".to_string(),
        ResolveError::CyclicInclusion { .. } => "this source closes the cycle".to_string(),
        ResolveError::DepthExceeded { .. } => "nested too deeply".to_string(),
        ResolveError::EmptyChoice { .. } => "empty choice".to_string(),
        ResolveError::Load(kconfig_core::LoadError::Syntax { error, .. }) => {
            return Reported(diagnostic::render_syntax_error(error, &text)).into();
        }
        _ => "here".to_string(),
    };
    Reported(diagnostic::render(&text, span, &err.to_string(), &label)).into()
}

fn report_eval_error(err: &EvalError, text: &str) -> anyhow::Error {
    let EvalError::TypeMismatch { span, .. } = err;
    Reported(diagnostic::render(text, *span, &err.to_string(), "type mismatch")).into()
}
