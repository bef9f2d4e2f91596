//! Abstract Syntax Tree types for Kconfig.
//!
//! The parser produces one [`Root`] per file. Statements, properties and
//! expressions are closed enums; every node carries a [`Span`].
//!
//! Trees are never mutated after parsing. The resolver consumes them and
//! builds new ones with `source` statements replaced by file contents.

pub mod sexpr;

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::span::{FileId, Span};

/// One parsed file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Root {
    pub file: FileId,
    /// The file this tree was read from, if it came from disk.
    pub path: Option<PathBuf>,
    pub main_menu: Option<MainMenu>,
    pub statements: Vec<Stmt>,
}

/// `mainmenu "Title"`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MainMenu {
    pub title: StringLiteral,
    pub span: Span,
}

/// A statement inside a block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    /// `config NAME`
    Config(Config),
    /// `menuconfig NAME`
    MenuConfig(Config),
    /// `choice ... endchoice`
    Choice(Choice),
    /// `menu "Title" ... endmenu`
    Menu(Menu),
    /// `if EXPR ... endif`
    If(IfBlock),
    /// `source "path"` and its relative/optional variants
    Source(Source),
    /// `comment "text"`
    Comment(Comment),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Config(c) | Stmt::MenuConfig(c) => c.span,
            Stmt::Choice(c) => c.span,
            Stmt::Menu(m) => m.span,
            Stmt::If(i) => i.span,
            Stmt::Source(s) => s.span,
            Stmt::Comment(c) => c.span,
        }
    }

    /// Nested statements of a `menu` or `if` block.
    pub fn children(&self) -> &[Stmt] {
        match self {
            Stmt::Menu(m) => &m.body,
            Stmt::If(i) => &i.body,
            _ => &[],
        }
    }
}

/// A symbol declaration. Shared by `config` and `menuconfig`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub symbol: Identifier,
    pub options: Vec<Property>,
    pub span: Span,
}

impl Config {
    /// The declared type, from a type property or a `def_bool`/`def_tristate`.
    pub fn symbol_type(&self) -> Option<SymbolType> {
        self.options.iter().find_map(|p| match p {
            Property::Type(t) => Some(t.kind),
            Property::DefBool(_) => Some(SymbolType::Bool),
            Property::DefTristate(_) => Some(SymbolType::Tristate),
            _ => None,
        })
    }

    /// The prompt text, whether inline on the type or a separate `prompt`.
    pub fn prompt(&self) -> Option<&StringLiteral> {
        self.options.iter().find_map(|p| match p {
            Property::Type(TypeDecl { prompt: Some(text), .. }) => Some(text),
            Property::Prompt(prompt) => Some(&prompt.text),
            _ => None,
        })
    }

    pub fn help(&self) -> Option<&str> {
        self.options.iter().find_map(|p| match p {
            Property::Help(h) => Some(h.text.as_str()),
            _ => None,
        })
    }
}

/// `choice` group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Choice {
    pub options: Vec<Property>,
    pub configs: Vec<Config>,
    pub span: Span,
}

/// `menu` block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Menu {
    pub title: StringLiteral,
    /// `depends on` and `visible if` properties, in source order.
    pub options: Vec<Property>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl Menu {
    /// Conjunction of every `visible if` condition, or `None` when there is none.
    pub fn visible(&self) -> Option<Expr> {
        self.options
            .iter()
            .filter_map(|p| match p {
                Property::Visible(v) => Some(v.condition.clone()),
                _ => None,
            })
            .reduce(|lhs, rhs| Expr::binary(lhs, BinaryOp::And, rhs))
    }
}

/// `if` block. Structural: the body applies when the condition is not `n`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IfBlock {
    pub condition: Expr,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourceKind {
    /// `source`: relative to the base directory.
    Absolute,
    /// `rsource`: relative to the including file.
    Relative,
    /// `osource`: like `source`, missing files are skipped.
    Optional,
    /// `orsource`
    OptionalRelative,
}

impl SourceKind {
    pub fn is_relative(self) -> bool {
        matches!(self, SourceKind::Relative | SourceKind::OptionalRelative)
    }

    pub fn is_optional(self) -> bool {
        matches!(self, SourceKind::Optional | SourceKind::OptionalRelative)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            SourceKind::Absolute => "source",
            SourceKind::Relative => "rsource",
            SourceKind::Optional => "osource",
            SourceKind::OptionalRelative => "orsource",
        }
    }
}

/// `source "path"`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Source {
    pub kind: SourceKind,
    pub path: StringLiteral,
    pub span: Span,
}

/// `comment "text"` (displayed in menus, not a source comment)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub text: StringLiteral,
    pub options: Vec<Property>,
    pub span: Span,
}

/// Attribute lines under an entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Property {
    Type(TypeDecl),
    Prompt(Prompt),
    Default(DefaultValue),
    DefBool(DefaultValue),
    DefTristate(DefaultValue),
    Depends(Depends),
    Select(Select),
    Imply(Select),
    Range(Range),
    Visible(Visible),
    Help(Help),
    Option(OptionProp),
    DefaultChoice(DefaultChoice),
}

impl Property {
    pub fn span(&self) -> Span {
        match self {
            Property::Type(p) => p.span,
            Property::Prompt(p) => p.span,
            Property::Default(p) | Property::DefBool(p) | Property::DefTristate(p) => p.span,
            Property::Depends(p) => p.span,
            Property::Select(p) | Property::Imply(p) => p.span,
            Property::Range(p) => p.span,
            Property::Visible(p) => p.span,
            Property::Help(p) => p.span,
            Property::Option(p) => p.span,
            Property::DefaultChoice(p) => p.span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SymbolType {
    Bool,
    Tristate,
    Int,
    Hex,
    String,
}

impl fmt::Display for SymbolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SymbolType::Bool => "bool",
            SymbolType::Tristate => "tristate",
            SymbolType::Int => "int",
            SymbolType::Hex => "hex",
            SymbolType::String => "string",
        };
        f.write_str(name)
    }
}

/// `bool "Prompt" if COND`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeDecl {
    pub kind: SymbolType,
    pub prompt: Option<StringLiteral>,
    /// Condition on the inline prompt.
    pub condition: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prompt {
    pub text: StringLiteral,
    pub condition: Option<Expr>,
    pub span: Span,
}

/// `default`, `def_bool` and `def_tristate` values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefaultValue {
    pub value: Expr,
    pub condition: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Depends {
    pub condition: Expr,
    pub span: Span,
}

/// `select` and `imply`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Select {
    pub symbol: Identifier,
    pub condition: Option<Expr>,
    pub span: Span,
}

/// `range LOW HIGH`. Bounds are literals or symbols.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Range {
    pub low: Expr,
    pub high: Expr,
    pub condition: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Visible {
    pub condition: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Help {
    /// Body with common indentation removed; empty for a bare keyword.
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum OptionName {
    DefconfigList,
    Modules,
    Env,
    AllnoconfigY,
    /// Unknown names are kept as written.
    Other(String),
}

impl fmt::Display for OptionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionName::DefconfigList => f.write_str("defconfig_list"),
            OptionName::Modules => f.write_str("modules"),
            OptionName::Env => f.write_str("env"),
            OptionName::AllnoconfigY => f.write_str("allnoconfig_y"),
            OptionName::Other(name) => f.write_str(name),
        }
    }
}

/// `option NAME [= "value"]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionProp {
    pub name: OptionName,
    pub value: Option<StringLiteral>,
    pub span: Span,
}

/// `default SYMBOL` inside a `choice`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefaultChoice {
    pub symbol: Identifier,
    pub condition: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

/// A string literal: decoded value plus the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StringLiteral {
    pub value: String,
    pub raw: String,
    pub span: Span,
}

/// Three-valued logic, ordered `n < m < y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Tristate {
    No,
    Module,
    Yes,
}

impl fmt::Display for Tristate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Tristate::No => "n",
            Tristate::Module => "m",
            Tristate::Yes => "y",
        };
        f.write_str(c)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOp {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Equal => "=",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Dependency/value expressions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    Symbol(Identifier),
    /// `y` or `n` where a bool is expected.
    Bool { value: bool, span: Span },
    Tristate { value: Tristate, span: Span },
    Int { value: i64, span: Span },
    Hex { value: u64, span: Span },
    String(StringLiteral),
    Not { operand: Box<Expr>, span: Span },
    Binary {
        lhs: Box<Expr>,
        op: BinaryOp,
        rhs: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    /// Build a binary node spanning both operands.
    pub fn binary(lhs: Expr, op: BinaryOp, rhs: Expr) -> Expr {
        let span = lhs.span().join(rhs.span());
        Expr::Binary {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
            span,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Expr::Symbol(id) => id.span,
            Expr::String(s) => s.span,
            Expr::Bool { span, .. }
            | Expr::Tristate { span, .. }
            | Expr::Int { span, .. }
            | Expr::Hex { span, .. }
            | Expr::Not { span, .. }
            | Expr::Binary { span, .. } => *span,
        }
    }

    /// Turn a bare `y`/`n` into a tristate literal; anything else is unchanged.
    pub fn into_tristate_literal(self) -> Expr {
        match self {
            Expr::Bool { value, span } => Expr::Tristate {
                value: if value { Tristate::Yes } else { Tristate::No },
                span,
            },
            other => other,
        }
    }

    /// Turn a bare `y`/`n`/`m` into a bool literal; `m` is kept as a tristate.
    pub fn into_bool_literal(self) -> Expr {
        match self {
            Expr::Tristate { value: Tristate::Yes, span } => Expr::Bool { value: true, span },
            Expr::Tristate { value: Tristate::No, span } => Expr::Bool { value: false, span },
            other => other,
        }
    }

    /// Symbol names referenced anywhere in this expression, in order.
    pub fn symbols(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Symbol(id) => out.push(&id.name),
            Expr::Not { operand, .. } => operand.collect_symbols(out),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_symbols(out);
                rhs.collect_symbols(out);
            }
            _ => {}
        }
    }
}

/// Visit every statement depth-first, parents before children.
pub fn walk<'a>(statements: &'a [Stmt], f: &mut impl FnMut(&'a Stmt)) {
    for stmt in statements {
        f(stmt);
        walk(stmt.children(), f);
    }
}

/// Every symbol declaration in a block, including choice members, in order.
pub fn configs(statements: &[Stmt]) -> Vec<&Config> {
    let mut out = Vec::new();
    walk(statements, &mut |stmt| match stmt {
        Stmt::Config(c) | Stmt::MenuConfig(c) => out.push(c),
        Stmt::Choice(choice) => out.extend(choice.configs.iter()),
        _ => {}
    });
    out
}
