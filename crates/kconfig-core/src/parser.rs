//! Parser for Kconfig source text.
//!
//! Transforms a token stream from the lexer into an Abstract Syntax Tree.
//! Uses chumsky parser combinators over the token slice; statements and
//! properties dispatch on their leading keyword.
//!
//! Parsing is fail-fast: the first error aborts the file and is reported as
//! a single [`ParseError`].

use std::fmt;

use chumsky::{error::RichReason, input::ValueInput, prelude::*};

use crate::ast::{
    BinaryOp, Choice, Comment, Config, DefaultChoice, DefaultValue, Depends, Expr, Help,
    Identifier, IfBlock, MainMenu, Menu, OptionName, OptionProp, Prompt, Property, Range, Root,
    Select, Source, SourceKind, Stmt, StringLiteral, SymbolType, Tristate, TypeDecl, Visible,
};
use crate::error::SyntaxError;
use crate::lexer::{self, Spanned, StringLit, Token};
use crate::span::{FileId, Locator, Span};

type Extra<'tokens> = extra::Err<Rich<'tokens, Token, SimpleSpan>>;

/// Parse error with location and context.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub struct ParseError {
    pub span: Span,
    /// The offending token, `None` at end of input.
    pub found: Option<String>,
    /// What would have been accepted instead, sorted.
    pub expected: Vec<String>,
    /// The construct being parsed when the error hit.
    pub production: Option<&'static str>,
    /// Set for errors the grammar raises itself rather than a token mismatch.
    pub message: Option<String>,
}

impl ParseError {
    pub fn at_end_of_input(&self) -> bool {
        self.found.is_none()
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.span)?;
        if let Some(message) = &self.message {
            f.write_str(message)?;
        } else {
            match &self.found {
                Some(token) => write!(f, "unexpected '{token}'")?,
                None => write!(f, "unexpected end of input")?,
            }
            if !self.expected.is_empty() {
                write!(f, ", expected {}", join_alternatives(&self.expected))?;
            }
        }
        if let Some(production) = self.production {
            write!(f, " in {production}")?;
        }
        Ok(())
    }
}

fn join_alternatives(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [one] => one.clone(),
        [init @ .., last] => format!("{} or {}", init.join(", "), last),
    }
}

/// Parse Kconfig source into a [`Root`] tagged with [`FileId::ROOT`].
pub fn parse(source: &str) -> Result<Root, SyntaxError> {
    parse_source(source, FileId::ROOT)
}

/// Parse Kconfig source, reporting spans against `file`.
pub fn parse_source(source: &str, file: FileId) -> Result<Root, SyntaxError> {
    let loc = Locator::new(file, source);
    let tokens = lexer::tokenize_in(source, &loc)?;
    let pairs = token_pairs(&tokens);
    let end_span: SimpleSpan = (source.len()..source.len()).into();

    let result = root_parser(loc.clone()).parse(pairs.as_slice().map(end_span, |(t, s)| (t, s)));
    result
        .into_result()
        .map_err(|errs| SyntaxError::Parse(first_error(errs, &tokens, &loc)))
}

/// Parse a standalone expression such as `A && !B`.
pub fn parse_expr(source: &str) -> Result<Expr, SyntaxError> {
    let loc = Locator::new(FileId::ROOT, source);
    let tokens = lexer::tokenize_in(source, &loc)?;
    let pairs = token_pairs(&tokens);
    let end_span: SimpleSpan = (source.len()..source.len()).into();

    let result = expr_parser(loc.clone()).parse(pairs.as_slice().map(end_span, |(t, s)| (t, s)));
    result
        .into_result()
        .map_err(|errs| SyntaxError::Parse(first_error(errs, &tokens, &loc)))
}

fn token_pairs(tokens: &[Spanned<Token>]) -> Vec<(Token, SimpleSpan)> {
    tokens
        .iter()
        .map(|spanned| {
            let span: SimpleSpan = (spanned.span.start..spanned.span.end).into();
            (spanned.token.clone(), span)
        })
        .collect()
}

fn first_error(
    errs: Vec<Rich<'_, Token, SimpleSpan>>,
    tokens: &[Spanned<Token>],
    loc: &Locator,
) -> ParseError {
    let Some(err) = errs.into_iter().next() else {
        let end = loc.text().len();
        return ParseError {
            span: loc.span(end..end),
            found: None,
            expected: Vec::new(),
            production: None,
            message: None,
        };
    };

    let span = locate(loc, *err.span());
    let message = match err.reason() {
        RichReason::Custom(message) => Some(message.clone()),
        _ => None,
    };
    // custom errors carry no token; name the one under the span
    let found = match (err.found(), &message) {
        (Some(token), _) => Some(token.to_string()),
        (None, Some(_)) => tokens
            .iter()
            .find(|t| t.span.start == span.start)
            .map(|t| t.token.to_string()),
        (None, None) => None,
    };
    let mut expected: Vec<String> = err.expected().map(ToString::to_string).collect();
    expected.sort();
    expected.dedup();
    let production = production_at(tokens, span.start, found.is_none());

    ParseError {
        span,
        found,
        expected,
        production,
        message,
    }
}

/// Name the construct an error at `offset` belongs to.
///
/// At end of input this is the innermost unterminated block; elsewhere it
/// is the entry or block whose keyword most recently preceded the error.
fn production_at(tokens: &[Spanned<Token>], offset: usize, at_end: bool) -> Option<&'static str> {
    let mut open: Vec<&'static str> = Vec::new();
    let mut last = None;

    for spanned in tokens.iter().take_while(|t| t.span.start < offset) {
        match &spanned.token {
            Token::Menu => {
                open.push("menu");
                last = Some("menu");
            }
            Token::Choice => {
                open.push("choice");
                last = Some("choice");
            }
            Token::IfBlock => {
                open.push("if block");
                last = Some("if block");
            }
            Token::EndMenu | Token::EndChoice | Token::EndIf => {
                open.pop();
                last = open.last().copied();
            }
            Token::Config => last = Some("config entry"),
            Token::MenuConfig => last = Some("menuconfig entry"),
            Token::Comment => last = Some("comment"),
            Token::Source | Token::RSource | Token::OSource | Token::ORSource => {
                last = Some("source")
            }
            Token::MainMenu => last = Some("mainmenu"),
            _ => {}
        }
    }

    if at_end && !open.is_empty() {
        open.last().copied()
    } else {
        last
    }
}

fn locate(loc: &Locator, span: SimpleSpan) -> Span {
    loc.span(span.start..span.end)
}

// ═══════════════════════════════════════════════════════════════════════════
// Parser Combinators - generic over input type
// ═══════════════════════════════════════════════════════════════════════════

/// Top-level parser: `[mainmenu] block`.
fn root_parser<'tokens, I>(loc: Locator) -> impl Parser<'tokens, I, Root, Extra<'tokens>>
where
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    let file = loc.file();
    let l = loc.clone();
    let main_menu = just(Token::MainMenu)
        .ignore_then(string_parser(loc.clone()))
        .map_with(move |title, e| MainMenu {
            title,
            span: locate(&l, e.span()),
        })
        .labelled("mainmenu");

    main_menu
        .or_not()
        .then(statement_parser(loc).repeated().collect::<Vec<_>>())
        .map(move |(main_menu, statements)| Root {
            file,
            path: None,
            main_menu,
            statements,
        })
}

/// Statement parser - dispatches on the leading keyword.
fn statement_parser<'tokens, I>(loc: Locator) -> impl Parser<'tokens, I, Stmt, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    recursive(|stmt| {
        choice((
            entry_parser(loc.clone(), Token::Config).map(Stmt::Config),
            entry_parser(loc.clone(), Token::MenuConfig).map(Stmt::MenuConfig),
            choice_parser(loc.clone()).map(Stmt::Choice),
            comment_parser(loc.clone()).map(Stmt::Comment),
            menu_parser(loc.clone(), stmt.clone()).map(Stmt::Menu),
            if_parser(loc.clone(), stmt).map(Stmt::If),
            source_parser(loc.clone()).map(Stmt::Source),
        ))
        .boxed()
    })
}

/// `config NAME options...` or `menuconfig NAME options...`
fn entry_parser<'tokens, I>(
    loc: Locator,
    keyword: Token,
) -> impl Parser<'tokens, I, Config, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    let label = if keyword == Token::MenuConfig {
        "menuconfig entry"
    } else {
        "config entry"
    };
    let options = config_option_parser(loc.clone())
        .repeated()
        .collect::<Vec<_>>()
        .validate(|options: Vec<Property>, _, emitter| {
            if let Some((first, second)) = duplicate_type(&options) {
                let span: SimpleSpan = (second.span.start..second.span.end).into();
                emitter.emit(Rich::custom(
                    span,
                    format!(
                        "duplicate type '{}', already declared as {}",
                        second.kind, first.kind
                    ),
                ));
            }
            options
        });

    let l = loc.clone();
    just(keyword)
        .ignore_then(ident_parser(loc))
        .then(options)
        .map_with(move |(symbol, options), e| Config {
            symbol,
            options,
            span: locate(&l, e.span()),
        })
        .labelled(label)
        .boxed()
}

/// The first and second type declarations, if an entry has more than one.
fn duplicate_type(options: &[Property]) -> Option<(&TypeDecl, &TypeDecl)> {
    let mut types = options.iter().filter_map(|p| match p {
        Property::Type(t) => Some(t),
        _ => None,
    });
    let first = types.next()?;
    types.next().map(|second| (first, second))
}

/// `choice options... configs... endchoice`
fn choice_parser<'tokens, I>(loc: Locator) -> impl Parser<'tokens, I, Choice, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    let options = choice((
        type_parser(loc.clone()),
        prompt_parser(loc.clone()),
        default_choice_parser(loc.clone()),
        depends_parser(loc.clone()),
        help_parser(loc.clone()),
        option_parser(loc.clone()),
    ));

    let l = loc.clone();
    just(Token::Choice)
        .ignore_then(options.repeated().collect::<Vec<_>>())
        .then(
            entry_parser(loc, Token::Config)
                .repeated()
                .at_least(1)
                .collect::<Vec<_>>(),
        )
        .then_ignore(just(Token::EndChoice))
        .map_with(move |(options, configs), e| Choice {
            options,
            configs,
            span: locate(&l, e.span()),
        })
        .labelled("choice")
        .boxed()
}

/// `comment "text" [depends on ...]`
fn comment_parser<'tokens, I>(loc: Locator) -> impl Parser<'tokens, I, Comment, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    let l = loc.clone();
    just(Token::Comment)
        .ignore_then(string_parser(loc.clone()))
        .then(depends_parser(loc).repeated().collect::<Vec<_>>())
        .map_with(move |(text, options), e| Comment {
            text,
            options,
            span: locate(&l, e.span()),
        })
        .labelled("comment")
        .boxed()
}

/// `menu "title" [depends on ...] [visible if ...] block endmenu`
fn menu_parser<'tokens, I, S>(
    loc: Locator,
    stmt: S,
) -> impl Parser<'tokens, I, Menu, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
    S: Parser<'tokens, I, Stmt, Extra<'tokens>> + Clone + 'tokens,
{
    let options = choice((depends_parser(loc.clone()), visible_parser(loc.clone())));

    let l = loc.clone();
    just(Token::Menu)
        .ignore_then(string_parser(loc))
        .then(options.repeated().collect::<Vec<_>>())
        .then(stmt.repeated().collect::<Vec<_>>())
        .then_ignore(just(Token::EndMenu))
        .map_with(move |((title, options), body), e| Menu {
            title,
            options,
            body,
            span: locate(&l, e.span()),
        })
        .labelled("menu")
        .boxed()
}

/// `if EXPR block endif`
fn if_parser<'tokens, I, S>(
    loc: Locator,
    stmt: S,
) -> impl Parser<'tokens, I, IfBlock, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
    S: Parser<'tokens, I, Stmt, Extra<'tokens>> + Clone + 'tokens,
{
    let l = loc.clone();
    just(Token::IfBlock)
        .ignore_then(expr_parser(loc))
        .then(stmt.repeated().collect::<Vec<_>>())
        .then_ignore(just(Token::EndIf))
        .map_with(move |(condition, body), e| IfBlock {
            condition,
            body,
            span: locate(&l, e.span()),
        })
        .labelled("if block")
        .boxed()
}

/// `source "path"`, `rsource`, `osource`, `orsource`
fn source_parser<'tokens, I>(loc: Locator) -> impl Parser<'tokens, I, Source, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    let kind = select! {
        Token::Source => SourceKind::Absolute,
        Token::RSource => SourceKind::Relative,
        Token::OSource => SourceKind::Optional,
        Token::ORSource => SourceKind::OptionalRelative,
    };

    let l = loc.clone();
    kind.then(string_parser(loc))
        .map_with(move |(kind, path), e| Source {
            kind,
            path,
            span: locate(&l, e.span()),
        })
        .labelled("source")
        .boxed()
}

// ═══════════════════════════════════════════════════════════════════════════
// Properties
// ═══════════════════════════════════════════════════════════════════════════

/// Any property allowed under `config` and `menuconfig`.
fn config_option_parser<'tokens, I>(
    loc: Locator,
) -> impl Parser<'tokens, I, Property, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    choice((
        type_parser(loc.clone()),
        prompt_parser(loc.clone()),
        default_parser(loc.clone()),
        def_type_parser(loc.clone(), Token::DefBool),
        def_type_parser(loc.clone(), Token::DefTristate),
        depends_parser(loc.clone()),
        select_parser(loc.clone(), Token::Select),
        select_parser(loc.clone(), Token::Imply),
        range_parser(loc.clone()),
        help_parser(loc.clone()),
        option_parser(loc),
    ))
    .boxed()
}

/// Optional trailing `if EXPR`.
fn condition_parser<'tokens, I>(
    loc: Locator,
) -> impl Parser<'tokens, I, Option<Expr>, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    just(Token::If).ignore_then(expr_parser(loc)).or_not()
}

/// `bool ["prompt" [if EXPR]]`
fn type_parser<'tokens, I>(loc: Locator) -> impl Parser<'tokens, I, Property, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    let kind = select! {
        Token::Bool => SymbolType::Bool,
        Token::Tristate => SymbolType::Tristate,
        Token::Int => SymbolType::Int,
        Token::Hex => SymbolType::Hex,
        Token::StringType => SymbolType::String,
    };

    let l = loc.clone();
    kind.then(
        string_parser(loc.clone())
            .then(condition_parser(loc))
            .or_not(),
    )
    .map_with(move |(kind, prompt), e| {
        let (prompt, condition) = match prompt {
            Some((text, condition)) => (Some(text), condition),
            None => (None, None),
        };
        Property::Type(TypeDecl {
            kind,
            prompt,
            condition,
            span: locate(&l, e.span()),
        })
    })
    .labelled("type")
}

/// `prompt "text" [if EXPR]`
fn prompt_parser<'tokens, I>(loc: Locator) -> impl Parser<'tokens, I, Property, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    let l = loc.clone();
    just(Token::Prompt)
        .ignore_then(string_parser(loc.clone()))
        .then(condition_parser(loc))
        .map_with(move |(text, condition), e| {
            Property::Prompt(Prompt {
                text,
                condition,
                span: locate(&l, e.span()),
            })
        })
        .labelled("prompt")
}

/// `default EXPR [if EXPR]`
fn default_parser<'tokens, I>(loc: Locator) -> impl Parser<'tokens, I, Property, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    let l = loc.clone();
    just(Token::Default)
        .ignore_then(expr_parser(loc.clone()))
        .then(condition_parser(loc))
        .map_with(move |(value, condition), e| {
            Property::Default(DefaultValue {
                value: value.into_tristate_literal(),
                condition,
                span: locate(&l, e.span()),
            })
        })
        .labelled("default")
}

/// `def_bool EXPR [if EXPR]` and `def_tristate EXPR [if EXPR]`
fn def_type_parser<'tokens, I>(
    loc: Locator,
    keyword: Token,
) -> impl Parser<'tokens, I, Property, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    let tristate = keyword == Token::DefTristate;
    let l = loc.clone();
    just(keyword)
        .ignore_then(expr_parser(loc.clone()))
        .then(condition_parser(loc))
        .map_with(move |(value, condition), e| {
            let span = locate(&l, e.span());
            if tristate {
                Property::DefTristate(DefaultValue {
                    value: value.into_tristate_literal(),
                    condition,
                    span,
                })
            } else {
                Property::DefBool(DefaultValue {
                    value: value.into_bool_literal(),
                    condition,
                    span,
                })
            }
        })
        .labelled(if tristate { "def_tristate" } else { "def_bool" })
}

/// `depends on EXPR`
fn depends_parser<'tokens, I>(loc: Locator) -> impl Parser<'tokens, I, Property, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    let l = loc.clone();
    just(Token::Depends)
        .ignore_then(just(Token::On))
        .ignore_then(expr_parser(loc))
        .map_with(move |condition, e| {
            Property::Depends(Depends {
                condition,
                span: locate(&l, e.span()),
            })
        })
        .labelled("depends on")
}

/// `visible if EXPR`
fn visible_parser<'tokens, I>(loc: Locator) -> impl Parser<'tokens, I, Property, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    let l = loc.clone();
    just(Token::Visible)
        .ignore_then(just(Token::If))
        .ignore_then(expr_parser(loc))
        .map_with(move |condition, e| {
            Property::Visible(Visible {
                condition,
                span: locate(&l, e.span()),
            })
        })
        .labelled("visible if")
}

/// `select SYMBOL [if EXPR]` and `imply SYMBOL [if EXPR]`
fn select_parser<'tokens, I>(
    loc: Locator,
    keyword: Token,
) -> impl Parser<'tokens, I, Property, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    let imply = keyword == Token::Imply;
    let l = loc.clone();
    just(keyword)
        .ignore_then(ident_parser(loc.clone()))
        .then(condition_parser(loc))
        .map_with(move |(symbol, condition), e| {
            let select = Select {
                symbol,
                condition,
                span: locate(&l, e.span()),
            };
            if imply {
                Property::Imply(select)
            } else {
                Property::Select(select)
            }
        })
        .labelled(if imply { "imply" } else { "select" })
}

/// `range LOW HIGH [if EXPR]`
fn range_parser<'tokens, I>(loc: Locator) -> impl Parser<'tokens, I, Property, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    let bound = choice((
        literal_parser(loc.clone()),
        ident_parser(loc.clone()).map(Expr::Symbol),
    ));

    let l = loc.clone();
    just(Token::Range)
        .ignore_then(bound.clone())
        .then(bound)
        .then(condition_parser(loc))
        .map_with(move |((low, high), condition), e| {
            Property::Range(Range {
                low,
                high,
                condition,
                span: locate(&l, e.span()),
            })
        })
        .labelled("range")
}

/// Help block, already collected by the lexer.
fn help_parser<'tokens, I>(loc: Locator) -> impl Parser<'tokens, I, Property, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    select! { Token::Help(text) => text }
        .map_with(move |text, e| {
            Property::Help(Help {
                text,
                span: locate(&loc, e.span()),
            })
        })
        .labelled("help")
}

/// `option NAME [= "value"]`
fn option_parser<'tokens, I>(loc: Locator) -> impl Parser<'tokens, I, Property, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    let name = select! {
        Token::OptDefconfigList => OptionName::DefconfigList,
        Token::OptModules => OptionName::Modules,
        Token::OptEnv => OptionName::Env,
        Token::OptAllnoconfigY => OptionName::AllnoconfigY,
        Token::Ident(other) => OptionName::Other(other),
    };

    let l = loc.clone();
    just(Token::Option)
        .ignore_then(name)
        .then(just(Token::Eq).ignore_then(string_parser(loc)).or_not())
        .map_with(move |(name, value), e| {
            Property::Option(OptionProp {
                name,
                value,
                span: locate(&l, e.span()),
            })
        })
        .labelled("option")
}

/// `default SYMBOL [if EXPR]` inside a choice.
fn default_choice_parser<'tokens, I>(
    loc: Locator,
) -> impl Parser<'tokens, I, Property, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    let l = loc.clone();
    just(Token::Default)
        .ignore_then(ident_parser(loc.clone()))
        .then(condition_parser(loc))
        .map_with(move |(symbol, condition), e| {
            Property::DefaultChoice(DefaultChoice {
                symbol,
                condition,
                span: locate(&l, e.span()),
            })
        })
        .labelled("default")
}

// ═══════════════════════════════════════════════════════════════════════════
// Expressions
// ═══════════════════════════════════════════════════════════════════════════

/// Expression parser with Kconfig precedence.
///
/// Grammar:
///   expr       = or_expr
///   or_expr    = and_expr { "||" and_expr }
///   and_expr   = comparison { "&&" comparison }
///   comparison = unary [ cmp_op unary ]
///   unary      = "!" unary | atom
///   atom       = literal | symbol | "(" expr ")"
fn expr_parser<'tokens, I>(loc: Locator) -> impl Parser<'tokens, I, Expr, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    recursive(|expr| {
        let atom = choice((
            literal_parser(loc.clone()),
            ident_parser(loc.clone()).map(Expr::Symbol),
            expr.delimited_by(just(Token::LParen), just(Token::RParen)),
        ));

        let l = loc.clone();
        let unary = recursive(move |unary| {
            just(Token::Not)
                .ignore_then(unary)
                .map_with(move |operand, e| Expr::Not {
                    operand: Box::new(operand),
                    span: locate(&l, e.span()),
                })
                .or(atom)
        });

        let comparison_op = select! {
            Token::Eq => BinaryOp::Equal,
            Token::NotEq => BinaryOp::NotEqual,
            Token::Lt => BinaryOp::Less,
            Token::LtEq => BinaryOp::LessEqual,
            Token::Gt => BinaryOp::Greater,
            Token::GtEq => BinaryOp::GreaterEqual,
        };

        let comparison = unary
            .clone()
            .then(comparison_op.then(unary).or_not())
            .map(|(lhs, rhs)| match rhs {
                Some((op, rhs)) => Expr::binary(lhs, op, rhs),
                None => lhs,
            });

        let and_expr = comparison.clone().foldl(
            just(Token::And).ignore_then(comparison).repeated(),
            |lhs, rhs| Expr::binary(lhs, BinaryOp::And, rhs),
        );

        and_expr.clone().foldl(
            just(Token::Or).ignore_then(and_expr).repeated(),
            |lhs, rhs| Expr::binary(lhs, BinaryOp::Or, rhs),
        )
    })
    .labelled("expression")
    .boxed()
}

enum Literal {
    Bool(bool),
    Module,
    Int(i64),
    Hex(u64),
    String(StringLit),
}

/// `y`, `n`, `m`, numbers and strings.
fn literal_parser<'tokens, I>(loc: Locator) -> impl Parser<'tokens, I, Expr, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    select! {
        Token::Yes => Literal::Bool(true),
        Token::No => Literal::Bool(false),
        Token::Module => Literal::Module,
        Token::Number(n) => Literal::Int(n),
        Token::HexNumber(n) => Literal::Hex(n),
        Token::String(lit) => Literal::String(lit),
    }
    .map_with(move |literal, e| {
        let span = locate(&loc, e.span());
        match literal {
            Literal::Bool(value) => Expr::Bool { value, span },
            Literal::Module => Expr::Tristate {
                value: Tristate::Module,
                span,
            },
            Literal::Int(value) => Expr::Int { value, span },
            Literal::Hex(value) => Expr::Hex { value, span },
            Literal::String(lit) => Expr::String(StringLiteral {
                value: lit.value,
                raw: lit.raw,
                span,
            }),
        }
    })
    .labelled("literal")
}

/// Symbol name.
fn ident_parser<'tokens, I>(loc: Locator) -> impl Parser<'tokens, I, Identifier, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    select! { Token::Ident(name) => name }
        .map_with(move |name, e| Identifier {
            name,
            span: locate(&loc, e.span()),
        })
        .labelled("symbol")
}

/// Double-quoted string.
fn string_parser<'tokens, I>(loc: Locator) -> impl Parser<'tokens, I, StringLiteral, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    select! { Token::String(lit) => lit }
        .map_with(move |lit, e| StringLiteral {
            value: lit.value,
            raw: lit.raw,
            span: locate(&loc, e.span()),
        })
        .labelled("string")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::sexpr::{format_expr, format_root};

    fn parse_ok(source: &str) -> Root {
        match parse(source) {
            Ok(root) => root,
            Err(e) => panic!("parse failed: {e}\n{source}"),
        }
    }

    fn parse_err(source: &str) -> ParseError {
        match parse(source) {
            Err(SyntaxError::Parse(e)) => e,
            Err(SyntaxError::Lex(e)) => panic!("expected parse error, got lex error {e}"),
            Ok(root) => panic!("expected error, got {}", format_root(&root)),
        }
    }

    #[test]
    fn empty_file() {
        let root = parse_ok("");
        assert!(root.main_menu.is_none());
        assert!(root.statements.is_empty());
    }

    #[test]
    fn precedence_not_and_or() {
        let expr = match parse_expr("!A && B || C") {
            Ok(e) => e,
            Err(e) => panic!("{e}"),
        };
        assert_eq!(format_expr(&expr), "(or (and (not A) B) C)");
    }

    #[test]
    fn comparison_binds_tighter_than_and() {
        let expr = match parse_expr("A = y && B != \"x\"") {
            Ok(e) => e,
            Err(e) => panic!("{e}"),
        };
        assert_eq!(format_expr(&expr), "(and (= A y) (!= B \"x\"))");
    }

    #[test]
    fn binary_span_covers_operands() {
        let expr = match parse_expr("FOO || BAR") {
            Ok(e) => e,
            Err(e) => panic!("{e}"),
        };
        assert_eq!(expr.span().range(), 0..10);
    }

    #[test]
    fn statement_spans_have_lines() {
        let root = parse_ok("\nconfig A\n\tbool\n\nconfig B\n\tint\n");
        let lines: Vec<u32> = root.statements.iter().map(|s| s.span().line).collect();
        assert_eq!(lines, vec![2, 5]);
    }

    #[test]
    fn missing_endmenu_reports_menu() {
        let err = parse_err("menu \"M\"\nconfig A\n\tbool\n");
        assert!(err.at_end_of_input());
        assert_eq!(err.production, Some("menu"));
        assert!(err.expected.iter().any(|e| e.contains("endmenu")), "{err}");
    }

    #[test]
    fn mainmenu_after_statement_is_rejected() {
        let err = parse_err("config A\n\tbool\nmainmenu \"late\"\n");
        assert_eq!(err.found.as_deref(), Some("mainmenu"));
        assert_eq!((err.span.line, err.span.column), (3, 1));
    }

    #[test]
    fn second_type_is_rejected_at_its_span() {
        let err = parse_err("config A\n\tbool \"a\"\n\tint \"b\"\n");
        assert_eq!((err.span.line, err.span.column), (3, 2));
        assert_eq!(err.found.as_deref(), Some("int"));
        assert_eq!(err.production, Some("config entry"));
        assert_eq!(
            err.to_string(),
            "3:2: duplicate type 'int', already declared as bool in config entry"
        );
    }

    #[test]
    fn stray_token_reports_entry() {
        let err = parse_err("config A\n\tbool\n\tdepends FOO\n");
        assert_eq!(err.found.as_deref(), Some("FOO"));
        assert_eq!(err.production, Some("config entry"));
    }
}
