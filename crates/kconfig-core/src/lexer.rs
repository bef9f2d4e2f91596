//! Lexer for Kconfig source text.
//!
//! Converts source text into a stream of tokens using the logos lexer
//! generator. Keywords and the tristate values `y`/`m`/`n` win over the
//! identifier pattern by priority, so `y` is never an `Ident`.
//!
//! # Token Categories
//!
//! - **Statement keywords**: `config`, `menuconfig`, `choice`, `menu`, `if`, `source`, ...
//! - **Property keywords**: `depends`, `prompt`, `default`, `select`, `help`, ...
//! - **Types**: `bool`, `tristate`, `int`, `hex`, `string`, `def_bool`, `def_tristate`
//! - **Operators**: `=`, `!=`, `<`, `<=`, `>`, `>=`, `!`, `&&`, `||`, `(`, `)`
//! - **Literals**: strings, decimal and hex numbers, `y`/`m`/`n`
//!
//! Help blocks are lexed as a single [`Token::Help`] carrying the body text.

use std::fmt;
use std::ops::Range;

use logos::Logos;
use serde::Serialize;

use crate::span::{FileId, Locator, Span};

/// A token with its byte range in the source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub token: T,
    pub span: Range<usize>,
}

impl<T> Spanned<T> {
    pub fn new(token: T, span: Range<usize>) -> Self {
        Self { token, span }
    }
}

/// What went wrong while lexing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub enum LexErrorKind {
    #[default]
    UnexpectedCharacter,
    UnterminatedString,
    InvalidNumber,
    /// A `["XXXX"]` group naming something that is not a Unicode scalar.
    InvalidCodePoint(String),
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexErrorKind::UnexpectedCharacter => write!(f, "unexpected character"),
            LexErrorKind::UnterminatedString => write!(f, "unterminated string"),
            LexErrorKind::InvalidNumber => write!(f, "invalid number"),
            LexErrorKind::InvalidCodePoint(hex) => write!(f, "invalid code point [\"{hex}\"]"),
        }
    }
}

/// A lexing failure, positioned in its file.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{span}: {kind}{}", found_suffix(.unexpected_char))]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
    /// The first offending character, if any.
    pub unexpected_char: Option<char>,
}

fn found_suffix(c: &Option<char>) -> String {
    match c {
        Some(c) => format!(" {c:?}"),
        None => String::new(),
    }
}

/// A decoded string literal plus the exact source text it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringLit {
    pub value: String,
    pub raw: String,
}

/// Tokens produced by the Kconfig lexer.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(error = LexErrorKind)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"\\\r?\n")]
pub enum Token {
    // ═══════════════════════════════════════════════════════════════════
    // Statement keywords
    // ═══════════════════════════════════════════════════════════════════
    #[token("config")]
    Config,

    #[token("menuconfig")]
    MenuConfig,

    #[token("choice")]
    Choice,

    #[token("endchoice")]
    EndChoice,

    #[token("comment")]
    Comment,

    #[token("menu")]
    Menu,

    #[token("endmenu")]
    EndMenu,

    /// `if` introducing a trailing condition (`default y if FOO`).
    #[token("if")]
    If,

    /// `if` at the start of a logical line, opening an `if` block.
    /// Produced by [`Tokens`], never by logos directly.
    IfBlock,

    #[token("endif")]
    EndIf,

    #[token("source")]
    Source,

    #[token("rsource")]
    RSource,

    #[token("osource")]
    OSource,

    #[token("orsource")]
    ORSource,

    #[token("mainmenu")]
    MainMenu,

    // ═══════════════════════════════════════════════════════════════════
    // Property keywords
    // ═══════════════════════════════════════════════════════════════════
    #[token("depends")]
    Depends,

    #[token("on")]
    On,

    /// Help block; the value is the de-indented body.
    #[token("help", lex_help)]
    #[token("--help--", lex_help)]
    #[token("---help---", lex_help)]
    Help(String),

    #[token("prompt")]
    Prompt,

    #[token("default")]
    Default,

    #[token("select")]
    Select,

    #[token("imply")]
    Imply,

    #[token("range")]
    Range,

    #[token("visible")]
    Visible,

    #[token("option")]
    Option,

    #[token("defconfig_list")]
    OptDefconfigList,

    #[token("modules")]
    OptModules,

    #[token("env")]
    OptEnv,

    #[token("allnoconfig_y")]
    OptAllnoconfigY,

    // ═══════════════════════════════════════════════════════════════════
    // Types
    // ═══════════════════════════════════════════════════════════════════
    #[token("tristate")]
    Tristate,

    #[token("bool")]
    Bool,

    #[token("def_tristate")]
    DefTristate,

    #[token("def_bool")]
    DefBool,

    #[token("int")]
    Int,

    #[token("hex")]
    Hex,

    #[token("string")]
    StringType,

    // ═══════════════════════════════════════════════════════════════════
    // Operators
    // ═══════════════════════════════════════════════════════════════════
    #[token("=")]
    Eq,

    #[token("!=")]
    NotEq,

    #[token("<")]
    Lt,

    #[token("<=")]
    LtEq,

    #[token(">")]
    Gt,

    #[token(">=")]
    GtEq,

    #[token("!")]
    Not,

    #[token("&&")]
    And,

    #[token("||")]
    Or,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    // ═══════════════════════════════════════════════════════════════════
    // Literals
    // ═══════════════════════════════════════════════════════════════════
    #[token("y", priority = 3)]
    Yes,

    #[token("m", priority = 3)]
    Module,

    #[token("n", priority = 3)]
    No,

    #[regex(r"-?[0-9]+", lex_number)]
    Number(i64),

    #[regex(r"0x[0-9a-fA-F]+", lex_hex)]
    HexNumber(u64),

    /// `"..."` with `""` for a quote and `["XXXX"]` code point groups.
    #[regex(r#""(""|\["([0-9A-F][0-9A-F]){2,4}"\]|[^\n"])*""#, lex_string)]
    String(StringLit),

    /// A quote that runs into end of line; always an error.
    #[regex(r#""[^"\n]*"#, lex_unterminated, allow_greedy = true)]
    UnterminatedString,

    /// Symbol name.
    #[regex(r"[a-zA-Z][a-zA-Z0-9_]*", lex_ident)]
    Ident(String),

    /// `# ...` to end of line; dropped by [`Tokens`].
    #[regex(r"#[^\n]*", allow_greedy = true)]
    LineComment,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Token::Config => "config",
            Token::MenuConfig => "menuconfig",
            Token::Choice => "choice",
            Token::EndChoice => "endchoice",
            Token::Comment => "comment",
            Token::Menu => "menu",
            Token::EndMenu => "endmenu",
            Token::If | Token::IfBlock => "if",
            Token::EndIf => "endif",
            Token::Source => "source",
            Token::RSource => "rsource",
            Token::OSource => "osource",
            Token::ORSource => "orsource",
            Token::MainMenu => "mainmenu",
            Token::Depends => "depends",
            Token::On => "on",
            Token::Help(_) => "help",
            Token::Prompt => "prompt",
            Token::Default => "default",
            Token::Select => "select",
            Token::Imply => "imply",
            Token::Range => "range",
            Token::Visible => "visible",
            Token::Option => "option",
            Token::OptDefconfigList => "defconfig_list",
            Token::OptModules => "modules",
            Token::OptEnv => "env",
            Token::OptAllnoconfigY => "allnoconfig_y",
            Token::Tristate => "tristate",
            Token::Bool => "bool",
            Token::DefTristate => "def_tristate",
            Token::DefBool => "def_bool",
            Token::Int => "int",
            Token::Hex => "hex",
            Token::StringType => "string",
            Token::Eq => "=",
            Token::NotEq => "!=",
            Token::Lt => "<",
            Token::LtEq => "<=",
            Token::Gt => ">",
            Token::GtEq => ">=",
            Token::Not => "!",
            Token::And => "&&",
            Token::Or => "||",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::Yes => "y",
            Token::Module => "m",
            Token::No => "n",
            Token::Number(n) => return write!(f, "{n}"),
            Token::HexNumber(n) => return write!(f, "{n:#x}"),
            Token::String(lit) => return write!(f, "{}", lit.raw),
            Token::UnterminatedString => "unterminated string",
            Token::Ident(name) => return write!(f, "{name}"),
            Token::LineComment => "comment",
        };
        write!(f, "{text}")
    }
}

fn lex_ident(lex: &mut logos::Lexer<Token>) -> String {
    lex.slice().to_string()
}

fn lex_number(lex: &mut logos::Lexer<Token>) -> Result<i64, LexErrorKind> {
    lex.slice().parse().map_err(|_| LexErrorKind::InvalidNumber)
}

fn lex_hex(lex: &mut logos::Lexer<Token>) -> Result<u64, LexErrorKind> {
    let digits = &lex.slice()[2..];
    u64::from_str_radix(digits, 16).map_err(|_| LexErrorKind::InvalidNumber)
}

fn lex_string(lex: &mut logos::Lexer<Token>) -> Result<StringLit, LexErrorKind> {
    let raw = lex.slice();
    Ok(StringLit {
        value: decode_string(raw)?,
        raw: raw.to_string(),
    })
}

fn lex_unterminated(_lex: &mut logos::Lexer<Token>) -> Result<(), LexErrorKind> {
    Err(LexErrorKind::UnterminatedString)
}

/// Consume the indented body after a help keyword.
///
/// The body starts on the line after the keyword and ends before the first
/// non-blank line indented less than the body's first line. The token span
/// stops at the end of the last body line, so the newline that follows
/// still separates it from the next token.
fn lex_help(lex: &mut logos::Lexer<Token>) -> String {
    let rest = lex.remainder();
    let Some(first_newline) = rest.find('\n') else {
        lex.bump(rest.len());
        return String::new();
    };

    let mut consumed = first_newline;
    let mut pos = first_newline + 1;
    let mut base: Option<usize> = None;
    let mut lines: Vec<String> = Vec::new();

    while pos < rest.len() {
        let line_end = rest[pos..].find('\n').map_or(rest.len(), |i| pos + i);
        let line = rest[pos..line_end].trim_end_matches('\r');

        if line.trim().is_empty() {
            if base.is_some() {
                lines.push(String::new());
            }
            pos = line_end + 1;
            continue;
        }

        let indent = indentation(line);
        match base {
            None if indent == 0 => break,
            None => base = Some(indent),
            Some(b) if indent < b => break,
            Some(_) => {}
        }
        lines.push(strip_indent(line, base.unwrap_or(indent)).trim_end().to_string());
        consumed = line_end;
        pos = line_end + 1;
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lex.bump(consumed);
    lines.join("\n")
}

/// Indentation width with tabs advancing to the next multiple of 8.
fn indentation(line: &str) -> usize {
    let mut width = 0;
    for c in line.chars() {
        match c {
            ' ' => width += 1,
            '\t' => width = (width / 8 + 1) * 8,
            _ => break,
        }
    }
    width
}

fn strip_indent(line: &str, base: usize) -> &str {
    let mut width = 0;
    for (i, c) in line.char_indices() {
        if width >= base {
            return &line[i..];
        }
        match c {
            ' ' => width += 1,
            '\t' => width = (width / 8 + 1) * 8,
            _ => return &line[i..],
        }
    }
    ""
}

/// Decode the raw text of a string literal, quotes included.
pub fn decode_string(raw: &str) -> Result<String, LexErrorKind> {
    let inner = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or(LexErrorKind::UnterminatedString)?;

    let mut out = String::with_capacity(inner.len());
    let mut rest = inner;
    while let Some(c) = rest.chars().next() {
        if let Some(after) = rest.strip_prefix("\"\"") {
            out.push('"');
            rest = after;
        } else if let Some((hex, after)) = code_point_group(rest) {
            let ch = u32::from_str_radix(hex, 16)
                .ok()
                .and_then(char::from_u32)
                .ok_or_else(|| LexErrorKind::InvalidCodePoint(hex.to_string()))?;
            out.push(ch);
            rest = after;
        } else {
            out.push(c);
            rest = &rest[c.len_utf8()..];
        }
    }
    Ok(out)
}

/// Match `["XXXX"]` with 4, 6 or 8 uppercase hex digits at the start of `s`.
fn code_point_group(s: &str) -> Option<(&str, &str)> {
    let body = s.strip_prefix("[\"")?;
    let digits = body
        .bytes()
        .take_while(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(b))
        .count();
    if !matches!(digits, 4 | 6 | 8) {
        return None;
    }
    let after = body[digits..].strip_prefix("\"]")?;
    Some((&body[..digits], after))
}

/// Encode a value as a string literal, doubling embedded quotes.
///
/// Characters are always written literally, so a literal that used a
/// `["XXXX"]` group re-encodes to the same value but different text.
pub fn encode_string(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Lazy token stream over one source text.
///
/// Yields tokens in order and skips comments. Cloning a stream gives an
/// independent cursor at the same position.
#[derive(Clone)]
pub struct Tokens<'src> {
    lexer: logos::Lexer<'src, Token>,
    locator: Locator,
    prev_end: Option<usize>,
}

impl<'src> Tokens<'src> {
    pub fn new(source: &'src str, locator: Locator) -> Self {
        Self {
            lexer: Token::lexer(source),
            locator,
            prev_end: None,
        }
    }

    /// Whether a token starting at `start` is the first on its logical line.
    fn starts_line(&self, start: usize) -> bool {
        let Some(prev_end) = self.prev_end else {
            return true;
        };
        let gap = &self.lexer.source()[prev_end..start];
        let mut continued = false;
        for c in gap.chars() {
            match c {
                '\\' => continued = true,
                '\n' if !continued => return true,
                '\n' => continued = false,
                '\r' => {}
                _ => continued = false,
            }
        }
        false
    }

    fn error(&self, kind: LexErrorKind, range: Range<usize>) -> LexError {
        let slice = &self.lexer.source()[range.clone()];
        let unexpected_char = match kind {
            LexErrorKind::UnexpectedCharacter => slice.chars().next(),
            _ => None,
        };
        LexError {
            kind,
            span: self.locator.span(range),
            unexpected_char,
        }
    }
}

impl Iterator for Tokens<'_> {
    type Item = Result<Spanned<Token>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let result = self.lexer.next()?;
            let span = self.lexer.span();
            return match result {
                Ok(Token::LineComment) => continue,
                Ok(token) => {
                    let token = match token {
                        Token::If if self.starts_line(span.start) => Token::IfBlock,
                        other => other,
                    };
                    self.prev_end = Some(span.end);
                    Some(Ok(Spanned::new(token, span)))
                }
                Err(kind) => Some(Err(self.error(kind, span))),
            };
        }
    }
}

/// Tokenize source text, stopping at the first error.
pub fn tokenize(source: &str) -> Result<Vec<Spanned<Token>>, LexError> {
    tokenize_in(source, &Locator::new(FileId::ROOT, source))
}

/// Tokenize with spans reported against `locator`'s file.
pub fn tokenize_in(source: &str, locator: &Locator) -> Result<Vec<Spanned<Token>>, LexError> {
    Tokens::new(source, locator.clone()).collect()
}
