//! S-expression rendering of the AST.
//!
//! Compact and span-free, used by snapshot tests, the golden test files and
//! `kconfig parse`. Examples:
//!
//! ```text
//! (config FOO (type bool "Foo") (default y))
//! (menu "M" (visible A) (config A (type bool)))
//! (or (and (not A) B) C)
//! ```

use super::*;

/// Render a whole file: `(root ...)`.
pub fn format_root(root: &Root) -> String {
    let mut parts = Vec::new();
    if let Some(menu) = &root.main_menu {
        parts.push(format!("(mainmenu {})", format_string(&menu.title)));
    }
    parts.extend(root.statements.iter().map(format_stmt));
    list("root", parts)
}

/// Render a block of statements one per line.
pub fn format_block(statements: &[Stmt]) -> String {
    statements.iter().map(format_stmt).collect::<Vec<_>>().join("\n")
}

pub fn format_stmt(stmt: &Stmt) -> String {
    match stmt {
        Stmt::Config(config) => format_config("config", config),
        Stmt::MenuConfig(config) => format_config("menuconfig", config),
        Stmt::Choice(choice) => {
            let parts = choice
                .options
                .iter()
                .map(format_property)
                .chain(choice.configs.iter().map(|c| format_config("config", c)))
                .collect();
            list("choice", parts)
        }
        Stmt::Menu(menu) => {
            let parts = std::iter::once(format_string(&menu.title))
                .chain(menu.options.iter().map(format_property))
                .chain(menu.body.iter().map(format_stmt))
                .collect();
            list("menu", parts)
        }
        Stmt::If(block) => {
            let parts = std::iter::once(format_expr(&block.condition))
                .chain(block.body.iter().map(format_stmt))
                .collect();
            list("if", parts)
        }
        Stmt::Source(source) => {
            format!("({} {})", source.kind.keyword(), format_string(&source.path))
        }
        Stmt::Comment(comment) => {
            let parts = std::iter::once(format_string(&comment.text))
                .chain(comment.options.iter().map(format_property))
                .collect();
            list("comment", parts)
        }
    }
}

fn format_config(head: &str, config: &Config) -> String {
    let parts = std::iter::once(config.symbol.name.clone())
        .chain(config.options.iter().map(format_property))
        .collect();
    list(head, parts)
}

pub fn format_property(prop: &Property) -> String {
    match prop {
        Property::Type(t) => {
            let mut parts = vec![t.kind.to_string()];
            if let Some(prompt) = &t.prompt {
                parts.push(format_string(prompt));
            }
            push_condition(&mut parts, &t.condition);
            list("type", parts)
        }
        Property::Prompt(p) => {
            let mut parts = vec![format_string(&p.text)];
            push_condition(&mut parts, &p.condition);
            list("prompt", parts)
        }
        Property::Default(d) => format_default("default", d),
        Property::DefBool(d) => format_default("def_bool", d),
        Property::DefTristate(d) => format_default("def_tristate", d),
        Property::Depends(d) => format!("(depends {})", format_expr(&d.condition)),
        Property::Select(s) => format_select("select", s),
        Property::Imply(s) => format_select("imply", s),
        Property::Range(r) => {
            let mut parts = vec![format_expr(&r.low), format_expr(&r.high)];
            push_condition(&mut parts, &r.condition);
            list("range", parts)
        }
        Property::Visible(v) => format!("(visible {})", format_expr(&v.condition)),
        Property::Help(h) => format!("(help {:?})", h.text),
        Property::Option(o) => {
            let mut parts = vec![o.name.to_string()];
            if let Some(value) = &o.value {
                parts.push(format_string(value));
            }
            list("option", parts)
        }
        Property::DefaultChoice(d) => {
            let mut parts = vec![d.symbol.name.clone()];
            push_condition(&mut parts, &d.condition);
            list("default", parts)
        }
    }
}

fn format_default(head: &str, d: &DefaultValue) -> String {
    let mut parts = vec![format_expr(&d.value)];
    push_condition(&mut parts, &d.condition);
    list(head, parts)
}

fn format_select(head: &str, s: &Select) -> String {
    let mut parts = vec![s.symbol.name.clone()];
    push_condition(&mut parts, &s.condition);
    list(head, parts)
}

pub fn format_expr(expr: &Expr) -> String {
    match expr {
        Expr::Symbol(id) => id.name.clone(),
        Expr::Bool { value: true, .. } => "y".to_string(),
        Expr::Bool { value: false, .. } => "n".to_string(),
        Expr::Tristate { value, .. } => value.to_string(),
        Expr::Int { value, .. } => value.to_string(),
        Expr::Hex { value, .. } => format!("{value:#x}"),
        Expr::String(s) => format_string(s),
        Expr::Not { operand, .. } => format!("(not {})", format_expr(operand)),
        Expr::Binary { lhs, op, rhs, .. } => {
            let head = match op {
                BinaryOp::And => "and",
                BinaryOp::Or => "or",
                other => other.symbol(),
            };
            format!("({head} {} {})", format_expr(lhs), format_expr(rhs))
        }
    }
}

fn format_string(s: &StringLiteral) -> String {
    format!("{:?}", s.value)
}

fn push_condition(parts: &mut Vec<String>, condition: &Option<Expr>) {
    if let Some(cond) = condition {
        parts.push("if".to_string());
        parts.push(format_expr(cond));
    }
}

fn list(head: &str, parts: Vec<String>) -> String {
    if parts.is_empty() {
        format!("({head})")
    } else {
        format!("({head} {})", parts.join(" "))
    }
}
