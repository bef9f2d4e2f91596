//! Human-readable error reports.
//!
//! Renders an error against the text it points into with `ariadne`, without
//! colour, so the output can go to logs and test snapshots alike.

use ariadne::{Config, IndexType, Label, Report, ReportKind, Source};

use crate::error::SyntaxError;
use crate::span::Span;

/// Render `message` with `label` under the source text at `span`.
pub fn render(text: &str, span: Span, message: &str, label: &str) -> String {
    let range = clamp(text, span);
    let mut out = Vec::new();
    let written = Report::build(ReportKind::Error, range.clone())
        .with_config(
            Config::default()
                .with_color(false)
                .with_index_type(IndexType::Byte),
        )
        .with_message(message)
        .with_label(Label::new(range).with_message(label))
        .finish()
        .write(Source::from(text), &mut out);

    match written {
        Ok(()) => String::from_utf8_lossy(&out).into_owned(),
        Err(_) => format!("{span}: {message}\n"),
    }
}

/// Render a lex or parse error against the file it came from.
pub fn render_syntax_error(error: &SyntaxError, text: &str) -> String {
    let label = match error {
        SyntaxError::Lex(e) => e.kind.to_string(),
        SyntaxError::Parse(e) => match (&e.message, &e.found) {
            (Some(message), _) => message.clone(),
            (None, Some(token)) => format!("unexpected '{token}'"),
            (None, None) => "unexpected end of input".to_string(),
        },
    };
    render(text, error.span(), &error.to_string(), &label)
}

// ariadne wants a non-empty range inside the text
fn clamp(text: &str, span: Span) -> std::ops::Range<usize> {
    let start = span.start.min(text.len());
    let end = span.end.clamp(start, text.len());
    if start == end {
        start..(start + 1).min(text.len())
    } else {
        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn renders_parse_error_with_location() {
        let text = "config FOO\n\tdepends BAR\n";
        let Err(err) = parse(text) else {
            panic!("expected a parse error");
        };
        let report = render_syntax_error(&err, text);
        assert!(report.contains("unexpected 'BAR'"), "{report}");
        assert!(report.contains("depends BAR"), "{report}");
    }

    #[test]
    fn grammar_errors_use_their_message_as_label() {
        let text = "config A\n\tbool\n\thex\n";
        let Err(err) = parse(text) else {
            panic!("expected a parse error");
        };
        let report = render_syntax_error(&err, text);
        assert!(report.contains("duplicate type 'hex'"), "{report}");
    }

    #[test]
    fn empty_span_at_end_of_text() {
        let text = "menu \"M\"\n";
        let span = Span {
            start: text.len(),
            end: text.len(),
            ..Span::default()
        };
        let report = render(text, span, "missing endmenu", "here");
        assert!(report.contains("missing endmenu"), "{report}");
    }
}
