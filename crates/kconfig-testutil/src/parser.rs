//! Parser test file parser and runner.
//!
//! Parses the `tests/parser/*.test` format and runs each case through
//! [`kconfig_core::parse`]. A case looks like:
//!
//! ```text
//! # test: config_bool
//! # expect: ok
//! ---
//! config FOO
//!     bool "Foo"
//! ---
//! (root (config FOO (type bool "Foo")))
//! ===
//! ```
//!
//! For `# expect: error` the expected section is a fragment the error
//! message must contain; an empty section accepts any error.
//! `# expect: skip <reason>` keeps a case in the file without running it.
//! A case whose header or sections are malformed is reported as an error
//! rather than silently merged into its neighbour.

use kconfig_core::ast::sexpr::format_root;

use crate::{TestResult, TestSummary};

/// A single parser test case.
#[derive(Debug, Clone)]
pub struct ParserTestCase {
    /// Test name from the `# test: name` line.
    pub name: String,
    /// Line number where the test starts (1-indexed).
    pub line_number: usize,
    /// The Kconfig input.
    pub input: String,
    /// What we expect from parsing.
    pub expected: ParserExpectation,
}

/// What we expect from parsing an input.
#[derive(Debug, Clone, PartialEq)]
pub enum ParserExpectation {
    /// Expected tree as an S-expression.
    Ok(String),
    /// Fragment of the expected error message.
    Error(String),
    /// Not run, with the reason from the header.
    Skip(String),
    /// The case itself could not be read.
    Malformed(String),
}

fn is_header(line: &str) -> bool {
    line.trim().starts_with("# test:")
}

/// Parse the *.test file format into test cases.
pub fn parse_parser_tests(content: &str) -> Vec<ParserTestCase> {
    let mut cases = Vec::new();
    let lines: Vec<&str> = content.lines().collect();
    let mut i = 0;

    while i < lines.len() {
        let Some(name) = lines[i].trim().strip_prefix("# test:") else {
            i += 1;
            continue;
        };
        let name = name.trim().to_string();
        let start_line = i + 1;
        i += 1;

        let mut expect = "ok";
        if let Some(value) = lines.get(i).and_then(|l| l.trim().strip_prefix("# expect:")) {
            expect = value.trim();
            i += 1;
        }

        // Each section must close before the next case starts
        let mut sections: Vec<Vec<&str>> = Vec::new();
        let mut current: Option<Vec<&str>> = None;
        let mut closed = false;
        while i < lines.len() && !is_header(lines[i]) {
            let line = lines[i];
            let trimmed = line.trim();
            i += 1;
            if trimmed == "---" && sections.is_empty() {
                sections.extend(current.take());
                current = Some(Vec::new());
            } else if trimmed == "===" && sections.len() == 1 {
                sections.extend(current.take());
                closed = true;
                break;
            } else if let Some(section) = current.as_mut() {
                section.push(line);
            }
        }

        let (input, expected) = match (closed, sections.as_slice()) {
            (true, [input, expected]) => (input.clone(), expected.join("\n").trim().to_string()),
            _ => {
                cases.push(ParserTestCase {
                    name,
                    line_number: start_line,
                    input: String::new(),
                    expected: ParserExpectation::Malformed(
                        "expected `---` input `---` expected `===`".to_string(),
                    ),
                });
                continue;
            }
        };

        let mut input = input.join("\n");
        if !input.is_empty() {
            input.push('\n');
        }

        let expected = match expect.split_once(char::is_whitespace).unwrap_or((expect, "")) {
            ("ok", _) => ParserExpectation::Ok(expected),
            ("error", _) => ParserExpectation::Error(expected),
            ("skip", reason) => ParserExpectation::Skip(reason.trim().to_string()),
            (other, _) => ParserExpectation::Malformed(format!("unknown expectation {other:?}")),
        };

        cases.push(ParserTestCase {
            name,
            line_number: start_line,
            input,
            expected,
        });
    }

    cases
}

impl ParserTestCase {
    /// Run this test case and return the result.
    pub fn run(&self) -> TestResult {
        match &self.expected {
            ParserExpectation::Skip(reason) => TestResult::Skip {
                reason: reason.clone(),
            },
            ParserExpectation::Malformed(message) => TestResult::Error {
                message: message.clone(),
            },
            ParserExpectation::Ok(expected) => match kconfig_core::parse(&self.input) {
                Ok(root) => {
                    let actual = format_root(&root);
                    if normalize_sexpr(&actual) == normalize_sexpr(expected) {
                        TestResult::Pass
                    } else {
                        TestResult::Fail {
                            expected: expected.clone(),
                            actual,
                        }
                    }
                }
                Err(err) => TestResult::Fail {
                    expected: expected.clone(),
                    actual: format!("error: {err}"),
                },
            },
            ParserExpectation::Error(expected) => match kconfig_core::parse(&self.input) {
                Ok(root) => TestResult::Fail {
                    expected: format!("error: {expected}"),
                    actual: format_root(&root),
                },
                Err(err) => {
                    let message = err.to_string();
                    if message.contains(expected.as_str()) {
                        TestResult::Pass
                    } else {
                        TestResult::Fail {
                            expected: format!("error containing {expected:?}"),
                            actual: format!("error: {message}"),
                        }
                    }
                }
            },
        }
    }
}

/// Normalize S-expression for comparison (collapse whitespace).
fn normalize_sexpr(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Run all parser test cases and return a summary.
pub fn run_parser_tests(cases: &[ParserTestCase]) -> TestSummary {
    let mut summary = TestSummary::new();

    for case in cases {
        let result = case.run();
        summary.record(&case.name, case.line_number, result);
    }

    summary
}
