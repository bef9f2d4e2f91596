//! Runs the golden parser cases in `tests/parser/*.test`.

use kconfig_testutil::parser::{parse_parser_tests, run_parser_tests};

const STATEMENTS_TEST: &str = include_str!("../../../tests/parser/statements.test");

#[test]
fn run_parser_test_file() {
    let cases = parse_parser_tests(STATEMENTS_TEST);
    assert!(!cases.is_empty(), "no cases found in statements.test");

    let summary = run_parser_tests(&cases);
    println!("{summary}");

    assert!(
        summary.all_passed(),
        "parser golden tests: {} failed, {} errors",
        summary.failed,
        summary.errors
    );
}
