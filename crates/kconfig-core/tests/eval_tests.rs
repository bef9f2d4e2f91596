//! Evaluator tests: tristate algebra, comparisons and type checking.

use kconfig_core::eval::{Env, EvalError, Evaluator, TypeCheck};
use kconfig_core::{Tristate, Value, evaluate, evaluate_tristate, parse_expr};
use proptest::prelude::*;
use rstest::{fixture, rstest};

#[fixture]
fn env() -> Env {
    Env::new()
        .with("A", Tristate::Yes)
        .with("B", Tristate::Module)
        .with("C", Tristate::No)
        .with("ARCH", "x86")
        .with("NR_CPUS", "64")
        .with("BASE", "0x1000")
}

fn eval_str(source: &str, env: &Env) -> Value {
    let expr = parse_expr(source).unwrap_or_else(|e| panic!("parse error for {source:?}: {e}"));
    evaluate(&expr, env).unwrap_or_else(|e| panic!("eval error for {source:?}: {e}"))
}

fn tristate(c: char) -> Tristate {
    match c {
        'y' => Tristate::Yes,
        'm' => Tristate::Module,
        _ => Tristate::No,
    }
}

// =============================================================================
// TRISTATE LOGIC
// =============================================================================

#[rstest]
#[case::and_takes_min("A && B", 'm')]
#[case::or_takes_max("A || C", 'y')]
#[case::not_module_is_no("!B", 'n')]
#[case::not_no_is_yes("!C", 'y')]
#[case::not_yes_is_no("!A", 'n')]
#[case::double_not_module("!!B", 'y')]
#[case::unknown_is_no("MISSING", 'n')]
#[case::unknown_in_or("MISSING || B", 'm')]
#[case::literal_module("m && A", 'm')]
#[case::precedence("!A && B || C", 'n')]
#[case::parens("!(A && C)", 'y')]
fn eval_logic(env: Env, #[case] source: &str, #[case] expected: char) {
    assert_eq!(eval_str(source, &env), Value::Tristate(tristate(expected)));
}

// =============================================================================
// COMPARISONS
// =============================================================================

#[rstest]
#[case::tristate_equal("B = m", 'y')]
#[case::tristate_not_equal("A != y", 'n')]
#[case::symbols_compare_values("A = B", 'n')]
#[case::string_equal("ARCH = \"x86\"", 'y')]
#[case::string_not_equal("ARCH != \"arm\"", 'y')]
#[case::numeric_equal_across_bases("BASE = 4096", 'y')]
#[case::numeric_order("NR_CPUS > 8", 'y')]
#[case::numeric_not_lexicographic("NR_CPUS < 100", 'y')]
#[case::tristate_order("B < A", 'y')]
#[case::tristate_order_equal("B >= m", 'y')]
#[case::string_order("ARCH <= \"x86\"", 'y')]
#[case::unset_string_symbol("MISSING = \"\"", 'n')]
#[case::comparison_feeds_and("ARCH = \"x86\" && B", 'm')]
fn eval_comparisons(env: Env, #[case] source: &str, #[case] expected: char) {
    assert_eq!(eval_str(source, &env), Value::Tristate(tristate(expected)));
}

#[rstest]
#[case::string("\"hello\"", Value::String("hello".into()))]
#[case::int("42", Value::String("42".into()))]
#[case::hex("0xFF", Value::String("0xff".into()))]
#[case::string_symbol("ARCH", Value::String("x86".into()))]
fn eval_values(env: Env, #[case] source: &str, #[case] expected: Value) {
    assert_eq!(eval_str(source, &env), expected);
}

// =============================================================================
// TYPE CHECKING
// =============================================================================

#[rstest]
fn lenient_string_in_logic_is_no(env: Env) {
    let expr = parse_expr("ARCH && A").unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(evaluate_tristate(&expr, &env), Ok(Tristate::No));
}

#[rstest]
fn strict_rejects_string_in_logic(env: Env) {
    let expr = parse_expr("A && ARCH").unwrap_or_else(|e| panic!("{e}"));
    match Evaluator::strict(&env).eval(&expr) {
        Err(EvalError::TypeMismatch { op, expected, found, span }) => {
            assert_eq!(op, "&&");
            assert_eq!(expected, "tristate");
            assert_eq!(found, "string");
            assert_eq!(span.range(), 5..9);
        }
        other => panic!("expected a type mismatch, got {other:?}"),
    }
}

#[rstest]
fn strict_rejects_mixed_comparison(env: Env) {
    let expr = parse_expr("A = \"y\"").unwrap_or_else(|e| panic!("{e}"));
    let lenient = Evaluator::new(&env).with_check(TypeCheck::Lenient).eval(&expr);
    assert_eq!(lenient, Ok(Value::Tristate(Tristate::Yes)));

    let strict = Evaluator::new(&env).with_check(TypeCheck::Strict).eval(&expr);
    match strict {
        Err(EvalError::TypeMismatch { span, .. }) => assert_eq!(span.range(), 4..7),
        other => panic!("expected a type mismatch, got {other:?}"),
    }
}

#[rstest]
fn strict_accepts_well_typed(env: Env) {
    let expr = parse_expr("A && (ARCH = \"x86\") && !C").unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(Evaluator::strict(&env).eval_tristate(&expr), Ok(Tristate::Yes));
}

#[test]
fn closure_environment() {
    let expr = parse_expr("FOO && !BAR").unwrap_or_else(|e| panic!("{e}"));
    let lookup = |name: &str| match name {
        "FOO" => Some(Value::Tristate(Tristate::Module)),
        _ => None,
    };
    assert_eq!(evaluate_tristate(&expr, &lookup), Ok(Tristate::Module));
}

#[test]
fn env_from_command_line_assignments() {
    let mut env = Env::new();
    for assignment in ["SMP=y", "NR_CPUS=8", "LOCALVERSION=\"-rc1\""] {
        env.assign(assignment).unwrap_or_else(|e| panic!("{e}"));
    }
    let expr = parse_expr("SMP && NR_CPUS >= 4 && LOCALVERSION = \"-rc1\"")
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(evaluate_tristate(&expr, &env), Ok(Tristate::Yes));
}

// =============================================================================
// ALGEBRA
// =============================================================================

fn any_tristate() -> impl Strategy<Value = Tristate> {
    prop_oneof![
        Just(Tristate::No),
        Just(Tristate::Module),
        Just(Tristate::Yes),
    ]
}

proptest! {
    #[test]
    fn and_commutes(a in any_tristate(), b in any_tristate()) {
        prop_assert_eq!(a & b, b & a);
    }

    #[test]
    fn or_commutes(a in any_tristate(), b in any_tristate()) {
        prop_assert_eq!(a | b, b | a);
    }

    #[test]
    fn and_or_are_min_max(a in any_tristate(), b in any_tristate()) {
        prop_assert_eq!(a & b, a.min(b));
        prop_assert_eq!(a | b, a.max(b));
    }

    /// Evaluating through the parser agrees with the operators.
    #[test]
    fn evaluator_matches_operators(a in any_tristate(), b in any_tristate()) {
        let env = Env::new().with("A", a).with("B", b);
        let and = parse_expr("A && B").map_err(|e| TestCaseError::fail(e.to_string()))?;
        let or = parse_expr("A || B").map_err(|e| TestCaseError::fail(e.to_string()))?;
        let not = parse_expr("!A").map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(evaluate_tristate(&and, &env), Ok(a & b));
        prop_assert_eq!(evaluate_tristate(&or, &env), Ok(a | b));
        prop_assert_eq!(evaluate_tristate(&not, &env), Ok(!a));
    }
}

/// Negation is not an involution: `!!m` is `y`.
#[test]
fn double_negation_is_not_identity() {
    assert_eq!(!!Tristate::Module, Tristate::Yes);
    assert_eq!(!!Tristate::Yes, Tristate::Yes);
    assert_eq!(!!Tristate::No, Tristate::No);
}
