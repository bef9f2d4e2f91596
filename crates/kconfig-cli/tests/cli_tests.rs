//! End-to-end tests for the `kconfig` command line.

use std::path::Path;

use clap::Parser;
use rstest::rstest;

use kconfig_cli::{Cli, CliConfig, Reported};

fn run_args(args: &[&str], config: &CliConfig) -> Result<String, anyhow::Error> {
    let cli = Cli::try_parse_from(std::iter::once("kconfig").chain(args.iter().copied()))
        .unwrap_or_else(|e| panic!("bad arguments {args:?}: {e}"));
    let mut out = Vec::new();
    kconfig_cli::run(cli, config, &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

fn run_ok(args: &[&str]) -> String {
    run_args(args, &CliConfig::default()).unwrap_or_else(|e| panic!("{args:?} failed: {e:#}"))
}

fn write(dir: &Path, name: &str, text: &str) -> String {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, text).unwrap();
    path.display().to_string()
}

#[test]
fn parse_prints_sexpr_without_following_sources() {
    let dir = tempfile::tempdir().unwrap();
    let root = write(dir.path(), "Kconfig", "config A\n\tbool\nsource \"missing/Kconfig\"\n");

    let out = run_ok(&["parse", &root]);
    assert_eq!(out.trim(), r#"(root (config A (type bool)) (source "missing/Kconfig"))"#);
}

#[test]
fn parse_json() {
    let dir = tempfile::tempdir().unwrap();
    let root = write(dir.path(), "Kconfig", "config A\n\tbool\n");

    let out = run_ok(&["parse", "--json", &root]);
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json["statements"][0]["Config"]["symbol"]["name"], "A");
}

#[test]
fn resolve_splices_sources() {
    let dir = tempfile::tempdir().unwrap();
    let root = write(
        dir.path(),
        "Kconfig",
        "mainmenu \"Test\"\nsource \"arch/$SRCARCH/Kconfig\"\nconfig B\n\tbool\n",
    );
    write(dir.path(), "arch/x86/Kconfig", "config A\n\tbool\n");
    let srctree = dir.path().display().to_string();

    let out = run_ok(&["resolve", &root, "--srctree", &srctree, "--env", "SRCARCH=x86"]);
    assert_eq!(
        out.trim(),
        r#"(root (mainmenu "Test") (config A (type bool)) (config B (type bool)))"#
    );
}

#[test]
fn config_file_supplies_srctree_and_env() {
    let dir = tempfile::tempdir().unwrap();
    let root = write(dir.path(), "Kconfig", "source \"arch/$(SRCARCH)/Kconfig\"\n");
    write(dir.path(), "arch/arm64/Kconfig", "config ARM64\n\tdef_bool y\n");

    let config = CliConfig::from_toml(&format!(
        "srctree = {:?}\n[env]\nSRCARCH = \"arm64\"\n",
        dir.path().display().to_string()
    ))
    .unwrap();

    let out = run_args(&["symbols", &root], &config).unwrap();
    assert!(out.starts_with("ARM64\tbool\t"), "{out}");
    assert!(out.trim_end().ends_with("arch/arm64/Kconfig:1:1"), "{out}");
}

#[test]
fn symbols_lists_types_and_locations() {
    let dir = tempfile::tempdir().unwrap();
    let root = write(
        dir.path(),
        "Kconfig",
        "config A\n\ttristate\n\nsource \"sub.kconfig\"\n",
    );
    write(dir.path(), "sub.kconfig", "config N\n\tint\nconfig P\n\tprompt \"p\"\n");
    let srctree = dir.path().display().to_string();

    let out = run_ok(&["symbols", &root, "--srctree", &srctree]);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 3, "{out}");
    assert!(lines[0].starts_with("A\ttristate\t") && lines[0].ends_with("Kconfig:1:1"));
    assert!(lines[1].starts_with("N\tint\t") && lines[1].ends_with("sub.kconfig:1:1"));
    assert!(lines[2].starts_with("P\tunknown\t") && lines[2].ends_with("sub.kconfig:3:1"));
}

#[test]
fn cycle_is_reported_with_source_excerpt() {
    let dir = tempfile::tempdir().unwrap();
    let root = write(dir.path(), "a.kconfig", "source \"b.kconfig\"\n");
    write(dir.path(), "b.kconfig", "config B\n\tbool\nsource \"a.kconfig\"\n");
    let srctree = dir.path().display().to_string();

    let err = run_args(&["resolve", &root, "--srctree", &srctree], &CliConfig::default())
        .unwrap_err();
    let Some(Reported(report)) = err.downcast_ref::<Reported>() else {
        panic!("expected a rendered report, got {err:#}");
    };
    assert!(report.contains("cyclic inclusion"), "{report}");
    assert!(report.contains("source \"a.kconfig\""), "{report}");
}

#[test]
fn depth_limit_flag() {
    let dir = tempfile::tempdir().unwrap();
    let root = write(dir.path(), "Kconfig", "source \"one\"\n");
    write(dir.path(), "one", "source \"two\"\n");
    write(dir.path(), "two", "config DEEP\n\tbool\n");
    let srctree = dir.path().display().to_string();

    assert!(run_ok(&["resolve", &root, "--srctree", &srctree]).contains("DEEP"));
    let err = run_args(
        &["resolve", &root, "--srctree", &srctree, "--max-depth", "1"],
        &CliConfig::default(),
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("depth limit of 1"), "{err:#}");
}

#[test]
fn syntax_error_is_rendered() {
    let dir = tempfile::tempdir().unwrap();
    let root = write(dir.path(), "Kconfig", "menu \"M\"\nconfig A\n\tbool\n");

    let err = run_args(&["parse", &root], &CliConfig::default()).unwrap_err();
    let Some(Reported(report)) = err.downcast_ref::<Reported>() else {
        panic!("expected a rendered report, got {err:#}");
    };
    assert!(report.contains("unexpected end of input"), "{report}");
}

#[test]
fn missing_root_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope").display().to_string();
    assert!(run_args(&["parse", &missing], &CliConfig::default()).is_err());
    assert!(run_args(&["resolve", &missing], &CliConfig::default()).is_err());
}

#[rstest]
#[case::and_is_min(&["A && B", "--set", "A=y", "--set", "B=m"], "m")]
#[case::or_is_max(&["A || B", "--set", "A=n", "--set", "B=m"], "m")]
#[case::not_module_is_n(&["!B", "--set", "B=m"], "n")]
#[case::unknown_is_n(&["UNSET"], "n")]
#[case::string_equality(&["ARCH = \"x86\"", "--set", "ARCH=x86"], "y")]
#[case::numeric_compare(&["NR >= 0x10", "--set", "NR=16"], "y")]
#[case::symbol_value(&["ARCH", "--set", "ARCH=x86"], "x86")]
fn eval_prints_value(#[case] args: &[&str], #[case] expected: &str) {
    let mut full = vec!["eval"];
    full.extend_from_slice(args);
    assert_eq!(run_ok(&full).trim(), expected);
}

#[test]
fn eval_strict_rejects_mixed_operands() {
    let args = ["eval", "A && ARCH", "--set", "A=y", "--set", "ARCH=x86", "--strict"];
    let err = run_args(&args, &CliConfig::default()).unwrap_err();
    assert!(format!("{err:#}").contains("type mismatch"), "{err:#}");

    let lenient = run_ok(&args[..args.len() - 1]);
    assert_eq!(lenient.trim(), "n");
}

#[test]
fn eval_bad_assignment() {
    let err = run_args(&["eval", "A", "--set", "A"], &CliConfig::default()).unwrap_err();
    assert!(format!("{err:#}").contains("NAME=VALUE"), "{err:#}");
}

#[test]
fn eval_syntax_error() {
    let err = run_args(&["eval", "A &&"], &CliConfig::default()).unwrap_err();
    assert!(err.downcast_ref::<Reported>().is_some(), "{err:#}");
}

#[test]
fn env_flag_requires_assignment() {
    let parsed = Cli::try_parse_from(["kconfig", "resolve", "Kconfig", "--env", "NOVALUE"]);
    assert!(parsed.is_err());
}
