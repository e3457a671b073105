// Regression tests for the `asdl` binary.
// Requires: assert_cmd, predicates crates in [dev-dependencies]

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

const SAMPLE_GRAMMAR: &str = "grammars/py3_subset.asdl";

fn scratch_file(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("asdl-cli-{}-{}", std::process::id(), name));
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn check_prints_sample_grammar() {
    let mut cmd = Command::cargo_bin("asdl").unwrap();
    cmd.arg("check").arg(SAMPLE_GRAMMAR);
    cmd.assert()
        .success()
        .stdout(contains("ImportFrom(identifier? module, alias* names, int? level)"))
        .stdout(contains("root type mod"))
        .stdout(contains("grammar ok"));
}

#[test]
fn check_reports_miette_diagnostics_on_bad_grammar() {
    let bad = scratch_file("bad.asdl", "Expr = Num(int value" /* missing closing paren */);

    let mut cmd = Command::cargo_bin("asdl").unwrap();
    cmd.arg("check").arg(&bad);
    cmd.assert()
        .failure()
        .stderr(contains("asdl::grammar").and(contains("unbalanced").or(contains("help:"))));

    let _ = fs::remove_file(bad);
}

#[test]
fn check_reports_missing_file() {
    let mut cmd = Command::cargo_bin("asdl").unwrap();
    cmd.arg("check").arg("grammars/does_not_exist.asdl");
    cmd.assert().failure().stderr(contains("asdl::io"));
}

#[test]
fn actions_lists_the_canonical_sequence() {
    let grammar = scratch_file("expr.asdl", "Expr = Add(Expr left, Expr right) | Num(int value)");
    let tree = scratch_file(
        "two_plus_three.json",
        r#"{"_type": "Add", "left": {"_type": "Num", "value": 2}, "right": {"_type": "Num", "value": 3}}"#,
    );

    let mut cmd = Command::cargo_bin("asdl").unwrap();
    cmd.arg("actions").arg(&grammar).arg(&tree);
    cmd.assert()
        .success()
        .stdout(contains("5 actions"))
        .stdout(contains("ApplyRule(Add)"))
        .stdout(contains("GenToken(3)"));

    let _ = fs::remove_file(grammar);
    let _ = fs::remove_file(tree);
}

#[test]
fn actions_rejects_unknown_constructor() {
    let tree = scratch_file("unknown.json", r#"{"_type": "Lambda", "body": null}"#);

    let mut cmd = Command::cargo_bin("asdl").unwrap();
    cmd.arg("actions").arg(SAMPLE_GRAMMAR).arg(&tree);
    cmd.assert()
        .failure()
        .stderr(contains("asdl::unknown_constructor"));

    let _ = fs::remove_file(tree);
}

#[test]
fn replay_reproduces_the_tree() {
    let tree = scratch_file(
        "import.json",
        r#"{"_type": "Module", "body": [
            {"_type": "ImportFrom", "module": "os", "names": [{"_type": "alias", "name": "path", "asname": null}], "level": null}
        ]}"#,
    );

    let mut cmd = Command::cargo_bin("asdl").unwrap();
    cmd.arg("replay").arg(SAMPLE_GRAMMAR).arg(&tree);
    cmd.assert()
        .success()
        .stdout(contains("\"level\": 0"))
        .stdout(contains("replay reproduced the input tree"));

    let _ = fs::remove_file(tree);
}

#[test]
fn config_file_overrides_root_type() {
    let config = scratch_file("strict.yaml", "root_type: stmt\nallow_empty_multiple: false\n");
    let tree = scratch_file("pass.json", r#"{"_type": "Pass"}"#);

    let mut cmd = Command::cargo_bin("asdl").unwrap();
    cmd.arg("--config").arg(&config).arg("actions").arg(SAMPLE_GRAMMAR).arg(&tree);
    cmd.assert().success().stdout(contains("ApplyRule(Pass)"));

    let _ = fs::remove_file(config);
    let _ = fs::remove_file(tree);
}
