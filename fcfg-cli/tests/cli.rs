use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn robot_grammar() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("fcfg-parser")
        .join("tests")
        .join("fixtures")
        .join("robot.fcfg")
}

fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("failed to write temp file");
    path
}

#[test]
fn check_reports_rules_and_open_classes() {
    let mut cmd = cargo_bin_cmd!("fcfg");
    cmd.arg("check").arg(robot_grammar());

    cmd.assert().success().stdout(
        predicate::str::contains("9 rules, 21 entries")
            .and(predicate::str::contains("  person"))
            .and(predicate::str::contains("  object")),
    );
}

#[test]
fn check_filled_class_is_not_reported() {
    let mut cmd = cargo_bin_cmd!("fcfg");
    cmd.arg("--class")
        .arg("person=rein,loy")
        .arg("check")
        .arg(robot_grammar());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("  object").and(predicate::str::contains("person").not()));
}

#[test]
fn parse_prints_json_value() {
    let mut cmd = cargo_bin_cmd!("fcfg");
    cmd.arg("parse")
        .arg(robot_grammar())
        .arg("T")
        .args(["robot", "exit", "the", "arena"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"action\": \"exit\""));
}

#[test]
fn parse_accepts_sentence_as_single_argument() {
    let mut cmd = cargo_bin_cmd!("fcfg");
    cmd.arg("parse")
        .arg(robot_grammar())
        .arg("T")
        .arg("go to the kitchen");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"id\": \"kitchen\""));
}

#[test]
fn parse_with_yaml_format_and_class() {
    let mut cmd = cargo_bin_cmd!("fcfg");
    cmd.arg("--format")
        .arg("yaml")
        .arg("--class")
        .arg("person=rein,mister brown")
        .arg("parse")
        .arg(robot_grammar())
        .arg("T")
        .arg("find mister brown near the couch");

    cmd.assert().success().stdout(
        predicate::str::contains("action: find")
            .and(predicate::str::contains("id: mister brown")),
    );
}

#[test]
fn parse_failure_exits_with_one() {
    let mut cmd = cargo_bin_cmd!("fcfg");
    cmd.arg("parse")
        .arg(robot_grammar())
        .arg("T")
        .arg("robot exit the kitchen");

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("no derivation"));
}

#[test]
fn config_file_enables_case_sensitive_matching() {
    let dir = TempDir::new().unwrap();
    let config = write_file(&dir, "fcfg.toml", "[matching]\ncase_sensitive = true\n");

    let mut insensitive = cargo_bin_cmd!("fcfg");
    insensitive
        .arg("parse")
        .arg(robot_grammar())
        .arg("T")
        .arg("Robot EXIT the Arena");
    insensitive.assert().success();

    let mut sensitive = cargo_bin_cmd!("fcfg");
    sensitive
        .arg("--config")
        .arg(&config)
        .arg("parse")
        .arg(robot_grammar())
        .arg("T")
        .arg("Robot EXIT the Arena");
    sensitive.assert().code(1);
}

#[test]
fn local_config_file_is_picked_up() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "fcfg.toml", "[matching]\ncase_sensitive = true\n");

    let mut cmd = cargo_bin_cmd!("fcfg");
    cmd.current_dir(dir.path())
        .arg("parse")
        .arg(robot_grammar())
        .arg("T")
        .arg("Robot EXIT the Arena");
    cmd.assert().code(1);

    let mut lowercase = cargo_bin_cmd!("fcfg");
    lowercase.current_dir(dir.path())
        .arg("parse")
        .arg(robot_grammar())
        .arg("T")
        .arg("robot exit the arena");
    lowercase.assert().success();
}

#[test]
fn syntax_error_shows_source_context() {
    let dir = TempDir::new().unwrap();
    let grammar = write_file(&dir, "broken.fcfg", "T -> greet P\nP -> rein |\n");

    let mut cmd = cargo_bin_cmd!("fcfg");
    cmd.arg("check").arg(&grammar);

    cmd.assert().failure().stderr(
        predicate::str::contains("empty alternative")
            .and(predicate::str::contains(">>   2 | P -> rein |")),
    );
}

#[test]
fn missing_grammar_file_fails() {
    let mut cmd = cargo_bin_cmd!("fcfg");
    cmd.arg("check").arg("/nonexistent/grammar.fcfg");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("cannot read grammar file"));
}

#[test]
fn suggest_lists_next_words() {
    let mut cmd = cargo_bin_cmd!("fcfg");
    cmd.arg("suggest")
        .arg(robot_grammar())
        .arg("T")
        .args(["reset", "your"]);

    cmd.assert().success().stdout("left\nright\n");
}

#[test]
fn enumerate_prints_trees() {
    let mut cmd = cargo_bin_cmd!("fcfg");
    cmd.arg("enumerate")
        .arg(robot_grammar())
        .arg("SIDE")
        .arg("--depth")
        .arg("1");

    cmd.assert().success().stdout(
        predicate::str::contains("≔ SIDE #0")
            .and(predicate::str::contains("◦ left"))
            .and(predicate::str::contains("◦ right")),
    );
}

#[test]
fn enumerate_respects_limit() {
    let mut cmd = cargo_bin_cmd!("fcfg");
    cmd.arg("enumerate")
        .arg(robot_grammar())
        .arg("LOC")
        .arg("--limit")
        .arg("1");

    cmd.assert().success().stdout(
        predicate::str::contains("◦ living").and(predicate::str::contains("kitchen").not()),
    );
}

#[test]
fn random_is_reproducible_with_seed() {
    let run = || {
        let mut cmd = cargo_bin_cmd!("fcfg");
        cmd.arg("--class")
            .arg("person=rein")
            .arg("--class")
            .arg("object=coke")
            .arg("random")
            .arg(robot_grammar())
            .arg("T")
            .arg("--seed")
            .arg("7");
        let output = cmd.output().expect("failed to run fcfg");
        assert!(output.status.success());
        String::from_utf8(output.stdout).unwrap()
    };

    let first = run();
    assert!(!first.trim().is_empty());
    assert_eq!(first, run());
}

#[test]
fn undefined_root_is_an_error() {
    let mut cmd = cargo_bin_cmd!("fcfg");
    cmd.arg("parse").arg(robot_grammar()).arg("NOPE").arg("hello");

    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("rule NOPE is not defined"));
}
