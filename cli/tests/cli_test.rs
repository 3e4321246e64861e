use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use tern_core::ast::{Expr, Ident, Program, Stmt};
use tern_core::token::Token;

fn write_program(dir: &TempDir, name: &str, stmts: Vec<Stmt>) -> PathBuf {
    let path = dir.path().join(name);
    let json = Program::new(stmts).to_json().expect("serialize tree");
    std::fs::write(&path, json).expect("write tree");
    path
}

fn tern() -> Command {
    let mut cmd = Command::cargo_bin("tern").expect("binary built");
    cmd.env_remove("TERN_TRACE");
    cmd
}

fn run(path: &Path) -> Command {
    let mut cmd = tern();
    cmd.arg("run").arg(path);
    cmd
}

#[test]
fn test_run_prints_return_values() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_program(
        &dir,
        "sum.json",
        vec![Stmt::ret(vec![
            Expr::binary(Expr::int(1), Token::Add, Expr::int(2)),
            Expr::string("done"),
        ])],
    );

    run(&file).assert().success().stdout("3\ndone\n");
}

#[test]
fn test_run_with_stdlib_output() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_program(
        &dir,
        "hello.json",
        vec![
            Stmt::import("fmt"),
            Stmt::expr(Expr::method_call(
                Expr::ident("fmt"),
                "println",
                vec![Expr::string("hi"), Expr::int(2)],
            )),
        ],
    );

    run(&file).assert().success().stdout("hi 2\n");
}

#[test]
fn test_run_error_reports_line_and_column() {
    let dir = tempfile::tempdir().unwrap();
    let missing = Expr::Ident(Ident {
        name: "ghost".to_string(),
        pos: 7,
    });
    let file = write_program(&dir, "ghost.json", vec![Stmt::ret(vec![missing])]);
    let source = dir.path().join("ghost.tn");
    std::fs::write(&source, "x := 1\nreturn ghost\n").unwrap();

    run(&file)
        .arg("--source")
        .arg(&source)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error: 'ghost' not found at 2:1"));

    run(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("at offset 7"));
}

#[test]
fn test_run_honours_call_depth_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_program(
        &dir,
        "deep.json",
        vec![
            Stmt::func(
                "down",
                &["n"],
                vec![Stmt::ret(vec![Expr::call(
                    Expr::ident("down"),
                    vec![Expr::binary(Expr::ident("n"), Token::Add, Expr::int(1))],
                )])],
            ),
            Stmt::ret(vec![Expr::call(Expr::ident("down"), vec![Expr::int(0)])]),
        ],
    );
    let config = dir.path().join("tern.toml");
    std::fs::write(&config, "[runtime]\nmax_call_depth = 8\n").unwrap();

    run(&file)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("call depth exceeded"));
}

#[test]
fn test_run_rejects_unknown_config_keys() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_program(&dir, "one.json", vec![Stmt::ret(vec![Expr::int(1)])]);
    let config = dir.path().join("tern.toml");
    std::fs::write(&config, "[runtime]\nturbo = true\n").unwrap();

    run(&file)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid config"));
}

#[test]
fn test_run_fails_when_spawned_task_fails() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_program(
        &dir,
        "spawn.json",
        vec![
            Stmt::func("boom", &[], vec![Stmt::ret(vec![Expr::ident("nowhere")])]),
            Stmt::spawn(Expr::call(Expr::ident("boom"), vec![])),
            Stmt::ret(vec![Expr::int(5)]),
        ],
    );

    run(&file)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("'nowhere' not found"));
}

#[test]
fn test_run_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    run(&dir.path().join("absent.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read file"));
}

#[test]
fn test_run_rejects_non_tree_input() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("junk.json");
    std::fs::write(&path, "{\"not\": \"a tree\"}").unwrap();
    run(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a syntax tree"));
}

#[test]
fn test_compile_prints_listing_and_json() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_program(
        &dir,
        "twice.json",
        vec![
            Stmt::func(
                "twice",
                &["x"],
                vec![Stmt::ret(vec![Expr::binary(Expr::ident("x"), Token::Mul, Expr::int(2))])],
            ),
            Stmt::ret(vec![Expr::call(Expr::ident("twice"), vec![Expr::int(4)])]),
        ],
    );

    tern()
        .arg("compile")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("proto #0 <main>()").and(predicate::str::contains("proto #1 twice(x)")));

    tern()
        .arg("compile")
        .arg(&file)
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("SendMethod"));
}

#[test]
fn test_compile_error_exits_with_status_one() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_program(&dir, "bad.json", vec![Stmt::ret(vec![Expr::ident("undeclared")])]);

    tern()
        .arg("compile")
        .arg(&file)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error:").and(predicate::str::contains("undeclared")));
}

#[test]
fn test_missing_subcommand_prints_usage() {
    tern().assert().failure().stderr(predicate::str::contains("Usage"));
}
