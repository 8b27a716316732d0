//! Integration tests for the `yxir` binary

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;
use yxir::load_arena;
use yxir::middle::ir::dump_modules;

use crate::fixtures::program;

/// Path to the yxir binary built for this test run
fn yxir_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_yxir"))
}

/// Serialize the fixture program into `dir/name`
fn write_program(
    dir: &Path,
    name: &str,
) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let json = serde_json::to_string(&program().arena).unwrap();
    fs::write(&path, json).unwrap();
    path
}

fn run(args: &[&str]) -> Output {
    Command::new(yxir_bin())
        .args(args)
        .env_remove("YXIR_DCE_TRACE")
        .output()
        .unwrap()
}

#[test]
fn test_dce_writes_pruned_arena() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_program(temp_dir.path(), "program.json");
    let output = temp_dir.path().join("out").join("program.json");
    let config = temp_dir.path().join("missing.toml");

    let result = run(&[
        "dce",
        input.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]);
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));

    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("app.unused"));

    let arena = load_arena(&output).unwrap();
    let dump = dump_modules(&arena).unwrap();
    assert!(dump.contains("FUN name=main"));
    assert!(!dump.contains("FUN name=unused"));
}

#[test]
fn test_dce_trace_goes_to_stdout() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_program(temp_dir.path(), "program.json");
    let config = temp_dir.path().join("missing.toml");

    let result = run(&[
        "dce",
        input.to_str().unwrap(),
        "--trace",
        "--backend",
        "wasm",
        "--config",
        config.to_str().unwrap(),
    ]);
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));

    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.lines().any(|l| l == "\"<ROOT>\" -> \"app.main\""));
    assert!(stdout
        .lines()
        .any(|l| l == "\"app.main\" -> \"runtime.stringGetLiteral\" // string literal"));
}

#[test]
fn test_dce_over_directory() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("in");
    write_program(&input, "a/one.json");
    write_program(&input, "b/two.json");
    fs::write(input.join("notes.txt"), "not an arena").unwrap();
    let output = temp_dir.path().join("out");
    let config = temp_dir.path().join("missing.toml");

    let result = run(&[
        "dce",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]);
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));
    assert!(output.join("a/one.json").exists());
    assert!(output.join("b/two.json").exists());
    assert!(!output.join("notes.txt").exists());
}

#[test]
fn test_dce_unknown_backend_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_program(temp_dir.path(), "program.json");

    let result = run(&[
        "dce",
        input.to_str().unwrap(),
        "--backend",
        "jvm",
    ]);
    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("jvm"));
}

#[test]
fn test_dce_missing_input_fails() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("nowhere.json");

    let result = run(&["dce", input.to_str().unwrap()]);
    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("Path does not exist"));
}

#[test]
fn test_schema_builtin() {
    let result = run(&["schema"]);
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.lines().any(|l| l.starts_with("class ")));
    assert!(stdout.lines().any(|l| l.starts_with("interface ")));
}

#[test]
fn test_schema_from_ron_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("tree.ron");
    fs::write(
        &path,
        r#"(
            elements: [
                (name: "Node", fields: [(name: "body", ty: Some(Child("Node")))]),
                (name: "Leaf", parents: ["Node"], pin: Class),
            ],
        )"#,
    )
    .unwrap();

    let result = run(&["schema", path.to_str().unwrap()]);
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("class Leaf : [Node]"));
}

#[test]
fn test_schema_unsatisfiable_fails() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bad.ron");
    fs::write(
        &path,
        r#"(
            elements: [
                (name: "A", pin: Class),
                (name: "B", pin: Class),
                (name: "C", parents: ["A", "B"]),
            ],
        )"#,
    )
    .unwrap();

    let result = run(&["schema", path.to_str().unwrap()]);
    assert!(!result.status.success());
}

#[test]
fn test_dump_prints_tree() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_program(temp_dir.path(), "program.json");

    let result = run(&["dump", input.to_str().unwrap()]);
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.starts_with("MODULE_FRAGMENT name=runtime"));
    assert!(stdout.contains("  FILE path=main.yx package=app"));
}
