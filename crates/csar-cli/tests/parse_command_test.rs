use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn cargo_bin() -> PathBuf {
    if let Ok(path) = env::var("CARGO_BIN_EXE_csar") {
        return PathBuf::from(path);
    }

    let target_dir = env::var("CARGO_TARGET_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| repo_root().join("target"));
    let executable_name = format!("csar{}", std::env::consts::EXE_SUFFIX);
    let fallback = target_dir.join("debug").join(executable_name);

    if fallback.exists() {
        return fallback;
    }

    panic!(
        "CARGO_BIN_EXE_csar is not set and fallback binary was not found at {}",
        fallback.display()
    );
}

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

fn archive_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    for (path, content) in files {
        let full = dir.path().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(full, content).expect("write fixture");
    }
    dir
}

fn run_csar(args: &[&str]) -> Output {
    Command::new(cargo_bin())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("run csar")
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

const VALID: &str = "tosca_definitions_version: alien_dsl_1_3_0\nmetadata:\n  template_name: webapp\n  template_version: 1.0.0\nnode_types:\n  my.App:\n    derived_from: tosca.nodes.Root\n";

#[test]
fn parse_valid_archive_exits_zero() {
    let dir = archive_dir(&[("main.yaml", VALID)]);

    let output = run_csar(&["parse", &path_arg(dir.path())]);

    assert!(
        output.status.success(),
        "expected parse to succeed; stdout: {}; stderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("archive: webapp 1.0.0 (alien_dsl_1_3_0)"));
    assert!(stdout.contains("types: 1 node, 0 data"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Parse summary: errors=0, warnings=0"));
}

#[test]
fn parse_json_output_contains_result() {
    let dir = archive_dir(&[(
        "main.yaml",
        "tosca_definitions_version: alien_dsl_1_3_0\nmetadata:\n  template_name: webapp\n  template_version: 1.0.0\nbogus: 1\n",
    )]);

    let output = run_csar(&["parse", &path_arg(dir.path()), "--format", "json"]);

    assert_eq!(output.status.code(), Some(0));
    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should contain valid JSON");
    assert_eq!(parsed["value"]["archive"]["name"], "webapp");
    assert_eq!(parsed["issues"][0]["code"], "UNRECOGNIZED_PROPERTY");
    assert_eq!(parsed["issues"][0]["severity"], "WARNING");
}

#[test]
fn parse_with_errors_exits_one() {
    let dir = archive_dir(&[(
        "main.yaml",
        "tosca_definitions_version: alien_dsl_1_3_0\nmetadata:\n  template_name: webapp\n  template_version: 1.0.0\nnode_types:\n  my.App:\n    derived_from: my.Missing\n",
    )]);

    let output = run_csar(&["parse", &path_arg(dir.path())]);

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("TYPE_NOT_FOUND"), "stdout: {stdout}");
}

#[test]
fn parse_multiple_roots_is_fatal() {
    let dir = archive_dir(&[("a.yaml", VALID), ("b.yaml", VALID), ("c.yaml", VALID)]);

    let output = run_csar(&["parse", &path_arg(dir.path())]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("SINGLE_DEFINITION_SUPPORTED"), "stderr: {stderr}");
}

#[test]
fn parse_fatal_json_reports_issue() {
    let dir = archive_dir(&[]);

    let output = run_csar(&["parse", &path_arg(dir.path()), "--format", "json"]);

    assert_eq!(output.status.code(), Some(2));
    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should contain valid JSON");
    assert_eq!(parsed["fatal"], true);
    assert_eq!(parsed["issue"]["code"], "SINGLE_DEFINITION_SUPPORTED");
}

#[test]
fn parse_single_document() {
    let dir = archive_dir(&[("only.yaml", "tosca_definitions_version: alien_dsl_1_2_0\ntemplate_name: flat\n")]);
    let document = dir.path().join("only.yaml");

    let output = run_csar(&["parse", "--document", &path_arg(&document)]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("archive: flat"), "stdout: {stdout}");
}

#[test]
fn invalid_config_returns_fatal_exit_code() {
    let dir = archive_dir(&[("main.yaml", VALID), ("config.yaml", "entry_pattern: '('\n")]);
    let config = dir.path().join("config.yaml");

    let output = run_csar(&[
        "--config",
        &path_arg(&config),
        "parse",
        &path_arg(dir.path()),
    ]);

    assert_eq!(output.status.code(), Some(2));
    assert!(
        String::from_utf8_lossy(&output.stderr).contains("ERROR:"),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn discover_lists_root_candidates() {
    let dir = archive_dir(&[
        ("b.yaml", VALID),
        ("a.yml", VALID),
        ("nested/c.yaml", VALID),
        ("notes.txt", "x"),
    ]);

    let output = run_csar(&["discover", &path_arg(dir.path())]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["a.yml", "b.yaml"]);
}

#[test]
fn dialects_lists_supported_versions() {
    let output = run_csar(&["dialects"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("alien_dsl_1_1_0"));
    assert!(stdout.contains("tosca_simple_yaml_1_0"));
    assert!(stdout.contains("alien_dsl_1_3_0 (default)"));
}
