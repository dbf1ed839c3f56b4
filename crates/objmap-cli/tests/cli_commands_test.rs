//! Integration tests running the `objmap` binary against testdata/.

use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

fn testdata(path: &str) -> String {
    repo_root()
        .join("testdata")
        .join(path)
        .to_string_lossy()
        .into_owned()
}

fn objmap(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_objmap"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("objmap should execute")
}

fn assert_exit_code(output: &Output, expected: i32) {
    let actual = output.status.code().unwrap_or(-1);
    assert_eq!(
        actual,
        expected,
        "unexpected exit code; stdout: {}; stderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn map_applies_profile_and_conventions() {
    let types = testdata("types/users.yaml");
    let profile = testdata("profiles/users.yaml");
    let input = testdata("input/user.json");
    let output = objmap(&[
        "map",
        &input,
        "--types",
        &types,
        "--destination",
        "UserDto",
        "--profile",
        &profile,
        "--source-type",
        "UserEntity",
    ]);

    assert_exit_code(&output, 0);
    let dto = stdout_json(&output);
    assert_eq!(dto["id"], 7);
    assert_eq!(dto["firstName"], " Grace ");
    assert_eq!(dto["displayName"], "Grace");
    assert_eq!(dto["emailAddress"], "grace@example.com");
    assert!(dto.get("password").is_none());
}

#[test]
fn map_writes_arrays_to_output_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("users.json");
    std::fs::write(
        &input,
        r#"[{"id": 1, "first_name": "Ann"}, {"id": 2, "first_name": "Bo"}]"#,
    )
    .unwrap();
    let out = dir.path().join("out.json");

    let output = objmap(&[
        "map",
        input.to_str().unwrap(),
        "-t",
        &testdata("types/users.yaml"),
        "-d",
        "UserDto",
        "-s",
        "UserEntity",
        "-o",
        out.to_str().unwrap(),
    ]);

    assert_exit_code(&output, 0);
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written[1]["firstName"], "Bo");
    assert_eq!(written[0]["lastName"], serde_json::Value::Null);
}

#[test]
fn map_with_conventions_disabled_by_config() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("mapper.json");
    std::fs::write(&config, r#"{"use_conventions": false}"#).unwrap();

    let output = objmap(&[
        "--config",
        config.to_str().unwrap(),
        "map",
        &testdata("input/user.json"),
        "-t",
        &testdata("types/users.yaml"),
        "-d",
        "UserDto",
        "-s",
        "UserEntity",
    ]);

    assert_exit_code(&output, 0);
    let dto = stdout_json(&output);
    assert_eq!(dto["id"], 7);
    assert_eq!(dto["firstName"], serde_json::Value::Null);
}

#[test]
fn discover_prints_pairs_with_confidence() {
    let output = objmap(&[
        "discover",
        "-t",
        &testdata("types/users.yaml"),
        "-s",
        "UserEntity",
        "-d",
        "UserDto",
    ]);

    assert_exit_code(&output, 0);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("firstName <- first_name (0.85)"));
    assert!(stdout.contains("emailAddress <- email_addr (0.80)"));
    assert!(stdout.contains("id <- id (1.00)"));
}

#[test]
fn discover_respects_threshold() {
    let output = objmap(&[
        "discover",
        "-t",
        &testdata("types/users.yaml"),
        "-s",
        "UserEntity",
        "-d",
        "UserDto",
        "--threshold",
        "0.99",
    ]);

    assert_exit_code(&output, 0);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("id <- id"));
    assert!(!stdout.contains("firstName"));

    let output = objmap(&[
        "discover",
        "-t",
        &testdata("types/users.yaml"),
        "-s",
        "UserEntity",
        "-d",
        "UserDto",
        "--threshold",
        "1.5",
    ]);
    assert_exit_code(&output, 1);
}

#[test]
fn check_accepts_valid_profile() {
    let output = objmap(&[
        "check",
        "-t",
        &testdata("types/users.yaml"),
        "-p",
        &testdata("profiles/users.yaml"),
    ]);

    assert_exit_code(&output, 0);
    assert!(String::from_utf8_lossy(&output.stdout).contains("OK: 1 mappings sealed"));
}

#[test]
fn check_rejects_unknown_destination_property() {
    let dir = TempDir::new().unwrap();
    let profile = dir.path().join("broken.yaml");
    std::fs::write(
        &profile,
        "name: broken\nmaps:\n  - source: UserEntity\n    destination: UserDto\n    members:\n      nickname:\n        map_from: first_name\n",
    )
    .unwrap();

    let output = objmap(&[
        "check",
        "-t",
        &testdata("types/users.yaml"),
        "-p",
        profile.to_str().unwrap(),
    ]);

    assert_exit_code(&output, 1);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("nickname"));
}
