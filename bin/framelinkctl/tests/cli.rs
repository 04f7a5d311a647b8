//! ---
//! fl_section: "15-testing-qa-runbook"
//! fl_subsection: "integration-tests"
//! fl_type: "source"
//! fl_scope: "code"
//! fl_description: "Integration and validation tests for the framelink stack."
//! fl_version: "v0.0.0-prealpha"
//! fl_owner: "tbd"
//! ---
use assert_cmd::Command;

fn write_capture(contents: &str) -> tempfile::NamedTempFile {
    let file = tempfile::NamedTempFile::new().expect("temp file");
    std::fs::write(file.path(), contents).expect("write capture");
    file
}

fn framelinkctl() -> Command {
    let mut cmd = Command::cargo_bin("framelinkctl").expect("binary built");
    cmd.env("FRAMELINK_LOG", "off").env_remove("FRAMELINK_CONFIG");
    cmd
}

#[test]
fn replay_prints_json_summary() {
    let capture = write_capture(
        "{\"payload\":{\"type\":\"status\",\"data\":{\"enabled\":true}}}\n{\"payload\":{\"type\":\"refresh-preview\"}}\n{\"payload\":{\"type\":\"bogus\"}}\n",
    );
    let output = framelinkctl()
        .arg("replay")
        .arg(capture.path())
        .arg("--json")
        .output()
        .expect("run replay");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"records\":3"), "stdout: {stdout}");
    assert!(stdout.contains("\"delivered\":2"), "stdout: {stdout}");
    assert!(stdout.contains("\"discarded\":1"), "stdout: {stdout}");
}

#[test]
fn replay_json_stays_parseable_with_verbose_logging() {
    let capture = write_capture(
        "{\"payload\":{\"type\":\"status\",\"data\":{\"enabled\":true}}}\n{\"payload\":{\"type\":\"refresh-preview\"}}\n",
    );
    let config = write_capture("[logging]\nfilter = \"debug\"\n");
    let output = Command::cargo_bin("framelinkctl")
        .expect("binary built")
        .env_remove("FRAMELINK_LOG")
        .env_remove("RUST_LOG")
        .env_remove("FRAMELINK_CONFIG")
        .arg("replay")
        .arg(capture.path())
        .arg("--config")
        .arg(config.path())
        .arg("--json")
        .output()
        .expect("run replay");
    assert!(output.status.success());

    let summary: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is a single JSON document");
    assert_eq!(summary["records"], 2);
    assert_eq!(summary["delivered"], 2);
    assert_eq!(summary["by_kind"]["status"], 1);
}

#[test]
fn replay_fails_on_missing_capture() {
    framelinkctl()
        .arg("replay")
        .arg("does-not-exist.ndjson")
        .assert()
        .failure();
}

#[test]
fn inspect_accepts_valid_outbound_capture() {
    let capture = write_capture(
        "{\"type\":\"sdk-initialized\",\"requestId\":\"r-1\",\"data\":{\"version\":\"1.2.0\"}}\n",
    );
    framelinkctl()
        .args(["inspect", "--direction", "outbound"])
        .arg(capture.path())
        .assert()
        .success();
}

#[test]
fn inspect_flags_invalid_lines() {
    let capture = write_capture(
        "{\"type\":\"status\",\"data\":{\"enabled\":false}}\n{\"type\":\"status\"}\nnot json\n",
    );
    let output = framelinkctl()
        .args(["inspect", "--direction", "inbound"])
        .arg(capture.path())
        .output()
        .expect("run inspect");
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("line 2:"), "stdout: {stdout}");
    assert!(stdout.contains("line 3:"), "stdout: {stdout}");
    assert!(stdout.contains("Invalid: 2"), "stdout: {stdout}");
}
