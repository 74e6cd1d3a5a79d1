//! End-to-end runs of the `kube` binary with standard utilities standing in
//! for kubectl.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn kube(tool: &str) -> Command {
    let mut cmd = Command::cargo_bin("kube").unwrap();
    cmd.env("KUBE_TOOL", tool)
        .env_remove("KUBE_TIMEOUT")
        .env_remove("KUBE_USER")
        .env_remove("KUBE_DIR")
        .env_remove("KUBE_ASSUME_YES")
        .env_remove("KUBE_PLUGIN_PATH")
        .env_remove("KUBE_LOG")
        .env("NO_COLOR", "1");
    cmd
}

fn install_plugin(dir: &Path, name: &str, body: &str) {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
}

fn path_with(dir: &Path) -> String {
    let current = std::env::var("PATH").unwrap_or_default();
    format!("{}:{current}", dir.display())
}

#[test]
fn forwards_known_subcommand() {
    kube("echo")
        .args(["get", "pods", "-o", "wide"])
        .assert()
        .success()
        .stdout("get pods -o wide\n");
}

#[test]
fn tool_flags_after_the_token_are_not_parsed() {
    kube("echo")
        .args(["get", "pods", "--help", "--kube-yes"])
        .assert()
        .success()
        .stdout("get pods --help --kube-yes\n");
}

#[test]
fn wrapper_option_selects_the_tool() {
    Command::cargo_bin("kube")
        .unwrap()
        .env_remove("KUBE_TOOL")
        .args(["--kube-tool", "echo", "version"])
        .assert()
        .success()
        .stdout("version\n");
}

#[test]
fn tool_name_is_transparent() {
    kube("echo")
        .args(["echo", "hello", "world"])
        .assert()
        .success()
        .stdout("hello world\n");
}

#[test]
fn typo_is_corrected_with_notice() {
    kube("echo")
        .args(["dscribe", "pods"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "You called a echo command named 'dscribe', which does not exist.",
        ))
        .stdout(predicate::str::ends_with("describe pods\n"));
}

#[test]
fn unknown_command_exits_one() {
    kube("echo")
        .arg("zzzzzz")
        .assert()
        .code(1)
        .stderr("zzzzzz: no such command in echo\n");
}

#[test]
fn ambiguous_command_exits_one() {
    kube("echo")
        .arg("sget")
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "The most similar commands are [\"set\", \"get\"]",
        ));
}

#[test]
fn failing_tool_reports_stderr_and_code() {
    kube("ls")
        .args(["get", "/kube/does/not/exist"])
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("Error: "));
}

#[test]
fn timeout_kills_the_tool() {
    kube("sleep")
        .args(["--kube-timeout", "100ms", "sleep", "5"])
        .timeout(std::time::Duration::from_secs(4))
        .assert()
        .code(255);
}

#[test]
fn missing_tool_is_a_hard_error() {
    kube("kube-no-such-tool-installed")
        .args(["get", "pods"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to run"));
}

#[test]
fn delete_waits_for_confirmation() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config");
    fs::write(&config, "current-context: prod\n").unwrap();
    kube("echo")
        .env("KUBECONFIG", &config)
        .args(["delete", "pod", "web-0"])
        .write_stdin("\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("-> current context \"prod\""))
        .stdout(predicate::str::ends_with("delete pod web-0\n"));
}

#[test]
fn confirmation_can_be_skipped() {
    kube("echo")
        .env("KUBECONFIG", "/nonexistent/kubeconfig")
        .args(["--kube-yes", "apply", "-f", "x.yaml"])
        .assert()
        .success()
        .stdout("apply -f x.yaml\n");
}

#[test]
fn plugin_runs_attached() {
    let dir = tempfile::tempdir().unwrap();
    install_plugin(dir.path(), "kubectl-hello", "echo \"hi $1\"");
    kube("echo")
        .env("PATH", path_with(dir.path()))
        .args(["hello", "there"])
        .assert()
        .success()
        .stdout("hi there\n");
}

#[test]
fn plugin_exit_code_is_forwarded() {
    let dir = tempfile::tempdir().unwrap();
    install_plugin(dir.path(), "kube-fail", "exit 3");
    kube("echo")
        .env("PATH", path_with(dir.path()))
        .arg("fail")
        .assert()
        .code(3);
}

#[test]
fn two_plugins_are_ambiguous() {
    let dir = tempfile::tempdir().unwrap();
    install_plugin(dir.path(), "kube-foo", "exit 0");
    install_plugin(dir.path(), "kubectl-foo", "exit 0");
    kube("echo")
        .env("PATH", path_with(dir.path()))
        .arg("foo")
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("Some commands are found: ["))
        .stderr(predicate::str::contains("kube-foo"))
        .stderr(predicate::str::contains("kubectl-foo"));
}

#[test]
fn extra_environment_reaches_the_tool() {
    kube("sh")
        .args(["--kube-env", "GREETING=hi", "sh", "-c", "echo $GREETING"])
        .assert()
        .success()
        .stdout("hi\n");
}

#[test]
fn extra_environment_survives_non_utf8_variables() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    kube("sh")
        .env("KUBE_TEST_RAW", OsStr::from_bytes(b"\xff\xfe"))
        .args(["--kube-env", "GREETING=hi", "sh", "-c", "echo $GREETING"])
        .assert()
        .success()
        .stdout("hi\n");
}

#[test]
fn assume_yes_accepts_numeric_env_values() {
    kube("echo")
        .env("KUBE_ASSUME_YES", "1")
        .env("KUBECONFIG", "/nonexistent/kubeconfig")
        .args(["apply", "-f", "x.yaml"])
        .assert()
        .success()
        .stdout("apply -f x.yaml\n");
}

#[test]
fn assume_yes_zero_keeps_the_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config");
    fs::write(&config, "current-context: dev\n").unwrap();
    kube("echo")
        .env("KUBE_ASSUME_YES", "0")
        .env("KUBECONFIG", &config)
        .args(["delete", "ns", "x"])
        .write_stdin("\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("-> current context \"dev\""));
}

#[test]
fn plugin_path_option_replaces_path_lookup() {
    let dir = tempfile::tempdir().unwrap();
    install_plugin(dir.path(), "kube-greet", "echo greeted");
    kube("echo")
        .args(["--kube-plugin-path"])
        .arg(dir.path())
        .arg("greet")
        .assert()
        .success()
        .stdout("greeted\n");
}

#[test]
fn timeout_covers_forked_children() {
    kube("sh")
        .args(["--kube-timeout", "100ms", "sh", "-c", "sleep 5; true"])
        .timeout(std::time::Duration::from_secs(3))
        .assert()
        .code(255);
}
