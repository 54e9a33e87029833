//! Integration tests: run the bp403 binary and check exit codes/output.

use std::process::Command;

fn bp403() -> Command {
    Command::new(env!("CARGO_BIN_EXE_bp403"))
}

#[test]
fn help_lists_core_options() {
    let out = bp403().arg("--help").output().unwrap();
    assert!(out.status.success(), "bp403 --help should succeed");
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("modules"));
    assert!(stdout.contains("concurrent-requests"));
    assert!(stdout.contains("proxy"));
}

#[test]
fn missing_target_url_fails() {
    let out = bp403().output().unwrap();
    assert!(!out.status.success(), "bp403 with no target url should fail");
}

#[test]
fn unreachable_target_reports_error_and_nonzero_exit() {
    let out = bp403()
        .args(["http://127.0.0.1:1/", "--modules", "dumb_check", "--timeout", "200", "--max-retries", "0"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(!stderr.is_empty());
}
