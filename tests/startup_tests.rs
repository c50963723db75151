//! Tests for main.rs startup validation (token secrets, lifetimes).

use std::process::{Command, Stdio};
use std::time::Duration;

const ACCESS_SECRET: &str = "startup-access-secret-0123456789abcdef";
const REFRESH_SECRET: &str = "startup-refresh-secret-0123456789abcdef";

fn cargo_bin() -> std::path::PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // Remove test binary name
    path.pop(); // Remove deps
    path.push("tbs");
    path
}

/// Run the binary to completion and return (success, combined output).
fn run_to_exit(command: &mut Command) -> (bool, String) {
    let output = command
        .args(["--database", ":memory:", "--port", "0"])
        .stderr(Stdio::piped())
        .stdout(Stdio::piped())
        .output()
        .expect("Failed to run binary");

    // tracing logs to stdout by default
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    (output.status.success(), format!("{}{}", stdout, stderr))
}

#[test]
fn test_missing_access_secret_exits_with_error() {
    let (success, combined) = run_to_exit(
        Command::new(cargo_bin())
            .env_remove("JWT_ACCESS_SECRET")
            .env("JWT_REFRESH_SECRET", REFRESH_SECRET),
    );

    assert!(!success, "Should exit with error when JWT_ACCESS_SECRET is missing");
    assert!(
        combined.contains("JWT_ACCESS_SECRET") && combined.contains("required"),
        "Should mention JWT_ACCESS_SECRET is required, got: {}",
        combined
    );
}

#[test]
fn test_missing_refresh_secret_exits_with_error() {
    let (success, combined) = run_to_exit(
        Command::new(cargo_bin())
            .env("JWT_ACCESS_SECRET", ACCESS_SECRET)
            .env_remove("JWT_REFRESH_SECRET"),
    );

    assert!(!success);
    assert!(
        combined.contains("JWT_REFRESH_SECRET") && combined.contains("required"),
        "Should mention JWT_REFRESH_SECRET is required, got: {}",
        combined
    );
}

#[test]
fn test_short_secret_exits_with_error() {
    let (success, combined) = run_to_exit(
        Command::new(cargo_bin())
            .env("JWT_ACCESS_SECRET", "too-short")
            .env("JWT_REFRESH_SECRET", REFRESH_SECRET),
    );

    assert!(!success, "Should exit with error for a short secret");
    assert!(
        combined.contains("shorter"),
        "Should mention the secret is too short, got: {}",
        combined
    );
}

#[test]
fn test_identical_secrets_exit_with_error() {
    let (success, combined) = run_to_exit(
        Command::new(cargo_bin())
            .env("JWT_ACCESS_SECRET", ACCESS_SECRET)
            .env("JWT_REFRESH_SECRET", ACCESS_SECRET),
    );

    assert!(!success, "Should exit with error when both secrets are equal");
    assert!(
        combined.contains("differ"),
        "Should mention the secrets must differ, got: {}",
        combined
    );
}

#[test]
fn test_zero_access_ttl_is_rejected() {
    let (success, _) = run_to_exit(
        Command::new(cargo_bin())
            .env("JWT_ACCESS_SECRET", ACCESS_SECRET)
            .env("JWT_REFRESH_SECRET", REFRESH_SECRET)
            .env("ACCESS_TTL_MIN", "0"),
    );

    assert!(!success, "Should exit with error for a zero access lifetime");
}

#[test]
fn test_valid_secrets_start_server() {
    let mut child = Command::new(cargo_bin())
        .env("JWT_ACCESS_SECRET", ACCESS_SECRET)
        .env("JWT_REFRESH_SECRET", REFRESH_SECRET)
        .args(["--database", ":memory:", "--port", "0"])
        .stderr(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("Failed to run binary");

    // Give it a moment to start or fail
    std::thread::sleep(Duration::from_millis(500));

    match child.try_wait() {
        Ok(Some(status)) => {
            let output = child.wait_with_output().unwrap();
            let stdout = String::from_utf8_lossy(&output.stdout);
            panic!(
                "Server exited unexpectedly with status {:?}, output: {}",
                status, stdout
            );
        }
        Ok(None) => {
            child.kill().ok();
        }
        Err(e) => {
            panic!("Error checking process status: {}", e);
        }
    }
}
