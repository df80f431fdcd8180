//! Advisory check that the companion `claude` CLI is installed.
//!
//! The result is informational only and never changes the outcome of a
//! connectivity check.

use std::io::ErrorKind;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Executable probed by default
pub const DEFAULT_CLI_PROGRAM: &str = "claude";

/// Timeout for the version probe in seconds
pub const VERSION_TIMEOUT_SECS: u64 = 5;

/// Outcome of running `<program> --version`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliToolStatus {
    /// Exit code 0; trimmed stdout
    Available { version: String },
    /// Ran but exited non-zero
    Failed { code: Option<i32> },
    /// Executable not found on PATH
    NotInstalled,
    /// Spawn failure, timeout, or anything else
    Error(String),
}

/// Run `<program> --version` with the default timeout.
pub async fn check_cli_version(program: &str) -> CliToolStatus {
    check_cli_version_with_timeout(program, Duration::from_secs(VERSION_TIMEOUT_SECS)).await
}

pub async fn check_cli_version_with_timeout(program: &str, timeout: Duration) -> CliToolStatus {
    debug!("Running {} --version (timeout {:?})", program, timeout);

    let output = Command::new(program)
        .arg("--version")
        .kill_on_drop(true)
        .output();

    match tokio::time::timeout(timeout, output).await {
        Err(_) => CliToolStatus::Error(format!("timed out after {:?}", timeout)),
        Ok(Err(e)) if e.kind() == ErrorKind::NotFound => CliToolStatus::NotInstalled,
        Ok(Err(e)) => CliToolStatus::Error(e.to_string()),
        Ok(Ok(output)) if output.status.success() => CliToolStatus::Available {
            version: String::from_utf8_lossy(&output.stdout).trim().to_string(),
        },
        Ok(Ok(output)) => {
            debug!(
                "{} --version exited with {}: {}",
                program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            CliToolStatus::Failed {
                code: output.status.code(),
            }
        }
    }
}
