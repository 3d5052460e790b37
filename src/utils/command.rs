//! Command execution primitives with consistent error handling.

use std::path::Path;
use std::process::{Command, Output};

use serde::Serialize;

use crate::error::{Error, Result};

/// Captured output from command execution.
/// Reusable primitive for any step that executes external processes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CapturedOutput {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
}

impl CapturedOutput {
    pub fn new(stdout: String, stderr: String) -> Self {
        Self { stdout, stderr }
    }

    pub fn is_empty(&self) -> bool {
        self.stdout.is_empty() && self.stderr.is_empty()
    }
}

/// Exit status plus captured streams from a finished process.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessResult {
    pub exit_code: i32,
    pub success: bool,
    #[serde(flatten)]
    pub output: CapturedOutput,
}

fn to_process_result(output: Output) -> ProcessResult {
    ProcessResult {
        exit_code: output.status.code().unwrap_or(-1),
        success: output.status.success(),
        output: CapturedOutput::new(
            String::from_utf8_lossy(&output.stdout).to_string(),
            String::from_utf8_lossy(&output.stderr).to_string(),
        ),
    }
}

/// Run a command and capture its exit code and output.
///
/// Only fails if the process cannot be spawned; a non-zero exit is
/// reported through `ProcessResult`, not as an error.
pub fn capture(program: &str, args: &[&str], context: &str) -> Result<ProcessResult> {
    let output = Command::new(program).args(args).output().map_err(|e| {
        Error::internal_io(
            format!("Failed to run {}: {}", context, e),
            Some(context.to_string()),
        )
    })?;
    Ok(to_process_result(output))
}

/// Run a command in a specific directory and capture its exit code and output.
pub fn capture_in(dir: &Path, program: &str, args: &[&str], context: &str) -> Result<ProcessResult> {
    let output = Command::new(program)
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| {
            Error::internal_io(
                format!("Failed to run {}: {}", context, e),
                Some(context.to_string()),
            )
        })?;
    Ok(to_process_result(output))
}

/// Run a shell command line through `sh -c` in a directory.
///
/// Build commands are shell lines by design: they chain with `&&`, use
/// environment variables, and invoke scripts. Direct exec cannot express that.
pub fn capture_shell_in(dir: &Path, command_line: &str, context: &str) -> Result<ProcessResult> {
    capture_in(dir, "sh", &["-c", command_line], context)
}

/// Extract error text from a finished process.
///
/// Prefers stderr, falls back to stdout if stderr is empty.
pub fn error_text(result: &ProcessResult) -> String {
    let stderr = result.output.stderr.trim();
    if !stderr.is_empty() {
        stderr.to_string()
    } else {
        result.output.stdout.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn capture_succeeds_with_valid_command() {
        let result = capture("echo", &["hello"], "echo test").unwrap();
        assert!(result.success);
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.output.stdout.trim(), "hello");
    }

    #[test]
    fn capture_reports_nonzero_exit_without_error() {
        let result = capture("sh", &["-c", "exit 7"], "exit test").unwrap();
        assert!(!result.success);
        assert_eq!(result.exit_code, 7);
    }

    #[test]
    fn capture_fails_when_program_missing() {
        let result = capture("nonexistent_command_xyz", &[], "test");
        assert!(result.is_err());
    }

    #[test]
    fn capture_shell_in_runs_in_directory() {
        let result = capture_shell_in(&PathBuf::from("/tmp"), "pwd", "pwd test").unwrap();
        assert!(result.success);
        assert!(result.output.stdout.trim().ends_with("tmp"));
    }

    #[test]
    fn error_text_prefers_stderr() {
        let result = capture("sh", &["-c", "echo out; echo err >&2; exit 1"], "t").unwrap();
        assert_eq!(error_text(&result), "err");
    }

    #[test]
    fn error_text_falls_back_to_stdout() {
        let result = capture("sh", &["-c", "echo only-stdout; exit 1"], "t").unwrap();
        assert_eq!(error_text(&result), "only-stdout");
    }
}
