use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};

/// Captured result of one external command.
#[derive(Clone, Debug)]
pub struct RunOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Execute a program and capture stdout/stderr. `suppress_stderr` drops the
/// child's stderr entirely instead of capturing it.
///
/// # Errors
///
/// Returns an error when the program cannot be spawned; a non-zero exit is
/// reported through [`RunOutput::code`], not as an error.
pub fn run_command(
    program: &str,
    args: &[String],
    cwd: &Path,
    suppress_stderr: bool,
) -> Result<RunOutput> {
    let mut command = Command::new(program);
    command.args(args).current_dir(cwd).stdin(Stdio::null());
    if suppress_stderr {
        command.stderr(Stdio::null());
    }
    let output = command
        .output()
        .with_context(|| format!("failed to start {program}"))?;
    Ok(RunOutput {
        code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn captures_output_and_exit_code() -> Result<()> {
        let output = run_command(
            "/bin/sh",
            &[
                "-c".to_string(),
                "printf out && printf err >&2; exit 7".to_string(),
            ],
            Path::new("."),
            false,
        )?;
        assert_eq!(output.code, 7);
        assert_eq!(output.stdout, "out");
        assert_eq!(output.stderr, "err");
        assert!(!output.success());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn suppressed_stderr_is_empty() -> Result<()> {
        let output = run_command(
            "/bin/sh",
            &["-c".to_string(), "printf err >&2".to_string()],
            Path::new("."),
            true,
        )?;
        assert_eq!(output.code, 0);
        assert_eq!(output.stderr, "");
        Ok(())
    }

    #[test]
    fn missing_program_is_an_error() {
        let result = run_command(
            "plugsync-test-no-such-binary",
            &[],
            Path::new("."),
            false,
        );
        assert!(result.is_err());
    }
}
