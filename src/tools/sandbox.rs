use std::{fs, process::Command};

use anyhow::{Context, Result};

use crate::types::TestOutcome;

const OUTPUT_LIMIT_BYTES: usize = 8_000;

/// Runs a candidate plus its generated tests in isolation.
/// One implementation talks to pytest; tests substitute stubs.
pub trait TestExecutor {
    fn execute(&mut self, source: &str, test_source: &str) -> Result<TestOutcome>;
}

/// Writes `solution.py` and `test_solution.py` into a fresh scratch
/// directory, runs pytest scoped to it, and destroys the directory on return
/// regardless of outcome.
pub struct PytestSandbox {
    python: String,
}

impl PytestSandbox {
    pub fn new() -> Self {
        Self {
            python: std::env::var("CODECREW_PYTHON").unwrap_or_else(|_| "python3".to_string()),
        }
    }
}

impl TestExecutor for PytestSandbox {
    fn execute(&mut self, source: &str, test_source: &str) -> Result<TestOutcome> {
        let scratch = tempfile::Builder::new()
            .prefix("codecrew-sandbox-")
            .tempdir()
            .context("failed to create sandbox directory")?;
        fs::write(scratch.path().join("solution.py"), source)?;
        fs::write(scratch.path().join("test_solution.py"), test_source)?;

        let output = Command::new(&self.python)
            .args(["-m", "pytest", "-q"])
            .current_dir(scratch.path())
            .output()
            .with_context(|| format!("failed to run `{} -m pytest`", self.python))?;

        let mut text = String::new();
        text.push_str(&String::from_utf8_lossy(&output.stdout));
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        if text.len() > OUTPUT_LIMIT_BYTES {
            text.truncate(OUTPUT_LIMIT_BYTES);
            text.push_str("\n...[truncated]");
        }

        Ok(TestOutcome {
            passed: output.status.success(),
            output: text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Exercise the sandbox with `true`/`false` standing in for the test
    // runner, so the suite does not depend on a Python toolchain.
    fn sandbox_with(program: &str) -> PytestSandbox {
        PytestSandbox {
            python: program.to_string(),
        }
    }

    #[test]
    #[cfg(unix)]
    fn zero_exit_status_means_passed() {
        let mut sandbox = sandbox_with("true");
        let outcome = sandbox.execute("x = 1", "def test_x(): pass").unwrap();
        assert!(outcome.passed);
    }

    #[test]
    #[cfg(unix)]
    fn nonzero_exit_status_means_failed() {
        let mut sandbox = sandbox_with("false");
        let outcome = sandbox.execute("x = 1", "def test_x(): pass").unwrap();
        assert!(!outcome.passed);
    }

    #[test]
    fn missing_runner_surfaces_an_error() {
        let mut sandbox = sandbox_with("codecrew-no-such-binary");
        assert!(sandbox.execute("x = 1", "").is_err());
    }
}
