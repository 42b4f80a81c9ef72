use std::path::PathBuf;

use thiserror::Error;

/// One user request, immutable for the duration of a single crew run.
#[derive(Debug, Clone)]
pub struct Request {
    pub prompt: String,
    pub plan: bool,
}

/// Result of one sandbox test invocation.
#[derive(Debug, Clone)]
pub struct TestOutcome {
    pub passed: bool,
    pub output: String,
}

/// How a crew run ended. Abort is a clean, user-requested stop, not an error.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Finished {
        code: String,
        path: PathBuf,
        /// True when the caller supplied `--save` and the file was already written.
        explicit_save: bool,
    },
    Aborted,
}

/// Operator choice after a failed test attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixChoice {
    Refix,
    ManualEdit,
    Abort,
}

impl FixChoice {
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'r' => Some(Self::Refix),
            'm' => Some(Self::ManualEdit),
            'a' => Some(Self::Abort),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum CrewError {
    #[error("tests still failing after {attempts} attempts; giving up without saving")]
    TestLoopExhausted { attempts: usize, output: String },
}
