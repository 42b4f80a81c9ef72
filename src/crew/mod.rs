pub mod fence;
pub mod filename;

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};

use crate::agent::roles::{self, AgentRole, RoleBackend};
use crate::tools::{files, sandbox::TestExecutor, todo};
use crate::types::{CrewError, FixChoice, Request, RunOutcome};
use crate::ui::Console;

pub const MAX_TEST_ATTEMPTS: usize = 3;

/// Coordinates one plan → todo → generate → review → fix → test → save run.
/// Strictly sequential; at most one run is in flight per instance.
pub struct CrewRunner<B, C, X> {
    backend: B,
    console: C,
    executor: X,
    request: Request,
    save_path: PathBuf,
    explicit_save: bool,
    todo_path: PathBuf,
}

enum LoopEnd {
    Passed(String),
    Aborted,
}

impl<B: RoleBackend, C: Console, X: TestExecutor> CrewRunner<B, C, X> {
    pub fn new(
        backend: B,
        console: C,
        executor: X,
        request: Request,
        save_path: PathBuf,
        explicit_save: bool,
    ) -> Self {
        Self {
            backend,
            console,
            executor,
            request,
            save_path,
            explicit_save,
            todo_path: PathBuf::from(todo::TODO_FILE),
        }
    }

    #[cfg(test)]
    fn with_todo_path(mut self, path: PathBuf) -> Self {
        self.todo_path = path;
        self
    }

    pub async fn run(&mut self) -> Result<RunOutcome> {
        self.console.rule("Crew run started");

        // Informational only; never fed into later stages.
        if self.request.plan {
            self.console.line("📝 Generating plan...");
            let plan = self
                .backend
                .produce(AgentRole::Planner, &self.request.prompt)
                .await?;
            self.console.line(&plan);
        }

        self.console.line("📋 Generating todo list...");
        let todo_raw = self
            .backend
            .produce(AgentRole::Todo, &self.request.prompt)
            .await?;
        self.console.line(&todo_raw);
        todo::save_todo_markdown(&self.todo_path, &todo_raw)?;
        self.console
            .line(&format!("Todo list written to {}", self.todo_path.display()));

        self.console.line("💻 Generating code...");
        let coder_reply = self
            .backend
            .produce(AgentRole::Coder, &self.request.prompt)
            .await?;
        let raw_code = fence::strip_code_fence(&coder_reply);
        self.console.line(&raw_code);

        self.console.line("🔍 Reviewing code...");
        let notes = self
            .backend
            .produce(AgentRole::Reviewer, &raw_code)
            .await?;
        self.console.line(&notes);

        self.console.line("🛠️  Applying fixes...");
        let fixer_reply = self
            .backend
            .produce(AgentRole::Fixer, &roles::fix_input(&raw_code, &notes))
            .await?;
        let fixed = fence::strip_code_fence(&fixer_reply);

        let code = match self.test_loop(fixed).await? {
            LoopEnd::Passed(code) => code,
            LoopEnd::Aborted => {
                self.console.line("Run aborted; nothing saved.");
                return Ok(RunOutcome::Aborted);
            }
        };

        if self.explicit_save {
            files::write_text_to_file(&self.save_path, &code)?;
            self.console
                .line(&format!("Code saved to {}", self.save_path.display()));
        } else {
            self.console.line(&format!(
                "Code not saved yet. Suggested file: {}",
                self.save_path.display()
            ));
        }

        self.console.rule("Crew run completed");
        Ok(RunOutcome::Finished {
            code,
            path: self.save_path.clone(),
            explicit_save: self.explicit_save,
        })
    }

    /// Up to [`MAX_TEST_ATTEMPTS`] executor invocations. Each failure before
    /// the last offers re-fix, manual edit of the scratch copy, or abort; the
    /// final failure raises [`CrewError::TestLoopExhausted`].
    async fn test_loop(&mut self, mut code: String) -> Result<LoopEnd> {
        let scratch = tempfile::Builder::new()
            .prefix("codecrew-")
            .tempdir()
            .context("failed to create scratch directory")?;
        let code_path = scratch.path().join("candidate.py");
        let mut last_output = String::new();

        for attempt in 1..=MAX_TEST_ATTEMPTS {
            self.console.line(&format!(
                "🧪 Test attempt {attempt}/{MAX_TEST_ATTEMPTS}: generating tests..."
            ));
            let tester_reply = self.backend.produce(AgentRole::Tester, &code).await?;
            let tests = fence::strip_code_fence(&tester_reply);
            fs::write(&code_path, &code)
                .with_context(|| format!("failed to write `{}`", code_path.display()))?;

            let outcome = self.executor.execute(&code, &tests)?;
            if outcome.passed {
                self.console.line("✅ Tests passed.");
                return Ok(LoopEnd::Passed(code));
            }

            self.console.line("❌ Tests failed:");
            self.console.line(&outcome.output);
            last_output = outcome.output;

            if attempt == MAX_TEST_ATTEMPTS {
                break;
            }

            let choice = self.console.ask_choice(
                "Next step? [r]e-fix automatically / [m]anual edit / [a]bort",
                &['r', 'm', 'a'],
                'r',
            )?;
            match FixChoice::from_char(choice).unwrap_or(FixChoice::Abort) {
                FixChoice::Refix => {
                    self.console
                        .line("🛠️  Asking the fixer to address the failure...");
                    let reply = self
                        .backend
                        .produce(AgentRole::Fixer, &roles::fix_input(&code, &last_output))
                        .await?;
                    code = fence::strip_code_fence(&reply);
                    fs::write(&code_path, &code)
                        .with_context(|| format!("failed to write `{}`", code_path.display()))?;
                }
                FixChoice::ManualEdit => {
                    self.console.line(&format!(
                        "Edit the candidate directly: {}",
                        code_path.display()
                    ));
                    self.console
                        .ask_line("Press Enter when you are done editing:")?;
                    code = fs::read_to_string(&code_path)
                        .with_context(|| format!("failed to re-read `{}`", code_path.display()))?;
                }
                FixChoice::Abort => return Ok(LoopEnd::Aborted),
            }
        }

        Err(CrewError::TestLoopExhausted {
            attempts: MAX_TEST_ATTEMPTS,
            output: last_output,
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use anyhow::Result;

    use super::{CrewRunner, MAX_TEST_ATTEMPTS};
    use crate::agent::roles::{AgentRole, RoleBackend};
    use crate::tools::sandbox::TestExecutor;
    use crate::types::{CrewError, Request, RunOutcome, TestOutcome};
    use crate::ui::ScriptedConsole;

    struct CannedBackend {
        calls: RefCell<Vec<AgentRole>>,
    }

    impl CannedBackend {
        fn new() -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl RoleBackend for CannedBackend {
        async fn produce(&self, role: AgentRole, _input: &str) -> Result<String> {
            self.calls.borrow_mut().push(role);
            Ok(match role {
                AgentRole::Planner => "1. write hello".to_string(),
                AgentRole::Todo => "- [ ] task".to_string(),
                AgentRole::Coder => "```python\nprint('hello')\n```".to_string(),
                AgentRole::Reviewer => String::new(),
                AgentRole::Fixer => "print('hello')".to_string(),
                AgentRole::Tester => {
                    "```python\ndef test_dummy():\n    assert True\n```".to_string()
                }
            })
        }
    }

    struct StubExecutor {
        results: VecDeque<bool>,
        calls: Vec<(String, String)>,
    }

    impl StubExecutor {
        fn new(results: &[bool]) -> Self {
            Self {
                results: results.iter().copied().collect(),
                calls: Vec::new(),
            }
        }
    }

    impl TestExecutor for StubExecutor {
        fn execute(&mut self, source: &str, test_source: &str) -> Result<TestOutcome> {
            self.calls.push((source.to_string(), test_source.to_string()));
            let passed = self.results.pop_front().unwrap_or(false);
            Ok(TestOutcome {
                passed,
                output: if passed {
                    String::new()
                } else {
                    "1 failed".to_string()
                },
            })
        }
    }

    fn runner(
        executor: StubExecutor,
        console: ScriptedConsole,
        save_path: std::path::PathBuf,
        explicit: bool,
        todo_path: std::path::PathBuf,
    ) -> CrewRunner<CannedBackend, ScriptedConsole, StubExecutor> {
        CrewRunner::new(
            CannedBackend::new(),
            console,
            executor,
            Request {
                prompt: "test prompt".to_string(),
                plan: false,
            },
            save_path,
            explicit,
        )
        .with_todo_path(todo_path)
    }

    #[tokio::test]
    async fn full_run_with_explicit_path_saves_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let save_path = dir.path().join("out.py");
        let mut crew = runner(
            StubExecutor::new(&[true]),
            ScriptedConsole::new(),
            save_path.clone(),
            true,
            dir.path().join("todo.md"),
        );

        let outcome = crew.run().await.unwrap();
        match outcome {
            RunOutcome::Finished {
                code,
                path,
                explicit_save,
            } => {
                assert!(code.contains("print('hello')"));
                assert_eq!(path, save_path);
                assert!(explicit_save);
            }
            RunOutcome::Aborted => panic!("expected a finished run"),
        }
        assert!(save_path.exists());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("todo.md")).unwrap(),
            "- [ ] task\n"
        );
    }

    #[tokio::test]
    async fn first_attempt_success_keeps_code_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let mut crew = runner(
            StubExecutor::new(&[true]),
            ScriptedConsole::new(),
            dir.path().join("out.py"),
            false,
            dir.path().join("todo.md"),
        );

        let outcome = crew.run().await.unwrap();
        assert_eq!(crew.executor.calls.len(), 1);
        // What the executor saw is exactly what the run returns.
        let RunOutcome::Finished { code, .. } = outcome else {
            panic!("expected a finished run");
        };
        assert_eq!(crew.executor.calls[0].0, code);
        assert_eq!(code, "print('hello')");
        // No explicit path: nothing written.
        assert!(!dir.path().join("out.py").exists());
    }

    #[tokio::test]
    async fn exhaustion_after_three_attempts_without_save() {
        let dir = tempfile::tempdir().unwrap();
        let save_path = dir.path().join("out.py");
        // Always failing executor; operator keeps choosing automatic re-fix.
        let mut crew = runner(
            StubExecutor::new(&[]),
            ScriptedConsole::with_choices(&['r', 'r', 'r']),
            save_path.clone(),
            true,
            dir.path().join("todo.md"),
        );

        let err = crew.run().await.unwrap_err();
        let crew_err = err.downcast_ref::<CrewError>().expect("typed condition");
        match crew_err {
            CrewError::TestLoopExhausted { attempts, .. } => {
                assert_eq!(*attempts, MAX_TEST_ATTEMPTS);
            }
        }
        assert_eq!(crew.executor.calls.len(), MAX_TEST_ATTEMPTS);
        assert!(!save_path.exists());
    }

    #[tokio::test]
    async fn abort_choice_ends_the_run_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let save_path = dir.path().join("out.py");
        let mut crew = runner(
            StubExecutor::new(&[false]),
            ScriptedConsole::with_choices(&['a']),
            save_path.clone(),
            true,
            dir.path().join("todo.md"),
        );

        let outcome = crew.run().await.unwrap();
        assert!(matches!(outcome, RunOutcome::Aborted));
        assert_eq!(crew.executor.calls.len(), 1);
        assert!(!save_path.exists());
    }

    #[tokio::test]
    async fn manual_edit_rereads_the_scratch_copy() {
        let dir = tempfile::tempdir().unwrap();
        // First attempt fails, operator "edits" (leaves the file as is),
        // second attempt passes.
        let mut crew = runner(
            StubExecutor::new(&[false, true]),
            ScriptedConsole::with_choices(&['m']),
            dir.path().join("out.py"),
            false,
            dir.path().join("todo.md"),
        );

        let outcome = crew.run().await.unwrap();
        let RunOutcome::Finished { code, .. } = outcome else {
            panic!("expected a finished run");
        };
        assert_eq!(crew.executor.calls.len(), 2);
        assert_eq!(crew.executor.calls[1].0, code);
    }

    #[tokio::test]
    async fn plan_flag_adds_the_planner_call_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut crew = runner(
            StubExecutor::new(&[true]),
            ScriptedConsole::new(),
            dir.path().join("out.py"),
            false,
            dir.path().join("todo.md"),
        );
        crew.request.plan = true;

        crew.run().await.unwrap();
        let calls = crew.backend.calls.borrow();
        assert_eq!(calls[0], AgentRole::Planner);
        assert_eq!(
            calls[1..].to_vec(),
            vec![
                AgentRole::Todo,
                AgentRole::Coder,
                AgentRole::Reviewer,
                AgentRole::Fixer,
                AgentRole::Tester
            ]
        );
    }
}
