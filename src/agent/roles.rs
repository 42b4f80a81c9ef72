use anyhow::{Context, Result};

use crate::agent::provider::{self, Message, ModelConfig};

/// The closed set of crew roles. Each role is a stateless wrapper around one
/// model call: a fixed system instruction plus the caller's dynamic input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentRole {
    Planner,
    Todo,
    Coder,
    Reviewer,
    Fixer,
    Tester,
}

impl AgentRole {
    /// Canonical name, used for console labels.
    pub fn name(self) -> &'static str {
        match self {
            Self::Planner => "planner",
            Self::Todo => "todo",
            Self::Coder => "coder",
            Self::Reviewer => "reviewer",
            Self::Fixer => "fixer",
            Self::Tester => "tester",
        }
    }

    pub fn system_prompt(self) -> &'static str {
        match self {
            Self::Planner => PLANNER_PROMPT,
            Self::Todo => TODO_PROMPT,
            Self::Coder => CODER_PROMPT,
            Self::Reviewer => REVIEWER_PROMPT,
            Self::Fixer => FIXER_PROMPT,
            Self::Tester => TESTER_PROMPT,
        }
    }
}

/// The Fixer takes two inputs; fold them into one user message.
pub fn fix_input(code: &str, notes: &str) -> String {
    format!("Code:\n{code}\n\nReview notes:\n{notes}")
}

// ── Backend seam ─────────────────────────────────────────────────────────────

/// The single capability the orchestrator needs from the model layer.
/// Tests substitute canned backends; production uses [`HttpBackend`].
pub trait RoleBackend {
    async fn produce(&self, role: AgentRole, input: &str) -> Result<String>;
}

pub struct HttpBackend {
    client: reqwest::Client,
    config: ModelConfig,
}

impl HttpBackend {
    pub fn new(client: reqwest::Client, config: ModelConfig) -> Self {
        Self { client, config }
    }
}

impl RoleBackend for HttpBackend {
    async fn produce(&self, role: AgentRole, input: &str) -> Result<String> {
        let messages = [Message::system(role.system_prompt()), Message::user(input)];
        let reply = provider::chat(&self.client, &self.config, &messages)
            .await
            .with_context(|| format!("{} agent call failed", role.name()))?;
        Ok(reply.trim().to_string())
    }
}

// ── Role prompt definitions ───────────────────────────────────────────────────

const PLANNER_PROMPT: &str = "\
You are a senior software planner. Break the user's request down into logical,
ordered tasks. Number every step and keep each one short, concrete and
actionable. Add follow-up tasks where they are genuinely needed, but do not
pad the plan with unnecessary detail.";

const TODO_PROMPT: &str = "\
You are a project manager. Based on the user's request, produce a to-do list
in GitHub markdown format. Use `- [ ]` checkboxes, one task per line.";

const CODER_PROMPT: &str = "\
You are a senior Python developer. Implement the requested feature completely,
PEP 8 compliant and with explanatory comments. Mention any extra files or
tests the user should add. Return the code in a single ```python block.";

const REVIEWER_PROMPT: &str = "\
Review the code below in detail. List bugs, performance problems and security
issues as bullet points. Suggest example corrections where they help.";

const FIXER_PROMPT: &str = "\
Using the code and the review notes below, fix the code. Return the final
code in a single code block and nothing else.";

const TESTER_PROMPT: &str = "\
Write thorough pytest unit tests for the Python code below. Cover every
function and the main scenarios. The code under test is importable as the
module `solution`. Return only the test code, inside a single ```python
block.";
