use std::{fs, io::IsTerminal, path::PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::agent::provider::ModelConfig;
use crate::tools::home_dir;
use crate::ui::Console;

const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
const DEFAULT_MODEL: &str = "deepseek-coder";
const PREFS_FILE: &str = ".codecrew.json";

// ── Credential resolution ─────────────────────────────────────────────────────

/// Resolution order: `--api-key` flag > `DEEPSEEK_API_KEY` env (after `.env`
/// loading) > interactive prompt > fatal. Runs once at startup, before any
/// model call; the result is threaded through by value.
pub fn resolve_model_config(
    cli_key: Option<String>,
    console: &mut impl Console,
) -> Result<ModelConfig> {
    let base_url =
        std::env::var("DEEPSEEK_API_BASE").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let model = std::env::var("DEEPSEEK_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

    let api_key = match cli_key.filter(|k| !k.trim().is_empty()) {
        Some(key) => {
            persist_key_to_env(&key)?;
            key
        }
        None => match std::env::var("DEEPSEEK_API_KEY") {
            Ok(key) if !key.trim().is_empty() => key,
            _ => prompt_for_key(console)?,
        },
    };

    Ok(ModelConfig {
        base_url,
        api_key,
        model,
    })
}

fn prompt_for_key(console: &mut impl Console) -> Result<String> {
    if !std::io::stdin().is_terminal() {
        bail!("DEEPSEEK_API_KEY is not set and no interactive terminal is available");
    }
    console.line("No API key found. Please enter one to continue.");
    let key = console.ask_line("🔑 DeepSeek API key (blank to quit):")?;
    if key.is_empty() {
        bail!("no API key provided");
    }
    persist_key_to_env(&key)?;
    Ok(key)
}

/// Append the key to the working directory's `.env` so future sessions pick
/// it up through dotenvy.
fn persist_key_to_env(key: &str) -> Result<()> {
    use std::io::Write;
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(".env")
        .context("failed to open `.env`")?;
    writeln!(file, "DEEPSEEK_API_KEY={key}")?;
    Ok(())
}

// ── Persisted user preferences ────────────────────────────────────────────────

/// Read once at run start, written at most once per run (when the user opts
/// into "always save").
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub always_save: bool,
}

impl Preferences {
    fn path() -> Option<PathBuf> {
        home_dir().map(|h| h.join(PREFS_FILE))
    }

    fn from_raw(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }

    /// Malformed or missing preference files fall back to defaults.
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            return Self::default();
        };
        match fs::read_to_string(&path) {
            Ok(raw) => Self::from_raw(&raw),
            Err(_) => Self::default(),
        }
    }

    pub fn store(&self) -> Result<()> {
        let Some(path) = Self::path() else {
            bail!("could not determine home directory for preferences");
        };
        let raw = serde_json::to_string(self)?;
        fs::write(&path, raw)
            .with_context(|| format!("failed to write preferences to `{}`", path.display()))
    }
}
