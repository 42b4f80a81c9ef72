mod agent;
mod config;
mod crew;
mod tools;
mod types;
mod ui;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::Parser;

use agent::{provider::build_http_client, roles::HttpBackend};
use config::{Preferences, resolve_model_config};
use crew::{CrewRunner, filename};
use tools::{files, sandbox::PytestSandbox};
use types::{Request, RunOutcome};
use ui::{Console, TermConsole};

/// Turn a natural-language request into planned, reviewed and tested Python
/// code from the terminal.
#[derive(Parser)]
#[command(name = "codecrew", version, about)]
struct Cli {
    /// Free-text description of the code to generate. Omit it to be asked
    /// interactively.
    prompt: Option<String>,

    /// File path to save the output (default: auto name in the current
    /// directory).
    #[arg(long, value_name = "PATH")]
    save: Option<PathBuf>,

    /// Also generate a step-by-step plan before the code.
    #[arg(long)]
    plan: bool,

    /// DeepSeek API key (overrides DEEPSEEK_API_KEY).
    #[arg(long, value_name = "KEY")]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let mut console = TermConsole::new();

    // Fatal before any model call when no key can be found.
    let model_config = resolve_model_config(cli.api_key, &mut console)?;

    let (prompt, plan) = match cli.prompt {
        Some(p) => (p, cli.plan),
        None => ask_request_interactively(&mut console, cli.plan)?,
    };

    let prefs = Preferences::load();
    let (save_path, explicit_save) = match cli.save {
        Some(path) => (path, true),
        None => (
            filename::default_save_path(&std::env::current_dir()?, &prompt),
            false,
        ),
    };

    let backend = HttpBackend::new(build_http_client()?, model_config);
    let mut runner = CrewRunner::new(
        backend,
        TermConsole::new(),
        PytestSandbox::new(),
        Request { prompt, plan },
        save_path,
        explicit_save,
    );

    match runner.run().await? {
        RunOutcome::Aborted => Ok(()),
        RunOutcome::Finished {
            code,
            path,
            explicit_save,
        } => {
            if !explicit_save {
                offer_save(&mut console, &code, &path, prefs)?;
            }
            Ok(())
        }
    }
}

/// The feature-picker entry point: no prompt argument, so show what the crew
/// can do and read one request from the terminal.
fn ask_request_interactively(
    console: &mut TermConsole,
    plan_flag: bool,
) -> Result<(String, bool)> {
    if !std::io::stdin().is_terminal() {
        bail!("no prompt given and no interactive terminal available");
    }
    console.line("Features:");
    console.line("  • Natural language prompt → code generation");
    console.line("  • Plan mode               → task breakdown");
    console.line("  • Code review             → detect issues & improvements");
    console.line("  • Code fix                → apply automatic fixes");
    console.line("  • Test loop               → pytest in a sandbox, up to 3 attempts");
    console.line("  • File save               → interactive or automatic");
    let prompt = console.ask_line("What should the crew build?")?;
    if prompt.is_empty() {
        bail!("empty request");
    }
    let plan = plan_flag
        || console.ask_choice("Generate plan output? [y]/[n]", &['y', 'n'], 'n')? == 'y';
    Ok((prompt, plan))
}

fn offer_save(
    console: &mut TermConsole,
    code: &str,
    path: &Path,
    mut prefs: Preferences,
) -> Result<()> {
    if prefs.always_save {
        files::write_text_to_file(path, code)?;
        console.line(&format!("Code saved to {} (always-save).", path.display()));
        return Ok(());
    }

    let choice = console.ask_choice(
        "Save code to file? [y]es / [n]o / [a]lways",
        &['y', 'n', 'a'],
        'y',
    )?;
    if choice == 'y' || choice == 'a' {
        files::write_text_to_file(path, code)?;
        console.line(&format!("Code saved to {}.", path.display()));
    }
    if choice == 'a' {
        prefs.always_save = true;
        prefs.store()?;
    }
    Ok(())
}
