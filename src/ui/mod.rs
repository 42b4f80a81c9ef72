use std::io::{self, Write};

use anyhow::Result;
use chrono::Local;
use crossterm::style::Stylize;

/// Output sink plus the few interactive prompts the pipeline needs.
/// The orchestrator owns one of these; tests substitute a scripted sink.
pub trait Console {
    fn rule(&mut self, title: &str);
    fn line(&mut self, text: &str);
    /// Single-character menu. Empty input picks `default`; invalid input
    /// re-asks.
    fn ask_choice(&mut self, prompt: &str, choices: &[char], default: char) -> Result<char>;
    fn ask_line(&mut self, prompt: &str) -> Result<String>;
}

pub struct TermConsole;

impl TermConsole {
    pub fn new() -> Self {
        Self
    }
}

impl Console for TermConsole {
    fn rule(&mut self, title: &str) {
        let stamp = Local::now().format("%H:%M:%S");
        println!(
            "{} {} {}",
            "────".dark_grey(),
            title.cyan().bold(),
            format!("──── {stamp}").dark_grey()
        );
    }

    fn line(&mut self, text: &str) {
        println!("{text}");
    }

    fn ask_choice(&mut self, prompt: &str, choices: &[char], default: char) -> Result<char> {
        loop {
            print!("{} ", prompt.dark_yellow());
            io::stdout().flush()?;
            let mut buf = String::new();
            io::stdin().read_line(&mut buf)?;
            let trimmed = buf.trim();
            let Some(c) = trimmed.chars().next() else {
                return Ok(default);
            };
            let c = c.to_ascii_lowercase();
            if choices.contains(&c) {
                return Ok(c);
            }
            let allowed: String = choices.iter().map(|c| format!("[{c}]")).collect();
            println!("{}", format!("Please answer one of {allowed}").dark_grey());
        }
    }

    fn ask_line(&mut self, prompt: &str) -> Result<String> {
        print!("{} ", prompt.dark_yellow());
        io::stdout().flush()?;
        let mut buf = String::new();
        io::stdin().read_line(&mut buf)?;
        Ok(buf.trim().to_string())
    }
}

/// Records everything and replays scripted answers. Test-only.
#[cfg(test)]
pub struct ScriptedConsole {
    pub lines: Vec<String>,
    pub choices: std::collections::VecDeque<char>,
    pub replies: std::collections::VecDeque<String>,
}

#[cfg(test)]
impl ScriptedConsole {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            choices: std::collections::VecDeque::new(),
            replies: std::collections::VecDeque::new(),
        }
    }

    pub fn with_choices(choices: &[char]) -> Self {
        let mut console = Self::new();
        console.choices.extend(choices.iter().copied());
        console
    }
}

#[cfg(test)]
impl Console for ScriptedConsole {
    fn rule(&mut self, title: &str) {
        self.lines.push(format!("── {title}"));
    }

    fn line(&mut self, text: &str) {
        self.lines.push(text.to_string());
    }

    fn ask_choice(&mut self, _prompt: &str, _choices: &[char], default: char) -> Result<char> {
        Ok(self.choices.pop_front().unwrap_or(default))
    }

    fn ask_line(&mut self, _prompt: &str) -> Result<String> {
        Ok(self.replies.pop_front().unwrap_or_default())
    }
}
