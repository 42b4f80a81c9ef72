use std::{path::Path, sync::OnceLock};

use anyhow::Result;
use regex::Regex;

use super::files::write_text_to_file;

/// Fixed-location artifact, overwritten on every run.
pub const TODO_FILE: &str = "todo.md";

fn list_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:[-*]|\d+[.)])\s+").expect("static pattern"))
}

/// Normalize the Todo agent's freeform reply into checkbox lines, one per
/// item. Bullets and numbered lists become `- [ ]`; existing checkboxes keep
/// their state; fences and headings are dropped.
pub fn render_todo_markdown(raw: &str) -> String {
    let mut out = String::new();
    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("```") || trimmed.starts_with('#') {
            continue;
        }
        if is_checkbox(trimmed) {
            out.push_str(trimmed);
            out.push('\n');
            continue;
        }
        let item = list_prefix().replace(trimmed, "");
        if !item.is_empty() {
            out.push_str(&format!("- [ ] {item}\n"));
        }
    }
    out
}

fn is_checkbox(line: &str) -> bool {
    line.starts_with("- [ ] ") || line.starts_with("- [x] ") || line.starts_with("- [X] ")
}

/// Overwrite the todo artifact with the normalized list.
pub fn save_todo_markdown(path: &Path, raw: &str) -> Result<()> {
    write_text_to_file(path, &render_todo_markdown(raw))
}
