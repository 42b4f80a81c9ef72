use std::path::{Path, PathBuf};

const MAX_SLUG_WORDS: usize = 6;
const FALLBACK_SLUG: &str = "generated_code";

/// Filesystem-safe slug from the leading words of the user's request.
pub fn sanitize(text: &str) -> String {
    let rough: String = text
        .split_whitespace()
        .take(MAX_SLUG_WORDS)
        .collect::<Vec<_>>()
        .join("_");
    let slug: String = rough
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Default `.py` destination inside `dir`, with a numeric suffix when the
/// first candidate already exists.
pub fn default_save_path(dir: &Path, prompt: &str) -> PathBuf {
    let slug = sanitize(prompt);
    let mut path = dir.join(format!("{slug}.py"));
    let mut counter = 1;
    while path.exists() {
        path = dir.join(format!("{slug}_{counter}.py"));
        counter += 1;
    }
    path
}
