/// Markdown code-fence stripping for model replies.
///
/// The models are asked to return code in a single fenced block, but replies
/// drift: prose around the block, a missing closing fence, or no fence at
/// all. Stripping degrades gracefully instead of erroring, and is idempotent.
pub fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();

    if let Some(inner) = first_fenced_block(trimmed) {
        return inner;
    }

    // No complete block. Drop fence-like lines hanging at either end.
    let lines: Vec<&str> = trimmed.lines().collect();
    let mut start = 0;
    let mut end = lines.len();
    while start < end && is_fence_line(lines[start]) {
        start += 1;
    }
    while end > start && is_fence_line(lines[end - 1]) {
        end -= 1;
    }
    if start != 0 || end != lines.len() {
        return lines[start..end].join("\n").trim().to_string();
    }

    trimmed.to_string()
}

/// Interior of the first complete triple-backtick block, language tag ignored.
fn first_fenced_block(text: &str) -> Option<String> {
    let mut inside = false;
    let mut body: Vec<&str> = Vec::new();
    for line in text.lines() {
        if is_fence_line(line) {
            if inside {
                return Some(body.join("\n").trim().to_string());
            }
            inside = true;
            continue;
        }
        if inside {
            body.push(line);
        }
    }
    None
}

fn is_fence_line(line: &str) -> bool {
    line.trim_start().starts_with("```")
}
