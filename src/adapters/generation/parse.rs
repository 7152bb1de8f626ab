//! Response parsing helpers for generation backends.
//!
//! Models wrap JSON in prose, code fences, or both. These helpers dig
//! the payload out without caring which decoration was used this time.

use serde_json::Value;

/// Extracts the first JSON value from model output.
///
/// Tries, in order: the whole text, the first fenced code block, the
/// first balanced `{...}` region. Returns `None` when nothing parses.
pub fn extract_json_object(text: &str) -> Option<Value> {
    let trimmed = text.trim();

    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    if let Some(block) = fenced_block(trimmed) {
        if let Ok(value) = serde_json::from_str(block.trim()) {
            return Some(value);
        }
    }

    let candidate = balanced_braces(trimmed)?;
    serde_json::from_str(candidate).ok()
}

/// Clamps text to `max_chars` characters, appending "..." when cut.
///
/// Operates on characters, not bytes, so multibyte input never splits
/// mid-codepoint. The returned string never exceeds `max_chars`.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    if max_chars <= 3 {
        return trimmed.chars().take(max_chars).collect();
    }

    let kept: String = trimmed.chars().take(max_chars - 3).collect();
    format!("{}...", kept.trim_end())
}

/// Returns the body of the first fenced code block, if any.
///
/// The info string ("json", "JSON", nothing) is skipped, not matched.
fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];
    let body_start = after_fence.find('\n')? + 1;
    let body = &after_fence[body_start..];
    let end = body.find("```")?;
    Some(&body[..end])
}

/// Returns the first balanced `{...}` region, string-literal aware.
fn balanced_braces(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}
