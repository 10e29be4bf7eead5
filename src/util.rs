use std::path::Path;

/// Drop the last `count` characters of `text`, respecting char boundaries.
#[must_use]
pub fn trim_trailing_chars(text: &str, count: usize) -> &str {
    if count == 0 {
        return text;
    }
    match text.char_indices().rev().nth(count - 1) {
        Some((idx, _)) => &text[..idx],
        None => "",
    }
}

/// Render a relative path with `/` separators regardless of platform.
#[must_use]
pub fn to_forward_slashes(path: &Path) -> String {
    path.components()
        .map(|part| part.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
