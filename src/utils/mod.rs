//! Utility functions and helpers.

pub mod bvid;
pub mod http;
pub mod log;

/// Longest file stem produced by `sanitize_file_name`.
const MAX_FILE_STEM: usize = 200;

/// Make a title safe to use as a file stem.
///
/// Characters that are illegal in Windows file names, and line breaks, become
/// `_`. The result is trimmed and capped at 200 characters.
pub fn sanitize_file_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\r' | '\n' => '_',
            c => c,
        })
        .collect();

    let cleaned: String = replaced.trim().chars().take(MAX_FILE_STEM).collect();

    if cleaned.is_empty() {
        "unnamed_file".to_string()
    } else {
        cleaned
    }
}
