//! Filename, path-segment, and command-text normalization.

use std::sync::LazyLock;

use regex::Regex;

static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("invalid regex"));

static UNSAFE_PATH_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("invalid regex"));

/// Sanitize a filename for use under an attachment path.
///
/// Keeps `[A-Za-z0-9._-]`, replaces runs of any other character with `-`,
/// trims leading/trailing `-`/`.`, and falls back to `attachment.md` if
/// nothing survives. Idempotent: applying it twice yields the same result.
pub fn sanitize_filename(name: &str) -> String {
    let replaced = UNSAFE_FILENAME_CHARS.replace_all(name, "-");
    let trimmed = replaced.trim_matches(|c: char| c == '-' || c == '.');
    if trimmed.is_empty() {
        "attachment.md".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Sanitize a single path segment for use in a chat-log path.
///
/// Lowercases, replaces non-word runs with `-`, and trims `-`.
pub fn sanitize_path_segment(segment: &str) -> String {
    let lowered = segment.to_lowercase();
    let replaced = UNSAFE_PATH_CHARS.replace_all(&lowered, "-");
    replaced.trim_matches('-').to_string()
}

/// Normalize a message into the `pair` command form, or empty if it is not one.
///
/// Lowercases, strips a leading `/`, and collapses `pair@<botname>` (any
/// case) into `pair`. Returns the normalized text unchanged for anything
/// else so callers can compare against the literal string `"pair"`.
pub fn normalize_pair_command(text: &str) -> String {
    let trimmed = text.trim();
    let without_slash = trimmed.strip_prefix('/').unwrap_or(trimmed);
    let lowered = without_slash.to_lowercase();
    match lowered.split_once('@') {
        Some(("pair", _rest)) => "pair".to_string(),
        _ => lowered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_filename_keeps_safe_chars() {
        assert_eq!(sanitize_filename("notes.md"), "notes.md");
    }

    #[test]
    fn sanitize_filename_replaces_unsafe_runs() {
        assert_eq!(sanitize_filename("my notes!!.md"), "my-notes-.md");
    }

    #[test]
    fn sanitize_filename_trims_dots_and_dashes() {
        assert_eq!(sanitize_filename("--weird..name--"), "weird..name");
    }

    #[test]
    fn sanitize_filename_falls_back_on_empty() {
        assert_eq!(sanitize_filename("???"), "attachment.md");
    }

    #[test]
    fn sanitize_filename_is_idempotent() {
        let once = sanitize_filename("My Notes!! (v2).md");
        let twice = sanitize_filename(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn sanitize_path_segment_lowercases_and_dashes() {
        assert_eq!(sanitize_path_segment("Chan #123"), "chan-123");
    }

    #[test]
    fn normalize_pair_command_strips_slash_and_case() {
        assert_eq!(normalize_pair_command("/Pair"), "pair");
    }

    #[test]
    fn normalize_pair_command_collapses_mention_form() {
        assert_eq!(normalize_pair_command("pair@MyBot"), "pair");
    }

    #[test]
    fn normalize_pair_command_passes_through_other_text() {
        assert_eq!(normalize_pair_command("hello there"), "hello there");
    }
}
