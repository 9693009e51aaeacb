//! Command-name normalization and the `setMyCommands` payload builder.

use std::sync::LazyLock;

use regex::Regex;

static INVALID_COMMAND_CHAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9_]").unwrap());

const MAX_COMMAND_NAME_LEN: usize = 32;

/// Normalize a command name to `[a-z0-9_]`, truncated to 32 characters.
pub fn normalize_command_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let cleaned = INVALID_COMMAND_CHAR.replace_all(&lowered, "");
    cleaned.chars().take(MAX_COMMAND_NAME_LEN).collect()
}

/// Build the `setMyCommands` payload, always appending a fixed `pair` entry.
pub fn build_commands_payload(declared: &[(String, String)]) -> serde_json::Value {
    let mut commands: Vec<serde_json::Value> = declared
        .iter()
        .map(|(name, description)| {
            serde_json::json!({
                "command": normalize_command_name(name),
                "description": description,
            })
        })
        .collect();

    commands.push(serde_json::json!({
        "command": "pair",
        "description": "Pair this chat with your workspace account",
    }));

    serde_json::Value::Array(commands)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_lowercases_and_strips_invalid_chars() {
        assert_eq!(normalize_command_name("Do-Task!"), "dotask");
    }

    #[test]
    fn normalize_truncates_to_32_chars() {
        let long = "a".repeat(50);
        assert_eq!(normalize_command_name(&long).len(), 32);
    }

    #[test]
    fn build_commands_always_appends_pair() {
        let payload = build_commands_payload(&[("task".to_string(), "Do a task".to_string())]);
        let arr = payload.as_array().unwrap();
        assert_eq!(arr.len(), 2);
        assert_eq!(arr[1]["command"], "pair");
    }

    #[test]
    fn build_commands_with_no_declared_commands() {
        let payload = build_commands_payload(&[]);
        let arr = payload.as_array().unwrap();
        assert_eq!(arr.len(), 1);
        assert_eq!(arr[0]["command"], "pair");
    }
}
