//! Acknowledgement planning — the short "checking context" pre-reply.

use std::sync::LazyLock;

use regex::Regex;

use crate::collab::{MessageInput, Responder};

/// Which acknowledgement, if any, should precede the main generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckStrategy {
    /// No acknowledgement is warranted.
    None,
    /// Recent conversational memory is sufficient context.
    Tail,
    /// Retrieval from workspace memory is warranted.
    Qmd,
}

const TAIL_PHRASES: &[&str] = &[
    "as we discussed",
    "as i mentioned",
    "as you mentioned",
    "like i said",
    "we talked about",
    "earlier you said",
    "following up on",
    "continuing from",
    "picking up where we left off",
];

const QMD_PHRASES: &[&str] = &[
    "in my notes",
    "from my notes",
    "in the workspace",
    "in my files",
    "check the docs",
    "search the workspace",
    "look up",
    "find in memory",
    "according to my",
    "in my memory",
    "recall when",
    "remember when",
];

/// Pure heuristic over phrase patterns; no I/O.
pub fn select_strategy(text: &str) -> AckStrategy {
    let lower = text.to_lowercase();
    if QMD_PHRASES.iter().any(|p| lower.contains(p)) {
        return AckStrategy::Qmd;
    }
    if TAIL_PHRASES.iter().any(|p| lower.contains(p)) {
        return AckStrategy::Tail;
    }
    AckStrategy::None
}

fn ack_prompt(strategy: AckStrategy) -> &'static str {
    match strategy {
        AckStrategy::Tail => {
            "Write a 6-16 word single-sentence acknowledgement that mentions checking \
             recent conversation memory. No markdown, code fences, task IDs, or metadata."
        },
        AckStrategy::Qmd => {
            "Write a 6-16 word single-sentence acknowledgement that mentions retrieving \
             relevant workspace memory. No markdown, code fences, task IDs, or metadata."
        },
        AckStrategy::None => "",
    }
}

fn fallback(strategy: AckStrategy) -> String {
    match strategy {
        AckStrategy::Tail => "Let me pull some recent context first.".to_string(),
        AckStrategy::Qmd => "Give me a minute to pull data from memory.".to_string(),
        AckStrategy::None => String::new(),
    }
}

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*?```").expect("invalid regex"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("invalid regex"));

fn sanitize_ack(raw: &str) -> String {
    let no_fence = CODE_FENCE.replace_all(raw, " ");
    let collapsed = WHITESPACE_RUN.replace_all(&no_fence, " ");
    let trimmed = collapsed
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim();
    let lower = trimmed.to_lowercase();
    if lower.contains("action") && trimmed.contains('{') {
        return String::new();
    }
    cap_len(trimmed, 180)
}

fn cap_len(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{truncated}...")
}

/// Plan and, if warranted, generate an acknowledgement via `responder`.
///
/// Returns empty when `select_strategy` yields [`AckStrategy::None`]. On
/// any responder failure or empty/rejected output, falls back to a fixed
/// string for the selected strategy.
pub async fn plan_acknowledgement(responder: &dyn Responder, base: &MessageInput, text: &str) -> String {
    let strategy = select_strategy(text);
    if strategy == AckStrategy::None {
        return String::new();
    }
    let input = MessageInput {
        text: ack_prompt(strategy).to_string(),
        skip_grounding: true,
        ..base.clone()
    };
    match responder.reply(input).await {
        Ok(raw) => {
            let sanitized = sanitize_ack(&raw);
            if sanitized.is_empty() {
                fallback(strategy)
            } else {
                sanitized
            }
        },
        Err(_) => fallback(strategy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_none_for_plain_question() {
        assert_eq!(select_strategy("what time is it?"), AckStrategy::None);
    }

    #[test]
    fn selects_tail_for_discussion_reference() {
        assert_eq!(select_strategy("As we discussed yesterday, ship it."), AckStrategy::Tail);
    }

    #[test]
    fn selects_qmd_for_workspace_reference() {
        assert_eq!(select_strategy("What did I write in my notes about deploys?"), AckStrategy::Qmd);
    }

    #[test]
    fn sanitize_ack_strips_code_fences() {
        let raw = "Sure ```{\"x\":1}``` checking recent conversation memory now.";
        let sanitized = sanitize_ack(raw);
        assert!(!sanitized.contains("```"));
    }

    #[test]
    fn sanitize_ack_rejects_leaked_action_json() {
        let raw = "action: {\"type\":\"noop\"}";
        assert_eq!(sanitize_ack(raw), "");
    }

    #[test]
    fn sanitize_ack_caps_length() {
        let raw = "x".repeat(300);
        let sanitized = sanitize_ack(&raw);
        assert_eq!(sanitized.chars().count(), 180);
        assert!(sanitized.ends_with("..."));
    }
}
