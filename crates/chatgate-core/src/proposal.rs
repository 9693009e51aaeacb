//! Action-proposal extraction from LLM replies.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::types::Proposal;

static FENCE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)```\s*action\s*").expect("invalid regex"));

static INLINE_ACTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\baction\b\s*:?\s*").expect("invalid regex"));

const RESERVED_KEYS: [&str; 3] = ["type", "target", "summary"];

/// Extract a fenced or inline action proposal from a trimmed LLM reply.
///
/// Returns the reply with the matched span removed (trimmed), and the
/// decoded proposal if extraction and decoding both succeeded. On any
/// failure the input is returned unchanged with no proposal.
pub fn extract_proposal(reply: &str) -> (String, Option<Proposal>) {
    let found = extract_fenced(reply).or_else(|| extract_inline(reply));
    let Some((span, value)) = found else {
        return (reply.to_string(), None);
    };
    match decode_proposal(value) {
        Some(proposal) => {
            let mut cleaned = String::with_capacity(reply.len());
            cleaned.push_str(&reply[..span.0]);
            cleaned.push_str(&reply[span.1..]);
            (cleaned.trim().to_string(), Some(proposal))
        }
        None => (reply.to_string(), None),
    }
}

fn decode_proposal(value: Value) -> Option<Proposal> {
    let obj = value.as_object()?;
    let action_type = obj.get("type")?.as_str()?;
    if action_type.is_empty() {
        return None;
    }
    let target = obj
        .get("target")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let summary = obj
        .get("summary")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let mut payload = obj.clone();
    for key in RESERVED_KEYS {
        payload.remove(key);
    }
    Some(Proposal {
        action_type: action_type.to_string(),
        target,
        summary,
        payload,
        raw: Value::Object(obj.clone()),
    })
}

fn extract_fenced(text: &str) -> Option<((usize, usize), Value)> {
    let marker = FENCE_OPEN.find(text)?;
    let after = marker.end();
    let brace_start = after + text[after..].find('{')?;
    if text[after..brace_start].chars().any(|c| !c.is_whitespace()) {
        return None;
    }
    let (obj_end, value) = scan_json_object(text, brace_start)?;
    let rest = &text[obj_end..];
    let trimmed_rest = rest.trim_start();
    if !trimmed_rest.starts_with("```") {
        return None;
    }
    let close_offset = rest.len() - trimmed_rest.len();
    let close_end = obj_end + close_offset + 3;
    Some(((marker.start(), close_end), value))
}

fn extract_inline(text: &str) -> Option<((usize, usize), Value)> {
    for m in INLINE_ACTION.find_iter(text) {
        let brace_start = m.end();
        if text.as_bytes().get(brace_start) != Some(&b'{') {
            continue;
        }
        if let Some((obj_end, value)) = scan_json_object(text, brace_start) {
            return Some(((m.start(), obj_end), value));
        }
    }
    None
}

/// Scan a balanced `{...}` JSON object starting at byte offset `start`.
///
/// Tracks brace depth only outside string literals, and honors backslash
/// escapes inside strings, so braces embedded in string values never
/// confuse the scan. Returns the exclusive end offset and the decoded
/// value on success.
fn scan_json_object(s: &str, start: usize) -> Option<(usize, Value)> {
    let bytes = s.as_bytes();
    if bytes.get(start) != Some(&b'{') {
        return None;
    }
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape = false;
    let mut idx = start;
    while idx < bytes.len() {
        let b = bytes[idx];
        if in_string {
            if escape {
                escape = false;
            } else if b == b'\\' {
                escape = true;
            } else if b == b'"' {
                in_string = false;
            }
        } else {
            match b {
                b'"' => in_string = true,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        let end = idx + 1;
                        let slice = &s[start..end];
                        return serde_json::from_str::<Value>(slice).ok().map(|v| (end, v));
                    }
                },
                _ => {},
            }
        }
        idx += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_fenced_action() {
        let reply = "I can do that.\n\n```action\n{\"type\":\"send_email\",\"target\":\"ops@example.com\",\"summary\":\"Send update\",\"subject\":\"Status\"}\n```";
        let (clean, proposal) = extract_proposal(reply);
        let proposal = proposal.expect("expected a proposal");
        assert_eq!(clean, "I can do that.");
        assert_eq!(proposal.action_type, "send_email");
        assert_eq!(proposal.target, "ops@example.com");
        assert_eq!(proposal.summary, "Send update");
        assert_eq!(proposal.payload.get("subject"), Some(&json!("Status")));
        assert!(proposal.raw.get("type").is_some());
    }

    #[test]
    fn extracts_inline_action() {
        let reply = "Sure, action: {\"type\":\"noop\",\"target\":\"\",\"summary\":\"\"} done.";
        let (_, proposal) = extract_proposal(reply);
        assert_eq!(proposal.unwrap().action_type, "noop");
    }

    #[test]
    fn no_action_returns_input_unchanged() {
        let reply = "Just a normal reply with no action in it.";
        let (clean, proposal) = extract_proposal(reply);
        assert_eq!(clean, reply);
        assert!(proposal.is_none());
    }

    #[test]
    fn missing_type_yields_no_proposal() {
        let reply = "```action\n{\"target\":\"x\"}\n```";
        let (clean, proposal) = extract_proposal(reply);
        assert_eq!(clean, reply);
        assert!(proposal.is_none());
    }

    #[test]
    fn braces_inside_strings_do_not_break_scan() {
        let reply = "```action\n{\"type\":\"note\",\"summary\":\"uses a { brace } inline\"}\n```";
        let (_, proposal) = extract_proposal(reply);
        let proposal = proposal.expect("expected a proposal");
        assert_eq!(proposal.summary, "uses a { brace } inline");
    }
}
