//! Read-only probes into the provider's response JSON.
//!
//! The payload is treated as opaque everywhere else; these are the only fields
//! the proxy and the client wrapper ever look at.

use serde_json::Value;

pub fn candidates(payload: &Value) -> &[Value] {
    payload
        .get("candidates")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

pub fn candidate_count(payload: &Value) -> usize {
    candidates(payload).len()
}

pub fn has_candidates(payload: &Value) -> bool {
    !candidates(payload).is_empty()
}

/// Text of `candidates[0].content.parts[0].text`, if non-empty.
pub fn candidate_text(payload: &Value) -> Option<&str> {
    candidates(payload)
        .first()?
        .pointer("/content/parts/0/text")?
        .as_str()
        .filter(|t| !t.is_empty())
}

pub fn finish_reason(payload: &Value) -> Option<&str> {
    candidates(payload)
        .first()?
        .get("finishReason")?
        .as_str()
        .filter(|r| !r.is_empty())
}

pub fn block_reason(payload: &Value) -> Option<&str> {
    payload
        .pointer("/promptFeedback/blockReason")?
        .as_str()
        .filter(|r| !r.is_empty())
}

pub fn has_error(payload: &Value) -> bool {
    payload.get("error").is_some_and(|e| !e.is_null())
}

/// Message of an `error` field, whether it is a bare string or `{message}`.
pub fn error_message(payload: &Value) -> Option<&str> {
    match payload.get("error")? {
        Value::String(message) => Some(message.as_str()),
        error => error.get("message")?.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_candidate_text_reads_first_part() {
        let payload = json!({
            "candidates": [
                { "content": { "parts": [{ "text": "first" }, { "text": "second" }] } },
                { "content": { "parts": [{ "text": "other" }] } }
            ]
        });
        assert_eq!(candidate_text(&payload), Some("first"));
        assert_eq!(candidate_count(&payload), 2);
    }

    #[test]
    fn test_empty_text_is_not_content() {
        let payload = json!({
            "candidates": [{ "content": { "parts": [{ "text": "" }] }, "finishReason": "MAX_TOKENS" }]
        });
        assert!(has_candidates(&payload));
        assert_eq!(candidate_text(&payload), None);
        assert_eq!(finish_reason(&payload), Some("MAX_TOKENS"));
    }

    #[test]
    fn test_block_reason_without_candidates() {
        let payload = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        assert!(!has_candidates(&payload));
        assert_eq!(block_reason(&payload), Some("SAFETY"));
        assert_eq!(finish_reason(&payload), None);
    }

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(
            error_message(&json!({ "error": { "code": 429, "message": "Resource exhausted" } })),
            Some("Resource exhausted")
        );
        assert_eq!(error_message(&json!({ "error": "Stripe not configured" })), Some("Stripe not configured"));
        assert_eq!(error_message(&json!({ "candidates": [] })), None);
        assert!(!has_error(&json!({ "error": null })));
    }
}
