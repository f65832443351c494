//! Response Reconciliation
//!
//! Turns whatever JSON the server sent back into something a view can show.
//!
//! The server makes no schema promise. The field lookups below are
//! best-effort display logic, not a parsed protocol; the priority order is
//! fixed but nothing else about the payload is assumed.

use serde_json::Value;

/// Field shown first in single-shot mode
pub const TEXT_FIELD: &str = "text";

/// Field shown in single-shot mode when `text` is missing
pub const RESPONSE_FIELD: &str = "response";

/// Field holding the chat reply
pub const ANSWER_FIELD: &str = "answer";

/// Field holding how many knowledge chunks backed the answer
pub const SOURCE_COUNT_FIELD: &str = "source_documents_count";

/// Look up a field, treating JSON `null` as absent
fn field<'a>(payload: &'a Value, name: &str) -> Option<&'a Value> {
    payload.get(name).filter(|v| !v.is_null())
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Display value for single-shot mode
///
/// `text`, else `response`, else the whole payload; pretty-printed JSON in
/// every case.
pub fn single_shot_display(payload: &Value) -> String {
    let chosen = field(payload, TEXT_FIELD)
        .or_else(|| field(payload, RESPONSE_FIELD))
        .unwrap_or(payload);
    pretty(chosen)
}

/// Chat reply text, or `None` when the caller should use its fallback
///
/// String answers are used verbatim; other JSON is rendered compactly. An
/// empty string counts as no answer.
pub fn chat_answer(payload: &Value) -> Option<String> {
    match field(payload, ANSWER_FIELD)? {
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Source count reported alongside a chat reply
pub fn source_count(payload: &Value) -> Option<u64> {
    field(payload, SOURCE_COUNT_FIELD).and_then(Value::as_u64)
}
