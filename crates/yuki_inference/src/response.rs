//! Results returned by the dispatcher and helpers for reading upstream
//! payloads.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use yuki_core::estimate_tokens;
use yuki_error::GatewayErrorKind;

/// The two upstream operations.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Endpoint {
    /// Single-prompt endpoint
    Generate,
    /// Message-array endpoint
    Chat,
}

impl Endpoint {
    /// Request path on the upstream server.
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Generate => "/api/generate",
            Endpoint::Chat => "/api/chat",
        }
    }

    /// Text carried by one payload or stream record, if any.
    ///
    /// Single-prompt records carry `response`; message-array records carry
    /// `message.content`.
    pub(crate) fn text_field<'a>(self, payload: &'a Value) -> Option<&'a str> {
        match self {
            Endpoint::Generate => payload.get("response")?.as_str(),
            Endpoint::Chat => payload.get("message")?.get("content")?.as_str(),
        }
    }
}

/// A completed non-streaming generation.
#[derive(Debug, Clone, PartialEq, Serialize, Getters)]
pub struct GenerationResult {
    text: String,
    model_id: String,
    endpoint_used: Endpoint,
    latency_ms: u64,
    token_estimate: u64,
    raw_payload: Value,
}

impl GenerationResult {
    pub(crate) fn new(
        text: String,
        model_id: String,
        endpoint_used: Endpoint,
        latency_ms: u64,
        token_estimate: u64,
        raw_payload: Value,
    ) -> Self {
        Self {
            text,
            model_id,
            endpoint_used,
            latency_ms,
            token_estimate,
            raw_payload,
        }
    }
}

/// Reachability of the upstream server.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Getters)]
pub struct HealthReport {
    reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl HealthReport {
    pub(crate) fn up(status_code: u16, tags: Value) -> Self {
        Self {
            reachable: true,
            status_code: Some(status_code),
            tags: Some(tags),
            error: None,
        }
    }

    pub(crate) fn down(status_code: Option<u16>, error: impl Into<String>) -> Self {
        Self {
            reachable: false,
            status_code,
            tags: None,
            error: Some(error.into()),
        }
    }

    /// True when the server answered the probe with 200.
    pub fn is_reachable(&self) -> bool {
        self.reachable
    }
}

/// The payload's explicit error field, when it carries a truthy one.
pub(crate) fn reported_error(payload: &Value) -> Option<String> {
    match payload.get("error")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Pull the reply text out of a complete non-streaming payload.
pub(crate) fn extract_text(endpoint: Endpoint, payload: &Value) -> Result<String, GatewayErrorKind> {
    if !payload.is_object() {
        return Err(GatewayErrorKind::MalformedResponse(format!(
            "expected a JSON object from {}, got {}",
            endpoint.path(),
            type_name(payload)
        )));
    }
    endpoint
        .text_field(payload)
        .map(str::to_string)
        .ok_or_else(|| {
            GatewayErrorKind::MalformedResponse(format!(
                "no reply text in payload from {}",
                endpoint.path()
            ))
        })
}

/// Token count from the server's counters, or the length heuristic.
pub(crate) fn token_estimate(payload: &Value, prompt_chars: usize, text: &str) -> u64 {
    let prompt = payload.get("prompt_eval_count").and_then(Value::as_u64);
    let reply = payload.get("eval_count").and_then(Value::as_u64);
    if prompt.is_none() && reply.is_none() {
        return estimate_tokens(prompt_chars, text.chars().count());
    }
    prompt.unwrap_or(0) + reply.unwrap_or(0)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_text_per_endpoint() {
        let generate = json!({"response": "hi", "done": true});
        let chat = json!({"message": {"role": "assistant", "content": "hey"}});
        assert_eq!(extract_text(Endpoint::Generate, &generate).unwrap(), "hi");
        assert_eq!(extract_text(Endpoint::Chat, &chat).unwrap(), "hey");
    }

    #[test]
    fn test_extract_text_rejects_wrong_shapes() {
        let cases = [
            (Endpoint::Generate, json!(["response"])),
            (Endpoint::Generate, json!({"message": {"content": "x"}})),
            (Endpoint::Chat, json!({"message": "x"})),
            (Endpoint::Chat, json!("plain")),
        ];
        for (endpoint, payload) in cases {
            let err = extract_text(endpoint, &payload).unwrap_err();
            assert_eq!(err.code(), "malformed_response", "{payload}");
        }
    }

    #[test]
    fn test_reported_error_truthiness() {
        assert_eq!(reported_error(&json!({"error": "model not loaded"})).as_deref(), Some("model not loaded"));
        assert_eq!(reported_error(&json!({"error": {"code": 1}})).as_deref(), Some(r#"{"code":1}"#));
        assert_eq!(reported_error(&json!({"error": ""})), None);
        assert_eq!(reported_error(&json!({"error": null})), None);
        assert_eq!(reported_error(&json!({"response": "ok"})), None);
    }

    #[test]
    fn test_token_estimate_prefers_counters() {
        let counted = json!({"prompt_eval_count": 12, "eval_count": 30});
        assert_eq!(token_estimate(&counted, 1000, "whatever"), 42);

        let partial = json!({"eval_count": 7});
        assert_eq!(token_estimate(&partial, 1000, "whatever"), 7);

        let bare = json!({"response": "abcd"});
        assert_eq!(token_estimate(&bare, 12, "abcd"), 4);
    }

    #[test]
    fn test_health_report_serialization_omits_empty_fields() {
        let report = HealthReport::down(None, "connection refused");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json, json!({"reachable": false, "error": "connection refused"}));
    }
}
