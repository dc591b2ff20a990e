//! Request and reply shapes for each provider family.
//!
//! Everything here is pure: [`build`] turns a [`Call`] into an [`HttpCall`]
//! and [`extract_text`] pulls the reply text out of a decoded body. The
//! transport lives in [`super::backend`].

use super::backend::Call;
use crate::error::{Result, ScratchError};
use crate::types::ProviderKind;
use serde_json::{json, Value};

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone)]
pub struct HttpCall {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Value,
}

pub fn build(call: &Call<'_>) -> HttpCall {
    match call.provider {
        ProviderKind::OpenAi | ProviderKind::DeepSeek | ProviderKind::Local => {
            let mut headers = Vec::new();
            if let Some(key) = call.credential {
                headers.push(("authorization", format!("Bearer {key}")));
            }
            HttpCall {
                url: format!("{}/chat/completions", call.base_url),
                headers,
                body: chat_completions_body(call),
            }
        }
        ProviderKind::Azure => HttpCall {
            url: format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                call.base_url, call.model, call.azure_api_version
            ),
            headers: call
                .credential
                .map(|k| vec![("api-key", k.to_string())])
                .unwrap_or_default(),
            body: chat_completions_body(call),
        },
        ProviderKind::Anthropic => {
            let mut content = Vec::new();
            if let Some(img) = call.image {
                content.push(json!({
                    "type": "image",
                    "source": { "type": "base64", "media_type": img.mime, "data": img.data },
                }));
            }
            content.push(json!({ "type": "text", "text": call.prompt }));

            let mut headers = vec![("anthropic-version", ANTHROPIC_VERSION.to_string())];
            if let Some(key) = call.credential {
                headers.push(("x-api-key", key.to_string()));
            }
            HttpCall {
                url: format!("{}/v1/messages", call.base_url),
                headers,
                body: json!({
                    "model": call.model,
                    "max_tokens": call.max_tokens,
                    "temperature": call.temperature,
                    "messages": [{ "role": "user", "content": content }],
                }),
            }
        }
        ProviderKind::Gemini => {
            let mut parts = vec![json!({ "text": call.prompt })];
            if let Some(img) = call.image {
                parts.push(json!({
                    "inline_data": { "mime_type": img.mime, "data": img.data },
                }));
            }
            HttpCall {
                url: format!(
                    "{}/v1beta/models/{}:generateContent",
                    call.base_url, call.model
                ),
                headers: call
                    .credential
                    .map(|k| vec![("x-goog-api-key", k.to_string())])
                    .unwrap_or_default(),
                body: json!({
                    "contents": [{ "role": "user", "parts": parts }],
                    "generationConfig": {
                        "temperature": call.temperature,
                        "maxOutputTokens": call.max_tokens,
                    },
                }),
            }
        }
    }
}

/// o-series reasoning models reject `temperature` and take
/// `max_completion_tokens`.
fn is_reasoning_model(model: &str) -> bool {
    let m = model.to_ascii_lowercase();
    ["o1", "o3", "o4"]
        .iter()
        .any(|p| m == *p || m.starts_with(&format!("{p}-")))
}

fn chat_completions_body(call: &Call<'_>) -> Value {
    let content = match call.image {
        Some(img) => json!([
            { "type": "text", "text": call.prompt },
            { "type": "image_url", "image_url": { "url": img.data_uri() } },
        ]),
        None => json!(call.prompt),
    };
    let mut body = json!({
        "model": call.model,
        "messages": [{ "role": "user", "content": content }],
    });
    if is_reasoning_model(call.model) {
        body["max_completion_tokens"] = json!(call.max_tokens);
        body["reasoning_effort"] = json!("low");
    } else {
        body["max_tokens"] = json!(call.max_tokens);
        body["temperature"] = json!(call.temperature);
    }
    body
}

/// Pull the reply text out of a successful response body.
pub fn extract_text(provider: ProviderKind, body: &Value) -> Result<String> {
    let missing = |field: &str| {
        ScratchError::Backend(format!("{provider} reply is missing {field}"))
    };
    match provider {
        ProviderKind::OpenAi | ProviderKind::DeepSeek | ProviderKind::Local | ProviderKind::Azure => {
            body.pointer("/choices/0/message/content")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| missing("choices[0].message.content"))
        }
        ProviderKind::Anthropic => {
            let blocks = body
                .get("content")
                .and_then(Value::as_array)
                .ok_or_else(|| missing("content"))?;
            let text: Vec<&str> = blocks
                .iter()
                .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|b| b.get("text").and_then(Value::as_str))
                .collect();
            if text.is_empty() {
                return Err(missing("a text content block"));
            }
            Ok(text.concat())
        }
        ProviderKind::Gemini => {
            let parts = body
                .pointer("/candidates/0/content/parts")
                .and_then(Value::as_array)
                .ok_or_else(|| missing("candidates[0].content.parts"))?;
            let text: Vec<&str> = parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect();
            if text.is_empty() {
                return Err(missing("a text part"));
            }
            Ok(text.concat())
        }
    }
}

/// The provider's own error message, passed through unchanged.
///
/// All supported providers report `{"error": {"message": ...}}`; anything
/// else falls back to the raw body, then to the status line.
pub fn error_message(status: u16, body: &str) -> String {
    if let Ok(v) = serde_json::from_str::<Value>(body) {
        if let Some(msg) = v.pointer("/error/message").and_then(Value::as_str) {
            return msg.to_string();
        }
        if let Some(msg) = v.get("error").and_then(Value::as_str) {
            return msg.to_string();
        }
    }
    let raw = body.trim();
    if raw.is_empty() {
        format!("HTTP {status}")
    } else {
        raw.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::image::ImagePayload;

    fn call<'a>(provider: ProviderKind, model: &'a str, image: Option<&'a ImagePayload>) -> Call<'a> {
        Call {
            provider,
            model,
            prompt: "describe this",
            image,
            credential: Some("sk-test"),
            base_url: "http://host/v1",
            max_tokens: 256,
            temperature: 0.5,
            azure_api_version: "2024-08-01-preview",
        }
    }

    fn png() -> ImagePayload {
        ImagePayload {
            mime: "image/png".into(),
            data: "iVBORw==".into(),
        }
    }

    #[test]
    fn openai_text_only() {
        let http = build(&call(ProviderKind::OpenAi, "gpt-4o", None));
        assert_eq!(http.url, "http://host/v1/chat/completions");
        assert!(http
            .headers
            .contains(&("authorization", "Bearer sk-test".to_string())));
        assert_eq!(http.body["messages"][0]["content"], "describe this");
        assert_eq!(http.body["temperature"], 0.5);
        assert_eq!(http.body["max_tokens"], 256);
    }

    #[test]
    fn openai_with_image_uses_data_uri() {
        let img = png();
        let http = build(&call(ProviderKind::OpenAi, "gpt-4o", Some(&img)));
        let content = &http.body["messages"][0]["content"];
        assert_eq!(content[0]["text"], "describe this");
        assert_eq!(
            content[1]["image_url"]["url"],
            "data:image/png;base64,iVBORw=="
        );
    }

    #[test]
    fn reasoning_model_drops_temperature() {
        let http = build(&call(ProviderKind::OpenAi, "o1-mini", None));
        assert!(http.body.get("temperature").is_none());
        assert_eq!(http.body["max_completion_tokens"], 256);
        assert_eq!(http.body["reasoning_effort"], "low");
        assert!(!is_reasoning_model("gpt-4o"));
        assert!(is_reasoning_model("o3"));
    }

    #[test]
    fn local_without_key_sends_no_auth() {
        let mut c = call(ProviderKind::Local, "qwen", None);
        c.credential = None;
        let http = build(&c);
        assert!(http.headers.is_empty());
    }

    #[test]
    fn azure_deployment_url() {
        let http = build(&call(ProviderKind::Azure, "gpt-4o-ms", None));
        assert_eq!(
            http.url,
            "http://host/v1/openai/deployments/gpt-4o-ms/chat/completions?api-version=2024-08-01-preview"
        );
        assert_eq!(http.headers, vec![("api-key", "sk-test".to_string())]);
    }

    #[test]
    fn anthropic_image_block_precedes_text() {
        let img = png();
        let http = build(&call(ProviderKind::Anthropic, "claude", Some(&img)));
        assert_eq!(http.url, "http://host/v1/v1/messages");
        let content = &http.body["messages"][0]["content"];
        assert_eq!(content[0]["type"], "image");
        assert_eq!(content[0]["source"]["media_type"], "image/png");
        assert_eq!(content[1]["text"], "describe this");
        assert!(http.headers.contains(&("x-api-key", "sk-test".to_string())));
    }

    #[test]
    fn gemini_inline_data() {
        let img = png();
        let http = build(&call(ProviderKind::Gemini, "gemini-pro", Some(&img)));
        assert_eq!(http.url, "http://host/v1/v1beta/models/gemini-pro:generateContent");
        let parts = &http.body["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "describe this");
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/png");
        assert_eq!(http.body["generationConfig"]["maxOutputTokens"], 256);
    }

    #[test]
    fn extract_text_per_provider() {
        let openai = json!({ "choices": [{ "message": { "content": "hi" } }] });
        assert_eq!(extract_text(ProviderKind::DeepSeek, &openai).unwrap(), "hi");

        let anthropic = json!({ "content": [
            { "type": "text", "text": "a" },
            { "type": "tool_use", "id": "x" },
            { "type": "text", "text": "b" },
        ]});
        assert_eq!(extract_text(ProviderKind::Anthropic, &anthropic).unwrap(), "ab");

        let gemini = json!({ "candidates": [{ "content": { "parts": [{ "text": "g" }] } }] });
        assert_eq!(extract_text(ProviderKind::Gemini, &gemini).unwrap(), "g");
    }

    #[test]
    fn extract_text_missing_field_is_backend_error() {
        let err = extract_text(ProviderKind::OpenAi, &json!({ "choices": [] })).unwrap_err();
        assert!(matches!(err, ScratchError::Backend(ref m) if m.contains("choices[0].message.content")));
    }

    #[test]
    fn error_message_passthrough() {
        assert_eq!(
            error_message(401, r#"{"error":{"message":"Incorrect API key provided"}}"#),
            "Incorrect API key provided"
        );
        assert_eq!(error_message(500, r#"{"error":"overloaded"}"#), "overloaded");
        assert_eq!(error_message(502, "Bad Gateway\n"), "Bad Gateway");
        assert_eq!(error_message(503, ""), "HTTP 503");
    }
}
