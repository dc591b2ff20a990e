use super::image::ImagePayload;
use super::wire;
use crate::error::{Result, ScratchError};
use crate::types::ProviderKind;

/// One fully resolved outbound request.
#[derive(Debug, Clone)]
pub struct Call<'a> {
    pub provider: ProviderKind,
    pub model: &'a str,
    pub prompt: &'a str,
    pub image: Option<&'a ImagePayload>,
    pub credential: Option<&'a str>,
    pub base_url: &'a str,
    pub max_tokens: u32,
    pub temperature: f32,
    pub azure_api_version: &'a str,
}

/// Sends a resolved call and returns the reply text.
///
/// Implementations make exactly one attempt. Any failure is reported as
/// [`ScratchError::Backend`] carrying the provider's message.
pub trait Backend {
    fn send(&self, call: &Call<'_>) -> Result<String>;
}

impl<B: Backend + ?Sized> Backend for &B {
    fn send(&self, call: &Call<'_>) -> Result<String> {
        (**self).send(call)
    }
}

/// Blocking HTTP transport over `reqwest`.
pub struct HttpBackend {
    client: reqwest::blocking::Client,
}

impl HttpBackend {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("scratch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ScratchError::Backend(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Backend for HttpBackend {
    fn send(&self, call: &Call<'_>) -> Result<String> {
        let http = wire::build(call);
        tracing::info!(provider = %call.provider, model = call.model, url = %http.url, "sending llm request");

        let mut req = self.client.post(&http.url).json(&http.body);
        for (name, value) in &http.headers {
            req = req.header(*name, value);
        }

        let resp = req
            .send()
            .map_err(|e| ScratchError::Backend(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| ScratchError::Backend(e.to_string()))?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "llm request failed");
            return Err(ScratchError::Backend(wire::error_message(status.as_u16(), &body)));
        }

        let value: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            ScratchError::Backend(format!("{} returned invalid JSON: {e}", call.provider))
        })?;
        wire::extract_text(call.provider, &value)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn call<'a>(provider: ProviderKind, base_url: &'a str) -> Call<'a> {
        Call {
            provider,
            model: "test-model",
            prompt: "ping",
            image: None,
            credential: Some("sk-test"),
            base_url,
            max_tokens: 100,
            temperature: 0.7,
            azure_api_version: "2024-08-01-preview",
        }
    }

    #[test]
    fn openai_compatible_success() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "test-model",
                "messages": [{ "role": "user", "content": "ping" }],
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"pong"}}]}"#)
            .create();

        let base = format!("{}/v1", server.url());
        let text = HttpBackend::new()
            .unwrap()
            .send(&call(ProviderKind::OpenAi, &base))
            .unwrap();
        assert_eq!(text, "pong");
        mock.assert();
    }

    #[test]
    fn anthropic_success() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "sk-test")
            .match_header("anthropic-version", wire::ANTHROPIC_VERSION)
            .with_status(200)
            .with_body(r#"{"content":[{"type":"text","text":"hello from claude"}]}"#)
            .create();

        let text = HttpBackend::new()
            .unwrap()
            .send(&call(ProviderKind::Anthropic, &server.url()))
            .unwrap();
        assert_eq!(text, "hello from claude");
        mock.assert();
    }

    #[test]
    fn gemini_success() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/v1beta/models/test-model:generateContent")
            .match_header("x-goog-api-key", "sk-test")
            .with_status(200)
            .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"gem"}]}}]}"#)
            .create();

        let text = HttpBackend::new()
            .unwrap()
            .send(&call(ProviderKind::Gemini, &server.url()))
            .unwrap();
        assert_eq!(text, "gem");
        mock.assert();
    }

    #[test]
    fn http_error_message_passed_through_verbatim() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body(r#"{"error":{"message":"Rate limit reached for gpt-4o","type":"requests"}}"#)
            .expect(1)
            .create();

        let err = HttpBackend::new()
            .unwrap()
            .send(&call(ProviderKind::DeepSeek, &server.url()))
            .unwrap_err();
        assert!(matches!(err, ScratchError::Backend(ref m) if m == "Rate limit reached for gpt-4o"));
    }

    #[test]
    fn invalid_json_is_backend_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body("<html>proxy page</html>")
            .create();

        let err = HttpBackend::new()
            .unwrap()
            .send(&call(ProviderKind::Local, &server.url()))
            .unwrap_err();
        assert!(matches!(err, ScratchError::Backend(ref m) if m.contains("invalid JSON")));
    }

    #[test]
    fn unreachable_host_is_backend_error() {
        // Port 9 (discard) on localhost is closed on test machines.
        let err = HttpBackend::new()
            .unwrap()
            .send(&call(ProviderKind::Local, "http://127.0.0.1:9"))
            .unwrap_err();
        assert!(matches!(err, ScratchError::Backend(_)));
    }
}
