//! OpenAI-compatible backend for completions and embeddings.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::provider::{CompletionProvider, EmbeddingProvider};
use crate::types::{CompletionRequest, ProviderReply, ToolCall};

/// OpenAI-compatible API provider. Owns the single configured HTTP client.
pub struct OpenAiProvider {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    embedding_model: String,
    embedding_dimensions: usize,
    timeout_ms: u64,
}

impl OpenAiProvider {
    /// Build the provider from configuration.
    ///
    /// # Errors
    /// Returns [`LlmError::ConfigError`] if no credential can be resolved or
    /// the HTTP client cannot be constructed.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            LlmError::ConfigError(format!(
                "no API key: set `llm.api_key` or the {} environment variable",
                config.api_key_env
            ))
        })?;

        let http = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| LlmError::ConfigError(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            embedding_model: config.embedding_model.clone(),
            embedding_dimensions: config.embedding_dimensions,
            timeout_ms: config.request_timeout_ms,
        })
    }

    async fn post(&self, endpoint: &str, body: &Value) -> Result<Value, LlmError> {
        let url = format!("{}/{endpoint}", self.base_url);
        let start = Instant::now();

        let resp = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::from_transport(e, self.timeout_ms))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(%url, status = status.as_u16(), "LLM provider returned error");
            return Err(LlmError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| LlmError::from_transport(e, self.timeout_ms))?;

        debug!(%url, latency_ms = start.elapsed().as_millis() as u64, "LLM call finished");
        Ok(json)
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<ProviderReply, LlmError> {
        let body = chat_body(&self.model, request);
        let json = self.post("chat/completions", &body).await?;
        parse_chat_reply(&json)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let body = json!({
            "model": self.embedding_model,
            "input": text,
        });
        let json = self.post("embeddings", &body).await?;
        parse_embedding(&json)
    }

    fn dimensions(&self) -> usize {
        self.embedding_dimensions
    }
}

/// Build the `/chat/completions` body. The `tools` key is omitted entirely
/// when no tools are offered, since an empty array is rejected.
#[must_use]
pub fn chat_body(model: &str, request: &CompletionRequest) -> Value {
    let messages: Vec<Value> = request
        .messages
        .iter()
        .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
        .collect();

    let mut body = json!({
        "model": model,
        "messages": messages,
    });

    if !request.tools.is_empty() {
        let tools: Vec<Value> = request
            .tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters,
                    }
                })
            })
            .collect();
        body["tools"] = json!(tools);
        body["tool_choice"] = json!(request.tool_choice.as_str());
    }
    if let Some(temperature) = request.temperature {
        body["temperature"] = json!(temperature);
    }
    if let Some(max_tokens) = request.max_tokens {
        body["max_tokens"] = json!(max_tokens);
    }

    body
}

/// Extract the first choice (text and first tool call) from a response.
///
/// # Errors
/// Returns [`LlmError::ParseError`] if the response carries no choices.
pub fn parse_chat_reply(json: &Value) -> Result<ProviderReply, LlmError> {
    let message = json["choices"]
        .get(0)
        .map(|choice| &choice["message"])
        .ok_or_else(|| LlmError::ParseError(format!("response has no choices: {json}")))?;

    let content = message["content"].as_str().map(str::to_string);
    let tool_call = message["tool_calls"]
        .as_array()
        .and_then(|calls| calls.first())
        .and_then(|call| {
            let function = &call["function"];
            let name = function["name"].as_str()?;
            Some(ToolCall {
                name: name.to_string(),
                arguments: function["arguments"].as_str().unwrap_or("").to_string(),
            })
        });

    Ok(ProviderReply { content, tool_call })
}

/// Extract the first embedding vector from an `/embeddings` response.
///
/// # Errors
/// Returns [`LlmError::ParseError`] if the vector is missing or non-numeric.
pub fn parse_embedding(json: &Value) -> Result<Vec<f32>, LlmError> {
    let values = json["data"][0]["embedding"]
        .as_array()
        .ok_or_else(|| LlmError::ParseError("response has no embedding".into()))?;

    values
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| LlmError::ParseError(format!("non-numeric embedding value: {v}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use super::*;
    use crate::types::{Message, ToolChoice, ToolSchema};

    /// A local server that reads one request, writes `partial` and then stalls.
    fn stalled_server(partial: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0_u8; 4096];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(partial.as_bytes());
                let _ = stream.flush();
                thread::sleep(Duration::from_secs(2));
            }
        });
        format!("http://{addr}")
    }

    fn provider_for(base_url: String) -> OpenAiProvider {
        let timeout_ms = 150;
        OpenAiProvider {
            http: Client::builder()
                .no_proxy()
                .timeout(Duration::from_millis(timeout_ms))
                .build()
                .expect("client"),
            base_url,
            api_key: "test-key".into(),
            model: "gpt-4".into(),
            embedding_model: "text-embedding-ada-002".into(),
            embedding_dimensions: 3,
            timeout_ms,
        }
    }

    fn rate_tool() -> ToolSchema {
        ToolSchema {
            name: "rate".into(),
            description: "Rate it".into(),
            parameters: json!({"type": "object", "properties": {}}),
        }
    }

    #[test]
    fn plain_body_omits_tools() {
        let request = CompletionRequest::new(vec![Message::user("hello")]);
        let body = chat_body("gpt-4", &request);
        assert_eq!(body["model"], "gpt-4");
        assert_eq!(body["messages"][0]["role"], "user");
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
    }

    #[test]
    fn tool_body_carries_choice_and_limits() {
        let request = CompletionRequest::new(vec![Message::system("rate")])
            .with_tools(vec![rate_tool()], ToolChoice::Required)
            .with_temperature(0.0)
            .with_max_tokens(1);
        let body = chat_body("gpt-4", &request);
        assert_eq!(body["tools"][0]["function"]["name"], "rate");
        assert_eq!(body["tool_choice"], "required");
        assert_eq!(body["max_tokens"], 1);
        assert_eq!(body["temperature"], 0.0);
    }

    #[test]
    fn parses_text_reply() {
        let json = json!({"choices": [{"message": {"role": "assistant", "content": "Well met."}}]});
        let reply = parse_chat_reply(&json).expect("parse");
        assert_eq!(reply.content.as_deref(), Some("Well met."));
        assert!(reply.tool_call.is_none());
    }

    #[test]
    fn parses_first_tool_call() {
        let json = json!({"choices": [{"message": {
            "content": null,
            "tool_calls": [
                {"type": "function", "function": {"name": "attack", "arguments": "{\"target\":\"wolf\"}"}},
                {"type": "function", "function": {"name": "flee", "arguments": "{}"}}
            ]
        }}]});
        let reply = parse_chat_reply(&json).expect("parse");
        let call = reply.tool_call.expect("tool call");
        assert_eq!(call.name, "attack");
        assert_eq!(call.arguments, "{\"target\":\"wolf\"}");
        assert!(reply.content.is_none());
    }

    #[test]
    fn missing_choices_is_parse_error() {
        let err = parse_chat_reply(&json!({"error": "boom"})).expect_err("should fail");
        assert!(matches!(err, LlmError::ParseError(_)));
    }

    #[test]
    fn parses_embedding_vector() {
        let json = json!({"data": [{"embedding": [0.5, -0.25, 1.0]}]});
        assert_eq!(parse_embedding(&json).expect("parse"), vec![0.5, -0.25, 1.0]);
        assert!(parse_embedding(&json!({"data": []})).is_err());
    }

    #[test]
    fn provider_requires_credential() {
        let config = LlmConfig {
            api_key: None,
            api_key_env: "RECALL_TEST_UNSET_KEY_VAR".into(),
            ..LlmConfig::default()
        };
        assert!(matches!(
            OpenAiProvider::from_config(&config),
            Err(LlmError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn stalled_headers_time_out_with_configured_budget() {
        let provider = provider_for(stalled_server(""));
        let err = provider.embed("hello").await.expect_err("timeout");
        assert!(matches!(err, LlmError::Timeout(150)), "got {err:?}");
    }

    #[tokio::test]
    async fn stalled_body_times_out_with_configured_budget() {
        let provider = provider_for(stalled_server(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 64\r\n\r\n{\"data\"",
        ));
        let err = provider.embed("hello").await.expect_err("timeout");
        assert!(matches!(err, LlmError::Timeout(150)), "got {err:?}");
    }
}
