//! LLM Client: the single point of entry for all provider calls in SkillPath.
//!
//! ARCHITECTURAL RULE: No other module may call a provider API directly.
//! Exactly one HTTP request per `call`; retrying across providers is the
//! recommender's job, never this module's.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub mod providers;

use providers::ProviderConfig;

const TEMPERATURE: f32 = 0.2;
const MAX_TOKENS: u32 = 1500;
/// How much of an error body is kept for logs.
const ERROR_SNIPPET_CHARS: usize = 500;

/// The provider could not be reached or did not answer with JSON.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected content type '{0}'")]
    ContentType(String),

    #[error("response body is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum ProviderCallError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The provider answered 2xx but the body carries an `error` field.
    #[error("provider error: {0}")]
    Provider(String),
}

/// A function the model is forced to call, constraining its output to `parameters`.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

/// The seam between the recommender and the network. `ProviderClient` is the
/// real implementation; tests substitute scripted callers.
#[async_trait]
pub trait ProviderCaller: Send + Sync {
    /// Sends one chat completion and returns the decoded body untouched.
    /// `schema` is only attached when the provider supports structured output.
    async fn call(
        &self,
        provider: &ProviderConfig,
        system: &str,
        prompt: &str,
        schema: Option<&FunctionSchema>,
    ) -> Result<Value, ProviderCallError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct Tool<'a> {
    #[serde(rename = "type")]
    tool_type: &'a str,
    function: &'a FunctionSchema,
}

#[derive(Debug, Serialize)]
struct ToolChoice<'a> {
    #[serde(rename = "type")]
    tool_type: &'a str,
    function: ToolChoiceFunction<'a>,
}

#[derive(Debug, Serialize)]
struct ToolChoiceFunction<'a> {
    name: &'a str,
}

fn build_request<'a>(
    provider: &'a ProviderConfig,
    system: &'a str,
    prompt: &'a str,
    schema: Option<&'a FunctionSchema>,
) -> ChatRequest<'a> {
    let schema = schema.filter(|_| provider.kind.supports_structured_schema());

    ChatRequest {
        model: &provider.model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: system,
            },
            ChatMessage {
                role: "user",
                content: prompt,
            },
        ],
        temperature: TEMPERATURE,
        max_tokens: MAX_TOKENS,
        tools: schema.map(|function| {
            vec![Tool {
                tool_type: "function",
                function,
            }]
        }),
        tool_choice: schema.map(|function| ToolChoice {
            tool_type: "function",
            function: ToolChoiceFunction {
                name: function.name,
            },
        }),
    }
}

/// The HTTP client shared by every provider attempt.
#[derive(Clone)]
pub struct ProviderClient {
    client: Client,
}

impl ProviderClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
        }
    }
}

#[async_trait]
impl ProviderCaller for ProviderClient {
    async fn call(
        &self,
        provider: &ProviderConfig,
        system: &str,
        prompt: &str,
        schema: Option<&FunctionSchema>,
    ) -> Result<Value, ProviderCallError> {
        let request_body = build_request(provider, system, prompt, schema);

        let mut request = self
            .client
            .post(&provider.endpoint)
            .bearer_auth(&provider.api_key)
            .json(&request_body);
        for (name, value) in &provider.extra_headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(TransportError::Http)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: body.chars().take(ERROR_SNIPPET_CHARS).collect(),
            }
            .into());
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if !content_type.contains("json") {
            return Err(TransportError::ContentType(content_type).into());
        }

        let text = response.text().await.map_err(TransportError::Http)?;
        let body: Value = serde_json::from_str(&text).map_err(TransportError::Decode)?;

        if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(ProviderCallError::Provider(message));
        }

        if let Some(usage) = body.get("usage") {
            let prompt_tokens = usage.get("prompt_tokens").cloned().unwrap_or_default();
            let completion_tokens = usage.get("completion_tokens").cloned().unwrap_or_default();
            debug!(
                "{} call succeeded: prompt_tokens={prompt_tokens}, completion_tokens={completion_tokens}",
                provider.kind,
            );
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::providers::ProviderKind;
    use super::*;

    fn schema() -> FunctionSchema {
        FunctionSchema {
            name: "emit_learning_paths",
            description: "test schema",
            parameters: json!({"type": "object"}),
        }
    }

    fn provider(kind: ProviderKind, endpoint: String) -> ProviderConfig {
        ProviderConfig {
            kind,
            api_key: "test-key".to_string(),
            endpoint,
            model: "test-model".to_string(),
            extra_headers: vec![],
        }
    }

    #[test]
    fn test_structured_request_forces_tool_call() {
        let provider = provider(ProviderKind::OpenAi, "http://unused".into());
        let schema = schema();
        let body = serde_json::to_value(build_request(&provider, "sys", "hi", Some(&schema))).unwrap();

        assert_eq!(body["model"], "test-model");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
        assert_eq!(body["tools"][0]["function"]["name"], "emit_learning_paths");
        assert_eq!(body["tool_choice"]["function"]["name"], "emit_learning_paths");
    }

    #[test]
    fn test_schema_dropped_for_plain_provider() {
        let provider = provider(ProviderKind::OpenRouter, "http://unused".into());
        let schema = schema();
        let body = serde_json::to_value(build_request(&provider, "sys", "hi", Some(&schema))).unwrap();

        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
    }

    #[tokio::test]
    async fn test_call_returns_raw_body_and_sends_headers() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .header("authorization", "Bearer test-key")
                    .header("x-title", "SkillPath");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "choices": [{"message": {"content": "{\"paths\": []}"}}],
                        "usage": {"prompt_tokens": 120, "completion_tokens": 340}
                    }));
            })
            .await;

        let mut config = provider(ProviderKind::OpenRouter, server.url("/v1/chat/completions"));
        config.extra_headers = vec![("X-Title".to_string(), "SkillPath".to_string())];

        let client = ProviderClient::new(Duration::from_secs(5));
        let body = client.call(&config, "sys", "prompt", None).await.unwrap();

        mock.assert_async().await;
        assert_eq!(body["choices"][0]["message"]["content"], "{\"paths\": []}");
        assert_eq!(body["usage"]["completion_tokens"], 340);
    }

    #[tokio::test]
    async fn test_non_2xx_is_transport_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(503).body("upstream unavailable");
            })
            .await;

        let client = ProviderClient::new(Duration::from_secs(5));
        let err = client
            .call(&provider(ProviderKind::OpenAi, server.url("/")), "sys", "prompt", None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ProviderCallError::Transport(TransportError::Status { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_non_json_content_type_is_transport_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200)
                    .header("content-type", "text/html")
                    .body("<html>hello</html>");
            })
            .await;

        let client = ProviderClient::new(Duration::from_secs(5));
        let err = client
            .call(&provider(ProviderKind::OpenAi, server.url("/")), "sys", "prompt", None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ProviderCallError::Transport(TransportError::ContentType(_))
        ));
    }

    #[tokio::test]
    async fn test_error_field_is_provider_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({"error": {"message": "model overloaded", "code": 529}}));
            })
            .await;

        let client = ProviderClient::new(Duration::from_secs(5));
        let err = client
            .call(&provider(ProviderKind::OpenRouter, server.url("/")), "sys", "prompt", None)
            .await
            .unwrap_err();

        match err {
            ProviderCallError::Provider(message) => assert_eq!(message, "model overloaded"),
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let client = ProviderClient::new(Duration::from_secs(2));
        let err = client
            .call(
                &provider(ProviderKind::OpenAi, "http://127.0.0.1:1/v1".into()),
                "sys",
                "prompt",
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderCallError::Transport(TransportError::Http(_))));
    }
}
