use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use kunan_core::config::LlmConfig;

#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Returns the text of the first completion choice.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Client for OpenAI-compatible `POST {base_url}/chat/completions` endpoints.
pub struct ChatCompletionClient {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl ChatCompletionClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<SecretString>) -> Self {
        Self { client: Client::new(), base_url: base_url.into(), api_key }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(config.base_url.clone(), config.api_key.clone())
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Serialize)]
struct ChatRequestBody<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponseBody {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl LlmClient for ChatCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = ChatRequestBody {
            model: &request.model,
            temperature: request.temperature,
            messages: [
                ChatMessage { role: "system", content: &request.system },
                ChatMessage { role: "user", content: &request.user },
            ],
        };

        let mut builder = self.client.post(self.completions_url()).json(&body);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key.expose_secret());
        }

        let response = builder.send().await.context("completion request failed")?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("completion endpoint returned {status}"));
        }

        let parsed: ChatResponseBody =
            response.json().await.context("failed to decode completion response")?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| anyhow!("completion response carried no message content"))
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::{ChatCompletionClient, CompletionRequest, LlmClient};

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "llama-3.3-70b-versatile".to_string(),
            system: "Eres el gerente de operaciones".to_string(),
            user: "Llevar llaves a 10 cuadras".to_string(),
            temperature: 0.2,
        }
    }

    #[tokio::test]
    async fn sends_system_and_user_messages_with_bearer_key() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/openai/v1/chat/completions")
                    .header("authorization", "Bearer gsk-test")
                    .json_body(json!({
                        "model": "llama-3.3-70b-versatile",
                        "temperature": 0.2,
                        "messages": [
                            { "role": "system", "content": "Eres el gerente de operaciones" },
                            { "role": "user", "content": "Llevar llaves a 10 cuadras" }
                        ]
                    }));
                then.status(200).json_body(json!({
                    "choices": [{ "message": { "role": "assistant", "content": "{\"task\":\"x\"}" } }]
                }));
            })
            .await;

        let client = ChatCompletionClient::new(
            format!("{}/openai/v1", server.base_url()),
            Some("gsk-test".to_string().into()),
        );
        let content = client.complete(&request()).await.expect("completion");

        mock.assert_async().await;
        assert_eq!(content, "{\"task\":\"x\"}");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(429).body("rate limited");
            })
            .await;

        let client = ChatCompletionClient::new(server.base_url(), None);
        let error = client.complete(&request()).await.expect_err("429 should fail");

        assert!(error.to_string().contains("429"));
    }

    #[tokio::test]
    async fn missing_choices_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(json!({ "choices": [] }));
            })
            .await;

        let client = ChatCompletionClient::new(server.base_url(), None);
        let error = client.complete(&request()).await.expect_err("no choices");

        assert!(error.to_string().contains("no message content"));
    }

    #[tokio::test]
    async fn empty_content_is_returned_as_is() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(json!({
                    "choices": [{ "message": { "content": "" } }]
                }));
            })
            .await;

        let client = ChatCompletionClient::new(server.base_url(), None);
        let content = client.complete(&request()).await.expect("empty content is still content");

        assert!(content.is_empty());
    }
}
