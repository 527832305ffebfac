// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Chat Completions API.
//!
//! One request per call. Failures are classified so the pipeline can decide
//! what to retry: transport errors and 408/429/5xx are
//! [`CourierError::Unavailable`], other statuses are
//! [`CourierError::Collaborator`], and an unreadable success body is a
//! [`CourierError::Protocol`] error.

use std::time::Duration;

use courier_core::{Collaborator, CourierError};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, ChatRequest, ChatResponse};

/// HTTP client for an OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    completions_url: String,
}

impl OpenAiClient {
    /// Creates a client for `base_url` (e.g. `https://api.openai.com/v1`).
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self, CourierError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| CourierError::Config(format!("invalid API key header value: {e}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| CourierError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            completions_url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
        })
    }

    /// Sends a non-streaming completion request.
    pub async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, CourierError> {
        let response = self
            .client
            .post(&self.completions_url)
            .json(request)
            .send()
            .await
            .map_err(|e| CourierError::Unavailable {
                collaborator: Collaborator::Model,
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, "completion response received");

        if status.is_success() {
            let body = response.text().await.map_err(|e| CourierError::Unavailable {
                collaborator: Collaborator::Model,
                message: format!("failed to read response body: {e}"),
                source: Some(Box::new(e)),
            })?;
            return serde_json::from_str(&body)
                .map_err(|e| CourierError::Protocol(format!("unparseable completion: {e}")));
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
            Ok(api_err) => format!(
                "API error ({}, {}): {}",
                status,
                api_err.error.error_type.as_deref().unwrap_or("unknown"),
                api_err.error.message
            ),
            Err(_) => format!("API returned {status}: {body}"),
        };

        if is_transient_error(status) {
            warn!(status = %status, "transient model API error");
            Err(CourierError::Unavailable {
                collaborator: Collaborator::Model,
                message,
                source: None,
            })
        } else {
            Err(CourierError::Collaborator {
                collaborator: Collaborator::Model,
                message,
                source: None,
            })
        }
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: StatusCode) -> bool {
    matches!(status.as_u16(), 408 | 429 | 500 | 502 | 503 | 504)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatMessage;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> OpenAiClient {
        OpenAiClient::new("sk-test", &format!("{}/v1", server.uri()), Duration::from_secs(5))
            .unwrap()
    }

    fn request() -> ChatRequest {
        ChatRequest {
            model: "gpt-test".into(),
            messages: vec![ChatMessage {
                role: "user".into(),
                content: Some("Hello".into()),
                tool_calls: vec![],
                tool_call_id: None,
            }],
            max_tokens: 64,
            tools: vec![],
        }
    }

    #[tokio::test]
    async fn sends_bearer_token_to_completions_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-1",
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": "Hi!" },
                    "finish_reason": "stop"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = test_client(&server).complete(&request()).await.unwrap();
        assert_eq!(response.choices[0].message.content.as_deref(), Some("Hi!"));
    }

    #[tokio::test]
    async fn rate_limit_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": { "message": "slow down", "type": "rate_limit_error" }
            })))
            .mount(&server)
            .await;

        let err = test_client(&server).complete(&request()).await.unwrap_err();
        assert!(err.is_transient());
        assert!(err.to_string().contains("slow down"));
    }

    #[tokio::test]
    async fn bad_request_is_not_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("nope"))
            .mount(&server)
            .await;

        let err = test_client(&server).complete(&request()).await.unwrap_err();
        assert!(matches!(err, CourierError::Collaborator { .. }));
    }

    #[tokio::test]
    async fn garbage_success_body_is_protocol_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = test_client(&server).complete(&request()).await.unwrap_err();
        assert!(matches!(err, CourierError::Protocol(_)));
    }

    #[tokio::test]
    async fn connection_refused_is_transient() {
        // Nothing listens on port 9 of localhost in the test environment.
        let client =
            OpenAiClient::new("sk", "http://127.0.0.1:9/v1", Duration::from_secs(2)).unwrap();
        let err = client.complete(&request()).await.unwrap_err();
        assert!(err.is_transient());
    }
}
