// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! fal.ai text-to-image client.
//!
//! Calls the synchronous `https://fal.run/<model>` endpoint and returns the
//! URL of the first generated image. Retries are left to the caller.

use std::time::Duration;

use async_trait::async_trait;
use courier_config::model::ImageConfig;
use courier_core::{
    AdapterType, Collaborator, CourierError, GeneratedImage, HealthStatus, ImageGenerator,
    PluginAdapter,
};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    images: Vec<ImageRef>,
}

#[derive(Debug, Deserialize)]
struct ImageRef {
    url: String,
}

/// HTTP client for fal.ai image models.
#[derive(Debug, Clone)]
pub struct FalImageClient {
    client: reqwest::Client,
    endpoint: String,
}

impl FalImageClient {
    /// Builds a client from config, reading the key from `FAL_KEY` when the
    /// config leaves it unset.
    pub fn new(config: &ImageConfig) -> Result<Self, CourierError> {
        let key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("FAL_KEY").ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                CourierError::Config("image.api_key (or FAL_KEY) is required for image generation".into())
            })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Key {key}"))
                .map_err(|e| CourierError::Config(format!("invalid fal.ai key: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(180))
            .build()
            .map_err(|e| CourierError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/{}",
                config.base_url.trim_end_matches('/'),
                config.model.trim_start_matches('/')
            ),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn unavailable(message: String, source: Option<reqwest::Error>) -> CourierError {
    CourierError::Unavailable {
        collaborator: Collaborator::ImageGeneration,
        message,
        source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
    }
}

#[async_trait]
impl PluginAdapter for FalImageClient {
    fn name(&self) -> &str {
        "fal"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ImageGeneration
    }

    async fn health_check(&self) -> Result<HealthStatus, CourierError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CourierError> {
        Ok(())
    }
}

#[async_trait]
impl ImageGenerator for FalImageClient {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, CourierError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&GenerateRequest { prompt })
            .send()
            .await
            .map_err(|e| unavailable(format!("request failed: {e}"), Some(e)))?;

        let status = response.status();
        debug!(status = %status, "fal.ai response received");

        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(unavailable(format!("fal.ai returned {status}: {body}"), None));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CourierError::Collaborator {
                collaborator: Collaborator::ImageGeneration,
                message: format!("fal.ai returned {status}: {body}"),
                source: None,
            });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| CourierError::Protocol(format!("unreadable fal.ai response: {e}")))?;

        body.images
            .into_iter()
            .next()
            .map(|img| GeneratedImage { url: img.url })
            .ok_or_else(|| CourierError::Protocol("fal.ai response contained no images".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> FalImageClient {
        FalImageClient::new(&ImageConfig {
            enabled: true,
            api_key: Some("test-key".into()),
            base_url: server.uri(),
            model: "fal-ai/flux/dev".into(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn returns_first_image_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/fal-ai/flux/dev"))
            .and(header("authorization", "Key test-key"))
            .and(body_json(serde_json::json!({ "prompt": "a red fox" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "images": [
                    { "url": "https://cdn.example/fox.png", "width": 1024 },
                    { "url": "https://cdn.example/other.png" }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let image = client_for(&server).generate("a red fox").await.unwrap();
        assert_eq!(image.url, "https://cdn.example/fox.png");
    }

    #[tokio::test]
    async fn server_errors_are_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = client_for(&server).generate("x").await.unwrap_err();
        assert!(err.is_transient(), "got {err:?}");
    }

    #[tokio::test]
    async fn client_errors_are_not_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("bad prompt"))
            .mount(&server)
            .await;

        let err = client_for(&server).generate("x").await.unwrap_err();
        assert!(matches!(err, CourierError::Collaborator { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn empty_image_list_is_protocol_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "images": [] })))
            .mount(&server)
            .await;

        let err = client_for(&server).generate("x").await.unwrap_err();
        assert!(matches!(err, CourierError::Protocol(_)));
    }

    #[test]
    fn endpoint_joins_base_and_model() {
        let client = FalImageClient::new(&ImageConfig {
            enabled: true,
            api_key: Some("k".into()),
            base_url: "https://fal.run/".into(),
            model: "/fal-ai/flux/dev".into(),
        })
        .unwrap();
        assert_eq!(client.endpoint(), "https://fal.run/fal-ai/flux/dev");
    }
}
