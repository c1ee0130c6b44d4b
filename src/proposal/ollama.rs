//! Ollama-compatible model client
//!
//! POSTs `{model, prompt, stream: false, format: "json", options:
//! {temperature: 0}}` to a `/api/generate` endpoint and returns the reply
//! body untouched.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::config::ModelConfig;

use super::client::{ModelClient, ModelFailure, ModelFuture, ModelRequest};

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

impl<'a> GenerateRequest<'a> {
    fn new(model: &'a str, request: &'a ModelRequest) -> Self {
        Self {
            model,
            prompt: &request.prompt,
            stream: false,
            format: request.deterministic.then_some("json"),
            options: request
                .deterministic
                .then_some(GenerateOptions { temperature: 0.0 }),
        }
    }
}

/// HTTP client for an Ollama `/api/generate` endpoint
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaClient {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ModelFailure> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ModelFailure::Unreachable(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
        })
    }

    pub fn from_config(config: &ModelConfig) -> Result<Self, ModelFailure> {
        Self::new(&config.endpoint, &config.model, config.timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, request: &ModelRequest) -> Result<Value, ModelFailure> {
        let body = GenerateRequest::new(&self.model, request);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelFailure::Timeout
                } else {
                    ModelFailure::Unreachable(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ModelFailure::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                ModelFailure::Timeout
            } else {
                ModelFailure::Unreachable(format!("Failed to read response: {}", e))
            }
        })
    }
}

impl ModelClient for OllamaClient {
    fn generate<'a>(&'a self, request: &'a ModelRequest) -> ModelFuture<'a> {
        Box::pin(self.send(request))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_shape() {
        let request = ModelRequest::deterministic("list students");
        let body = serde_json::to_value(GenerateRequest::new("llama3", &request)).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "llama3",
                "prompt": "list students",
                "stream": false,
                "format": "json",
                "options": {"temperature": 0.0}
            })
        );
    }

    #[test]
    fn test_free_form_request_omits_format() {
        let request = ModelRequest {
            prompt: "hi".into(),
            deterministic: false,
        };
        let body = serde_json::to_value(GenerateRequest::new("llama3", &request)).unwrap();
        assert!(body.get("format").is_none());
        assert!(body.get("options").is_none());
    }

    #[test]
    fn test_from_config() {
        let client = OllamaClient::from_config(&ModelConfig::default()).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:11434/api/generate");
        assert_eq!(client.model_name(), "llama3");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let client =
            OllamaClient::new("http://127.0.0.1:1/api/generate", "llama3", Duration::from_secs(2))
                .unwrap();
        let err = client
            .generate(&ModelRequest::deterministic("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ModelFailure::Unreachable(_) | ModelFailure::Timeout));
    }
}
