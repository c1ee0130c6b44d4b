//! Model client boundary
//!
//! The model is an untrusted oracle. A client only transports text; it
//! never interprets the reply.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;
use thiserror::Error;

/// One generation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    pub prompt: String,
    /// Ask for temperature 0 and JSON-formatted output
    pub deterministic: bool,
}

impl ModelRequest {
    pub fn deterministic(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            deterministic: true,
        }
    }
}

/// Transport-level failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelFailure {
    #[error("{0}")]
    Unreachable(String),

    #[error("request timed out")]
    Timeout,

    #[error("endpoint returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Future returned by `ModelClient::generate`
pub type ModelFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, ModelFailure>> + Send + 'a>>;

/// A generative model endpoint
pub trait ModelClient: Send + Sync {
    /// Sends the prompt and returns the raw reply body
    fn generate<'a>(&'a self, request: &'a ModelRequest) -> ModelFuture<'a>;

    /// Model name for logs
    fn model_name(&self) -> &str;
}
