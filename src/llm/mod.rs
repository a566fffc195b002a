//! Boundary to the hosted language model.
//!
//! The chat service only depends on [`ChatModel`]; [`OpenAiCompatClient`]
//! implements it for OpenRouter, GitHub Models / Azure Inference and any other
//! OpenAI-compatible `/chat/completions` endpoint.

mod client;

pub use client::OpenAiCompatClient;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Message;

/// Why a completion could not be obtained.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model API key not configured")]
    NotConfigured,

    #[error("model request timed out")]
    Timeout,

    #[error("model request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model API quota or rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("malformed model response: {0}")]
    Malformed(String),
}

impl ModelError {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotConfigured => "not_configured",
            Self::Timeout => "timeout",
            Self::Transport(_) => "transport",
            Self::Status { .. } => "status",
            Self::RateLimited(_) => "rate_limited",
            Self::Malformed(_) => "malformed",
        }
    }
}

/// Something that turns an ordered message list into one assistant reply.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> Result<String, ModelError>;
}
