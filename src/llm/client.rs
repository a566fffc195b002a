use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::{ChatModel, ModelError};
use crate::config::ModelSettings;
use crate::models::Message;

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP client for an OpenAI-compatible chat completions API.
///
/// One request per call, bounded by the configured timeout, never retried.
#[derive(Debug, Clone)]
pub struct OpenAiCompatClient {
    settings: ModelSettings,
    client: Client,
}

impl OpenAiCompatClient {
    pub fn new(settings: ModelSettings) -> Result<Self, ModelError> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self { settings, client })
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.settings.base_url)
    }

    /// Build the request with auth and attribution headers.
    fn request(&self, api_key: &str, body: &ChatCompletionRequest<'_>) -> reqwest::RequestBuilder {
        let mut req = self.client.post(self.url()).bearer_auth(api_key).json(body);
        if let Some(ref url) = self.settings.app_url {
            req = req.header("HTTP-Referer", url);
        }
        if let Some(ref title) = self.settings.app_title {
            req = req.header("X-Title", title);
        }
        req
    }

    /// Map non-success statuses to typed errors.
    async fn handle_response(&self, response: reqwest::Response) -> Result<String, ModelError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS | StatusCode::PAYMENT_REQUIRED => {
                    ModelError::RateLimited(body)
                }
                StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ModelError::Timeout,
                _ => ModelError::Status {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        let payload: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Malformed(e.to_string()))?;
        extract_reply(payload)
    }
}

fn extract_reply(payload: ChatCompletionResponse) -> Result<String, ModelError> {
    let content = payload
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| ModelError::Malformed("no choices in response".to_string()))?;

    let content = content.trim();
    if content.is_empty() {
        return Err(ModelError::Malformed("empty completion".to_string()));
    }
    Ok(content.to_string())
}

fn transport_error(e: reqwest::Error) -> ModelError {
    if e.is_timeout() {
        ModelError::Timeout
    } else {
        ModelError::Transport(e)
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, ModelError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or(ModelError::NotConfigured)?;

        let body = ChatCompletionRequest {
            model: &self.settings.model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        tracing::debug!(
            model = %self.settings.model,
            messages = messages.len(),
            "Requesting completion"
        );

        let response = self
            .request(api_key, &body)
            .send()
            .await
            .map_err(transport_error)?;
        self.handle_response(response).await
    }
}
