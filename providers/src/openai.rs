//! Chat-completions transport.

use polish_types::{DEFAULT_CHAT_ENDPOINT, ProviderError};

use crate::client::{ChatCompletion, ChatTransport, EnhanceError};
use crate::prompt::ChatRequest;
use crate::{http_client, read_capped_error_body, status_error};

/// POSTs [`ChatRequest`]s to an OpenAI-compatible endpoint with bearer auth.
#[derive(Debug, Clone)]
pub struct OpenAiChatTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl Default for OpenAiChatTransport {
    fn default() -> Self {
        Self::new(DEFAULT_CHAT_ENDPOINT)
    }
}

impl OpenAiChatTransport {
    /// Transport over the shared hardened client.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(http_client().clone(), endpoint)
    }

    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ChatTransport for OpenAiChatTransport {
    async fn complete(
        &self,
        request: &ChatRequest,
        api_key: &str,
    ) -> Result<ChatCompletion, EnhanceError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = read_capped_error_body(response).await;
            tracing::warn!(status = status.as_u16(), "Chat completion request failed");
            return Err(status_error(status, &body));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        serde_json::from_slice::<ChatCompletion>(&body).map_err(|e| {
            tracing::warn!(%e, bytes = body.len(), "Undecodable chat completion body");
            ProviderError::Decode(e.to_string()).into()
        })
    }
}
