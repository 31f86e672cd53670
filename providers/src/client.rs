//! The enhancement client: credential check, one request, validated candidates.

use std::future::Future;

use polish_types::{
    ApiKey, AuthError, CandidateSet, Objective, ProviderError, ResponseSanitizer, StyleSettings,
};
use serde::Deserialize;
use thiserror::Error;

use crate::prompt::{self, ChatRequest};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnhanceError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Decoded chat-completions response. Every level is optional so shape
/// problems surface as [`ProviderError`]s rather than decode failures.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ChatCompletion {
    pub choices: Option<Vec<ChatChoice>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ChatChoice {
    pub message: Option<ChoiceMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

impl ChatCompletion {
    /// Completion with one choice per entry of `contents`.
    #[must_use]
    pub fn from_contents<I, S>(contents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            choices: Some(
                contents
                    .into_iter()
                    .map(|content| ChatChoice {
                        message: Some(ChoiceMessage {
                            content: Some(content.into()),
                        }),
                    })
                    .collect(),
            ),
        }
    }
}

/// Sends a chat request and returns the decoded body.
///
/// Implementations map HTTP-level failures; shape validation happens in
/// [`EnhancementClient`].
pub trait ChatTransport {
    fn complete(
        &self,
        request: &ChatRequest,
        api_key: &str,
    ) -> impl Future<Output = Result<ChatCompletion, EnhanceError>>;
}

/// Turns selected text into sanitized candidates.
#[derive(Debug, Clone)]
pub struct EnhancementClient<T> {
    transport: T,
    sanitizer: ResponseSanitizer,
}

impl<T: ChatTransport> EnhancementClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            sanitizer: ResponseSanitizer::default(),
        }
    }

    pub fn with_sanitizer(mut self, sanitizer: ResponseSanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Request `style.output_count` rewrites of `text`.
    ///
    /// Fewer candidates than requested are returned as-is. Choices that are empty
    /// after sanitizing are dropped; if none survive the call fails.
    pub async fn enhance(
        &self,
        text: &str,
        objective: Objective,
        style: &StyleSettings,
        credential: Option<&ApiKey>,
    ) -> Result<CandidateSet, EnhanceError> {
        let api_key = credential.ok_or(AuthError::Missing)?.validate()?;
        let request = prompt::build_request(text, objective, style);
        let requested = usize::from(request.n);
        tracing::debug!(
            %objective,
            model = %request.model,
            n = request.n,
            chars = text.chars().count(),
            "Requesting enhancement"
        );

        let completion = self.transport.complete(&request, api_key).await?;
        let choices = completion
            .choices
            .filter(|choices| !choices.is_empty())
            .ok_or(ProviderError::NoChoices)?;
        if choices.len() < requested {
            tracing::debug!(
                requested,
                returned = choices.len(),
                "Provider returned fewer candidates than requested"
            );
        }

        let mut candidates = Vec::with_capacity(choices.len());
        for (index, choice) in choices.into_iter().take(requested).enumerate() {
            let content = choice
                .message
                .and_then(|message| message.content)
                .ok_or(ProviderError::MissingContent { index })?;
            let cleaned = self.sanitizer.sanitize(&content);
            if cleaned.is_empty() {
                tracing::debug!(index, "Dropping empty candidate");
                continue;
            }
            candidates.push(cleaned);
        }

        CandidateSet::new(candidates).ok_or_else(|| ProviderError::NoUsableCandidates.into())
    }
}
