//! Language-model access for Polish.
//!
//! # Architecture
//!
//! - [`prompt`] - pure request construction: objective guide table, style
//!   descriptors, the fixed sampling temperature
//! - [`ChatTransport`] - the seam between request and network
//! - [`OpenAiChatTransport`] - chat-completions over HTTPS
//! - [`EnhancementClient`] - credential checks, response validation, and
//!   sanitizing into a [`polish_types::CandidateSet`]
//!
//! # Error Handling
//!
//! Every failure is an [`EnhanceError`]: either an [`AuthError`] the user can
//! fix by configuring a key, or a [`ProviderError`] carrying the provider's own
//! message. Requests are single-attempt; nothing here retries.

mod client;
mod openai;
pub mod prompt;

pub use client::{
    ChatChoice, ChatCompletion, ChatTransport, ChoiceMessage, EnhanceError, EnhancementClient,
};
pub use openai::OpenAiChatTransport;
pub use polish_types;

use polish_types::{AuthError, ProviderError};
use std::sync::OnceLock;
use std::time::Duration;

const CONNECT_TIMEOUT_SECS: u64 = 30;
const TCP_KEEPALIVE_SECS: u64 = 60;
const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

/// Process-wide HTTP client: HTTPS only, no redirects, bounded connect time.
///
/// No total request deadline is set; a hung provider holds the cycle until the
/// transport gives up.
pub fn http_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        base_client_builder().build().unwrap_or_else(|e| {
            tracing::error!(
                "Failed to build hardened HTTP client: {e}. Attempting minimal hardened fallback."
            );
            reqwest::Client::builder()
                .https_only(true)
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .expect("Minimal hardened HTTP client must build; cannot proceed without TLS")
        })
    })
}

fn base_client_builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .user_agent(concat!("polish/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .redirect(reqwest::redirect::Policy::none())
        .https_only(true)
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
}

/// Read at most 32 KiB of an error response body.
pub async fn read_capped_error_body(response: reqwest::Response) -> String {
    use futures_util::StreamExt;
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}

/// Pull the human-readable message out of an error body.
///
/// Prefers `error.message` from a JSON body, then the raw body, then the
/// status reason.
pub(crate) fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            json.pointer("/error/message")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        })
        .filter(|message| !message.trim().is_empty());
    if let Some(message) = from_json {
        return message;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        trimmed.to_string()
    }
}

/// Map a non-success status to the shared error taxonomy.
pub(crate) fn status_error(status: reqwest::StatusCode, body: &str) -> EnhanceError {
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return AuthError::Rejected {
            status: status.as_u16(),
        }
        .into();
    }
    ProviderError::Status {
        status: status.as_u16(),
        message: error_message(status, body),
    }
    .into()
}
