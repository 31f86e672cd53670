//! Failure taxonomy shared by the provider client and the enhancement cycle.

use thiserror::Error;

/// Missing, malformed, or rejected credential. Always user-actionable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("no API key is configured")]
    Missing,
    #[error("the API key is not in the expected format")]
    Malformed,
    #[error("the provider rejected the API key (HTTP {status})")]
    Rejected { status: u16 },
}

/// The remote call failed or returned something other than a well-formed set of choices.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("provider returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("could not decode provider response: {0}")]
    Decode(String),
    #[error("provider response contained no choices")]
    NoChoices,
    #[error("provider choice {index} has no message content")]
    MissingContent { index: usize },
    #[error("provider returned no usable candidates")]
    NoUsableCandidates,
}
