//! Cycle failures and the notices they produce.

use polish_providers::EnhanceError;
use polish_types::{AuthError, ProviderError};
use thiserror::Error;

/// The captured target can no longer be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DomUnavailableError {
    #[error("the text field is no longer on the page")]
    Detached,
    #[error("could not find the editable region for the selection")]
    EditableRootMissing,
    #[error("the text changed before the edit could be applied")]
    Changed,
}

/// Rejected before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no text is selected")]
    NothingSelected,
    #[error("the selection contains only whitespace")]
    EmptySelection,
    #[error("unknown objective {0:?}")]
    UnknownObjective(String),
}

/// Everything that can end a cycle early.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CycleError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Dom(#[from] DomUnavailableError),
}

impl From<EnhanceError> for CycleError {
    fn from(err: EnhanceError) -> Self {
        match err {
            EnhanceError::Auth(e) => CycleError::Auth(e),
            EnhanceError::Provider(e) => CycleError::Provider(e),
        }
    }
}

impl CycleError {
    /// Text for the transient notice, or `None` when the failure is silent.
    #[must_use]
    pub fn notice(&self) -> Option<String> {
        match self {
            CycleError::Validation(
                ValidationError::NothingSelected | ValidationError::EmptySelection,
            )
            | CycleError::Dom(DomUnavailableError::Detached) => None,
            CycleError::Validation(e @ ValidationError::UnknownObjective(_)) => Some(e.to_string()),
            CycleError::Auth(AuthError::Missing) => {
                Some("Please set your OpenAI API key in the Polish settings".to_string())
            }
            CycleError::Auth(AuthError::Malformed) => Some(
                "Your OpenAI API key looks malformed; check the Polish settings".to_string(),
            ),
            CycleError::Auth(e @ AuthError::Rejected { .. }) => {
                Some(format!("Failed to enhance text: {e}; check the Polish settings"))
            }
            CycleError::Provider(e) => Some(format!("Failed to enhance text: {e}")),
            CycleError::Dom(e) => Some(format!("Could not update the message: {e}")),
        }
    }
}
