//! Core domain types for Polish.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod error;
mod platform;
mod sanitize;
mod selector;
mod settings;
mod text;

pub use error::{AuthError, ProviderError};
pub use platform::{BlockTag, ContentModel, PlatformProfile, PlatformRegistry};
pub use sanitize::{
    QuotePolicy, ResponseSanitizer, normalize_lines, sanitize_response, strip_code_fences,
    strip_quotes,
};
pub use selector::{Selector, SelectorError, SelectorSubject};
pub use settings::{
    Credentials, DEFAULT_CHAT_ENDPOINT, IconSize, IconSizeError, ProviderSettings, SettingKey,
    Settings, UiPreferences,
};
pub use text::{split_edge_whitespace, truncate_with_ellipsis};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Objective
// ============================================================================

/// The rewriting goal picked from the affordance.
///
/// The set is closed; adding a goal means adding a variant here and a guide
/// entry in the prompt table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Objective {
    Clarity,
    Grammar,
    Concise,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown objective: {0:?}")]
pub struct UnknownObjective(pub String);

impl Objective {
    pub const ALL: [Objective; 3] = [Objective::Clarity, Objective::Grammar, Objective::Concise];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Objective::Clarity => "clarity",
            Objective::Grammar => "grammar",
            Objective::Concise => "concise",
        }
    }

    /// Tooltip text shown on the affordance button.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Objective::Clarity => "Enhance Clarity",
            Objective::Grammar => "Fix Grammar",
            Objective::Concise => "Make Concise",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "clarity" | "clear" => Some(Objective::Clarity),
            "grammar" => Some(Objective::Grammar),
            "concise" | "concision" => Some(Objective::Concise),
            _ => None,
        }
    }
}

impl FromStr for Objective {
    type Err = UnknownObjective;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownObjective(s.to_string()))
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Style
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnglishVariant {
    #[default]
    American,
    British,
}

impl EnglishVariant {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EnglishVariant::American => "american",
            EnglishVariant::British => "british",
        }
    }

    /// Phrase embedded in prompts.
    #[must_use]
    pub const fn descriptor(self) -> &'static str {
        match self {
            EnglishVariant::American => "American English",
            EnglishVariant::British => "British English",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "american" | "us" | "en-us" => Some(EnglishVariant::American),
            "british" | "uk" | "gb" | "en-gb" => Some(EnglishVariant::British),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Professional,
    Casual,
}

impl Tone {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Tone::Professional => "professional",
            Tone::Casual => "casual",
        }
    }

    /// Phrase embedded in prompts.
    #[must_use]
    pub const fn descriptor(self) -> &'static str {
        match self {
            Tone::Professional => "professional and formal",
            Tone::Casual => "casual and friendly",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "professional" | "formal" => Some(Tone::Professional),
            "casual" | "friendly" => Some(Tone::Casual),
            _ => None,
        }
    }
}

/// Model identifier sent verbatim to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModelName(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("model name cannot be empty")]
pub struct EmptyModelName;

impl ModelName {
    pub const DEFAULT: &'static str = "gpt-3.5-turbo";

    pub fn new(value: impl Into<String>) -> Result<Self, EmptyModelName> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(EmptyModelName);
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ModelName {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl TryFrom<String> for ModelName {
    type Error = EmptyModelName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ModelName> for String {
    fn from(value: ModelName) -> Self {
        value.0
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Number of candidates requested per enhancement.
///
/// Invariant: `1..=OutputCount::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct OutputCount(u8);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutputCountError {
    #[error("output count must be a whole number (got {0:?})")]
    NotANumber(String),
    #[error("output count must be between 1 and {max} (got {got})")]
    OutOfRange { got: u32, max: u8 },
}

impl OutputCount {
    pub const MAX: u8 = 5;
    pub const ONE: OutputCount = OutputCount(1);

    pub fn new(count: u32) -> Result<Self, OutputCountError> {
        if count == 0 || count > u32::from(Self::MAX) {
            return Err(OutputCountError::OutOfRange {
                got: count,
                max: Self::MAX,
            });
        }
        Ok(Self(count as u8))
    }

    /// Parse the string-encoded form kept in the settings store.
    pub fn parse(value: &str) -> Result<Self, OutputCountError> {
        let trimmed = value.trim();
        let count = trimmed
            .parse::<u32>()
            .map_err(|_| OutputCountError::NotANumber(trimmed.to_string()))?;
        Self::new(count)
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl Default for OutputCount {
    fn default() -> Self {
        Self::ONE
    }
}

impl TryFrom<u32> for OutputCount {
    type Error = OutputCountError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OutputCount> for u32 {
    fn from(value: OutputCount) -> Self {
        u32::from(value.0)
    }
}

impl fmt::Display for OutputCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Stylistic settings captured once per enhancement request.
///
/// Cycles clone this out of the current settings snapshot, so later edits never
/// reach a request that is already in flight.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleSettings {
    pub english_variant: EnglishVariant,
    pub tone: Tone,
    pub model: ModelName,
    pub output_count: OutputCount,
}

// ============================================================================
// API Key
// ============================================================================

/// Provider credential as stored by the user.
///
/// The value is kept as entered; [`ApiKey::validate`] applies the format check at
/// request time so a malformed key surfaces as [`AuthError::Malformed`] rather than
/// silently disappearing from the settings.
///
/// Note: `Debug` is manually implemented to redact the key value, preventing accidental
/// credential disclosure in logs or error messages.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey(<redacted>)")
    }
}

impl ApiKey {
    /// Secret-prefix convention of the provider's keys.
    pub const PREFIX: &'static str = "sk-";

    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Check the key against the provider's format and return the usable secret.
    pub fn validate(&self) -> Result<&str, AuthError> {
        let key = self.0.trim();
        if key.is_empty() {
            return Err(AuthError::Missing);
        }
        if key.len() <= Self::PREFIX.len()
            || !key.starts_with(Self::PREFIX)
            || key.chars().any(char::is_whitespace)
        {
            return Err(AuthError::Malformed);
        }
        Ok(key)
    }

    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// Masked form for display: prefix plus the last four characters.
    #[must_use]
    pub fn masked(&self) -> String {
        let key = self.0.trim();
        let count = key.chars().count();
        if count <= 8 {
            return "*".repeat(count);
        }
        let tail: String = key.chars().skip(count - 4).collect();
        let head: String = key.chars().take(3).collect();
        format!("{head}...{tail}")
    }
}

// ============================================================================
// Candidates
// ============================================================================

/// Ordered, cleaned model outputs for one enhancement.
///
/// Invariant: never empty. A response without usable candidates is an error upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSet(Vec<String>);

impl CandidateSet {
    /// Returns `None` when `candidates` is empty.
    #[must_use]
    pub fn new(candidates: Vec<String>) -> Option<Self> {
        if candidates.is_empty() {
            None
        } else {
            Some(Self(candidates))
        }
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn first(&self) -> &str {
        &self.0[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}
