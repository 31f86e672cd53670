//! Resolved settings shared across crates.
//!
//! These types represent fully-validated state. Raw TOML structs with `Option`
//! fields stay private in `polish-config`; the loader resolves them into these
//! types at the parse boundary.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::PlatformRegistry;
use crate::sanitize::QuotePolicy;
use crate::{ApiKey, StyleSettings};

/// Chat-completion endpoint used when none is configured.
pub const DEFAULT_CHAT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("icon size must be between {min} and {max} pixels (got {got})")]
pub struct IconSizeError {
    pub got: u32,
    pub min: u8,
    pub max: u8,
}

/// Edge length of the affordance buttons in CSS pixels.
///
/// Invariant: `IconSize::MIN..=IconSize::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct IconSize(u8);

impl IconSize {
    pub const MIN: u8 = 16;
    pub const MAX: u8 = 48;
    pub const DEFAULT: IconSize = IconSize(28);

    pub fn new(px: u32) -> Result<Self, IconSizeError> {
        if px < u32::from(Self::MIN) || px > u32::from(Self::MAX) {
            return Err(IconSizeError {
                got: px,
                min: Self::MIN,
                max: Self::MAX,
            });
        }
        Ok(Self(px as u8))
    }

    #[must_use]
    pub const fn px(self) -> u8 {
        self.0
    }

    /// Inner padding that keeps the glyph proportional to the button.
    #[must_use]
    pub const fn padding(self) -> u8 {
        match self.0 {
            0..=26 => 5,
            30.. => 7,
            _ => 6,
        }
    }
}

impl Default for IconSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for IconSize {
    type Error = IconSizeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IconSize> for u32 {
    fn from(value: IconSize) -> Self {
        u32::from(value.0)
    }
}

/// Affordance presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiPreferences {
    pub icon_size: IconSize,
    pub show_tooltips: bool,
}

impl Default for UiPreferences {
    fn default() -> Self {
        Self {
            icon_size: IconSize::DEFAULT,
            show_tooltips: true,
        }
    }
}

/// Where requests go and how replies are cleaned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSettings {
    pub endpoint: String,
    pub quote_policy: QuotePolicy,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_CHAT_ENDPOINT.to_string(),
            quote_policy: QuotePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Credentials {
    pub api_key: Option<ApiKey>,
}

/// Immutable settings snapshot.
///
/// Serializes without credentials or platform profiles; the snapshot is what
/// gets broadcast to listeners.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(skip)]
    pub credentials: Credentials,
    #[serde(flatten)]
    pub style: StyleSettings,
    #[serde(flatten)]
    pub ui: UiPreferences,
    pub provider: ProviderSettings,
    #[serde(skip)]
    pub platforms: PlatformRegistry,
}

impl Settings {
    /// String-encoded value for `key`, as exposed by the store's `values` query.
    ///
    /// The API key is masked; an unset key yields `None`.
    #[must_use]
    pub fn value(&self, key: SettingKey) -> Option<String> {
        match key {
            SettingKey::ApiKey => self.credentials.api_key.as_ref().map(ApiKey::masked),
            SettingKey::EnglishVariant => Some(self.style.english_variant.as_str().to_string()),
            SettingKey::Tone => Some(self.style.tone.as_str().to_string()),
            SettingKey::Model => Some(self.style.model.to_string()),
            SettingKey::OutputCount => Some(self.style.output_count.to_string()),
            SettingKey::IconSize => Some(self.ui.icon_size.px().to_string()),
            SettingKey::ShowTooltips => Some(self.ui.show_tooltips.to_string()),
        }
    }
}

/// User-editable setting names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SettingKey {
    ApiKey,
    EnglishVariant,
    Tone,
    Model,
    OutputCount,
    IconSize,
    ShowTooltips,
}

impl SettingKey {
    pub const ALL: [SettingKey; 7] = [
        SettingKey::ApiKey,
        SettingKey::EnglishVariant,
        SettingKey::Tone,
        SettingKey::Model,
        SettingKey::OutputCount,
        SettingKey::IconSize,
        SettingKey::ShowTooltips,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SettingKey::ApiKey => "apiKey",
            SettingKey::EnglishVariant => "englishVariant",
            SettingKey::Tone => "tone",
            SettingKey::Model => "model",
            SettingKey::OutputCount => "outputCount",
            SettingKey::IconSize => "iconSize",
            SettingKey::ShowTooltips => "showTooltips",
        }
    }

    /// Accepts both the camelCase name and its snake_case spelling.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let normalized: String = value
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|key| key.as_str().to_ascii_lowercase() == normalized)
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
