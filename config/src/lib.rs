//! Settings for Polish: one TOML file, one store, one change stream.
//!
//! ```toml
//! [credentials]
//! api_key = "${OPENAI_API_KEY}"
//!
//! [style]
//! english_variant = "british"
//! tone = "casual"
//! model = "gpt-4o-mini"
//! output_count = "3"
//!
//! [ui]
//! icon_size = 32
//! show_tooltips = false
//!
//! [provider]
//! endpoint = "https://api.openai.com/v1/chat/completions"
//! quote_policy = "keep-apostrophes"
//!
//! [[platforms]]
//! name = "intranet"
//! hosts = ["chat.example.com"]
//! selector = "textarea.composer"
//! content_model = "plain"
//! ```
//!
//! The raw file is parsed into `Option`-heavy structs and resolved into a
//! validated [`Settings`] snapshot at the parse boundary. Writes go through
//! `toml_edit` so user comments and layout survive.

mod persist;
mod raw;
mod store;

pub use raw::expand_env_vars;
pub use store::{SettingsMessage, SettingsPatch, SettingsStore};

pub use polish_types::{SettingKey, Settings};

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Environment variable that overrides the configured API key.
pub const API_KEY_ENV: &str = "POLISH_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine the config path (no home directory)")]
    NoPath,
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unknown setting {0:?}")]
    UnknownKey(String),
    #[error("expected key=value, got {0:?}")]
    Assignment(String),
    #[error("invalid value for {key}: {message}")]
    Invalid { key: SettingKey, message: String },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Write { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// `~/.polish/config.toml`
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".polish").join("config.toml"))
}
