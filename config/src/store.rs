//! The settings store: current snapshot, validated updates, change fan-out.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use polish_types::{
    ApiKey, EnglishVariant, IconSize, ModelName, OutputCount, SettingKey, Settings, Tone,
};
use serde::{Serialize, Serializer};
use tokio::sync::{broadcast, watch};

use crate::persist::persist;
use crate::raw::RawConfig;
use crate::{API_KEY_ENV, ConfigError, config_path};

const UPDATE_CHANNEL_CAPACITY: usize = 16;

/// Announcement sent to every subscriber after a successful update.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SettingsMessage {
    #[serde(rename_all = "camelCase")]
    SettingsUpdated {
        #[serde(serialize_with = "serialize_snapshot")]
        settings: Arc<Settings>,
        changed: Vec<SettingKey>,
    },
}

fn serialize_snapshot<S: Serializer>(
    settings: &Arc<Settings>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    settings.as_ref().serialize(serializer)
}

/// Ordered list of `key = value` assignments to apply in one update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    entries: Vec<(SettingKey, String)>,
}

impl SettingsPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: SettingKey, value: impl Into<String>) -> Self {
        self.entries.push((key, value.into()));
        self
    }

    /// Parse one `key=value` assignment (`output_count=3`, `tone = casual`).
    pub fn parse_assignment(assignment: &str) -> Result<(SettingKey, String), ConfigError> {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| ConfigError::Assignment(assignment.to_string()))?;
        let key = SettingKey::parse(key)
            .ok_or_else(|| ConfigError::UnknownKey(key.trim().to_string()))?;
        Ok((key, value.trim().to_string()))
    }

    pub fn from_assignments<'a>(
        assignments: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, ConfigError> {
        let entries = assignments
            .into_iter()
            .map(Self::parse_assignment)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SettingKey, &str)> {
        self.entries.iter().map(|(key, value)| (*key, value.as_str()))
    }
}

fn invalid(key: SettingKey, message: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        key,
        message: message.to_string(),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Some(true),
        "false" | "0" | "off" | "no" => Some(false),
        _ => None,
    }
}

/// Validate `value` for `key` and write it into `settings`.
fn apply(settings: &mut Settings, key: SettingKey, value: &str) -> Result<(), ConfigError> {
    match key {
        SettingKey::ApiKey => {
            let trimmed = value.trim();
            settings.credentials.api_key = (!trimmed.is_empty()).then(|| ApiKey::new(trimmed));
        }
        SettingKey::EnglishVariant => {
            settings.style.english_variant = EnglishVariant::parse(value).ok_or_else(|| {
                invalid(key, format!("expected american or british, got {value:?}"))
            })?;
        }
        SettingKey::Tone => {
            settings.style.tone = Tone::parse(value).ok_or_else(|| {
                invalid(key, format!("expected professional or casual, got {value:?}"))
            })?;
        }
        SettingKey::Model => {
            settings.style.model = ModelName::new(value.trim()).map_err(|e| invalid(key, e))?;
        }
        SettingKey::OutputCount => {
            settings.style.output_count = OutputCount::parse(value).map_err(|e| invalid(key, e))?;
        }
        SettingKey::IconSize => {
            let px: u32 = value.trim().parse().map_err(|_| {
                invalid(key, format!("expected a whole number of pixels, got {value:?}"))
            })?;
            settings.ui.icon_size = IconSize::new(px).map_err(|e| invalid(key, e))?;
        }
        SettingKey::ShowTooltips => {
            settings.ui.show_tooltips = parse_bool(value)
                .ok_or_else(|| invalid(key, format!("expected true or false, got {value:?}")))?;
        }
    }
    Ok(())
}

/// Owns the current [`Settings`] snapshot.
///
/// Readers take cheap `Arc` snapshots or follow the `watch` channel; every
/// successful [`SettingsStore::set`] is persisted first and then announced on
/// the broadcast channel.
#[derive(Debug)]
pub struct SettingsStore {
    path: Option<PathBuf>,
    snapshot: watch::Sender<Arc<Settings>>,
    updates: broadcast::Sender<SettingsMessage>,
}

impl SettingsStore {
    /// Load from `~/.polish/config.toml`, honoring `POLISH_API_KEY`.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path().ok_or(ConfigError::NoPath)?;
        Self::open(path)
    }

    /// Load from `path`, honoring `POLISH_API_KEY`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Self::open_with_key_override(path, env::var(API_KEY_ENV).ok())
    }

    /// Load from `path`; a missing file yields defaults.
    pub fn open_with_key_override(
        path: impl Into<PathBuf>,
        key_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        let path = path.into();
        let raw = read_raw(&path)?;
        let settings = raw.resolve(key_override);
        tracing::debug!(path = %path.display(), "Loaded settings");
        Ok(Self::build(Some(path), settings))
    }

    /// Store with no backing file; updates stay in memory.
    #[must_use]
    pub fn in_memory(settings: Settings) -> Self {
        Self::build(None, settings)
    }

    fn build(path: Option<PathBuf>, settings: Settings) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(settings));
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            path,
            snapshot,
            updates,
        }
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Current snapshot.
    #[must_use]
    pub fn get(&self) -> Arc<Settings> {
        self.snapshot.borrow().clone()
    }

    /// String-encoded values for `keys`; unset keys are omitted.
    #[must_use]
    pub fn values(&self, keys: &[SettingKey]) -> BTreeMap<SettingKey, String> {
        let settings = self.get();
        keys.iter()
            .filter_map(|&key| settings.value(key).map(|value| (key, value)))
            .collect()
    }

    /// Change announcements from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SettingsMessage> {
        self.updates.subscribe()
    }

    /// Follow the latest snapshot.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Arc<Settings>> {
        self.snapshot.subscribe()
    }

    /// Validate and apply `patch` atomically.
    ///
    /// Returns the keys whose value actually changed. Any invalid entry
    /// rejects the whole patch and leaves the stored settings untouched.
    pub fn set(&self, patch: &SettingsPatch) -> Result<Vec<SettingKey>, ConfigError> {
        let current = self.get();
        let mut next = Settings::clone(&current);
        for (key, value) in patch.iter() {
            apply(&mut next, key, value)?;
        }

        let mut changed: Vec<SettingKey> = SettingKey::ALL
            .into_iter()
            .filter(|&key| key_changed(&current, &next, key))
            .collect();
        changed.sort();
        if changed.is_empty() {
            return Ok(changed);
        }

        if let Some(path) = &self.path {
            persist(path, &next, &changed)?;
        }

        let next = Arc::new(next);
        self.snapshot.send_replace(Arc::clone(&next));
        tracing::info!(?changed, "Settings updated");
        // No subscribers is fine.
        let _ = self.updates.send(SettingsMessage::SettingsUpdated {
            settings: next,
            changed: changed.clone(),
        });
        Ok(changed)
    }
}

fn key_changed(before: &Settings, after: &Settings, key: SettingKey) -> bool {
    match key {
        SettingKey::ApiKey => before.credentials.api_key != after.credentials.api_key,
        _ => before.value(key) != after.value(key),
    }
}

fn read_raw(path: &Path) -> Result<RawConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(RawConfig::default()),
        Err(source) => {
            tracing::warn!("Failed to read config at {:?}: {}", path, source);
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    toml::from_str(&content).map_err(|source| {
        tracing::warn!("Failed to parse config at {:?}: {}", path, source);
        ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        }
    })
}
