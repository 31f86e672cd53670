//! Comment-preserving writes of individual settings.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use polish_types::{SettingKey, Settings};
use tempfile::NamedTempFile;
use toml_edit::{DocumentMut, Item, Table, value};

use crate::ConfigError;

/// Table and key a setting lives under in the file.
fn location(key: SettingKey) -> (&'static str, &'static str) {
    match key {
        SettingKey::ApiKey => ("credentials", "api_key"),
        SettingKey::EnglishVariant => ("style", "english_variant"),
        SettingKey::Tone => ("style", "tone"),
        SettingKey::Model => ("style", "model"),
        SettingKey::OutputCount => ("style", "output_count"),
        SettingKey::IconSize => ("ui", "icon_size"),
        SettingKey::ShowTooltips => ("ui", "show_tooltips"),
    }
}

fn encode(settings: &Settings, key: SettingKey) -> Option<Item> {
    let item = match key {
        SettingKey::ApiKey => value(settings.credentials.api_key.as_ref()?.expose_secret()),
        SettingKey::EnglishVariant => value(settings.style.english_variant.as_str()),
        SettingKey::Tone => value(settings.style.tone.as_str()),
        SettingKey::Model => value(settings.style.model.as_str()),
        // Stored as a string so the file matches the dropdown's encoding.
        SettingKey::OutputCount => value(settings.style.output_count.to_string()),
        SettingKey::IconSize => value(i64::from(settings.ui.icon_size.px())),
        SettingKey::ShowTooltips => value(settings.ui.show_tooltips),
    };
    Some(item)
}

/// Apply `changed` keys from `settings` onto `content`, keeping everything else.
pub(crate) fn render(
    content: &str,
    settings: &Settings,
    changed: &[SettingKey],
) -> io::Result<String> {
    let mut doc = content
        .parse::<DocumentMut>()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    for &key in changed {
        let (table, field) = location(key);
        match encode(settings, key) {
            Some(item) => {
                if !doc.contains_table(table) {
                    doc[table] = Item::Table(Table::new());
                }
                doc[table][field] = item;
            }
            None => {
                if let Some(existing) = doc.get_mut(table).and_then(Item::as_table_like_mut) {
                    existing.remove(field);
                }
            }
        }
    }

    Ok(doc.to_string())
}

/// Write `changed` keys to the file at `path`, creating it if needed.
pub(crate) fn persist(
    path: &Path,
    settings: &Settings,
    changed: &[SettingKey],
) -> Result<(), ConfigError> {
    write_settings(path, settings, changed).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn write_settings(path: &Path, settings: &Settings, changed: &[SettingKey]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_private_dir(parent)?;

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e),
    };
    let serialized = render(&content, settings, changed)?;

    // NamedTempFile is created 0600 on Unix; persist() renames over the target.
    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(serialized.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    tracing::debug!(path = %path.display(), ?changed, "Persisted settings");
    Ok(())
}

fn ensure_private_dir(dir: &Path) -> io::Result<()> {
    if dir.exists() {
        return Ok(());
    }
    fs::create_dir_all(dir)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
    }
    Ok(())
}
