//! Raw file shape and its resolution into [`Settings`].
//!
//! Unrecognized or out-of-range values in the file fall back to their
//! defaults with a warning; a typo in one key never blocks the others.

use std::env;
use std::fmt;

use polish_types::{
    ApiKey, BlockTag, ContentModel, EnglishVariant, IconSize, ModelName, OutputCount,
    PlatformProfile, PlatformRegistry, QuotePolicy, Selector, Settings, Tone,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawConfig {
    pub credentials: Option<RawCredentials>,
    pub style: Option<RawStyle>,
    pub ui: Option<RawUi>,
    pub provider: Option<RawProvider>,
    pub platforms: Vec<RawPlatform>,
}

#[derive(Default, Deserialize)]
pub(crate) struct RawCredentials {
    pub api_key: Option<String>,
}

// Manual Debug impl to prevent leaking API keys in logs.
impl fmt::Debug for RawCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = if self.api_key.is_some() {
            "[REDACTED]"
        } else {
            "None"
        };
        f.debug_struct("RawCredentials")
            .field("api_key", &mask)
            .finish()
    }
}

/// Numbers written either bare or quoted (`output_count = "2"` or `= 2`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum NumberOrString {
    Number(i64),
    String(String),
}

impl NumberOrString {
    fn as_u32(&self) -> Option<u32> {
        match self {
            NumberOrString::Number(n) => u32::try_from(*n).ok(),
            NumberOrString::String(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawStyle {
    pub english_variant: Option<String>,
    pub tone: Option<String>,
    pub model: Option<String>,
    pub output_count: Option<NumberOrString>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawUi {
    pub icon_size: Option<NumberOrString>,
    pub show_tooltips: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawProvider {
    pub endpoint: Option<String>,
    pub quote_policy: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawPlatform {
    pub name: String,
    #[serde(default)]
    pub hosts: Vec<String>,
    pub selector: String,
    pub content_model: Option<String>,
    pub block_tag: Option<String>,
    pub observe_root: Option<String>,
}

/// Replace `${VAR}` references with environment values.
///
/// Missing variables expand to the empty string. An unclosed `${` and an
/// empty `${}` are kept literally.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(open) = rest.find("${") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        match after.find('}') {
            Some(close) if close > 0 => {
                out.push_str(&env::var(&after[..close]).unwrap_or_default());
                rest = &after[close + 1..];
            }
            _ => {
                out.push_str("${");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn warn_invalid(key: &str, value: &str) {
    tracing::warn!(key, value, "Ignoring invalid config value; using default");
}

fn resolve_platform(raw: RawPlatform) -> Option<PlatformProfile> {
    let surface = match Selector::parse(&raw.selector) {
        Ok(selector) => selector,
        Err(e) => {
            tracing::warn!(platform = %raw.name, %e, "Skipping platform with invalid selector");
            return None;
        }
    };
    let observe_root = match raw.observe_root.as_deref().map(Selector::parse) {
        None => None,
        Some(Ok(selector)) => Some(selector),
        Some(Err(e)) => {
            tracing::warn!(platform = %raw.name, %e, "Ignoring invalid observe_root");
            None
        }
    };
    let block_tag = raw.block_tag.as_deref().and_then(BlockTag::parse);
    let content_model = match raw.content_model.as_deref() {
        None => ContentModel::Plain,
        Some(value) => ContentModel::parse(value, block_tag).unwrap_or_else(|| {
            warn_invalid("platforms.content_model", value);
            ContentModel::Plain
        }),
    };
    if raw.hosts.is_empty() {
        tracing::warn!(platform = %raw.name, "Skipping platform with no hosts");
        return None;
    }
    Some(PlatformProfile::new(
        raw.name,
        raw.hosts,
        surface,
        content_model,
        observe_root,
    ))
}

impl RawConfig {
    /// Resolve into a validated snapshot.
    ///
    /// `key_override` (from the environment) wins over the file's key.
    pub(crate) fn resolve(self, key_override: Option<String>) -> Settings {
        let mut settings = Settings::default();

        let file_key = self
            .credentials
            .and_then(|c| c.api_key)
            .map(|key| expand_env_vars(&key));
        settings.credentials.api_key = key_override
            .into_iter()
            .chain(file_key)
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty())
            .map(ApiKey::new);

        if let Some(style) = self.style {
            if let Some(value) = style.english_variant {
                match EnglishVariant::parse(&value) {
                    Some(variant) => settings.style.english_variant = variant,
                    None => warn_invalid("style.english_variant", &value),
                }
            }
            if let Some(value) = style.tone {
                match Tone::parse(&value) {
                    Some(tone) => settings.style.tone = tone,
                    None => warn_invalid("style.tone", &value),
                }
            }
            if let Some(value) = style.model {
                match ModelName::new(value.as_str()) {
                    Ok(model) => settings.style.model = model,
                    Err(_) => warn_invalid("style.model", &value),
                }
            }
            if let Some(value) = style.output_count {
                match value.as_u32().map(OutputCount::new) {
                    Some(Ok(count)) => settings.style.output_count = count,
                    _ => warn_invalid("style.output_count", &format!("{value:?}")),
                }
            }
        }

        if let Some(ui) = self.ui {
            if let Some(value) = ui.icon_size {
                match value.as_u32().map(IconSize::new) {
                    Some(Ok(size)) => settings.ui.icon_size = size,
                    _ => warn_invalid("ui.icon_size", &format!("{value:?}")),
                }
            }
            if let Some(show) = ui.show_tooltips {
                settings.ui.show_tooltips = show;
            }
        }

        if let Some(provider) = self.provider {
            if let Some(endpoint) = provider.endpoint {
                let endpoint = expand_env_vars(&endpoint);
                if endpoint.trim().is_empty() {
                    warn_invalid("provider.endpoint", &endpoint);
                } else {
                    settings.provider.endpoint = endpoint.trim().to_string();
                }
            }
            if let Some(value) = provider.quote_policy {
                match QuotePolicy::parse(&value) {
                    Some(policy) => settings.provider.quote_policy = policy,
                    None => warn_invalid("provider.quote_policy", &value),
                }
            }
        }

        let custom: Vec<PlatformProfile> = self
            .platforms
            .into_iter()
            .filter_map(resolve_platform)
            .collect();
        if !custom.is_empty() {
            settings.platforms = PlatformRegistry::with_profiles(custom);
        }

        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_src: &str) -> RawConfig {
        toml::from_str(toml_src).unwrap()
    }

    #[test]
    fn expand_env_vars_no_vars() {
        assert_eq!(expand_env_vars("plain value"), "plain value");
    }

    #[test]
    fn expand_env_vars_present_var() {
        let expected = env::var("PATH").unwrap_or_default();
        assert_eq!(expand_env_vars("${PATH}"), expected);
        assert_eq!(expand_env_vars("a${PATH}b"), format!("a{expected}b"));
    }

    #[test]
    fn expand_env_vars_missing_var_becomes_empty() {
        assert_eq!(
            expand_env_vars("key=${POLISH_SURELY_UNSET_VARIABLE_42}!"),
            "key=!"
        );
    }

    #[test]
    fn expand_env_vars_unclosed_and_empty_preserved() {
        assert_eq!(expand_env_vars("${UNCLOSED"), "${UNCLOSED");
        assert_eq!(expand_env_vars("a${}b"), "a${}b");
    }

    #[test]
    fn expand_env_vars_unicode_content() {
        assert_eq!(expand_env_vars("héllo ${}wörld"), "héllo ${}wörld");
    }

    #[test]
    fn empty_config_resolves_to_defaults() {
        assert_eq!(parse("").resolve(None), Settings::default());
    }

    #[test]
    fn full_config_resolves() {
        let settings = parse(
            r#"
            [credentials]
            api_key = "sk-file"

            [style]
            english_variant = "british"
            tone = "casual"
            model = "gpt-4o-mini"
            output_count = "3"

            [ui]
            icon_size = 32
            show_tooltips = false

            [provider]
            endpoint = "https://llm.example.com/v1/chat/completions"
            quote_policy = "strip-all"
            "#,
        )
        .resolve(None);

        assert_eq!(
            settings.credentials.api_key.as_ref().map(ApiKey::expose_secret),
            Some("sk-file")
        );
        assert_eq!(settings.style.english_variant, EnglishVariant::British);
        assert_eq!(settings.style.tone, Tone::Casual);
        assert_eq!(settings.style.model.as_str(), "gpt-4o-mini");
        assert_eq!(settings.style.output_count.get(), 3);
        assert_eq!(settings.ui.icon_size.px(), 32);
        assert!(!settings.ui.show_tooltips);
        assert_eq!(
            settings.provider.endpoint,
            "https://llm.example.com/v1/chat/completions"
        );
        assert_eq!(settings.provider.quote_policy, QuotePolicy::StripAll);
    }

    #[test]
    fn output_count_accepts_bare_number() {
        let settings = parse("[style]\noutput_count = 2").resolve(None);
        assert_eq!(settings.style.output_count.get(), 2);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let settings = parse(
            r#"
            [style]
            tone = "sarcastic"
            output_count = "9"
            [ui]
            icon_size = 200
            "#,
        )
        .resolve(None);
        let defaults = Settings::default();
        assert_eq!(settings.style.tone, defaults.style.tone);
        assert_eq!(settings.style.output_count, defaults.style.output_count);
        assert_eq!(settings.ui.icon_size, defaults.ui.icon_size);
    }

    #[test]
    fn key_override_wins_and_blank_is_ignored() {
        let raw = "[credentials]\napi_key = \"sk-file\"";
        let settings = parse(raw).resolve(Some("sk-env".to_string()));
        assert_eq!(
            settings.credentials.api_key.as_ref().map(ApiKey::expose_secret),
            Some("sk-env")
        );
        let settings = parse(raw).resolve(Some("   ".to_string()));
        assert_eq!(
            settings.credentials.api_key.as_ref().map(ApiKey::expose_secret),
            Some("sk-file")
        );
        let settings = parse("[credentials]\napi_key = \"\"").resolve(None);
        assert!(settings.credentials.api_key.is_none());
    }

    #[test]
    fn custom_platforms_precede_builtins() {
        let settings = parse(
            r#"
            [[platforms]]
            name = "intranet"
            hosts = ["chat.example.com"]
            selector = "textarea.composer"

            [[platforms]]
            name = "broken"
            hosts = ["x.example.com"]
            selector = "div > p"
            "#,
        )
        .resolve(None);
        let registry = &settings.platforms;
        let profile = registry.for_host("chat.example.com").unwrap();
        assert_eq!(profile.name(), "intranet");
        assert_eq!(profile.content_model(), ContentModel::Plain);
        assert!(registry.by_name("broken").is_none());
        assert!(registry.for_host("app.slack.com").is_some());
    }

    #[test]
    fn raw_credentials_debug_is_redacted() {
        let raw = parse("[credentials]\napi_key = \"sk-secret\"");
        let debug = format!("{raw:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
