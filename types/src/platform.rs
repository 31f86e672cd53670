//! Per-site knowledge: which elements are composers and how they lay out lines.
//!
//! Supporting another chat site means adding one [`PlatformProfile`]; the
//! selection and mutation code never branches on the site itself.

use crate::selector::Selector;

/// Block element used by block-structured rich editors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockTag {
    Paragraph,
    Div,
}

impl BlockTag {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            BlockTag::Paragraph => "p",
            BlockTag::Div => "div",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "p" => Some(BlockTag::Paragraph),
            "div" => Some(BlockTag::Div),
            _ => None,
        }
    }
}

/// How an editable surface stores its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentModel {
    /// Value-based `<input>` / `<textarea>`.
    Plain,
    /// Content-editable region with one block element per line.
    RichBlocks { tag: BlockTag },
    /// Content-editable region with lines separated by `<br>`.
    RichBreaks,
}

impl ContentModel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ContentModel::Plain => "plain",
            ContentModel::RichBlocks { .. } => "rich-blocks",
            ContentModel::RichBreaks => "rich-breaks",
        }
    }

    /// Parse a config value; `block_tag` only applies to `rich-blocks`.
    #[must_use]
    pub fn parse(value: &str, block_tag: Option<BlockTag>) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "plain" => Some(ContentModel::Plain),
            "rich-blocks" | "blocks" => Some(ContentModel::RichBlocks {
                tag: block_tag.unwrap_or(BlockTag::Div),
            }),
            "rich-breaks" | "breaks" => Some(ContentModel::RichBreaks),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_rich(self) -> bool {
        !matches!(self, ContentModel::Plain)
    }
}

/// Static description of one supported site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformProfile {
    name: String,
    hosts: Vec<String>,
    surface: Selector,
    content_model: ContentModel,
    observe_root: Option<Selector>,
}

impl PlatformProfile {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        hosts: Vec<String>,
        surface: Selector,
        content_model: ContentModel,
        observe_root: Option<Selector>,
    ) -> Self {
        Self {
            name: name.into(),
            hosts: hosts
                .into_iter()
                .map(|h| h.trim().to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
            surface,
            content_model,
            observe_root,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    #[must_use]
    pub fn surface(&self) -> &Selector {
        &self.surface
    }

    #[must_use]
    pub fn content_model(&self) -> ContentModel {
        self.content_model
    }

    #[must_use]
    pub fn observe_root(&self) -> Option<&Selector> {
        self.observe_root.as_ref()
    }

    /// True when `hostname` is one of the profile's hosts or a subdomain of one.
    #[must_use]
    pub fn matches_host(&self, hostname: &str) -> bool {
        let hostname = hostname.trim().trim_end_matches('.').to_ascii_lowercase();
        self.hosts.iter().any(|host| {
            hostname == *host
                || hostname
                    .strip_suffix(host.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}

fn builtin(
    name: &str,
    host: &str,
    surface: &str,
    content_model: ContentModel,
    observe_root: &str,
) -> PlatformProfile {
    PlatformProfile::new(
        name,
        vec![host.to_string()],
        Selector::parse(surface).expect("built-in surface selector is valid"),
        content_model,
        Some(Selector::parse(observe_root).expect("built-in observe root is valid")),
    )
}

/// Ordered profile lookup. Configured profiles shadow built-ins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformRegistry {
    profiles: Vec<PlatformProfile>,
}

impl PlatformRegistry {
    /// Slack, Teams, and Gmail.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            profiles: vec![
                builtin(
                    "slack",
                    "app.slack.com",
                    concat!(
                        r#".ql-editor[contenteditable="true"], "#,
                        r#"[data-qa="message_input"], [data-qa="texty_message_input"]"#,
                    ),
                    ContentModel::RichBlocks {
                        tag: BlockTag::Paragraph,
                    },
                    ".p-workspace__primary_view_contents",
                ),
                builtin(
                    "teams",
                    "teams.microsoft.com",
                    r#"[role="textbox"][contenteditable="true"], .cke_editable"#,
                    ContentModel::RichBlocks { tag: BlockTag::Div },
                    r#"[data-tid="message-pane"]"#,
                ),
                builtin(
                    "gmail",
                    "mail.google.com",
                    r#"div[role="textbox"][contenteditable="true"], .Am.Al.editable"#,
                    ContentModel::RichBreaks,
                    ".AO",
                ),
            ],
        }
    }

    /// Built-ins preceded by `extra`, which win on host collisions.
    #[must_use]
    pub fn with_profiles(extra: Vec<PlatformProfile>) -> Self {
        let mut profiles = extra;
        profiles.extend(Self::builtin().profiles);
        Self { profiles }
    }

    #[must_use]
    pub fn for_host(&self, hostname: &str) -> Option<&PlatformProfile> {
        self.profiles.iter().find(|p| p.matches_host(hostname))
    }

    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&PlatformProfile> {
        self.profiles
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlatformProfile> {
        self.profiles.iter()
    }
}

impl Default for PlatformRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
