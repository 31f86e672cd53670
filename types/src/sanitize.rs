//! Model output normalization.
//!
//! Raw completions arrive in whatever shape the model felt like producing: wrapped
//! in a code fence, quoted, padded with blank lines. Everything written back into a
//! composer goes through [`ResponseSanitizer`] first.
//!
//! The pipeline runs four steps in a fixed order. Each one is exposed on its own
//! so it can be tested in isolation:
//!
//! 1. [`strip_code_fences`] keeps only the inner content of fenced blocks
//! 2. [`strip_quotes`] removes quotation marks according to a [`QuotePolicy`]
//! 3. [`normalize_lines`] trims lines and collapses blank-line runs to one
//! 4. leading/trailing blank lines are trimmed from the whole result

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A fence with an optional info string (` ```text `) on its own line.
static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:[\w+.-]*[^\S\n]*\n)?(.*?)\n?```").expect("fence pattern is valid")
});

const FENCE: &str = "```";

/// How quotation marks in model output are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuotePolicy {
    /// Leave every quotation mark in place.
    Preserve,
    /// Remove double quotes everywhere and single quotes unless they sit
    /// between two alphanumerics (`don't`, `it’s`).
    #[default]
    KeepApostrophes,
    /// Remove every straight and curly quotation mark, apostrophes included.
    StripAll,
}

impl QuotePolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            QuotePolicy::Preserve => "preserve",
            QuotePolicy::KeepApostrophes => "keep-apostrophes",
            QuotePolicy::StripAll => "strip-all",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "preserve" | "none" => Some(QuotePolicy::Preserve),
            "keep-apostrophes" | "default" => Some(QuotePolicy::KeepApostrophes),
            "strip-all" | "all" => Some(QuotePolicy::StripAll),
            _ => None,
        }
    }
}

/// Deterministic cleaner for raw completion text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResponseSanitizer {
    quote_policy: QuotePolicy,
}

impl ResponseSanitizer {
    #[must_use]
    pub const fn new(quote_policy: QuotePolicy) -> Self {
        Self { quote_policy }
    }

    #[must_use]
    pub const fn quote_policy(&self) -> QuotePolicy {
        self.quote_policy
    }

    /// Run the full pipeline.
    ///
    /// ```
    /// use polish_types::{QuotePolicy, ResponseSanitizer};
    ///
    /// let sanitizer = ResponseSanitizer::new(QuotePolicy::KeepApostrophes);
    /// assert_eq!(sanitizer.sanitize("```\n\"Don't panic.\"\n```"), "Don't panic.");
    /// ```
    #[must_use]
    pub fn sanitize(&self, raw: &str) -> String {
        let unfenced = strip_code_fences(raw);
        let unquoted = strip_quotes(&unfenced, self.quote_policy);
        let normalized = normalize_lines(&unquoted);
        normalized.trim().to_string()
    }
}

/// Sanitize with the canonical quote policy.
#[must_use]
pub fn sanitize_response(raw: &str) -> String {
    ResponseSanitizer::default().sanitize(raw)
}

/// Replace every fenced block with its inner content.
///
/// An opening fence that never closes is dropped wherever it sits. When it
/// starts its line, the info string and line break go with it.
#[must_use]
pub fn strip_code_fences(input: &str) -> Cow<'_, str> {
    if !input.contains(FENCE) {
        return Cow::Borrowed(input);
    }

    let replaced = FENCED_BLOCK.replace_all(input, "$1");
    // Blocks pair up left to right, so at most the last fence is left over.
    let Some(open) = replaced.rfind(FENCE) else {
        return replaced;
    };
    let line_start = replaced[..open].rfind('\n').map_or(0, |i| i + 1);
    let (start, end) = if replaced[line_start..open].trim().is_empty() {
        let end = replaced[open..]
            .find('\n')
            .map_or(replaced.len(), |i| open + i + 1);
        (line_start, end)
    } else {
        (open, open + FENCE.len())
    };
    let mut out = replaced.into_owned();
    out.replace_range(start..end, "");
    Cow::Owned(out)
}

fn is_double_quote(c: char) -> bool {
    matches!(c, '"' | '\u{201C}' | '\u{201D}' | '\u{201E}')
}

fn is_single_quote(c: char) -> bool {
    matches!(c, '\'' | '\u{2018}' | '\u{2019}' | '\u{201A}')
}

/// Remove quotation marks according to `policy`.
///
/// Apostrophe detection looks at the neighbours in the original text, so the
/// result is stable when applied twice.
#[must_use]
pub fn strip_quotes(input: &str, policy: QuotePolicy) -> Cow<'_, str> {
    if policy == QuotePolicy::Preserve
        || !input.chars().any(|c| is_double_quote(c) || is_single_quote(c))
    {
        return Cow::Borrowed(input);
    }

    let chars: Vec<char> = input.chars().collect();
    let mut result = String::with_capacity(input.len());
    for (i, &c) in chars.iter().enumerate() {
        if is_double_quote(c) {
            continue;
        }
        if is_single_quote(c) {
            let keep = policy == QuotePolicy::KeepApostrophes
                && i.checked_sub(1)
                    .and_then(|prev| chars.get(prev))
                    .is_some_and(|prev| prev.is_alphanumeric())
                && chars.get(i + 1).is_some_and(|next| next.is_alphanumeric());
            if keep {
                result.push(c);
            }
            continue;
        }
        result.push(c);
    }
    Cow::Owned(result)
}

/// Trim every line, collapse interior runs of horizontal whitespace, and fold
/// consecutive blank lines into a single blank line.
#[must_use]
pub fn normalize_lines(input: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    for line in input.split('\n') {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() && lines.last().is_some_and(String::is_empty) {
            continue;
        }
        lines.push(line);
    }
    lines.join("\n")
}
