//! Chat request construction.
//!
//! Pure and deterministic: the same text, objective, and style always produce
//! the same payload. The user's text is embedded verbatim.

use polish_types::{EnglishVariant, Objective, StyleSettings, Tone};
use serde::Serialize;

/// Sampling temperature for rewrites. Fixed; not a user setting.
pub const TEMPERATURE: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Chat-completions request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    /// Number of candidates to sample.
    pub n: u8,
}

/// The objective-specific instruction.
#[must_use]
pub fn objective_guide(objective: Objective, variant: EnglishVariant, tone: Tone) -> String {
    let variant = variant.descriptor();
    let tone = tone.descriptor();
    match objective {
        Objective::Clarity => format!(
            "Enhance clarity while maintaining the main message, using {variant} spelling and a {tone} tone"
        ),
        Objective::Grammar => format!(
            "Fix grammatical errors using {variant} conventions while maintaining a {tone} tone"
        ),
        Objective::Concise => format!(
            "Make the message more concise while fixing grammatical errors, using {variant} spelling and a {tone} tone"
        ),
    }
}

#[must_use]
pub fn system_instruction(variant: EnglishVariant, tone: Tone) -> String {
    let variant = variant.descriptor();
    let tone = tone.descriptor();
    format!(
        "You are a professional writing assistant that writes in {variant} with a {tone} tone. \
         Always use {variant} spelling and grammar conventions while maintaining the specified tone."
    )
}

#[must_use]
pub fn user_instruction(
    text: &str,
    objective: Objective,
    variant: EnglishVariant,
    tone: Tone,
) -> String {
    let guide = objective_guide(objective, variant, tone);
    let variant = variant.descriptor();
    let tone = tone.descriptor();
    format!(
        "Please revise the following message:\n\
         \n\
         \"{text}\"\n\
         \n\
         Requirements:\n\
         - {guide}\n\
         - Maintain the original meaning\n\
         - Keep any technical terms intact\n\
         - Ensure all spelling and grammar follows {variant} conventions\n\
         - Maintain a {tone} tone throughout\n\
         - Return ONLY the revised text, with no commentary, quotation marks, or formatting."
    )
}

/// Build the request for one enhancement.
#[must_use]
pub fn build_request(text: &str, objective: Objective, style: &StyleSettings) -> ChatRequest {
    ChatRequest {
        model: style.model.as_str().to_string(),
        messages: vec![
            ChatMessage {
                role: Role::System,
                content: system_instruction(style.english_variant, style.tone),
            },
            ChatMessage {
                role: Role::User,
                content: user_instruction(text, objective, style.english_variant, style.tone),
            },
        ],
        temperature: TEMPERATURE,
        n: style.output_count.get(),
    }
}
