//! Minimal CSS selector support for locating editable surfaces.
//!
//! Platform profiles identify composers with comma-separated lists of compound
//! selectors: a tag, classes, an id, and attribute tests. Combinators are not
//! supported; profiles never need them, and rejecting them keeps matching a
//! single-element check.

use std::fmt;

use thiserror::Error;

/// Element view needed to evaluate a selector.
pub trait SelectorSubject {
    fn tag_name(&self) -> &str;
    fn attribute(&self, name: &str) -> Option<&str>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("selector is empty")]
    Empty,
    #[error("unexpected {found:?} at position {position} in selector {selector:?}")]
    Unexpected {
        selector: String,
        found: char,
        position: usize,
    },
    #[error("unterminated attribute test in selector {0:?}")]
    Unterminated(String),
    #[error("combinators are not supported (selector {0:?})")]
    Combinator(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeTest {
    name: String,
    value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeTest>,
}

impl Compound {
    fn matches(&self, subject: &dyn SelectorSubject) -> bool {
        if let Some(tag) = &self.tag
            && !tag.eq_ignore_ascii_case(subject.tag_name())
        {
            return false;
        }
        if let Some(id) = &self.id
            && subject.attribute("id") != Some(id.as_str())
        {
            return false;
        }
        if !self.classes.is_empty() {
            let class_attr = subject.attribute("class").unwrap_or_default();
            if !self
                .classes
                .iter()
                .all(|class| class_attr.split_whitespace().any(|c| c == class))
            {
                return false;
            }
        }
        self.attributes.iter().all(|test| {
            match (subject.attribute(&test.name), &test.value) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(actual), Some(expected)) => actual == expected,
            }
        })
    }
}

/// Parsed selector list; matches when any alternative matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Compound>,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let mut alternatives = Vec::new();
        for part in source.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(SelectorError::Empty);
            }
            alternatives.push(parse_compound(part)?);
        }
        Ok(Self {
            source: source.trim().to_string(),
            alternatives,
        })
    }

    #[must_use]
    pub fn matches(&self, subject: &dyn SelectorSubject) -> bool {
        self.alternatives.iter().any(|c| c.matches(subject))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn parse_compound(part: &str) -> Result<Compound, SelectorError> {
    let chars: Vec<char> = part.chars().collect();
    let unexpected = |position: usize| SelectorError::Unexpected {
        selector: part.to_string(),
        found: chars[position],
        position,
    };
    let read_ident = |start: usize| -> (String, usize) {
        let mut end = start;
        while end < chars.len() && is_ident_char(chars[end]) {
            end += 1;
        }
        (chars[start..end].iter().collect(), end)
    };

    let mut compound = Compound::default();
    let mut i = 0;

    if chars[0] == '*' {
        i = 1;
    } else if is_ident_char(chars[0]) {
        let (tag, end) = read_ident(0);
        compound.tag = Some(tag.to_ascii_lowercase());
        i = end;
    }

    while i < chars.len() {
        match chars[i] {
            '.' | '#' => {
                let (name, end) = read_ident(i + 1);
                if name.is_empty() {
                    return Err(unexpected(i));
                }
                if chars[i] == '.' {
                    compound.classes.push(name);
                } else {
                    compound.id = Some(name);
                }
                i = end;
            }
            '[' => {
                let close = chars[i..]
                    .iter()
                    .position(|&c| c == ']')
                    .map(|offset| i + offset)
                    .ok_or_else(|| SelectorError::Unterminated(part.to_string()))?;
                let body: String = chars[i + 1..close].iter().collect();
                compound.attributes.push(parse_attribute(&body, part)?);
                i = close + 1;
            }
            c if c.is_whitespace() || matches!(c, '>' | '+' | '~') => {
                return Err(SelectorError::Combinator(part.to_string()));
            }
            _ => return Err(unexpected(i)),
        }
    }

    Ok(compound)
}

fn parse_attribute(body: &str, part: &str) -> Result<AttributeTest, SelectorError> {
    let Some((name, value)) = body.split_once('=') else {
        let name = body.trim();
        if name.is_empty() || !name.chars().all(is_ident_char) {
            return Err(SelectorError::Unterminated(part.to_string()));
        }
        return Ok(AttributeTest {
            name: name.to_ascii_lowercase(),
            value: None,
        });
    };

    let name = name.trim();
    if name.is_empty() || !name.chars().all(is_ident_char) {
        return Err(SelectorError::Unterminated(part.to_string()));
    }
    let value = value.trim();
    let unquoted = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value);
    Ok(AttributeTest {
        name: name.to_ascii_lowercase(),
        value: Some(unquoted.to_string()),
    })
}
