//! Persona name and role, read from the session context.

use std::sync::LazyLock;

use regex::Regex;

pub const DEFAULT_NAME: &str = "Assistant";
pub const DEFAULT_ROLE: &str = "professional";

static NAME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(?:you are|i am) ([A-Z][a-z]+)",
        r"(?i)([A-Z][a-z]+)(?:,| is| as) (?:an?|the)",
        r"(?i)(?:as|by|from|with) ([A-Z][a-z]+)",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

static ROLE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(?:an?|the) ([a-z]+(?:\s[a-z]+){0,2}(?:specialist|professional|expert|consultant|manager|engineer|designer|developer|marketer|assistant|advisor))",
        r"(?i)(?:in|for|as) ([a-z]+(?:\s[a-z]+){0,2} (?:industry|field|sector|role|position))",
        r"(?i)(?:an?|the) ([a-z]+(?:\s[a-z]+){0,3})",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// First capture of the first pattern whose first match is longer than
/// `min_chars`.
fn first_capture(patterns: &[Regex], text: &str, min_chars: usize) -> Option<String> {
    patterns.iter().find_map(|re| {
        let caps = re.captures(text)?;
        let found = caps.get(1)?.as_str();
        (found.chars().count() > min_chars).then(|| found.to_owned())
    })
}

/// Who the bot is pretending to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    pub name: String,
    pub role: String,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_owned(),
            role: DEFAULT_ROLE.to_owned(),
        }
    }
}

impl Persona {
    /// Guess a name and role from free-form context such as
    /// "You are Maya, a growth marketer".
    #[must_use]
    pub fn from_context(context: &str) -> Self {
        if context.trim().is_empty() {
            return Self::default();
        }
        Self {
            name: first_capture(&NAME_PATTERNS, context, 2).unwrap_or_else(|| DEFAULT_NAME.to_owned()),
            role: first_capture(&ROLE_PATTERNS, context, 3).unwrap_or_else(|| DEFAULT_ROLE.to_owned()),
        }
    }

    /// Apply explicit overrides on top of an extracted persona.
    #[must_use]
    pub fn with_overrides(mut self, name: Option<&str>, role: Option<&str>) -> Self {
        if let Some(name) = name.filter(|n| !n.trim().is_empty()) {
            self.name = name.trim().to_owned();
        }
        if let Some(role) = role.filter(|r| !r.trim().is_empty()) {
            self.role = role.trim().to_owned();
        }
        self
    }
}
