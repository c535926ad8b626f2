//! Content safety filtering applied to generated answers before delivery.

use std::sync::LazyLock;

use {
    answerline_config::GuardrailsConfig,
    regex::{Captures, Regex, RegexBuilder},
};

use crate::Result;

/// Rewrites a generated answer before it is shown to the sender.
///
/// Synchronous and infallible: whatever it returns is what gets delivered.
pub trait SafetyFilter: Send + Sync {
    fn filter(&self, answer: &str, original_text: &str) -> String;
}

#[allow(clippy::expect_used)]
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("email pattern is valid")
});

#[allow(clippy::expect_used)]
static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\+?\(?\d[\d\s().-]{6,}\d").expect("phone pattern is valid")
});

#[allow(clippy::expect_used)]
static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n(?:[ \t]*\n){2,}").expect("blank line pattern is valid"));

/// Phone-like runs need at least this many digits to be redacted, so prices,
/// dates and opening hours pass through.
const MIN_PHONE_DIGITS: usize = 8;

/// Configurable guardrails: blocked terms, contact redaction, whitespace cleanup.
#[derive(Debug, Clone)]
pub struct GuardrailFilter {
    blocked: Option<Regex>,
    redact_contacts: bool,
    replacement: String,
}

impl GuardrailFilter {
    pub fn new(config: &GuardrailsConfig) -> Result<Self> {
        let terms: Vec<String> = config
            .blocked_terms
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(regex::escape)
            .collect();
        let blocked = if terms.is_empty() {
            None
        } else {
            Some(
                RegexBuilder::new(&format!(r"\b(?:{})\b", terms.join("|")))
                    .case_insensitive(true)
                    .build()?,
            )
        };
        Ok(Self {
            blocked,
            redact_contacts: config.redact_contacts,
            replacement: config.replacement.clone(),
        })
    }

    fn redact_contacts(&self, text: &str, original_text: &str) -> String {
        let original_lower = original_text.to_lowercase();
        let text = EMAIL.replace_all(text, |caps: &Captures<'_>| {
            let email = &caps[0];
            if original_lower.contains(&email.to_lowercase()) {
                email.to_string()
            } else {
                self.replacement.clone()
            }
        });
        PHONE
            .replace_all(&text, |caps: &Captures<'_>| {
                let number = &caps[0];
                let digits = number.chars().filter(char::is_ascii_digit).count();
                if digits < MIN_PHONE_DIGITS || original_text.contains(number) {
                    number.to_string()
                } else {
                    self.replacement.clone()
                }
            })
            .into_owned()
    }
}

impl Default for GuardrailFilter {
    fn default() -> Self {
        Self {
            blocked: None,
            redact_contacts: true,
            replacement: GuardrailsConfig::default().replacement,
        }
    }
}

impl SafetyFilter for GuardrailFilter {
    fn filter(&self, answer: &str, original_text: &str) -> String {
        let mut text = match &self.blocked {
            Some(re) => re.replace_all(answer, self.replacement.as_str()).into_owned(),
            None => answer.to_string(),
        };
        if self.redact_contacts {
            text = self.redact_contacts(&text, original_text);
        }
        BLANK_LINES.replace_all(text.trim(), "\n\n").into_owned()
    }
}
