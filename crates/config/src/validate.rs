//! Configuration validation.
//!
//! Checks a loaded [`AnswerlineConfig`] for values that would make the
//! gateway start but fail at the first inbound message.

use secrecy::ExposeSecret;

use crate::schema::AnswerlineConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "whatsapp.account_sid"
    pub path: &'static str,
    pub message: String,
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(&mut self, severity: Severity, path: &'static str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path,
            message: message.into(),
        });
    }
}

/// Validate a loaded configuration.
pub fn validate(config: &AnswerlineConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    if !config.server.webhook_path.starts_with('/') {
        result.push(Severity::Error, "server.webhook_path", "must start with '/'");
    }

    let wa = &config.whatsapp;
    if wa.account_sid.is_empty() {
        result.push(Severity::Error, "whatsapp.account_sid", "missing Twilio account SID");
    }
    if wa.auth_token.expose_secret().is_empty() {
        result.push(Severity::Error, "whatsapp.auth_token", "missing Twilio auth token");
    }
    if wa.from_number.is_empty() {
        result.push(Severity::Error, "whatsapp.from_number", "missing sender number");
    }
    if wa.max_message_chars == 0 {
        result.push(
            Severity::Error,
            "whatsapp.max_message_chars",
            "must be greater than zero",
        );
    }

    if config.providers.api_key.expose_secret().is_empty() {
        result.push(
            Severity::Warning,
            "providers.api_key",
            "no API key set; requests will be sent unauthenticated",
        );
    }

    let pipeline = &config.pipeline;
    if pipeline.max_answer_chars == 0 {
        result.push(
            Severity::Error,
            "pipeline.max_answer_chars",
            "must be greater than zero",
        );
    } else if pipeline.max_answer_chars > wa.max_message_chars {
        result.push(
            Severity::Info,
            "pipeline.max_answer_chars",
            format!(
                "immediate answers up to {} chars will be split into several messages (channel limit {})",
                pipeline.max_answer_chars, wa.max_message_chars
            ),
        );
    }
    for (path, text) in [
        ("pipeline.processing_notice", &pipeline.processing_notice),
        ("pipeline.empty_answer_apology", &pipeline.empty_answer_apology),
        ("pipeline.failure_apology", &pipeline.failure_apology),
    ] {
        if text.trim().is_empty() {
            result.push(Severity::Error, path, "message text must not be blank");
        }
    }

    match &config.retrieval.docs_dir {
        Some(dir) if !dir.is_dir() => result.push(
            Severity::Error,
            "retrieval.docs_dir",
            format!("not a readable directory: {}", dir.display()),
        ),
        None => result.push(
            Severity::Warning,
            "retrieval.docs_dir",
            "no documents configured; answers will have no supporting context",
        ),
        _ => {},
    }
    if config.retrieval.chunk_overlap >= config.retrieval.chunk_size {
        result.push(
            Severity::Error,
            "retrieval.chunk_overlap",
            "must be smaller than retrieval.chunk_size",
        );
    }

    result
}
