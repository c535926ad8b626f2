//! `answerline doctor`: config validation and environment audit.
//!
//! Runs a series of checks against the loaded configuration and prints a
//! structured report with `[ok]`, `[warn]`, `[fail]`, `[skip]`, or `[info]`
//! status indicators per item.

use std::path::{Path, PathBuf};

use {
    answerline_config::{
        AnswerlineConfig, RetrievalConfig, Severity, StorageConfig, validate,
    },
    answerline_sessions::SqliteConversationStore,
    anyhow::Result,
    secrecy::ExposeSecret,
};

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ok,
    Warn,
    Fail,
    Skip,
    Info,
}

impl Status {
    /// Colored `[label]` tag printed in front of each finding.
    fn tag(self) -> String {
        let (color, label) = match self {
            Self::Ok => ("\x1b[32m", "ok"),
            Self::Warn => ("\x1b[33m", "warn"),
            Self::Fail => ("\x1b[31m", "fail"),
            Self::Skip => ("\x1b[2m", "skip"),
            Self::Info => ("\x1b[36m", "info"),
        };
        format!("[{color}{label}{RESET}]")
    }
}

impl From<Severity> for Status {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Error => Self::Fail,
            Severity::Warning => Self::Warn,
            Severity::Info => Self::Info,
        }
    }
}

/// Findings of one check, printed under a bold title.
struct Section {
    title: String,
    items: Vec<(Status, String)>,
}

impl Section {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
        }
    }

    fn push(&mut self, status: Status, message: impl Into<String>) {
        self.items.push((status, message.into()));
    }

    fn count(&self, status: Status) -> usize {
        self.items.iter().filter(|(s, _)| *s == status).count()
    }
}

/// Print every section; returns `(errors, warnings)`.
fn print_report(sections: &[Section]) -> (usize, usize) {
    for section in sections {
        eprintln!("{BOLD}{}{RESET}", section.title);
        for (status, message) in &section.items {
            eprintln!("  {}  {message}", status.tag());
        }
        eprintln!();
    }
    let total = |status| sections.iter().map(|s| s.count(status)).sum::<usize>();
    (total(Status::Fail), total(Status::Warn))
}

// ── Entry point ─────────────────────────────────────────────────────────────

pub async fn handle_doctor(config: &AnswerlineConfig, source: Option<&Path>) -> Result<()> {
    eprintln!("{BOLD}answerline doctor{RESET}");
    eprintln!("{BOLD}================={RESET}\n");

    let sections = vec![
        check_config(config, source),
        check_placeholders(config),
        check_storage(&config.storage).await,
        check_knowledge_base(&config.retrieval),
    ];

    let (errors, warnings) = print_report(&sections);

    eprintln!("{BOLD}Summary:{RESET} {errors} error(s), {warnings} warning(s)");

    if errors > 0 {
        std::process::exit(1);
    }

    Ok(())
}

// ── 1. Config validation ────────────────────────────────────────────────────

fn check_config(config: &AnswerlineConfig, source: Option<&Path>) -> Section {
    let label = source
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".into());
    let mut section = Section::new(format!("Config ({label})"));

    if source.is_none() {
        section.push(Status::Info, "No config file found; run `answerline config init`");
    }

    let result = validate(config);
    if !result.has_errors() {
        section.push(Status::Ok, "Configuration valid");
    }
    for d in &result.diagnostics {
        section.push(d.severity.into(), format!("{}: {}", d.path, d.message));
    }

    section
}

// ── 2. Unresolved ${VAR} placeholders ───────────────────────────────────────

fn check_placeholders(config: &AnswerlineConfig) -> Section {
    let mut section = Section::new("Environment");

    let fields = [
        ("whatsapp.account_sid", config.whatsapp.account_sid.as_str()),
        (
            "whatsapp.auth_token",
            config.whatsapp.auth_token.expose_secret().as_str(),
        ),
        ("whatsapp.from_number", config.whatsapp.from_number.as_str()),
        (
            "providers.api_key",
            config.providers.api_key.expose_secret().as_str(),
        ),
    ];

    let mut unresolved = 0usize;
    for (path, value) in fields {
        if let Some(var) = unresolved_placeholder(value) {
            unresolved += 1;
            section.push(
                Status::Warn,
                format!("{path}: ${{{var}}} is not set (export it or add it to .env)"),
            );
        }
    }
    if unresolved == 0 {
        section.push(Status::Ok, "All placeholders resolved");
    }

    section
}

/// Name of the first `${VAR}` left in `value` after substitution.
fn unresolved_placeholder(value: &str) -> Option<&str> {
    let start = value.find("${")? + 2;
    let len = value[start..].find('}')?;
    Some(&value[start..start + len])
}

// ── 3. Conversation storage ─────────────────────────────────────────────────

async fn check_storage(storage: &StorageConfig) -> Section {
    let mut section = Section::new("Storage");

    if storage.is_in_memory() {
        section.push(
            Status::Info,
            "In-memory history (lost on restart, not shared between processes)",
        );
        return section;
    }

    if let Some(path) = sqlite_file(&storage.database_url)
        && !path.exists()
    {
        section.push(
            Status::Skip,
            format!("{} does not exist yet (created on first start)", path.display()),
        );
        return section;
    }

    match SqliteConversationStore::connect(&storage.database_url).await {
        Ok(store) => {
            store.pool().close().await;
            section.push(Status::Ok, format!("Database reachable: {}", storage.database_url));
        },
        Err(e) => section.push(Status::Fail, format!("Database error: {e}")),
    }

    section
}

/// Local file behind a `sqlite:` URL, if it names one.
fn sqlite_file(url: &str) -> Option<PathBuf> {
    let rest = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(PathBuf::from(path))
}

// ── 4. Knowledge base ───────────────────────────────────────────────────────

fn check_knowledge_base(retrieval: &RetrievalConfig) -> Section {
    let mut section = Section::new("Knowledge base");

    let Some(ref dir) = retrieval.docs_dir else {
        section.push(Status::Skip, "retrieval.docs_dir not set");
        return section;
    };
    if !dir.is_dir() {
        section.push(Status::Fail, format!("Directory missing: {}", dir.display()));
        return section;
    }

    let documents = answerline_memory::document_paths(dir);
    if documents.is_empty() {
        section.push(
            Status::Warn,
            format!("No .md/.markdown/.txt files under {}", dir.display()),
        );
    } else {
        section.push(
            Status::Ok,
            format!("{} document(s) under {}", documents.len(), dir.display()),
        );
    }

    section
}
