use std::path::{Path, PathBuf};

use {
    answerline_config::{AnswerlineConfig, Severity, default_config_template, validate},
    anyhow::Result,
    clap::Subcommand,
};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Write a documented `answerline.toml` with every default.
    Init {
        /// Where to write the file.
        #[arg(long, default_value = "answerline.toml")]
        path: PathBuf,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Validate the configuration file and report errors/warnings.
    Check {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
    /// Print the config file in use, if any.
    Path,
}

pub fn handle_config(
    action: ConfigAction,
    config: &AnswerlineConfig,
    source: Option<&Path>,
    port: u16,
) -> Result<()> {
    match action {
        ConfigAction::Init { path, force } => init(&path, force, port),
        ConfigAction::Check { verbose } => check(config, source, verbose),
        ConfigAction::Path => {
            match source {
                Some(path) => println!("{}", path.display()),
                None => eprintln!("No config file found; using defaults."),
            }
            Ok(())
        },
    }
}

fn init(path: &Path, force: bool, port: u16) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    std::fs::write(path, default_config_template(port))?;
    eprintln!("Wrote {}", path.display());
    Ok(())
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn check(config: &AnswerlineConfig, source: Option<&Path>, verbose: bool) -> Result<()> {
    let result = validate(config);

    match source {
        Some(path) => eprintln!("Checking {}\n", path.display()),
        None => eprintln!("No config file found; checking defaults.\n"),
    }

    let mut shown = 0;
    for d in &result.diagnostics {
        if d.severity == Severity::Info && !verbose {
            continue;
        }

        let (color, label) = match d.severity {
            Severity::Error => (RED, "error"),
            Severity::Warning => (YELLOW, "warning"),
            Severity::Info => (CYAN, "info"),
        };
        eprintln!("  {color}{BOLD}{label}{RESET} {}: {}", d.path, d.message);
        shown += 1;
    }

    if shown == 0 {
        eprintln!("No issues found.");
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);
    eprintln!("\n{errors} error(s), {warnings} warning(s)");

    if result.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}
