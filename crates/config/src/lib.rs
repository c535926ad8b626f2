//! Configuration loading, env substitution, and validation.
//!
//! Config files: `answerline.toml`, `answerline.yaml`, or `answerline.json`
//! Searched in `./` then `~/.config/answerline/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod template;
pub mod validate;

pub use {
    loader::{config_dir, discover_and_load, find_config_file, load_config},
    schema::{
        AnswerlineConfig, GuardrailsConfig, PipelineConfig, ProvidersConfig, RetrievalConfig,
        ServerConfig, StorageConfig, WhatsAppConfig,
    },
    template::default_config_template,
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
