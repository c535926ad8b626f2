/// Config schema types (server, channel, providers, pipeline, retrieval, guardrails, storage).
use {
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
};

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnswerlineConfig {
    pub server: ServerConfig,
    pub whatsapp: WhatsAppConfig,
    pub providers: ProvidersConfig,
    pub pipeline: PipelineConfig,
    pub retrieval: RetrievalConfig,
    pub guardrails: GuardrailsConfig,
    pub storage: StorageConfig,
}

/// Gateway server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to. Defaults to "127.0.0.1".
    pub bind: String,
    pub port: u16,
    /// Route the messaging provider posts inbound messages to.
    pub webhook_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 3000,
            webhook_path: "/webhooks/whatsapp".into(),
        }
    }
}

/// Twilio WhatsApp account used for outbound delivery.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct WhatsAppConfig {
    pub account_sid: String,
    pub auth_token: Secret<String>,
    /// Sender number, with or without the `whatsapp:` prefix.
    pub from_number: String,
    pub api_base_url: String,
    /// Longest single message the provider accepts; longer texts are split.
    pub max_message_chars: usize,
}

impl std::fmt::Debug for WhatsAppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhatsAppConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .field("from_number", &self.from_number)
            .field("api_base_url", &self.api_base_url)
            .finish_non_exhaustive()
    }
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: Secret::new(String::new()),
            from_number: String::new(),
            api_base_url: "https://api.twilio.com".into(),
            max_message_chars: 1600,
        }
    }
}

impl WhatsAppConfig {
    /// Whether enough credentials are present to send messages.
    pub fn is_configured(&self) -> bool {
        !self.account_sid.is_empty()
            && !self.auth_token.expose_secret().is_empty()
            && !self.from_number.is_empty()
    }
}

/// OpenAI-compatible endpoint used for both embeddings and chat completions.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub api_key: Secret<String>,
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: f32,
    /// Replaces the built-in system prompt when set.
    pub system_prompt: Option<String>,
}

impl std::fmt::Debug for ProvidersConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvidersConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("chat_model", &self.chat_model)
            .field("embedding_model", &self.embedding_model)
            .finish_non_exhaustive()
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            api_key: Secret::new(String::new()),
            base_url: "https://api.openai.com".into(),
            chat_model: "gpt-4o-mini".into(),
            embedding_model: "text-embedding-3-small".into(),
            temperature: 0.3,
            system_prompt: None,
        }
    }
}

/// Orchestration knobs and the fixed texts sent to users.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Filtered answers longer than this are regenerated in the background.
    pub max_answer_chars: usize,
    /// Number of prior turns handed to the generator.
    pub history_limit: usize,
    /// Generator output that means "nothing to say".
    pub empty_answer_sentinel: String,
    /// Sent before a long answer is regenerated in the background.
    pub processing_notice: String,
    /// Sent when the generator returns nothing usable.
    pub empty_answer_apology: String,
    /// Sent when any pipeline stage fails.
    pub failure_apology: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_answer_chars: 1000,
            history_limit: 10,
            empty_answer_sentinel: "No content available".into(),
            processing_notice: "Sua resposta está sendo processada e pode levar um pouco mais \
                                de tempo. Agradeço a paciência!"
                .into(),
            empty_answer_apology: "Desculpe, não consegui gerar uma resposta no momento. Tente \
                                   reformular sua pergunta."
                .into(),
            failure_apology: "Desculpe, ocorreu um erro inesperado ao processar sua solicitação."
                .into(),
        }
    }
}

/// Document retrieval settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Directory of markdown documents indexed at startup.
    pub docs_dir: Option<std::path::PathBuf>,
    pub top_k: usize,
    pub min_score: f32,
    /// Approximate chunk size in whitespace-separated tokens.
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            docs_dir: None,
            top_k: 4,
            min_score: 0.2,
            chunk_size: 200,
            chunk_overlap: 40,
        }
    }
}

/// Content safety filter settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GuardrailsConfig {
    /// Words or phrases redacted from answers (case-insensitive, whole word).
    pub blocked_terms: Vec<String>,
    /// Redact e-mail addresses and phone numbers the user did not send.
    pub redact_contacts: bool,
    pub replacement: String,
}

impl Default for GuardrailsConfig {
    fn default() -> Self {
        Self {
            blocked_terms: Vec::new(),
            redact_contacts: true,
            replacement: "[removido]".into(),
        }
    }
}

/// Conversation storage.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite URL, or `"memory"` for a process-local store.
    pub database_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://answerline.db?mode=rwc".into(),
        }
    }
}

impl StorageConfig {
    pub fn is_in_memory(&self) -> bool {
        self.database_url == "memory"
    }
}
