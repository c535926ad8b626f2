//! Documented config template written by `answerline init`.

/// Generate the default config template with a specific port.
pub fn default_config_template(port: u16) -> String {
    format!(
        r##"# Answerline Configuration
# ========================
# Every option is shown with its default. Changes require a restart.
#
# Environment variable substitution is supported: ${{ENV_VAR}}
# Example: auth_token = "${{TWILIO_AUTH_TOKEN}}"

[server]
bind = "127.0.0.1"                     # "0.0.0.0" to accept outside connections
port = {port}
webhook_path = "/webhooks/whatsapp"    # Point the Twilio sandbox/number here (POST)

[whatsapp]
account_sid = "${{TWILIO_ACCOUNT_SID}}"
auth_token = "${{TWILIO_AUTH_TOKEN}}"
from_number = "${{TWILIO_WHATSAPP_NUMBER}}"  # "whatsapp:" prefix is added when missing
api_base_url = "https://api.twilio.com"
max_message_chars = 1600               # Longer texts are split into several messages

[providers]
api_key = "${{OPENAI_API_KEY}}"
base_url = "https://api.openai.com"    # Any OpenAI-compatible endpoint
chat_model = "gpt-4o-mini"
embedding_model = "text-embedding-3-small"
temperature = 0.3
# system_prompt = "You are ..."        # Replaces the built-in prompt

[pipeline]
max_answer_chars = 1000                # Longer answers are shortened in the background
history_limit = 10                     # Prior turns sent to the model
empty_answer_sentinel = "No content available"
processing_notice = "Sua resposta está sendo processada e pode levar um pouco mais de tempo. Agradeço a paciência!"
empty_answer_apology = "Desculpe, não consegui gerar uma resposta no momento. Tente reformular sua pergunta."
failure_apology = "Desculpe, ocorreu um erro inesperado ao processar sua solicitação."

[retrieval]
# docs_dir = "./docs"                  # Markdown/text knowledge base, indexed at startup
top_k = 4
min_score = 0.2
chunk_size = 200                       # Approximate tokens per chunk
chunk_overlap = 40

[guardrails]
blocked_terms = []                     # Whole words replaced in answers
redact_contacts = true                 # Hide e-mails/phones the user did not send
replacement = "[removido]"

[storage]
database_url = "sqlite://answerline.db?mode=rwc"   # "memory" keeps history in-process only
"##
    )
}
