//! OpenAI-compatible chat completions (`/v1/chat/completions`).

use {
    answerline_common::types::{ContextItem, ConversationTurn},
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    tracing::{debug, trace, warn},
};

use crate::{
    generator::{AnswerGenerator, CondenseRequest},
    model::ChatMessage,
    prompt::{DEFAULT_SYSTEM_PROMPT, build_answer_messages, build_condense_messages},
};

pub struct OpenAiChatGenerator {
    client: &'static reqwest::Client,
    api_key: Secret<String>,
    base_url: String,
    model: String,
    temperature: f32,
    system_prompt: String,
}

impl OpenAiChatGenerator {
    pub fn new(api_key: Secret<String>, model: impl Into<String>) -> Self {
        Self {
            client: super::shared_http_client(),
            api_key,
            base_url: "https://api.openai.com".into(),
            model: model.into(),
            temperature: 0.3,
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    async fn complete(&self, messages: &[ChatMessage]) -> anyhow::Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": messages.iter().map(ChatMessage::to_openai_value).collect::<Vec<_>>(),
        });
        debug!(model = %self.model, messages_count = messages.len(), "chat completion request");

        let http_resp = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = http_resp.status();
        if !status.is_success() {
            let body_text = http_resp.text().await.unwrap_or_default();
            warn!(%status, model = %self.model, body = %body_text, "chat completion API error");
            anyhow::bail!("chat completion API error HTTP {status}: {body_text}");
        }

        let resp = http_resp.json::<serde_json::Value>().await?;
        trace!(response = %resp, "chat completion raw response");

        // Missing choices or null content both read as an empty answer.
        let text = resp["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        Ok(text)
    }
}

#[async_trait]
impl AnswerGenerator for OpenAiChatGenerator {
    async fn generate(
        &self,
        question: &str,
        context: &[ContextItem],
        history: &[ConversationTurn],
    ) -> anyhow::Result<String> {
        let messages = build_answer_messages(&self.system_prompt, question, context, history);
        self.complete(&messages).await
    }

    async fn condense(&self, request: &CondenseRequest) -> anyhow::Result<String> {
        let messages = build_condense_messages(&self.system_prompt, request);
        self.complete(&messages).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
