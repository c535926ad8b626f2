//! Recording fakes for the pipeline collaborators.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};

use {
    answerline_agents::{AnswerGenerator, CondenseRequest},
    answerline_channels::{AckOutcome, AckResponder, ChannelOutbound},
    answerline_common::types::{ContextItem, ConversationTurn, Role},
    answerline_memory::{EmbeddingProvider, Retriever},
    answerline_sessions::{ConversationStore, MemoryConversationStore},
    async_trait::async_trait,
    tokio::sync::Notify,
};

use crate::{
    Result,
    guardrails::SafetyFilter,
    reprocess::{Reprocessor, ReprocessingJob},
};

/// Conversation store that can be told to fail for one role.
#[derive(Default)]
pub struct FakeStore {
    inner: MemoryConversationStore,
    pub fail_role: Mutex<Option<Role>>,
    pub fail_history: Mutex<bool>,
}

impl FakeStore {
    pub async fn turns(&self, sender_id: &str) -> Vec<ConversationTurn> {
        self.inner.history(sender_id, usize::MAX).await.unwrap()
    }

    pub async fn count(&self, sender_id: &str, role: Role) -> usize {
        self.turns(sender_id)
            .await
            .iter()
            .filter(|t| t.role == role)
            .count()
    }
}

#[async_trait]
impl ConversationStore for FakeStore {
    async fn store(
        &self,
        sender_id: &str,
        text: &str,
        role: Role,
    ) -> answerline_sessions::Result<()> {
        if *self.fail_role.lock().unwrap() == Some(role) {
            return Err(answerline_sessions::Error::unavailable("database is locked"));
        }
        self.inner.store(sender_id, text, role).await
    }

    async fn history(
        &self,
        sender_id: &str,
        limit: usize,
    ) -> answerline_sessions::Result<Vec<ConversationTurn>> {
        if *self.fail_history.lock().unwrap() {
            return Err(answerline_sessions::Error::unavailable("history unavailable"));
        }
        self.inner.history(sender_id, limit).await
    }
}

pub enum EmbedBehavior {
    Vector(Vec<f32>),
    Nothing,
    Fail,
}

pub struct FakeEmbedder {
    pub behavior: Mutex<EmbedBehavior>,
    pub calls: Mutex<usize>,
}

impl Default for FakeEmbedder {
    fn default() -> Self {
        Self {
            behavior: Mutex::new(EmbedBehavior::Vector(vec![1.0, 0.0])),
            calls: Mutex::new(0),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    async fn embed(&self, _text: &str) -> anyhow::Result<Option<Vec<f32>>> {
        *self.calls.lock().unwrap() += 1;
        match &*self.behavior.lock().unwrap() {
            EmbedBehavior::Vector(v) => Ok(Some(v.clone())),
            EmbedBehavior::Nothing => Ok(None),
            EmbedBehavior::Fail => anyhow::bail!("embedding service unavailable"),
        }
    }

    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
    }

    fn model_name(&self) -> &str {
        "fake-embed"
    }
}

#[derive(Default)]
pub struct FakeRetriever {
    pub items: Vec<ContextItem>,
    pub fail: Mutex<bool>,
    pub calls: Mutex<usize>,
}

impl FakeRetriever {
    pub fn with_items(items: Vec<ContextItem>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }
}

#[async_trait]
impl Retriever for FakeRetriever {
    async fn retrieve(&self, _embedding: &[f32]) -> anyhow::Result<Vec<ContextItem>> {
        *self.calls.lock().unwrap() += 1;
        if *self.fail.lock().unwrap() {
            anyhow::bail!("index offline");
        }
        Ok(self.items.clone())
    }
}

#[derive(Default)]
pub struct FakeGenerator {
    pub answer: Mutex<String>,
    pub condensed: Mutex<String>,
    pub fail: Mutex<bool>,
    pub fail_condense: Mutex<bool>,
    pub generate_calls: Mutex<usize>,
    pub condense_requests: Mutex<Vec<CondenseRequest>>,
}

impl FakeGenerator {
    pub fn answering(answer: impl Into<String>) -> Self {
        Self {
            answer: Mutex::new(answer.into()),
            ..Self::default()
        }
    }

    pub fn generate_calls(&self) -> usize {
        *self.generate_calls.lock().unwrap()
    }
}

#[async_trait]
impl AnswerGenerator for FakeGenerator {
    async fn generate(
        &self,
        _question: &str,
        _context: &[ContextItem],
        _history: &[ConversationTurn],
    ) -> anyhow::Result<String> {
        *self.generate_calls.lock().unwrap() += 1;
        if *self.fail.lock().unwrap() {
            anyhow::bail!("model overloaded");
        }
        Ok(self.answer.lock().unwrap().clone())
    }

    async fn condense(&self, request: &CondenseRequest) -> anyhow::Result<String> {
        self.condense_requests.lock().unwrap().push(request.clone());
        if *self.fail_condense.lock().unwrap() {
            anyhow::bail!("model overloaded");
        }
        Ok(self.condensed.lock().unwrap().clone())
    }

    fn model_name(&self) -> &str {
        "fake-chat"
    }
}

/// Identity filter that counts calls.
#[derive(Default)]
pub struct CountingFilter {
    pub calls: Mutex<Vec<(String, String)>>,
}

impl SafetyFilter for CountingFilter {
    fn filter(&self, answer: &str, original_text: &str) -> String {
        self.calls
            .lock()
            .unwrap()
            .push((answer.to_string(), original_text.to_string()));
        answer.to_string()
    }
}

#[derive(Default)]
pub struct RecordingOutbound {
    pub sent: Mutex<Vec<(String, String)>>,
    /// Texts whose delivery fails.
    pub fail_texts: Mutex<Vec<String>>,
    pub fail_all: Mutex<bool>,
}

impl RecordingOutbound {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, text)| text).collect()
    }

    pub fn fail_on(&self, text: impl Into<String>) {
        self.fail_texts.lock().unwrap().push(text.into());
    }
}

#[async_trait]
impl ChannelOutbound for RecordingOutbound {
    fn id(&self) -> &str {
        "recording"
    }

    async fn send_text(&self, to: &str, text: &str) -> answerline_channels::Result<()> {
        if *self.fail_all.lock().unwrap()
            || self.fail_texts.lock().unwrap().iter().any(|t| t == text)
        {
            return Err(answerline_channels::Error::rejected(503, "provider unavailable"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), text.to_string()));
        Ok(())
    }
}

/// Reprocessor that records jobs, optionally holding each one until released.
#[derive(Default)]
pub struct RecordingReprocessor {
    pub jobs: Mutex<Vec<ReprocessingJob>>,
    pub gate: Option<Arc<Notify>>,
}

impl RecordingReprocessor {
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            jobs: Mutex::new(Vec::new()),
            gate: Some(gate),
        }
    }

    pub fn jobs(&self) -> Vec<ReprocessingJob> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Reprocessor for RecordingReprocessor {
    async fn reprocess(&self, job: ReprocessingJob) -> Result<()> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.jobs.lock().unwrap().push(job);
        Ok(())
    }
}

/// Channel responder that records every terminal response it emits.
#[derive(Default)]
pub struct RecordingResponder {
    pub sent: Vec<AckOutcome>,
}

impl AckResponder for RecordingResponder {
    fn respond(&mut self, outcome: AckOutcome) {
        self.sent.push(outcome);
    }
}
