//! Background regeneration of answers that were too long to send directly.

use std::sync::Arc;

use {
    answerline_agents::{AnswerGenerator, CondenseRequest},
    answerline_channels::ChannelOutbound,
    answerline_common::types::{ContextItem, ConversationTurn, Role},
    answerline_sessions::ConversationStore,
    async_trait::async_trait,
    tracing::{info, warn},
};

use crate::{
    Error, Result,
    error::{Stage, StageExt},
    guardrails::SafetyFilter,
};

/// Snapshot of one request, enough to regenerate after it has ended.
#[derive(Debug, Clone)]
pub struct ReprocessingJob {
    pub sender_id: String,
    pub original_text: String,
    pub context: Vec<ContextItem>,
    pub history: Vec<ConversationTurn>,
    /// Generated answer before safety filtering.
    pub raw_answer: String,
}

#[async_trait]
pub trait Reprocessor: Send + Sync {
    /// Produce and deliver a shorter answer. Errors are terminal for the job.
    async fn reprocess(&self, job: ReprocessingJob) -> Result<()>;
}

/// Cut `text` to at most `max_chars` characters at a word boundary, marking
/// the cut with an ellipsis.
pub fn truncate_at_word(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }

    let keep = max_chars - 1;
    let end = text
        .char_indices()
        .nth(keep)
        .map_or(text.len(), |(idx, _)| idx);
    let head = &text[..end];
    let head = match head.rfind(char::is_whitespace) {
        Some(idx) if idx > 0 && !text[end..].starts_with(char::is_whitespace) => &head[..idx],
        _ => head,
    };
    format!("{}…", head.trim_end())
}

/// Condense with the generator, filter, enforce the budget, persist, send.
pub struct ShortenAndSend {
    generator: Arc<dyn AnswerGenerator>,
    filter: Arc<dyn SafetyFilter>,
    store: Arc<dyn ConversationStore>,
    outbound: Arc<dyn ChannelOutbound>,
    max_chars: usize,
}

impl ShortenAndSend {
    pub fn new(
        generator: Arc<dyn AnswerGenerator>,
        filter: Arc<dyn SafetyFilter>,
        store: Arc<dyn ConversationStore>,
        outbound: Arc<dyn ChannelOutbound>,
        max_chars: usize,
    ) -> Self {
        Self {
            generator,
            filter,
            store,
            outbound,
            max_chars,
        }
    }
}

#[async_trait]
impl Reprocessor for ShortenAndSend {
    async fn reprocess(&self, job: ReprocessingJob) -> Result<()> {
        let sender_id = job.sender_id.as_str();
        let request = CondenseRequest {
            question: job.original_text.clone(),
            answer: job.raw_answer.clone(),
            context: job.context.clone(),
            history: job.history.clone(),
            max_chars: self.max_chars,
        };
        let condensed = self
            .generator
            .condense(&request)
            .await
            .stage(Stage::Generate)?;

        let candidate = if condensed.trim().is_empty() {
            warn!(%sender_id, "condensed answer is empty, truncating the original");
            job.raw_answer.as_str()
        } else {
            condensed.as_str()
        };
        let filtered = self.filter.filter(candidate, &job.original_text);
        let answer = truncate_at_word(&filtered, self.max_chars);
        if answer.trim().is_empty() {
            return Err(Error::EmptyRegeneratedAnswer);
        }

        self.store
            .store(sender_id, &answer, Role::Bot)
            .await
            .stage(Stage::StoreAnswer)?;
        self.outbound
            .send_text(sender_id, &answer)
            .await
            .stage(Stage::Deliver)?;
        info!(
            %sender_id,
            raw_chars = job.raw_answer.chars().count(),
            chars = answer.chars().count(),
            "shortened answer delivered"
        );
        Ok(())
    }
}
