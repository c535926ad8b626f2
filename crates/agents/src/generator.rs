use {
    answerline_common::types::{ContextItem, ConversationTurn},
    async_trait::async_trait,
};

/// Input for regenerating a shorter version of an answer.
#[derive(Debug, Clone)]
pub struct CondenseRequest {
    pub question: String,
    pub answer: String,
    pub context: Vec<ContextItem>,
    pub history: Vec<ConversationTurn>,
    /// Upper bound for the condensed answer, in characters.
    pub max_chars: usize,
}

/// Produces answers from a question plus retrieved context and history.
///
/// An empty string is a valid result; callers decide what to do with it.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(
        &self,
        question: &str,
        context: &[ContextItem],
        history: &[ConversationTurn],
    ) -> anyhow::Result<String>;

    /// Rewrite `request.answer` to fit within `request.max_chars`.
    async fn condense(&self, request: &CondenseRequest) -> anyhow::Result<String>;

    fn model_name(&self) -> &str;
}
