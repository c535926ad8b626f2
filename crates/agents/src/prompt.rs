//! Chat prompt assembly for answering and condensing.

use answerline_common::types::{ContextItem, ConversationTurn, Role};

use crate::{generator::CondenseRequest, model::ChatMessage};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful customer-service assistant \
answering over WhatsApp. Answer only from the provided context and the conversation so far. \
Reply in the same language as the user, in plain text without markdown headings. \
If the context does not contain the answer, say so briefly instead of guessing.";

const NO_CONTEXT: &str = "(no relevant documents found)";

/// Render retrieved passages as a numbered block.
pub fn format_context(context: &[ContextItem]) -> String {
    if context.is_empty() {
        return NO_CONTEXT.to_string();
    }
    context
        .iter()
        .enumerate()
        .map(|(i, item)| format!("[{}] ({}) {}", i + 1, item.source, item.text.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// History turns as chat messages.
///
/// The question has usually been persisted before history is fetched, so a
/// trailing user turn identical to it is dropped to avoid asking it twice.
fn history_messages(history: &[ConversationTurn], question: &str) -> Vec<ChatMessage> {
    let turns = match history.split_last() {
        Some((last, rest)) if last.role == Role::User && last.content == question => rest,
        _ => history,
    };
    turns.iter().map(ChatMessage::from).collect()
}

pub fn build_answer_messages(
    system_prompt: &str,
    question: &str,
    context: &[ContextItem],
    history: &[ConversationTurn],
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(format!(
        "{system_prompt}\n\n## Context\n\n{}",
        format_context(context)
    )));
    messages.extend(history_messages(history, question));
    messages.push(ChatMessage::user(question));
    messages
}

pub fn build_condense_messages(system_prompt: &str, request: &CondenseRequest) -> Vec<ChatMessage> {
    let mut messages = build_answer_messages(
        system_prompt,
        &request.question,
        &request.context,
        &request.history,
    );
    messages.push(ChatMessage::assistant(request.answer.clone()));
    messages.push(ChatMessage::user(format!(
        "Rewrite your previous answer so it fits in at most {} characters. Keep the \
         essential facts, keep the same language, and do not add new information.",
        request.max_chars
    )));
    messages
}
