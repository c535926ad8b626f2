//! Answer generation: prompt building and chat-completion providers.

pub mod generator;
pub mod model;
pub mod prompt;
pub mod providers;

pub use {
    generator::{AnswerGenerator, CondenseRequest},
    model::ChatMessage,
    providers::openai::OpenAiChatGenerator,
};
