//! Inbound message orchestration: the glue between a channel webhook and the
//! storage, retrieval and generation collaborators.
//!
//! Flow: persist → embed → retrieve → history → generate → safety filter →
//! deliver now, or acknowledge and regenerate a shorter answer in the
//! background. Every path acknowledges the channel exactly once.

pub mod background;
pub mod delivery;
pub mod error;
pub mod guardrails;
pub mod pipeline;
pub mod reprocess;

#[cfg(test)]
mod test_support;

pub use {
    background::{BackgroundTasks, LaunchError},
    delivery::DeliveryDecision,
    error::{Error, Result, Stage},
    guardrails::{GuardrailFilter, SafetyFilter},
    pipeline::{Collaborators, Pipeline, PipelineContext},
    reprocess::{Reprocessor, ReprocessingJob, ShortenAndSend},
};
