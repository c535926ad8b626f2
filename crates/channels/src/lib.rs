//! Channel-facing contracts.
//!
//! A messaging channel contributes two things to the pipeline: an outbound
//! adapter that delivers text to a recipient, and a terminal acknowledgment
//! returned to the webhook call that carried the inbound message.

pub mod ack;
pub mod error;
pub mod plugin;

pub use {
    ack::{AckOutcome, AckResponder, AckTracker, PendingAck},
    error::{Error, Result},
    plugin::ChannelOutbound,
};
