//! WhatsApp channel for answerline, backed by the Twilio Messaging API.
//!
//! Inbound messages arrive as form-encoded webhook calls and are answered
//! with an empty TwiML document; replies go out through the REST API.

pub mod chunk;
pub mod error;
pub mod outbound;
pub mod webhook;

pub use {
    error::{Error, Result},
    outbound::TwilioOutbound,
    webhook::{EMPTY_TWIML, TWIML_CONTENT_TYPE, TwilioWebhookForm},
};
