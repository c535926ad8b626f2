//! Twilio WhatsApp webhook payload and acknowledgment body.

use {
    answerline_common::{Result, types::InboundMessage},
    serde::Deserialize,
};

/// Body returned to Twilio for every inbound call: an empty TwiML document,
/// meaning "received, nothing to reply inline".
pub const EMPTY_TWIML: &str = "<Response></Response>";

pub const TWIML_CONTENT_TYPE: &str = "text/xml";

/// The subset of Twilio's form-encoded webhook fields the pipeline uses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TwilioWebhookForm {
    #[serde(rename = "Body", default)]
    pub body: Option<String>,
    /// Sender address, e.g. `whatsapp:+5511999990000`.
    #[serde(rename = "From", default)]
    pub from: Option<String>,
    #[serde(rename = "MessageSid", default)]
    pub message_sid: Option<String>,
    #[serde(rename = "ProfileName", default)]
    pub profile_name: Option<String>,
}

impl TwilioWebhookForm {
    /// Convert into an [`InboundMessage`]. A missing body is an empty text;
    /// a missing sender is an error.
    pub fn into_inbound(self) -> Result<InboundMessage> {
        InboundMessage::new(self.from.unwrap_or_default(), self.body.unwrap_or_default())
    }
}
