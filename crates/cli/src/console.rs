//! Outbound adapter that prints deliveries instead of sending them.

use {
    answerline_channels::{ChannelOutbound, Result},
    async_trait::async_trait,
};

/// Used by `answerline ask` so a message can be tried without a Twilio account.
pub struct ConsoleOutbound;

#[async_trait]
impl ChannelOutbound for ConsoleOutbound {
    fn id(&self) -> &str {
        "console"
    }

    async fn send_text(&self, to: &str, text: &str) -> Result<()> {
        println!("\n→ {to}\n{text}\n");
        Ok(())
    }
}
