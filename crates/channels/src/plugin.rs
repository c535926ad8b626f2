use async_trait::async_trait;

use crate::Result;

/// Send messages to a channel recipient.
///
/// Implementations must be safe to call from detached background tasks, so
/// they hold no per-request state.
#[async_trait]
pub trait ChannelOutbound: Send + Sync {
    /// Channel identifier (e.g. "whatsapp"), used in logs.
    fn id(&self) -> &str;

    /// Deliver `text` to `to`. Long texts may be split into several messages
    /// by the implementation; the call succeeds only if every part was sent.
    async fn send_text(&self, to: &str, text: &str) -> Result<()>;
}
