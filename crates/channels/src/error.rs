use std::error::Error as StdError;

/// Crate-wide result type for channel operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed delivery errors shared by channel adapters.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The recipient identifier cannot be addressed on this channel.
    #[error("invalid recipient: {recipient}")]
    InvalidRecipient { recipient: String },

    /// Nothing to send.
    #[error("refusing to send an empty message")]
    EmptyMessage,

    /// The provider answered but refused the message.
    #[error("channel rejected message (status {status}): {detail}")]
    Rejected { status: u16, detail: String },

    /// Wrapped source error from an external dependency.
    #[error("channel operation failed: {context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn invalid_recipient(recipient: impl std::fmt::Display) -> Self {
        Self::InvalidRecipient {
            recipient: recipient.to_string(),
        }
    }

    #[must_use]
    pub fn rejected(status: u16, detail: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}
