use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("conversation database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be turned back into a conversation turn.
    #[error(transparent)]
    Domain(#[from] answerline_common::Error),

    /// The backing store cannot serve requests right now.
    #[error("conversation store unavailable: {0}")]
    Unavailable(String),
}

impl Error {
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
