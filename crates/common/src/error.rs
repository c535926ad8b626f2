use thiserror::Error;

/// Errors raised while constructing or parsing shared domain values.
#[derive(Error, Debug)]
pub enum Error {
    /// A stored role label did not match any known [`Role`](crate::types::Role).
    #[error("unknown conversation role: {0}")]
    UnknownRole(String),

    /// An inbound message arrived without a sender identifier.
    #[error("inbound message has no sender id")]
    MissingSender,
}

pub type Result<T> = std::result::Result<T, Error>;
