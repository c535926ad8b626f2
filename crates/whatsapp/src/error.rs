use thiserror::Error;

/// Errors building the Twilio channel from config.
#[derive(Debug, Error)]
pub enum Error {
    /// The Twilio account is missing credentials or a sender number.
    #[error("twilio account is not configured: {missing}")]
    NotConfigured { missing: &'static str },

    #[error("invalid whatsapp.{field}: {reason}")]
    InvalidSetting {
        field: &'static str,
        reason: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
