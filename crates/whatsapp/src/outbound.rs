use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    tracing::{debug, info},
};

use {
    answerline_channels::{ChannelOutbound, Error as ChannelError, Result as ChannelResult},
    answerline_config::WhatsAppConfig,
};

use crate::{
    chunk::chunk_message,
    error::{Error, Result},
};

const WHATSAPP_PREFIX: &str = "whatsapp:";

/// Outbound message sender for WhatsApp via the Twilio Messages API.
pub struct TwilioOutbound {
    client: reqwest::Client,
    account_sid: String,
    auth_token: Secret<String>,
    from: String,
    api_base_url: String,
    max_message_chars: usize,
}

impl TwilioOutbound {
    pub fn from_config(config: &WhatsAppConfig) -> Result<Self> {
        if config.account_sid.is_empty() {
            return Err(Error::NotConfigured {
                missing: "account_sid",
            });
        }
        if config.auth_token.expose_secret().is_empty() {
            return Err(Error::NotConfigured {
                missing: "auth_token",
            });
        }
        if config.from_number.trim().is_empty() {
            return Err(Error::NotConfigured {
                missing: "from_number",
            });
        }
        if config.max_message_chars == 0 {
            return Err(Error::InvalidSetting {
                field: "max_message_chars",
                reason: "must be greater than zero",
            });
        }
        Ok(Self {
            client: reqwest::Client::new(),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from: whatsapp_address(&config.from_number).map_err(|_| Error::InvalidSetting {
                field: "from_number",
                reason: "must contain a phone number",
            })?,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            max_message_chars: config.max_message_chars,
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base_url, self.account_sid
        )
    }

    async fn send_one(&self, to: &str, body: &str) -> ChannelResult<()> {
        let resp = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(&[("From", self.from.as_str()), ("To", to), ("Body", body)])
            .send()
            .await
            .map_err(|e| ChannelError::external("twilio send request", e))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(ChannelError::rejected(status.as_u16(), detail));
        }
        Ok(())
    }
}

/// Normalize a phone number or address to Twilio's `whatsapp:` form.
fn whatsapp_address(raw: &str) -> ChannelResult<String> {
    let trimmed = raw.trim();
    let number = trimmed.strip_prefix(WHATSAPP_PREFIX).unwrap_or(trimmed);
    if number.is_empty() {
        return Err(ChannelError::invalid_recipient(raw));
    }
    Ok(format!("{WHATSAPP_PREFIX}{number}"))
}

#[async_trait]
impl ChannelOutbound for TwilioOutbound {
    fn id(&self) -> &str {
        "whatsapp"
    }

    async fn send_text(&self, to: &str, text: &str) -> ChannelResult<()> {
        if text.trim().is_empty() {
            return Err(ChannelError::EmptyMessage);
        }
        let to = whatsapp_address(to)?;
        let chunks = chunk_message(text, self.max_message_chars);
        let parts = chunks.len();
        for (i, chunk) in chunks.iter().enumerate() {
            self.send_one(&to, chunk).await?;
            debug!(to = %to, part = i + 1, parts, chars = chunk.chars().count(), "whatsapp part sent");
        }
        info!(to = %to, parts, "whatsapp message sent");
        Ok(())
    }
}
