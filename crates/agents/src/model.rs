use answerline_common::types::{ConversationTurn, Role};

/// Chat message sent to a completion provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatMessage {
    System { content: String },
    User { content: String },
    Assistant { content: String },
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::System { content } | Self::User { content } | Self::Assistant { content } => {
                content
            },
        }
    }

    pub fn role(&self) -> &'static str {
        match self {
            Self::System { .. } => "system",
            Self::User { .. } => "user",
            Self::Assistant { .. } => "assistant",
        }
    }

    /// Convert to the OpenAI chat completions message shape.
    pub fn to_openai_value(&self) -> serde_json::Value {
        serde_json::json!({ "role": self.role(), "content": self.content() })
    }
}

impl From<&ConversationTurn> for ChatMessage {
    fn from(turn: &ConversationTurn) -> Self {
        match turn.role {
            Role::User => Self::user(turn.content.clone()),
            Role::Bot => Self::assistant(turn.content.clone()),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_openai_roles() {
        assert_eq!(ChatMessage::system("sys").to_openai_value()["role"], "system");
        let val = ChatMessage::assistant("ok").to_openai_value();
        assert_eq!(val["role"], "assistant");
        assert_eq!(val["content"], "ok");
    }

    #[test]
    fn bot_turns_become_assistant_messages() {
        let turn = ConversationTurn {
            role: Role::Bot,
            content: "olá".into(),
            created_at: 0,
        };
        assert_eq!(ChatMessage::from(&turn), ChatMessage::assistant("olá"));
    }
}
