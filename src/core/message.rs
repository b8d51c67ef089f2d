use serde::{Deserialize, Serialize};

use crate::api::ChatMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    pub fn is_user(self) -> bool {
        self == Role::User
    }

    pub fn is_assistant(self) -> bool {
        self == Role::Assistant
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<&str> for Role {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            _ => Err(format!("invalid message role: {value}")),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

/// A piece of message content. Only `Text` is rendered or sent upstream;
/// the other variants are kept so that transcripts from richer providers
/// deserialize without loss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MessagePart {
    Text { text: String },
    Reasoning { text: String },
    StepStart,
}

impl MessagePart {
    pub fn text(text: impl Into<String>) -> Self {
        MessagePart::Text { text: text.into() }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessagePart::Text { text } => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub parts: Vec<MessagePart>,
}

impl Message {
    pub fn new(id: impl Into<String>, role: Role, parts: Vec<MessagePart>) -> Self {
        Self {
            id: id.into(),
            role,
            parts,
        }
    }

    pub fn user_text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, Role::User, vec![MessagePart::text(text)])
    }

    pub fn assistant_text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, Role::Assistant, vec![MessagePart::text(text)])
    }

    /// Concatenated text parts, in order.
    pub fn text(&self) -> String {
        self.parts.iter().filter_map(MessagePart::as_text).collect()
    }

    pub fn is_user(&self) -> bool {
        self.role.is_user()
    }

    pub fn is_assistant(&self) -> bool {
        self.role.is_assistant()
    }

    pub fn to_api_message(&self) -> ChatMessage {
        ChatMessage {
            role: self.role.as_str().to_string(),
            content: self.text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_joins_only_text_parts() {
        let message = Message::new(
            "m-1",
            Role::Assistant,
            vec![
                MessagePart::StepStart,
                MessagePart::text("Hello"),
                MessagePart::Reasoning {
                    text: "hidden".into(),
                },
                MessagePart::text(", world"),
            ],
        );
        assert_eq!(message.text(), "Hello, world");
        assert_eq!(message.to_api_message().content, "Hello, world");
        assert_eq!(message.to_api_message().role, "assistant");
    }

    #[test]
    fn parts_serialize_with_type_tag() {
        let message = Message::user_text("m-2", "hi");
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["parts"][0]["type"], "text");
        assert_eq!(json["parts"][0]["text"], "hi");

        let step: MessagePart = serde_json::from_str(r#"{"type":"step-start"}"#).unwrap();
        assert_eq!(step, MessagePart::StepStart);
    }

    #[test]
    fn invalid_role_strings_are_rejected() {
        assert!(Role::try_from("system").is_err());
        assert_eq!(Role::try_from("assistant"), Ok(Role::Assistant));
    }
}
