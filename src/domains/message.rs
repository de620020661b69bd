use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Blank identifiers are treated as "no user", matching how the stored
    /// target is interpreted.
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub sender_id: UserId,
    pub sender_name: String,
    pub text: String,
    pub group_id: Option<GroupId>,
}

impl InboundMessage {
    pub fn private(sender_id: &str, sender_name: &str, text: &str) -> Self {
        Self {
            sender_id: UserId::new(sender_id),
            sender_name: sender_name.to_string(),
            text: text.to_string(),
            group_id: None,
        }
    }

    pub fn in_group(group_id: &str, sender_id: &str, sender_name: &str, text: &str) -> Self {
        Self {
            group_id: Some(GroupId::new(group_id)),
            ..Self::private(sender_id, sender_name, text)
        }
    }

    /// Group id if the message came from a group chat. Blank ids count as private.
    pub fn group(&self) -> Option<&GroupId> {
        self.group_id
            .as_ref()
            .filter(|group| !group.as_str().trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageComponent {
    Plain { text: String },
}

impl MessageComponent {
    pub fn plain(text: impl Into<String>) -> Self {
        MessageComponent::Plain { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEnvelope {
    pub timestamp: String,
    pub origin: String,
    pub body: String,
}

impl OutboundEnvelope {
    pub fn render(&self) -> String {
        format!(
            "[{}] {}\nMessage content: {}",
            self.timestamp, self.origin, self.body
        )
    }

    pub fn into_components(self) -> Vec<MessageComponent> {
        vec![MessageComponent::plain(self.render())]
    }
}
