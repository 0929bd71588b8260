//! Extracted conversation content.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
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
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThinkingBlock {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMessage {
    pub role: Role,
    pub content_html: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<ThinkingBlock>,
}

impl ConversationMessage {
    pub fn new(role: Role, content_html: impl Into<String>) -> Self {
        Self {
            role,
            content_html: content_html.into(),
            thinking: None,
        }
    }

    pub fn with_thinking(mut self, content: impl Into<String>) -> Self {
        self.thinking = Some(ThinkingBlock {
            content: content.into(),
        });
        self
    }
}

/// Messages of one site, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationData {
    #[serde(default)]
    pub messages: Vec<ConversationMessage>,
}

impl ConversationData {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// A site's conversation, as fed to the combined export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConversation {
    pub site_name: String,
    pub data: ConversationData,
}

impl SiteConversation {
    pub fn new(site_name: impl Into<String>, data: ConversationData) -> Self {
        Self {
            site_name: site_name.into(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_json_shape() {
        let msg = ConversationMessage::new(Role::Assistant, "<p>hi</p>").with_thinking("hmm");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["contentHtml"], "<p>hi</p>");
        assert_eq!(json["thinking"]["content"], "hmm");
    }

    #[test]
    fn test_thinking_omitted_when_absent() {
        let msg = ConversationMessage::new(Role::User, "q");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("thinking"));
    }

    #[test]
    fn test_empty_data_deserializes() {
        let data: ConversationData = serde_json::from_str("{}").unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }
}
