//! Free-form conversation history for the chat assistant.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How many trailing messages feed the "recent context" of a new question.
pub const CONTEXT_WINDOW: usize = 3;

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRole::User => f.write_str("user"),
            ChatRole::Assistant => f.write_str("assistant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// An ordered conversation, oldest message first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatHistory {
    messages: Vec<ChatMessage>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn push(&mut self, role: ChatRole, content: impl Into<String>, at: DateTime<Utc>) {
        self.messages.push(ChatMessage {
            role,
            content: content.into(),
            timestamp: at,
        });
    }

    pub fn push_user(&mut self, content: impl Into<String>, at: DateTime<Utc>) {
        self.push(ChatRole::User, content, at);
    }

    pub fn push_assistant(&mut self, content: impl Into<String>, at: DateTime<Utc>) {
        self.push(ChatRole::Assistant, content, at);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// User messages among the last [`CONTEXT_WINDOW`] messages, one per line.
    pub fn recent_context(&self) -> String {
        let start = self.messages.len().saturating_sub(CONTEXT_WINDOW);
        self.messages[start..]
            .iter()
            .filter(|m| m.role == ChatRole::User)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The whole conversation as `role: content` lines.
    pub fn transcript(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize chat history")
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = self.to_json_pretty()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write chat history to {}", path.display()))
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read chat history from {}", path.display()))?;
        serde_json::from_str(&content).context("failed to parse chat history JSON")
    }
}

/// Default download name for a chat export taken at `at`.
pub fn chat_export_file_name(at: DateTime<Utc>) -> String {
    format!("uniquery_chat_{}.json", at.format("%Y%m%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap() + Duration::seconds(secs)
    }

    fn conversation() -> ChatHistory {
        let mut history = ChatHistory::new();
        history.push_user("What is ownership?", at(0));
        history.push_assistant("Each value has one owner.", at(1));
        history.push_user("And borrowing?", at(2));
        history
    }

    #[test]
    fn recent_context_only_uses_user_messages_in_window() {
        let mut history = conversation();
        assert_eq!(history.recent_context(), "What is ownership?\nAnd borrowing?");

        history.push_assistant("References without ownership.", at(3));
        assert_eq!(history.recent_context(), "And borrowing?");
        assert_eq!(ChatHistory::new().recent_context(), "");
    }

    #[test]
    fn transcript_lines() {
        assert_eq!(
            conversation().transcript(),
            "user: What is ownership?\nassistant: Each value has one owner.\nuser: And borrowing?"
        );
    }

    #[test]
    fn clear_empties_history() {
        let mut history = conversation();
        history.clear();
        assert!(history.is_empty());
        assert!(history.last().is_none());
    }

    #[test]
    fn json_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("chat.json");
        let history = conversation();
        history.save_json(&path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["messages"][1]["role"], "assistant");
        assert_eq!(json["messages"][2]["content"], "And borrowing?");

        assert_eq!(ChatHistory::load_json(&path).unwrap(), history);
    }

    #[test]
    fn export_name_uses_date() {
        assert_eq!(chat_export_file_name(at(0)), "uniquery_chat_20231114.json");
    }
}
