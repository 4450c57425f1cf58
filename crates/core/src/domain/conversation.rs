use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::lenient;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Caller-supplied history entry. Browsers send whatever shape they kept around, so
/// both fields are optional and anything that is not a string is treated as missing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub content: Option<String>,
}

impl HistoryEntry {
    pub fn new(role: &str, content: &str) -> Self {
        Self { role: Some(role.to_string()), content: Some(content.to_string()) }
    }
}

impl From<&ConversationTurn> for HistoryEntry {
    fn from(turn: &ConversationTurn) -> Self {
        Self::new(turn.role.as_str(), &turn.content)
    }
}

/// Keeps entries that carry both a known role and non-empty content, in order.
pub fn filter_history(entries: &[HistoryEntry]) -> Vec<ConversationTurn> {
    entries
        .iter()
        .filter_map(|entry| {
            let role = entry.role.as_deref().and_then(Role::parse)?;
            let content = entry.content.as_deref().filter(|text| !text.is_empty())?;
            Some(ConversationTurn { role, content: content.to_string() })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{filter_history, ConversationTurn, HistoryEntry};

    #[test]
    fn malformed_entries_are_dropped_in_order() {
        let entries: Vec<HistoryEntry> = serde_json::from_str(
            r#"[
                {"role": "user", "content": "Acme wants exports"},
                {"role": "assistant"},
                {"content": "orphan"},
                {"role": "system", "content": "ignored"},
                {"role": "assistant", "content": 42},
                {"role": "assistant", "content": ""},
                {"role": "Assistant", "content": "Got it"}
            ]"#,
        )
        .expect("history should parse");

        let turns = filter_history(&entries);
        assert_eq!(
            turns,
            vec![ConversationTurn::user("Acme wants exports"), ConversationTurn::assistant("Got it")]
        );
    }

    #[test]
    fn empty_history_is_fine() {
        assert!(filter_history(&[]).is_empty());
    }
}
