//! Chat messages sent to the summarization model.

use serde::{Deserialize, Serialize};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Standing instructions; providers without a chat role for it send it separately.
    System,
    #[default]
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// Separate system instructions from the turns that follow them.
///
/// Multiple system messages are joined with a blank line. Order of the
/// remaining turns is preserved.
pub fn split_system(messages: &[Message]) -> (Option<String>, Vec<&Message>) {
    let (system, turns): (Vec<&Message>, Vec<&Message>) = messages
        .iter()
        .partition(|m| m.role == MessageRole::System);

    let system = (!system.is_empty()).then(|| {
        system
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    });
    (system, turns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Message::system("be brief")).unwrap();
        assert_eq!(json, r#"{"role":"system","content":"be brief"}"#);
    }

    #[test]
    fn test_split_system() {
        let messages = [
            Message::system("Be brief."),
            Message::user("Document text"),
            Message::system("No lists."),
            Message::assistant("ok"),
        ];
        let (system, turns) = split_system(&messages);
        assert_eq!(system.as_deref(), Some("Be brief.\n\nNo lists."));
        assert_eq!(turns, vec![&messages[1], &messages[3]]);

        let only = [Message::user("only")];
        let (system, turns) = split_system(&only);
        assert!(system.is_none());
        assert_eq!(turns.len(), 1);
    }
}
