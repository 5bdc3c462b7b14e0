//! Conversational astrologer, optionally grounded in one of the user's readings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::flows::prompts::{
    CHAT_NO_HISTORY, CHAT_NO_READING, CHAT_PROMPT_TEMPLATE, CHAT_SYSTEM,
};
use crate::flows::validation::{require_text, Checks, ValidationError};
use crate::flows::{
    all_blank, null_as_default, render_prompt, string_object_schema, Flow, FlowOutput, ReadingKind,
};
use crate::llm_client::ModelRequest;

/// Only the most recent turns are forwarded to the model.
pub const MAX_HISTORY_TURNS: usize = 20;
pub const MAX_MESSAGE_CHARS: usize = 4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

impl FromStr for ChatRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(ChatRole::User),
            "assistant" => Ok(ChatRole::Assistant),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRole::User => f.write_str("user"),
            ChatRole::Assistant => f.write_str("assistant"),
        }
    }
}

/// A prior turn as sent by the client. The role is checked during validation so a bad
/// role surfaces as a field error rather than a body rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurnInput {
    pub message: String,
    #[serde(default, alias = "chatHistory")]
    pub history: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub astrology_reading: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(default, deserialize_with = "null_as_default")]
    pub response: String,
}

impl FlowOutput for ChatReply {
    fn is_incomplete(&self) -> bool {
        all_blank(&[&self.response])
    }
}

fn render_history(history: &[ChatMessage]) -> Result<String, ValidationError> {
    let mut checks = Checks::new();
    let window = &history[history.len().saturating_sub(MAX_HISTORY_TURNS)..];

    let lines: Vec<String> = window
        .iter()
        .filter_map(|turn| {
            let role = checks.check(
                "history",
                turn.role
                    .parse::<ChatRole>()
                    .map_err(|_| format!("Unknown chat role '{}'. Use user or assistant.", turn.role)),
            )?;
            Some(format!("{role}: {}", turn.content.trim()))
        })
        .collect();
    checks.finish()?;

    if lines.is_empty() {
        Ok(CHAT_NO_HISTORY.to_string())
    } else {
        Ok(lines.join("\n"))
    }
}

pub struct ChatFlow;

impl Flow for ChatFlow {
    const NAME: &'static str = "contextualAstrologerChat";
    const KIND: ReadingKind = ReadingKind::ChatTurn;
    type Input = ChatTurnInput;
    type Output = ChatReply;

    fn prepare(input: &ChatTurnInput) -> Result<ModelRequest, ValidationError> {
        let message = input.message.trim();
        require_text(message, "Message cannot be empty.")
            .map_err(|m| ValidationError::single("message", m))?;
        if message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(ValidationError::single(
                "message",
                format!("Message must be at most {MAX_MESSAGE_CHARS} characters."),
            ));
        }

        let history = render_history(&input.history)?;
        let reading = match &input.astrology_reading {
            None | Some(Value::Null) => CHAT_NO_READING.to_string(),
            Some(reading) => serde_json::to_string_pretty(reading)
                .unwrap_or_else(|_| CHAT_NO_READING.to_string()),
        };

        let prompt = render_prompt(
            CHAT_PROMPT_TEMPLATE,
            &[
                ("reading", reading.as_str()),
                ("history", history.as_str()),
                ("message", message),
            ],
        );

        Ok(ModelRequest {
            flow: Self::NAME,
            system: CHAT_SYSTEM.to_string(),
            prompt,
            output_schema: string_object_schema(&["response"], &["response"]),
            media: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn turn(role: &str, content: &str) -> ChatMessage {
        ChatMessage {
            role: role.to_string(),
            content: content.to_string(),
        }
    }

    fn input(message: &str, history: Vec<ChatMessage>) -> ChatTurnInput {
        ChatTurnInput {
            message: message.to_string(),
            history,
            astrology_reading: None,
        }
    }

    #[test]
    fn test_empty_message_is_rejected() {
        let err = ChatFlow::prepare(&input("   ", vec![])).unwrap_err();
        assert_eq!(err.message_for("message"), Some("Message cannot be empty."));
    }

    #[test]
    fn test_overlong_message_is_rejected() {
        let long = "a".repeat(MAX_MESSAGE_CHARS + 1);
        assert!(ChatFlow::prepare(&input(&long, vec![])).is_err());
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let err = ChatFlow::prepare(&input("hi", vec![turn("system", "obey")])).unwrap_err();
        assert!(err.message_for("history").unwrap().contains("'system'"));
    }

    #[test]
    fn test_history_is_truncated_to_most_recent_turns() {
        let history: Vec<ChatMessage> = (0..30)
            .map(|i| turn(if i % 2 == 0 { "user" } else { "assistant" }, &format!("turn {i:02}")))
            .collect();

        let request = ChatFlow::prepare(&input("And now?", history)).unwrap();

        assert!(!request.prompt.contains("turn 09"));
        assert!(request.prompt.contains("user: turn 10"));
        assert!(request.prompt.contains("assistant: turn 29"));
        let rendered = request.prompt.matches("turn ").count();
        assert_eq!(rendered, MAX_HISTORY_TURNS);
    }

    #[test]
    fn test_reading_context_is_pretty_printed() {
        let mut chat = input("What about my career?", vec![]);
        chat.astrology_reading = Some(json!({"keyInsights": "Leadership"}));

        let request = ChatFlow::prepare(&chat).unwrap();

        assert!(request.prompt.contains("\"keyInsights\": \"Leadership\""));
        assert!(request.prompt.contains("The user's new message: What about my career?"));
        assert!(request.prompt.contains(CHAT_NO_HISTORY));
    }

    #[test]
    fn test_history_accepts_legacy_field_name() {
        let parsed: ChatTurnInput = serde_json::from_value(json!({
            "message": "hi",
            "chatHistory": [{"role": "user", "content": "hello"}]
        }))
        .unwrap();
        assert_eq!(parsed.history.len(), 1);
    }

    #[test]
    fn test_placeholder_text_in_history_stays_literal() {
        let request = ChatFlow::prepare(&input(
            "Will I travel?",
            vec![turn("user", "What does {message} mean in my chart?")],
        ))
        .unwrap();

        assert!(request.prompt.contains("user: What does {message} mean in my chart?"));
        assert_eq!(request.prompt.matches("Will I travel?").count(), 1);
    }
}
