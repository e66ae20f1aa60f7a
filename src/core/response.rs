//! Interaction response payloads and Discord message limits
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Response modifiers applied to command return values
//! - 1.0.0: Message truncation helpers

use serde_json::{json, Value};

/// Discord message content limit
pub const MESSAGE_LIMIT: usize = 2000;
/// Discord limit of choices returned by one autocomplete response
pub const AUTO_COMPLETE_CHOICES_MAX: usize = 25;

const MESSAGE_FLAG_EPHEMERAL: u64 = 1 << 6;

/// Truncate text to fit message limit, adding ellipsis if needed
pub fn truncate_for_message(text: &str) -> String {
    if text.len() <= MESSAGE_LIMIT {
        text.to_string()
    } else {
        // Find a safe UTF-8 boundary
        let mut end = MESSAGE_LIMIT - 3;
        while !text.is_char_boundary(end) && end > 0 {
            end -= 1;
        }
        format!("{}...", &text[..end])
    }
}

/// How a command function's return value is turned into a response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResponseModifier {
    /// Only the invoking user sees the response.
    pub show_for_invoking_user_only: bool,
    /// Mentions inside the content do not ping anyone.
    pub suppress_mentions: bool,
}

impl ResponseModifier {
    pub fn ephemeral() -> Self {
        Self {
            show_for_invoking_user_only: true,
            suppress_mentions: false,
        }
    }

    pub fn apply(&self, content: impl Into<String>) -> ResponseMessage {
        ResponseMessage {
            content: truncate_for_message(&content.into()),
            ephemeral: self.show_for_invoking_user_only,
            suppress_mentions: self.suppress_mentions,
        }
    }
}

/// A message sent as (or after) the response to an interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMessage {
    pub content: String,
    pub ephemeral: bool,
    pub suppress_mentions: bool,
}

impl ResponseMessage {
    pub fn new(content: impl Into<String>) -> Self {
        ResponseModifier::default().apply(content)
    }

    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = ephemeral;
        self
    }

    /// Message payload in wire shape.
    pub fn to_data(&self) -> Value {
        let mut data = json!({ "content": self.content });
        if self.ephemeral {
            data["flags"] = json!(MESSAGE_FLAG_EPHEMERAL);
        }
        if self.suppress_mentions {
            data["allowed_mentions"] = json!({ "parse": [] });
        }
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text() {
        assert_eq!(truncate_for_message("hello"), "hello");
    }

    #[test]
    fn test_truncate_long_text() {
        let result = truncate_for_message(&"a".repeat(2500));
        assert!(result.len() <= MESSAGE_LIMIT);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let result = truncate_for_message(&"é".repeat(1500));
        assert!(result.len() <= MESSAGE_LIMIT);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_modifier_shapes_payload() {
        let modifier = ResponseModifier {
            show_for_invoking_user_only: true,
            suppress_mentions: true,
        };
        let data = modifier.apply("<@42> sunflowers").to_data();

        assert_eq!(data["flags"], 64);
        assert_eq!(data["allowed_mentions"]["parse"], json!([]));
        assert_eq!(data["content"], "<@42> sunflowers");
    }

    #[test]
    fn test_plain_message_has_no_flags() {
        let data = ResponseMessage::new("hi").to_data();
        assert!(data.get("flags").is_none());
    }
}
