//! Wire types for OpenAI-compatible chat completion and model listing.
//!
//! Every provider TextTuner talks to speaks this format, so one set of
//! types covers OpenAI, Google's OpenAI-compatible endpoint, and any
//! user-supplied custom base URL.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Messages
// ─────────────────────────────────────────────

/// A chat message. Each variant maps to a `role` field value.
///
/// Only the two roles a skill ever sends exist here: an optional system
/// instruction followed by the user's text.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "role")]
pub enum Message {
    #[serde(rename = "system")]
    System { content: String },

    #[serde(rename = "user")]
    User { content: String },
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Message::System {
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
        }
    }

    /// Role name as it appears on the wire.
    pub fn role(&self) -> &'static str {
        match self {
            Message::System { .. } => "system",
            Message::User { .. } => "user",
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Message::System { content } | Message::User { content } => content,
        }
    }
}

// ─────────────────────────────────────────────
// Chat completion request / response
// ─────────────────────────────────────────────

/// Request body for `POST {base}/chat/completions`.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
}

/// Raw chat completion response. Every level is optional so that decoding
/// never fails on shape alone; the decoder reports what was missing.
#[derive(Debug, Default, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Option<Vec<ChatChoice>>,
}

/// A single choice in a chat completion response.
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub message: Option<AssistantMessage>,
}

/// The assistant message within a chat completion choice.
#[derive(Debug, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Content of the first choice's message, if every step of the path exists.
    pub fn first_content(self) -> Option<String> {
        self.choices?.into_iter().next()?.message?.content
    }
}

// ─────────────────────────────────────────────
// Model listing
// ─────────────────────────────────────────────

/// Response body of `GET {base}/models`.
#[derive(Debug, Deserialize)]
pub struct ModelListResponse {
    pub data: Vec<ModelEntry>,
}

/// One entry in the model list.
#[derive(Debug, Deserialize)]
pub struct ModelEntry {
    pub id: String,
}

impl ModelListResponse {
    pub fn into_ids(self) -> Vec<String> {
        self.data.into_iter().map(|m| m.id).collect()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_system_message_serialization() {
        let msg = Message::system("Rewrite plainly.");
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "Rewrite plainly.");
    }

    #[test]
    fn test_user_message_serialization() {
        let msg = Message::user("hello");
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json, json!({"role": "user", "content": "hello"}));
    }

    #[test]
    fn test_request_body_shape() {
        let req = ChatCompletionRequest {
            model: "gpt-4".into(),
            messages: vec![Message::system("sys"), Message::user("hi")],
        };
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(
            json,
            json!({
                "model": "gpt-4",
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "hi"}
                ]
            })
        );
    }

    #[test]
    fn test_first_content_present() {
        let resp: ChatCompletionResponse = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "choices": [
                {"message": {"role": "assistant", "content": "first"}},
                {"message": {"role": "assistant", "content": "second"}}
            ]
        }))
        .unwrap();

        assert_eq!(resp.first_content().as_deref(), Some("first"));
    }

    #[test]
    fn test_first_content_missing_levels() {
        let empty: ChatCompletionResponse = serde_json::from_value(json!({})).unwrap();
        assert!(empty.first_content().is_none());

        let no_choices: ChatCompletionResponse =
            serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(no_choices.first_content().is_none());

        let null_content: ChatCompletionResponse =
            serde_json::from_value(json!({"choices": [{"message": {"content": null}}]})).unwrap();
        assert!(null_content.first_content().is_none());
    }

    #[test]
    fn test_model_list_ids() {
        let resp: ModelListResponse = serde_json::from_value(json!({
            "object": "list",
            "data": [{"id": "gpt-4", "object": "model"}, {"id": "gpt-4o"}]
        }))
        .unwrap();

        assert_eq!(resp.into_ids(), vec!["gpt-4", "gpt-4o"]);
    }
}
