use serde::{Deserialize, Serialize};

/// Token cap sent with every chat completion.
pub const MAX_COMPLETION_TOKENS: u32 = 4000;
/// Sampling temperature sent with every chat completion.
pub const COMPLETION_TEMPERATURE: f64 = 0.7;

/// One message in an OpenAI-style conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            format_type: "json_object".to_string(),
        }
    }
}

/// Payload for `POST /chat/completions` on the upstream API. The knobs
/// other than the model and prompt are fixed: JSON-object output, a hard
/// token cap, and no streaming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub response_format: ResponseFormat,
    pub max_tokens: u32,
    pub temperature: f64,
    pub stream: bool,
}

impl ChatCompletionRequest {
    pub fn single_user_message(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::user(prompt)],
            response_format: ResponseFormat::json_object(),
            max_tokens: MAX_COMPLETION_TOKENS,
            temperature: COMPLETION_TEMPERATURE,
            stream: false,
        }
    }
}
