//! Blocking language-model client.
//!
//! Calls are made one at a time from the caller's thread; there is no streaming and no
//! retry. Any OpenAI-compatible `chat/completions` endpoint works, including local
//! servers such as Ollama or LiteLLM.

use crate::{MinutesError, MinutesResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Something that turns a prompt into a free-text reply.
pub trait LanguageModel {
    /// Identifier of the underlying model, for logs.
    fn model_name(&self) -> &str;

    /// Sends a single-turn prompt and returns the reply text.
    fn complete(&self, prompt: &str) -> MinutesResult<String>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Extracts the first choice's text from a `chat/completions` response body.
fn parse_chat_response(body: &str) -> MinutesResult<String> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| MinutesError::ModelResponse(format!("malformed response: {e}")))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| MinutesError::ModelResponse("response contained no text".into()))
}

/// OpenAI-compatible chat-completions client.
#[derive(Debug, Clone)]
pub struct ChatCompletionsModel {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl ChatCompletionsModel {
    /// Creates a client for `model` at `base_url` (for example `https://api.openai.com/v1`).
    ///
    /// `api_key` is sent as a bearer token when present.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> MinutesResult<Self> {
        let model = model.into();
        if model.trim().is_empty() {
            return Err(MinutesError::InvalidInput("model name cannot be empty".into()));
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(MinutesError::ModelRequest)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

impl LanguageModel for ChatCompletionsModel {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn complete(&self, prompt: &str) -> MinutesResult<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.2,
        };

        let mut builder = self.client.post(self.endpoint()).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        tracing::debug!("sending {} byte prompt to {}", prompt.len(), self.model);
        let body = builder
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(MinutesError::ModelRequest)?;

        parse_chat_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_response_first_choice() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"[]"}},{"index":1,"message":{"role":"assistant","content":"ignored"}}]}"#;
        assert_eq!(parse_chat_response(body).unwrap(), "[]");
    }

    #[test]
    fn test_parse_chat_response_without_text_fails() {
        let err = parse_chat_response(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, MinutesError::ModelResponse(_)));

        let err = parse_chat_response(r#"{"choices":[{"message":{"content":null}}]}"#)
            .unwrap_err();
        assert!(matches!(err, MinutesError::ModelResponse(_)));
    }

    #[test]
    fn test_parse_chat_response_malformed_body() {
        assert!(matches!(
            parse_chat_response("<html>502</html>"),
            Err(MinutesError::ModelResponse(_))
        ));
    }

    #[test]
    fn test_new_normalises_base_url_and_key() {
        let model =
            ChatCompletionsModel::new("http://localhost:11434/v1/", Some(" ".into()), "llama3")
                .unwrap();
        assert_eq!(model.endpoint(), "http://localhost:11434/v1/chat/completions");
        assert!(model.api_key.is_none());
        assert_eq!(model.model_name(), "llama3");
    }

    #[test]
    fn test_new_rejects_empty_model() {
        assert!(ChatCompletionsModel::new("http://localhost", None, " ").is_err());
    }
}
