//! # Prompt & Chat Payloads
//!
//! $$
//! \text{request} = (\text{model},\ [\text{system}, \text{user}],\ \tau,\ n_{\max})
//! $$
//!
//! Builds the selection prompt and the chat payload for an Ollama-style
//! `/api/chat` endpoint, and reads the assistant content back out of the reply.

use serde::Deserialize;
use serde::Serialize;

use crate::error::PipelineError;

/// System instruction sent with every selection request.
pub const SYSTEM_PROMPT: &str = "You are a financial analyst. Return ONLY valid JSON.";

/// Model endpoint settings. Passed explicitly; the transport lives with the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
  /// Model name as known to the endpoint.
  pub model: String,
  /// Endpoint base URL.
  pub base_url: String,
  /// Sampling temperature.
  pub temperature: f64,
  /// Upper bound on generated tokens.
  pub max_tokens: u32,
}

impl Default for LlmConfig {
  fn default() -> Self {
    Self {
      model: "gemma2".to_string(),
      base_url: "http://localhost:11434".to_string(),
      temperature: 0.0,
      max_tokens: 800,
    }
  }
}

impl LlmConfig {
  /// Full chat endpoint URL.
  pub fn chat_url(&self) -> String {
    format!("{}/api/chat", self.base_url.trim_end_matches('/'))
  }
}

/// One chat turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
  pub role: String,
  pub content: String,
}

impl ChatMessage {
  pub fn system(content: impl Into<String>) -> Self {
    Self {
      role: "system".to_string(),
      content: content.into(),
    }
  }

  pub fn user(content: impl Into<String>) -> Self {
    Self {
      role: "user".to_string(),
      content: content.into(),
    }
  }
}

/// Build the system and user turns asking for a long/short portfolio.
pub fn build_prompt(headlines: &str, universe_hint: &str, positions: usize) -> Vec<ChatMessage> {
  let user = format!(
    "Read the headlines below. Propose a market-neutral long/short portfolio with {positions} positions.
Universe hint: {universe_hint}

Return a JSON array of objects with:
- stock: a stock identifier (ticker is fine)
- weight: a real number; long positive, short negative; absolute weights should sum to 1

Headlines:
{headlines}
"
  );

  vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)]
}

/// Sampling options of a chat request.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatOptions {
  pub temperature: f64,
  pub num_predict: u32,
}

/// Non-streaming chat request payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatRequest {
  pub model: String,
  pub messages: Vec<ChatMessage>,
  pub stream: bool,
  pub options: ChatOptions,
}

impl ChatRequest {
  pub fn new(config: &LlmConfig, messages: Vec<ChatMessage>) -> Self {
    Self {
      model: config.model.clone(),
      messages,
      stream: false,
      options: ChatOptions {
        temperature: config.temperature,
        num_predict: config.max_tokens,
      },
    }
  }

  /// Serialize to the JSON body expected by the endpoint.
  pub fn to_json(&self) -> serde_json::Result<String> {
    serde_json::to_string(self)
  }
}

/// Assistant turn of a chat reply.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ResponseMessage {
  #[serde(default)]
  pub role: String,
  pub content: String,
}

/// Chat reply payload; only the message is read.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChatResponse {
  pub message: ResponseMessage,
}

/// Pull the assistant text out of a chat reply body.
pub fn extract_content(body: &str) -> Result<String, PipelineError> {
  let response: ChatResponse = serde_json::from_str(body)
    .map_err(|e| PipelineError::malformed(format!("unexpected chat reply: {e}")))?;
  Ok(response.message.content)
}
