use crate::models::chat::ChatMessage;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

const DEFAULT_BASE_URL: &str = "https://api.groq.com";
const COMPLETIONS_PATH: &str = "/openai/v1/chat/completions";
const MODEL: &str = "llama-3.3-70b-versatile";
const TEMPERATURE: f32 = 0.8;
const MAX_TOKENS: u32 = 300;

/// Trailing history entries forwarded with each completion request.
const HISTORY_WINDOW: usize = 30;

const FALLBACK_REPLY: &str = "I'm having trouble thinking right now. Can you try again?";

/// Failure kinds at the provider boundary. Handlers map these to responses
/// without ever looking at provider error shapes themselves.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI provider rate limit hit")]
    RateLimited,
    #[error("AI provider request failed: {0}")]
    Upstream(String),
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: &'static str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for Groq's OpenAI-compatible chat completion API. One request per
/// chat call; no retries, failures surface immediately.
#[derive(Clone)]
pub struct GroqClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GroqClient {
    pub fn from_env() -> Result<Self, reqwest::Error> {
        let base_url = env::var("GROQ_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let api_key = env::var("GROQ_API_KEY").unwrap_or_default();
        if api_key.is_empty() {
            warn!("GROQ_API_KEY is not set; AI requests will be rejected upstream");
        }
        let timeout_secs = env::var("AI_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(30);
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(GroqClient {
            http,
            base_url,
            api_key,
        })
    }

    /// Forward `[system] + [history window] + [current turns]` to the
    /// provider and return the generated reply.
    pub async fn complete(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        current: Vec<ChatMessage>,
    ) -> Result<String, AiError> {
        let window = history_window(history);

        let mut messages = Vec::with_capacity(1 + window.len() + current.len());
        messages.push(ChatMessage {
            role: "system".to_string(),
            content: system_prompt.to_string(),
        });
        messages.extend(window.iter().cloned());
        messages.extend(current);

        let body = ChatCompletionRequest {
            model: MODEL,
            messages,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let request_id = uuid::Uuid::new_v4();
        info!(
            request_id = %request_id,
            context_messages = window.len(),
            "Forwarding chat completion request"
        );

        let response = self
            .http
            .post(format!("{}{}", self.base_url, COMPLETIONS_PATH))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::Upstream(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AiError::RateLimited);
        }
        if !status.is_success() {
            return Err(AiError::Upstream(format!("provider returned {status}")));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AiError::Upstream(e.to_string()))?;

        Ok(first_choice_text(completion))
    }
}

/// Last `HISTORY_WINDOW` entries of the supplied history, oldest first.
fn history_window(history: &[ChatMessage]) -> &[ChatMessage] {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    &history[start..]
}

fn first_choice_text(completion: ChatCompletionResponse) -> String {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .filter(|content| !content.is_empty())
        .unwrap_or_else(|| FALLBACK_REPLY.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turns(n: usize) -> Vec<ChatMessage> {
        (0..n)
            .map(|i| ChatMessage {
                role: if i % 2 == 0 { "user" } else { "assistant" }.to_string(),
                content: format!("turn {i}"),
            })
            .collect()
    }

    #[test]
    fn test_history_window_short_history_passes_through() {
        let history = turns(5);
        let window = history_window(&history);

        assert_eq!(window.len(), 5);
        assert_eq!(window[0].content, "turn 0");
    }

    #[test]
    fn test_history_window_truncates_to_trailing_30() {
        let history = turns(45);
        let window = history_window(&history);

        assert_eq!(window.len(), 30);
        // Suffix truncation keeps the most recent entries in original order
        assert_eq!(window[0].content, "turn 15");
        assert_eq!(window[29].content, "turn 44");
    }

    #[test]
    fn test_history_window_empty() {
        let window = history_window(&[]);
        assert!(window.is_empty());
    }

    #[test]
    fn test_first_choice_text_extracts_content() {
        let completion: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "hey you"}}]}"#,
        )
        .unwrap();

        assert_eq!(first_choice_text(completion), "hey you");
    }

    #[test]
    fn test_first_choice_text_falls_back_on_empty_choices() {
        let completion: ChatCompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();

        assert_eq!(first_choice_text(completion), FALLBACK_REPLY);
    }

    #[test]
    fn test_first_choice_text_falls_back_on_null_content() {
        let completion: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();

        assert_eq!(first_choice_text(completion), FALLBACK_REPLY);
    }
}
