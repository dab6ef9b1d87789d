//! OpenAI-compatible chat-completions client.

use crate::config::GenerationConfig;
use crate::generation::{GenerationError, GenerationResult, TextGenerator};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const DRAFT_SYSTEM_PROMPT: &str = "You are a professional report writer. Generate a well-structured report draft based on the given title.";
const SUMMARY_SYSTEM_PROMPT: &str = "You are a professional content summarizer. Create a concise summary of the given report content, highlighting the key points and main ideas.";
const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// [`TextGenerator`] backed by an OpenAI-compatible `/chat/completions` API.
#[derive(Clone)]
pub struct OpenAiTextGenerator {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl OpenAiTextGenerator {
    /// Builds a client with the configured timeout.
    ///
    /// A missing API key is accepted here and reported on each call.
    pub fn new(config: &GenerationConfig) -> GenerationResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| GenerationError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, operation: &str, system: &str, user: &str) -> GenerationResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GenerationError::MissingApiKey)?;
        let started_at = Instant::now();
        debug!(
            "event=generation_call module=generation status=start operation={} model={} prompt_chars={}",
            operation,
            self.model,
            user.chars().count()
        );

        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let result = self.send(api_key, &request).await;
        match &result {
            Ok(text) => debug!(
                "event=generation_call module=generation status=ok operation={} duration_ms={} output_chars={}",
                operation,
                started_at.elapsed().as_millis(),
                text.chars().count()
            ),
            Err(err) => warn!(
                "event=generation_call module=generation status=error operation={} duration_ms={} error={}",
                operation,
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    async fn send(&self, api_key: &str, request: &ChatRequest<'_>) -> GenerationResult<String> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                code: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY_CHARS),
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|err| {
            if err.is_timeout() {
                GenerationError::Timeout
            } else {
                GenerationError::InvalidResponse(err.to_string())
            }
        })?;
        completion_text(parsed)
    }
}

#[async_trait]
impl TextGenerator for OpenAiTextGenerator {
    async fn generate_draft(&self, title: &str) -> GenerationResult<String> {
        let prompt = format!(
            "Generate a professional report draft for the title: \"{title}\". The report should include an introduction, main sections, and a conclusion."
        );
        self.complete("draft", DRAFT_SYSTEM_PROMPT, &prompt).await
    }

    async fn summarize_content(&self, content: &str) -> GenerationResult<String> {
        let prompt = format!(
            "Please summarize the following report content in a clear and concise manner:\n\n{content}"
        );
        self.complete("summarize", SUMMARY_SYSTEM_PROMPT, &prompt)
            .await
    }
}

fn completion_text(response: ChatResponse) -> GenerationResult<String> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::InvalidResponse("no choices returned".to_string()))?;
    match choice.message.content {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(GenerationError::InvalidResponse(
            "completion has no text content".to_string(),
        )),
    }
}

fn transport_error(err: reqwest::Error) -> GenerationError {
    if err.is_timeout() {
        GenerationError::Timeout
    } else {
        GenerationError::Transport(err.to_string())
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    let mut truncated = value.chars().take(max_chars).collect::<String>();
    if value.chars().count() > max_chars {
        truncated.push_str("...");
    }
    truncated
}

#[cfg(test)]
mod tests {
    use super::{completion_text, truncate, ChatResponse, OpenAiTextGenerator};
    use crate::config::GenerationConfig;
    use crate::generation::{GenerationError, TextGenerator};

    fn parse(json: &str) -> ChatResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn completion_text_takes_first_choice() {
        let response =
            parse(r#"{"choices":[{"message":{"content":"Intro"}},{"message":{"content":"x"}}]}"#);
        assert_eq!(completion_text(response).unwrap(), "Intro");
    }

    #[test]
    fn completion_text_rejects_empty_or_missing_content() {
        let empty = parse(r#"{"choices":[]}"#);
        assert!(matches!(
            completion_text(empty),
            Err(GenerationError::InvalidResponse(_))
        ));

        let blank = parse(r#"{"choices":[{"message":{"content":"  "}}]}"#);
        assert!(completion_text(blank).is_err());

        let null = parse(r#"{"choices":[{"message":{"content":null}}]}"#);
        assert!(completion_text(null).is_err());
    }

    #[test]
    fn truncate_caps_long_bodies() {
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("abc", 3), "abc");
    }

    #[tokio::test]
    async fn calls_without_api_key_fail_before_any_request() {
        let config = GenerationConfig {
            api_key: None,
            ..GenerationConfig::default()
        };
        let generator = OpenAiTextGenerator::new(&config).unwrap();
        let err = generator.generate_draft("Q1 Plan").await.unwrap_err();
        assert_eq!(err, GenerationError::MissingApiKey);
    }
}
