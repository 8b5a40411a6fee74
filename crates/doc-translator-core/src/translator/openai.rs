use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::http::{self, Attempt, RetryPolicy, invalid_response};
use super::traits::{Translator, TranslatorInfo};
use crate::config::{Lang, TranslatorConfig, language_name};
use crate::error::Result;

/// Local llama.cpp / Ollama style server
pub const DEFAULT_API_BASE: &str = "http://localhost:8080/v1";

const SERVICE: &str = "OpenAI-compatible API";

/// OpenAI-compatible API translator
/// Works with: llama.cpp server, Ollama, DeepSeek, OpenAI, etc.
pub struct OpenAiTranslator {
    client: Client,
    api_base: String,
    api_key: Option<String>,
    model: String,
    retry: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

impl OpenAiTranslator {
    pub fn new(config: &TranslatorConfig) -> Result<Self> {
        Ok(Self {
            client: http::build_client(config.timeout_secs)?,
            api_base: config.api_base.clone().unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: config.model.clone(),
            retry: RetryPolicy::new(config.retry_transient, config.retry_delay_ms),
        })
    }

    /// Create translation prompt
    fn create_prompt(text: &str, source: &Lang, target: &Lang) -> String {
        let source_hint = if source.as_str() == "auto" {
            String::new()
        } else {
            format!(" from {}", language_name(source))
        };
        format!(
            "Translate the following text{} into {}. Keep the line breaks. \
             Output only the translation, no explanations.\n\n{}",
            source_hint,
            language_name(target),
            text
        )
    }

    async fn request(&self, url: &str, request: &ChatRequest) -> Attempt<String> {
        let mut req = self.client.post(url).json(request);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }

        let response = http::send(SERVICE, req).await?;
        let chat_response: ChatResponse = response.json().await.map_err(|e| invalid_response(SERVICE, e))?;
        let choice = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| invalid_response(SERVICE, "no choices in response"))?;

        // Remove quotes if the model wrapped the response
        Ok(choice
            .message
            .content
            .trim()
            .trim_start_matches('"')
            .trim_end_matches('"')
            .to_string())
    }
}

#[async_trait]
impl Translator for OpenAiTranslator {
    fn info(&self) -> TranslatorInfo {
        TranslatorInfo {
            name: "OpenAI Compatible",
        }
    }

    async fn translate(&self, text: &str, source: &Lang, target: &Lang) -> Result<String> {
        // Skip empty text
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        // Skip if source and target are the same
        if source == target && source.as_str() != "auto" {
            return Ok(text.to_string());
        }

        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user",
                content: Self::create_prompt(text, source, target),
            }],
            temperature: Some(0.3), // Lower temperature for more consistent translations
        };

        debug!("Translation request to {} ({})", url, self.model);
        self.retry.run(SERVICE, || self.request(&url, &request)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_names_sinhala() {
        let prompt = OpenAiTranslator::create_prompt("Hello", &Lang::new("en"), &Lang::new("si"));
        assert!(prompt.contains("from English into Sinhala"));
        assert!(prompt.ends_with("Hello"));
    }

    #[test]
    fn test_prompt_auto_source() {
        let prompt = OpenAiTranslator::create_prompt("Hello", &Lang::new("auto"), &Lang::new("si"));
        assert!(prompt.starts_with("Translate the following text into Sinhala"));
    }

    #[test]
    fn test_default_api_base() {
        let translator = OpenAiTranslator::new(&TranslatorConfig::default()).ok();
        assert_eq!(translator.map(|t| t.api_base), Some(DEFAULT_API_BASE.to_string()));
    }
}
