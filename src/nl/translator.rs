//! NL-to-SQL translation over an OpenAI-compatible chat-completions API.
//!
//! The schema hint passed alongside the prompt has the form
//! `"table(col1, col2, ...)"` and is built from live reflected columns by
//! the session controller.

use crate::config::TranslatorConfig;
use crate::error::QuillError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that converts natural language to SQL for PostgreSQL. \
     Only return SQL.";

/// Narrow interface to the translation service.
#[async_trait]
pub trait SqlTranslator: Send + Sync {
    async fn translate(&self, prompt: &str, schema_hint: &str) -> Result<String, QuillError>;
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Client for an OpenAI-compatible `chat/completions` endpoint.
pub struct OpenAiTranslator {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiTranslator {
    pub fn new(config: TranslatorConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            model: config.model,
        }
    }
}

#[async_trait]
impl SqlTranslator for OpenAiTranslator {
    async fn translate(&self, prompt: &str, schema_hint: &str) -> Result<String, QuillError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
                ChatMessage {
                    role: "system".to_string(),
                    content: format!("Schema: {schema_hint}"),
                },
            ],
            temperature: 0.0,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(QuillError::translation)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QuillError::Translation {
                message: format!("{status}: {}", body.chars().take(200).collect::<String>()),
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(QuillError::translation)?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| QuillError::translation("no completion in response"))?;

        Ok(strip_code_fences(&content))
    }
}

/// Translator used when no API key is configured.
pub struct UnconfiguredTranslator;

#[async_trait]
impl SqlTranslator for UnconfiguredTranslator {
    async fn translate(&self, _prompt: &str, _schema_hint: &str) -> Result<String, QuillError> {
        Err(QuillError::translation(
            "no API key configured — set QUILL_OPENAI_API_KEY or OPENAI_API_KEY",
        ))
    }
}

/// Models wrap SQL in markdown fences more often than not.
fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    // Drop a language tag on the opening fence (```sql).
    let inner = match inner.split_once('\n') {
        Some((first, rest)) if !first.trim().contains(' ') => rest,
        _ => inner,
    };
    inner.trim().to_string()
}
