use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::config;

/// Best-effort extraction result. Every field is optional: the model may
/// return any subset, junk collapses to the empty record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedEmail {
    pub title: Option<String>,
    pub candidate_name: Option<String>,
    pub stage: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("Email parser is not configured")]
    NotConfigured,
    #[error("Parser request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Parser returned an unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Seam for the external email-to-fields collaborator. The pipeline only
/// depends on this contract, not on any specific model vendor.
#[async_trait]
pub trait EmailParser: Send + Sync {
    async fn extract(&self, text: &str) -> Result<ParsedEmail, ParserError>;
}

pub struct OpenAiEmailParser {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl OpenAiEmailParser {
    pub fn from_config() -> Self {
        let parser = &config::config().parser;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(parser.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: parser.api_key.clone(),
            base_url: parser.base_url.trim_end_matches('/').to_string(),
            model: parser.model.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl EmailParser for OpenAiEmailParser {
    async fn extract(&self, text: &str) -> Result<ParsedEmail, ParserError> {
        let api_key = self.api_key.as_deref().ok_or(ParserError::NotConfigured)?;

        let body = json!({
            "model": self.model,
            "temperature": 0.2,
            "messages": [
                {
                    "role": "system",
                    "content": "You extract structured JSON from recruitment scheduling emails. \
                                Always respond with valid JSON containing keys title, \
                                candidate_name, stage, status.",
                },
                {
                    "role": "user",
                    "content": format!(
                        "Email body: \"\"\"{}\"\"\"\n\nInfer the case title, candidate name, \
                         interview stage and status from the text above and answer as JSON. \
                         Example: {{\"title\":\"AI Consultant\",\"candidate_name\":\"Taro \
                         Yamada\",\"stage\":\"1st Interview\",\"status\":\"Scheduling\"}}",
                        text
                    ),
                },
            ],
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ParserError::UnexpectedResponse(format!(
                "status {}",
                response.status()
            )));
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content);

        Ok(match content {
            Some(content) => parse_content(&content),
            None => ParsedEmail::default(),
        })
    }
}

/// Pull the extraction record out of whatever the model sent back. Code
/// fences and surrounding prose are tolerated; anything unusable is the
/// empty record, never an error.
pub fn parse_content(content: &str) -> ParsedEmail {
    let trimmed = content.trim();

    let candidate = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(open), Some(close)) if open < close => &trimmed[open..=close],
        _ => return ParsedEmail::default(),
    };

    match serde_json::from_str::<ParsedEmail>(candidate) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::warn!("Discarding unparsable extraction output: {}", err);
            ParsedEmail::default()
        }
    }
}

static DEFAULT_PARSER: Lazy<OpenAiEmailParser> = Lazy::new(OpenAiEmailParser::from_config);

pub fn default_parser() -> &'static OpenAiEmailParser {
    &DEFAULT_PARSER
}
