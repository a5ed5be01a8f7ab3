//! services/api/src/adapters/classifier_llm.rs
//!
//! This module contains the adapter for the classification LLM.
//! It implements the `ClassificationProvider` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use authenticity_core::{
    domain::ClassifierOutput,
    ports::{ClassificationProvider, ProviderError},
};
use tracing::debug;

//=========================================================================================
// Prompt
//=========================================================================================

const SYSTEM_PROMPT: &str = r#"You are an AI-content detector. Decide whether the user's text was written by a human, generated by an AI model, or is a mix of both.

Respond with a single JSON object and nothing else, using exactly these fields:
{
  "classification": "human" | "ai" | "mixed",
  "confidenceScore": number between 0 and 100,
  "reasoning": short explanation of the verdict,
  "suspiciousSegments": [
    { "text": quoted passage, "startIndex": character offset, "endIndex": character offset, "score": number between 0 and 1 }
  ]
}

List only passages that look machine-generated. Use an empty array for human-written text."#;

/// Texts are truncated to this many characters before being sent.
const MAX_INPUT_CHARS: usize = 12_000;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

pub struct OpenAiClassifierAdapter {
    /// `None` when no API key was configured.
    client: Option<Client<OpenAIConfig>>,
    model: String,
}

impl OpenAiClassifierAdapter {
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self {
            client: Some(client),
            model,
        }
    }

    /// An adapter that reports itself as not configured and never calls out.
    pub fn unconfigured(model: String) -> Self {
        Self {
            client: None,
            model,
        }
    }
}

#[async_trait]
impl ClassificationProvider for OpenAiClassifierAdapter {
    fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    async fn classify(&self, text: &str) -> Result<ClassifierOutput, ProviderError> {
        let client = self.client.as_ref().ok_or(ProviderError::NotConfigured)?;
        let input: String = text.chars().take(MAX_INPUT_CHARS).collect();

        let messages = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(SYSTEM_PROMPT)
                    .build()
                    .map_err(call_failed)?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(input)
                    .build()
                    .map_err(call_failed)?,
            ),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .response_format(ResponseFormat::JsonObject)
            .temperature(0.0)
            .build()
            .map_err(call_failed)?;

        let response = client.chat().create(request).await.map_err(call_failed)?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| ProviderError::CallFailed("No classification returned".to_string()))?;

        debug!(model = %self.model, "Received classification response");
        parse_classification(&content)
    }
}

fn call_failed(e: impl std::fmt::Display) -> ProviderError {
    ProviderError::CallFailed(e.to_string())
}

/// Parses the model's reply into a `ClassifierOutput`.
///
/// Models sometimes wrap the JSON in a markdown fence or add a sentence around it,
/// so only the outermost `{ ... }` is read.
pub fn parse_classification(content: &str) -> Result<ClassifierOutput, ProviderError> {
    let start = content.find('{');
    let end = content.rfind('}');
    let json = match (start, end) {
        (Some(s), Some(e)) if s < e => &content[s..=e],
        _ => {
            return Err(ProviderError::CallFailed(
                "Classification response contained no JSON object".to_string(),
            ))
        }
    };
    serde_json::from_str(json)
        .map_err(|e| ProviderError::CallFailed(format!("Malformed classification response: {e}")))
}
