//! Chat-completions client shared by OpenAI and Mistral, which expose the same
//! `/v1/chat/completions` contract.

use crate::config::LlmSettings;
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::{
    http_client, MessageBag, ModelCatalog, ModelResult, Platform, Provider, Role,
};
use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    provider: Provider,
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    max_tokens: u32,
    extra_models: Vec<String>,
}

impl ChatCompletionsClient {
    pub fn openai(api_key: &str, settings: &LlmSettings) -> anyhow::Result<Self> {
        Self::new(Provider::OpenAI, &settings.openai_base_url, api_key, settings)
    }

    pub fn mistral(api_key: &str, settings: &LlmSettings) -> anyhow::Result<Self> {
        Self::new(Provider::Mistral, &settings.mistral_base_url, api_key, settings)
    }

    fn new(
        provider: Provider,
        base_url: &str,
        api_key: &str,
        settings: &LlmSettings,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            provider,
            http: http_client(settings.timeout_secs)?,
            api_key: api_key.to_string(),
            base_url: base_url.to_string(),
            max_tokens: settings.max_tokens,
            extra_models: settings.extra_models_for(provider).to_vec(),
        })
    }

    async fn create_completion(
        &self,
        req: ChatCompletionRequest<'_>,
    ) -> anyhow::Result<(serde_json::Value, ChatCompletionResponse)> {
        let url = format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        );
        let res = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .with_context(|| format!("{} request failed", self.provider))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .with_context(|| format!("failed to read {} response body", self.provider))?;
        if !status.is_success() {
            return Err(LlmDiagnosticsError::http(self.provider, status, text).into());
        }

        let decoded = LlmDiagnosticsError::decode_body(self.provider, text)?;
        Ok(decoded)
    }
}

#[async_trait::async_trait]
impl Platform for ChatCompletionsClient {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn model_catalog(&self) -> anyhow::Result<ModelCatalog> {
        Ok(ModelCatalog::builtin(self.provider, &self.extra_models))
    }

    async fn invoke(&self, model: &str, messages: &MessageBag) -> anyhow::Result<ModelResult> {
        // OpenAI takes `max_completion_tokens`, Mistral only `max_tokens`.
        let (max_tokens, max_completion_tokens) = match self.provider {
            Provider::OpenAI => (None, Some(self.max_tokens)),
            _ => (Some(self.max_tokens), None),
        };
        let req = ChatCompletionRequest {
            model,
            max_tokens,
            max_completion_tokens,
            messages: messages
                .messages()
                .iter()
                .map(|m| ChatMessage {
                    role: m.role,
                    content: &m.content,
                })
                .collect(),
        };

        let (raw_json, res) = self.create_completion(req).await?;
        let text = res
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty());

        match text {
            Some(text) => Ok(ModelResult::new(text, raw_json)),
            None => Err(LlmDiagnosticsError::empty(self.provider, raw_json).into()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
