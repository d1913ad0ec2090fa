use crate::config::LlmSettings;
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::{http_client, MessageBag, ModelCatalog, ModelResult, Platform, Provider};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    max_tokens: u32,
    extra_models: Vec<String>,
}

impl AnthropicClient {
    pub fn new(api_key: &str, settings: &LlmSettings) -> anyhow::Result<Self> {
        Ok(Self {
            http: http_client(settings.timeout_secs)?,
            api_key: api_key.to_string(),
            base_url: settings.anthropic_base_url.clone(),
            max_tokens: settings.max_tokens,
            extra_models: settings.extra_models_for(Provider::Anthropic).to_vec(),
        })
    }

    async fn create_message(
        &self,
        req: CreateMessageRequest<'_>,
    ) -> anyhow::Result<(serde_json::Value, CreateMessageResponse)> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key).context("API key is not a valid header value")?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .post(url)
            .headers(headers)
            .json(&req)
            .send()
            .await
            .context("Anthropic request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Anthropic response body")?;
        if !status.is_success() {
            return Err(LlmDiagnosticsError::http(Provider::Anthropic, status, text).into());
        }

        let decoded = LlmDiagnosticsError::decode_body(Provider::Anthropic, text)?;
        Ok(decoded)
    }

    fn response_text(res: &CreateMessageResponse) -> String {
        let mut out = String::new();
        for block in &res.content {
            if let ContentBlock::Text { text } = block {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(text);
            }
        }
        out
    }
}

#[async_trait::async_trait]
impl Platform for AnthropicClient {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn model_catalog(&self) -> anyhow::Result<ModelCatalog> {
        Ok(ModelCatalog::builtin(Provider::Anthropic, &self.extra_models))
    }

    async fn invoke(&self, model: &str, messages: &MessageBag) -> anyhow::Result<ModelResult> {
        let system = messages.system_text();
        let req = CreateMessageRequest {
            model,
            max_tokens: self.max_tokens,
            system: system.as_deref(),
            messages: messages
                .conversation()
                .map(|m| Message {
                    role: "user",
                    content: &m.content,
                })
                .collect(),
        };

        let (raw_json, res) = self.create_message(req).await?;
        if matches!(res.stop_reason.as_deref(), Some("max_tokens")) {
            tracing::warn!(
                model,
                max_tokens = self.max_tokens,
                "Anthropic stop_reason=max_tokens; reply may be truncated"
            );
        }

        let text = Self::response_text(&res);
        if text.trim().is_empty() {
            return Err(LlmDiagnosticsError::empty(Provider::Anthropic, raw_json).into());
        }
        Ok(ModelResult::new(text, raw_json))
    }
}

#[derive(Debug, Serialize)]
struct CreateMessageRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct CreateMessageResponse {
    content: Vec<ContentBlock>,

    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },

    #[serde(other)]
    Unknown,
}
