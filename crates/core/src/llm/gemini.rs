use crate::config::LlmSettings;
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::{http_client, MessageBag, ModelCatalog, ModelResult, Platform, Provider};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    max_tokens: u32,
    extra_models: Vec<String>,
}

impl GeminiClient {
    pub fn new(api_key: &str, settings: &LlmSettings) -> anyhow::Result<Self> {
        Ok(Self {
            http: http_client(settings.timeout_secs)?,
            api_key: api_key.to_string(),
            base_url: settings.gemini_base_url.clone(),
            max_tokens: settings.max_tokens,
            extra_models: settings.extra_models_for(Provider::Gemini).to_vec(),
        })
    }

    async fn generate_content(
        &self,
        model: &str,
        req: GenerateContentRequest<'_>,
    ) -> anyhow::Result<(serde_json::Value, GenerateContentResponse)> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(&self.api_key).context("API key is not a valid header value")?,
        );

        let url = format!(
            "{}/v1beta/models/{model}:generateContent",
            self.base_url.trim_end_matches('/')
        );
        let res = self
            .http
            .post(url)
            .headers(headers)
            .json(&req)
            .send()
            .await
            .context("Gemini request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Gemini response body")?;
        if !status.is_success() {
            return Err(LlmDiagnosticsError::http(Provider::Gemini, status, text).into());
        }

        let decoded = LlmDiagnosticsError::decode_body(Provider::Gemini, text)?;
        Ok(decoded)
    }

    fn response_text(res: &GenerateContentResponse) -> String {
        res.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Platform for GeminiClient {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn model_catalog(&self) -> anyhow::Result<ModelCatalog> {
        Ok(ModelCatalog::builtin(Provider::Gemini, &self.extra_models))
    }

    async fn invoke(&self, model: &str, messages: &MessageBag) -> anyhow::Result<ModelResult> {
        let system = messages.system_text();
        let req = GenerateContentRequest {
            system_instruction: system.as_deref().map(|text| Content {
                role: None,
                parts: vec![Part { text }],
            }),
            contents: messages
                .conversation()
                .map(|m| Content {
                    role: Some("user"),
                    parts: vec![Part { text: &m.content }],
                })
                .collect(),
            generation_config: GenerationConfig {
                max_output_tokens: self.max_tokens,
            },
        };

        let (raw_json, res) = self.generate_content(model, req).await?;
        let text = Self::response_text(&res);
        if text.trim().is_empty() {
            return Err(LlmDiagnosticsError::empty(Provider::Gemini, raw_json).into());
        }
        Ok(ModelResult::new(text, raw_json))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}
