use crate::llm::Provider;
use serde_json::Value;
use std::fmt;

/// Provider failure with enough context to diagnose it after the fact.
#[derive(Debug, Clone)]
pub struct LlmDiagnosticsError {
    pub provider: Provider,
    pub stage: &'static str,
    pub detail: String,
    pub raw_output: Option<String>,
    pub raw_response_json: Option<Value>,
}

impl LlmDiagnosticsError {
    pub(crate) fn http(provider: Provider, status: reqwest::StatusCode, body: String) -> Self {
        let raw_response_json = serde_json::from_str::<Value>(&body).ok();
        Self {
            provider,
            stage: "http",
            detail: format!("status={status}"),
            raw_output: Some(body),
            raw_response_json,
        }
    }

    /// 2xx body that is not JSON (`raw_response_json` is `None`) or does not
    /// match the expected response shape.
    pub(crate) fn decode(
        provider: Provider,
        body: String,
        raw_response_json: Option<Value>,
        err: impl fmt::Display,
    ) -> Self {
        Self {
            provider,
            stage: "decode",
            detail: err.to_string(),
            raw_output: Some(body),
            raw_response_json,
        }
    }

    /// Parses a successful response body, keeping the raw JSON next to the
    /// typed value.
    pub(crate) fn decode_body<T: serde::de::DeserializeOwned>(
        provider: Provider,
        body: String,
    ) -> Result<(Value, T), Self> {
        let raw_json = match serde_json::from_str::<Value>(&body) {
            Ok(v) => v,
            Err(err) => return Err(Self::decode(provider, body, None, err)),
        };
        match serde_json::from_value::<T>(raw_json.clone()) {
            Ok(parsed) => Ok((raw_json, parsed)),
            Err(err) => Err(Self::decode(provider, body, Some(raw_json), err)),
        }
    }

    pub(crate) fn empty(provider: Provider, raw_response_json: Value) -> Self {
        Self {
            provider,
            stage: "empty",
            detail: "response contains no text".to_string(),
            raw_output: None,
            raw_response_json: Some(raw_response_json),
        }
    }
}

impl fmt::Display for LlmDiagnosticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LLM error (provider={}, stage={}): {}",
            self.provider, self.stage, self.detail
        )
    }
}

impl std::error::Error for LlmDiagnosticsError {}
