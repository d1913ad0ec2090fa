pub mod anthropic;
pub mod catalog;
pub mod error;
pub mod gemini;
pub mod json;
pub mod openai;
pub mod resolver;

pub use catalog::{ModelCatalog, ModelDescriptor};
pub use resolver::ProviderRegistry;

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Gemini,
    OpenAI,
    Mistral,
    Anthropic,
}

impl Provider {
    /// Order in which catalogs are checked. The first provider listing a model wins.
    pub const PRIORITY: [Provider; 4] = [
        Provider::Gemini,
        Provider::OpenAI,
        Provider::Mistral,
        Provider::Anthropic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::OpenAI => "openai",
            Provider::Mistral => "mistral",
            Provider::Anthropic => "anthropic",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn for_system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn of_user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Ordered conversation handed to a provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageBag {
    messages: Vec<Message>,
}

impl MessageBag {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// System turns joined by blank lines, for APIs that take the system
    /// prompt outside the message list.
    pub fn system_text(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n"))
        }
    }

    pub fn conversation(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.role != Role::System)
    }
}

/// Reply of a single invocation.
#[derive(Debug, Clone)]
pub struct ModelResult {
    text: String,
    pub raw_response_json: serde_json::Value,
}

impl ModelResult {
    pub fn new(text: String, raw_response_json: serde_json::Value) -> Self {
        Self {
            text,
            raw_response_json,
        }
    }

    pub fn as_text(&self) -> &str {
        &self.text
    }
}

/// A provider client bound to one API key.
#[async_trait::async_trait]
pub trait Platform: Send + Sync {
    fn provider(&self) -> Provider;

    async fn model_catalog(&self) -> anyhow::Result<ModelCatalog>;

    async fn invoke(&self, model: &str, messages: &MessageBag) -> anyhow::Result<ModelResult>;
}

pub(crate) fn http_client(timeout_secs: u64) -> anyhow::Result<reqwest::Client> {
    use anyhow::Context;

    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .context("failed to build reqwest client")
}
