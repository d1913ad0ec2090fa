use crate::config::LlmSettings;
use crate::domain::idea::Idea;
use crate::domain::request::IdeaRequest;
use crate::error::GenerateError;
use crate::llm::{json, ModelCatalog, Provider, ProviderRegistry};
use crate::prompt;

/// Prompts that would be sent for a request, without calling the model.
#[derive(Debug, Clone)]
pub struct PromptPreview {
    pub provider: Provider,
    pub system_prompt: String,
    pub user_prompt: String,
}

pub struct IdeaGenerator {
    registry: ProviderRegistry,
}

impl IdeaGenerator {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self { registry }
    }

    pub fn from_settings(settings: &LlmSettings) -> Self {
        Self::new(ProviderRegistry::from_settings(settings))
    }

    /// Resolves the provider hosting `request.model`, asks it for ideas and
    /// parses the reply. Nothing is retried.
    pub async fn generate_ideas(&self, request: &IdeaRequest) -> Result<Vec<Idea>, GenerateError> {
        let platform = self
            .registry
            .resolve(&request.api_key, &request.model)
            .await?;
        let provider = platform.provider();

        tracing::info!(
            %provider,
            model = %request.model,
            count = request.count,
            "generating gift ideas"
        );

        let result = platform
            .invoke(&request.model, &prompt::message_bag(request))
            .await?;

        let ideas = json::parse_ideas(result.as_text()).inspect_err(|err| {
            tracing::warn!(%provider, model = %request.model, error = %err, "unusable model reply");
        })?;

        tracing::info!(%provider, ideas_len = ideas.len(), "gift ideas generated");
        Ok(ideas)
    }

    pub async fn preview(&self, request: &IdeaRequest) -> Result<PromptPreview, GenerateError> {
        let platform = self
            .registry
            .resolve(&request.api_key, &request.model)
            .await?;
        Ok(PromptPreview {
            provider: platform.provider(),
            system_prompt: prompt::system_prompt(),
            user_prompt: prompt::user_prompt(request),
        })
    }

    pub async fn catalogs(&self, api_key: &str) -> anyhow::Result<Vec<(Provider, ModelCatalog)>> {
        self.registry.catalogs(api_key).await
    }
}
