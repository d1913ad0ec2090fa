use crate::config::LlmSettings;
use crate::error::GenerateError;
use crate::llm::anthropic::AnthropicClient;
use crate::llm::gemini::GeminiClient;
use crate::llm::openai::ChatCompletionsClient;
use crate::llm::{ModelCatalog, Platform, Provider};

/// Builds a provider client from a caller-supplied API key.
pub type PlatformFactory =
    Box<dyn Fn(&str) -> anyhow::Result<Box<dyn Platform>> + Send + Sync>;

struct RegistryEntry {
    provider: Provider,
    factory: PlatformFactory,
}

/// Providers in resolution order.
#[derive(Default)]
pub struct ProviderRegistry {
    entries: Vec<RegistryEntry>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The production registry, in [`Provider::PRIORITY`] order.
    pub fn from_settings(settings: &LlmSettings) -> Self {
        let mut registry = Self::new();
        for provider in Provider::PRIORITY {
            let settings = settings.clone();
            registry = match provider {
                Provider::Gemini => registry.with_provider(provider, move |key: &str| {
                    Ok(Box::new(GeminiClient::new(key, &settings)?) as Box<dyn Platform>)
                }),
                Provider::OpenAI => registry.with_provider(provider, move |key: &str| {
                    Ok(Box::new(ChatCompletionsClient::openai(key, &settings)?) as Box<dyn Platform>)
                }),
                Provider::Mistral => registry.with_provider(provider, move |key: &str| {
                    Ok(Box::new(ChatCompletionsClient::mistral(key, &settings)?) as Box<dyn Platform>)
                }),
                Provider::Anthropic => registry.with_provider(provider, move |key: &str| {
                    Ok(Box::new(AnthropicClient::new(key, &settings)?) as Box<dyn Platform>)
                }),
            };
        }
        registry
    }

    /// Appends a provider after the ones already registered.
    pub fn with_provider<F>(mut self, provider: Provider, factory: F) -> Self
    where
        F: Fn(&str) -> anyhow::Result<Box<dyn Platform>> + Send + Sync + 'static,
    {
        self.entries.push(RegistryEntry {
            provider,
            factory: Box::new(factory),
        });
        self
    }

    pub fn providers(&self) -> impl Iterator<Item = Provider> + '_ {
        self.entries.iter().map(|e| e.provider)
    }

    /// Returns the first provider, in registration order, whose catalog lists
    /// `model`. Later catalogs are not fetched once a match is found, even if
    /// they list the same id.
    pub async fn resolve(
        &self,
        api_key: &str,
        model: &str,
    ) -> Result<Box<dyn Platform>, GenerateError> {
        for entry in &self.entries {
            let platform = (entry.factory)(api_key)?;
            let catalog = platform.model_catalog().await?;
            if let Some(descriptor) = catalog.get(model) {
                tracing::debug!(
                    provider = %entry.provider,
                    model,
                    display_name = %descriptor.display_name,
                    "model resolved"
                );
                return Ok(platform);
            }
            tracing::debug!(
                provider = %entry.provider,
                model,
                catalog_len = catalog.len(),
                "model not in catalog"
            );
        }

        Err(GenerateError::UnavailableModel(model.to_string()))
    }

    /// Every provider's catalog, in registration order.
    pub async fn catalogs(&self, api_key: &str) -> anyhow::Result<Vec<(Provider, ModelCatalog)>> {
        let mut out = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let platform = (entry.factory)(api_key)?;
            out.push((entry.provider, platform.model_catalog().await?));
        }
        Ok(out)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::llm::{MessageBag, ModelDescriptor, ModelResult};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Platform with a fixed catalog and canned reply.
    pub(crate) struct FakePlatform {
        pub provider: Provider,
        pub models: Vec<String>,
        pub reply: String,
        pub catalog_fetches: Arc<AtomicUsize>,
        pub invocations: Arc<Mutex<Vec<(String, MessageBag)>>>,
    }

    #[async_trait::async_trait]
    impl Platform for FakePlatform {
        fn provider(&self) -> Provider {
            self.provider
        }

        async fn model_catalog(&self) -> anyhow::Result<ModelCatalog> {
            self.catalog_fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .models
                .iter()
                .map(|id| ModelDescriptor {
                    id: id.clone(),
                    display_name: id.clone(),
                })
                .collect())
        }

        async fn invoke(&self, model: &str, messages: &MessageBag) -> anyhow::Result<ModelResult> {
            self.invocations
                .lock()
                .unwrap()
                .push((model.to_string(), messages.clone()));
            Ok(ModelResult::new(self.reply.clone(), serde_json::Value::Null))
        }
    }

    #[derive(Clone, Default)]
    pub(crate) struct Tally {
        pub catalog_fetches: Arc<AtomicUsize>,
        pub invocations: Arc<Mutex<Vec<(String, MessageBag)>>>,
    }

    impl Tally {
        pub fn count(&self) -> usize {
            self.catalog_fetches.load(Ordering::SeqCst)
        }
    }

    pub(crate) fn fake_registry(
        providers: &[(Provider, Vec<&str>, &str)],
    ) -> (ProviderRegistry, Vec<Tally>) {
        let mut registry = ProviderRegistry::new();
        let mut tallies = Vec::new();
        for (provider, models, reply) in providers {
            let tally = Tally::default();
            let provider = *provider;
            let models: Vec<String> = models.iter().map(|m| m.to_string()).collect();
            let reply = reply.to_string();
            let p = tally.clone();
            registry = registry.with_provider(provider, move |_key: &str| {
                Ok(Box::new(FakePlatform {
                    provider,
                    models: models.clone(),
                    reply: reply.clone(),
                    catalog_fetches: p.catalog_fetches.clone(),
                    invocations: p.invocations.clone(),
                }) as Box<dyn Platform>)
            });
            tallies.push(tally);
        }
        (registry, tallies)
    }

    #[tokio::test]
    async fn first_catalog_match_wins() {
        let (registry, tallies) = fake_registry(&[
            (Provider::Gemini, vec![], ""),
            (Provider::OpenAI, vec!["m1"], ""),
            (Provider::Mistral, vec!["m1"], ""),
        ]);

        let platform = registry.resolve("key", "m1").await.unwrap();
        assert_eq!(platform.provider(), Provider::OpenAI);
        assert_eq!(tallies[0].count(), 1);
        assert_eq!(tallies[1].count(), 1);
        assert_eq!(tallies[2].count(), 0);
    }

    #[tokio::test]
    async fn unknown_model_checks_every_provider() {
        let (registry, tallies) = fake_registry(&[
            (Provider::Gemini, vec!["a"], ""),
            (Provider::OpenAI, vec!["b"], ""),
            (Provider::Mistral, vec!["c"], ""),
            (Provider::Anthropic, vec!["d"], ""),
        ]);

        let err = match registry.resolve("key", "zzz").await {
            Err(err) => err,
            Ok(p) => panic!("unexpected provider {}", p.provider()),
        };
        assert!(matches!(err, GenerateError::UnavailableModel(ref m) if m == "zzz"));
        assert!(tallies.iter().all(|p| p.count() == 1));
    }

    #[tokio::test]
    async fn catalog_is_refetched_on_every_resolve() {
        let (registry, tallies) = fake_registry(&[(Provider::Anthropic, vec!["m"], "")]);
        registry.resolve("key", "m").await.unwrap();
        registry.resolve("key", "m").await.unwrap();
        assert_eq!(tallies[0].count(), 2);
    }

    #[tokio::test]
    async fn factory_failure_propagates() {
        let registry = ProviderRegistry::new()
            .with_provider(Provider::Gemini, |_key: &str| anyhow::bail!("tls backend unavailable"));
        let err = match registry.resolve("key", "m").await {
            Err(err) => err,
            Ok(_) => panic!("expected failure"),
        };
        assert!(matches!(err, GenerateError::Provider(_)));
    }

    #[tokio::test]
    async fn default_registry_follows_priority_order() {
        let registry = ProviderRegistry::from_settings(&LlmSettings::default());
        let providers: Vec<_> = registry.providers().collect();
        assert_eq!(providers, Provider::PRIORITY);

        let cases = [
            ("gemini-2.5-flash", Provider::Gemini),
            ("gpt-4o-mini", Provider::OpenAI),
            ("mistral-large-latest", Provider::Mistral),
            ("claude-sonnet-4-5", Provider::Anthropic),
        ];
        for (model, expected) in cases {
            let platform = registry.resolve("not-a-real-key", model).await.unwrap();
            assert_eq!(platform.provider(), expected, "{model}");
        }
    }

    #[tokio::test]
    async fn extra_models_make_ambiguous_ids_resolve_by_priority() {
        let mut settings = LlmSettings::default();
        settings
            .extra_models
            .insert(Provider::Anthropic, vec!["shared".to_string()]);
        settings
            .extra_models
            .insert(Provider::OpenAI, vec!["shared".to_string()]);

        let registry = ProviderRegistry::from_settings(&settings);
        let platform = registry.resolve("k", "shared").await.unwrap();
        assert_eq!(platform.provider(), Provider::OpenAI);
    }

    #[tokio::test]
    async fn lists_catalogs_in_order() {
        let registry = ProviderRegistry::from_settings(&LlmSettings::default());
        let catalogs = registry.catalogs("k").await.unwrap();
        assert_eq!(catalogs.len(), 4);
        assert_eq!(catalogs[0].0, Provider::Gemini);
        assert!(catalogs[3].1.contains("claude-haiku-4-5"));
    }
}
