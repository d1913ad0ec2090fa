use crate::llm::Provider;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub display_name: String,
}

/// Model ids served by one provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModelCatalog {
    models: BTreeMap<String, ModelDescriptor>,
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in models of `provider` plus `extra` ids from configuration.
    pub fn builtin(provider: Provider, extra: &[String]) -> Self {
        let mut catalog = Self::new();
        for (id, display_name) in builtin_models(provider) {
            catalog.insert(ModelDescriptor {
                id: id.to_string(),
                display_name: display_name.to_string(),
            });
        }
        for id in extra {
            catalog.insert(ModelDescriptor {
                id: id.clone(),
                display_name: id.clone(),
            });
        }
        catalog
    }

    pub fn insert(&mut self, descriptor: ModelDescriptor) {
        self.models.insert(descriptor.id.clone(), descriptor);
    }

    pub fn contains(&self, model: &str) -> bool {
        self.models.contains_key(model)
    }

    pub fn get(&self, model: &str) -> Option<&ModelDescriptor> {
        self.models.get(model)
    }

    pub fn models(&self) -> &BTreeMap<String, ModelDescriptor> {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl FromIterator<ModelDescriptor> for ModelCatalog {
    fn from_iter<I: IntoIterator<Item = ModelDescriptor>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for descriptor in iter {
            catalog.insert(descriptor);
        }
        catalog
    }
}

const GEMINI_MODELS: &[(&str, &str)] = &[
    ("gemini-2.5-pro", "Gemini 2.5 Pro"),
    ("gemini-2.5-flash", "Gemini 2.5 Flash"),
    ("gemini-2.5-flash-lite", "Gemini 2.5 Flash-Lite"),
    ("gemini-2.0-flash", "Gemini 2.0 Flash"),
    ("gemini-2.0-flash-lite", "Gemini 2.0 Flash-Lite"),
    ("gemini-1.5-pro", "Gemini 1.5 Pro"),
    ("gemini-1.5-flash", "Gemini 1.5 Flash"),
];

const OPENAI_MODELS: &[(&str, &str)] = &[
    ("gpt-5", "GPT-5"),
    ("gpt-5-mini", "GPT-5 mini"),
    ("gpt-5-nano", "GPT-5 nano"),
    ("gpt-4.1", "GPT-4.1"),
    ("gpt-4.1-mini", "GPT-4.1 mini"),
    ("gpt-4.1-nano", "GPT-4.1 nano"),
    ("gpt-4o", "GPT-4o"),
    ("gpt-4o-mini", "GPT-4o mini"),
    ("gpt-4-turbo", "GPT-4 Turbo"),
    ("gpt-3.5-turbo", "GPT-3.5 Turbo"),
    ("o1", "o1"),
    ("o3", "o3"),
    ("o3-mini", "o3-mini"),
    ("o4-mini", "o4-mini"),
];

const MISTRAL_MODELS: &[(&str, &str)] = &[
    ("mistral-large-latest", "Mistral Large"),
    ("mistral-medium-latest", "Mistral Medium"),
    ("mistral-small-latest", "Mistral Small"),
    ("magistral-medium-latest", "Magistral Medium"),
    ("magistral-small-latest", "Magistral Small"),
    ("ministral-8b-latest", "Ministral 8B"),
    ("ministral-3b-latest", "Ministral 3B"),
    ("codestral-latest", "Codestral"),
    ("open-mistral-nemo", "Mistral Nemo"),
    ("pixtral-large-latest", "Pixtral Large"),
];

const ANTHROPIC_MODELS: &[(&str, &str)] = &[
    ("claude-opus-4-1", "Claude Opus 4.1"),
    ("claude-opus-4-0", "Claude Opus 4"),
    ("claude-sonnet-4-5", "Claude Sonnet 4.5"),
    ("claude-sonnet-4-0", "Claude Sonnet 4"),
    ("claude-haiku-4-5", "Claude Haiku 4.5"),
    ("claude-3-7-sonnet-latest", "Claude Sonnet 3.7"),
    ("claude-3-5-haiku-latest", "Claude Haiku 3.5"),
    ("claude-3-haiku-20240307", "Claude Haiku 3"),
];

fn builtin_models(provider: Provider) -> &'static [(&'static str, &'static str)] {
    match provider {
        Provider::Gemini => GEMINI_MODELS,
        Provider::OpenAI => OPENAI_MODELS,
        Provider::Mistral => MISTRAL_MODELS,
        Provider::Anthropic => ANTHROPIC_MODELS,
    }
}
