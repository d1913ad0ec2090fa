pub mod domain;
pub mod error;
pub mod form;
pub mod llm;
pub mod prompt;
pub mod service;

pub mod config {
    use crate::llm::Provider;
    use std::collections::BTreeMap;

    const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
    const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
    const DEFAULT_MISTRAL_BASE_URL: &str = "https://api.mistral.ai";
    const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
    const DEFAULT_TIMEOUT_SECS: u64 = 60;
    const DEFAULT_MAX_TOKENS: u32 = 2048;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub sentry_dsn: Option<String>,
        pub llm: LlmSettings,
    }

    /// Endpoints and limits shared by every provider client. API keys are not
    /// part of the configuration: they arrive with each request.
    #[derive(Debug, Clone)]
    pub struct LlmSettings {
        pub gemini_base_url: String,
        pub openai_base_url: String,
        pub mistral_base_url: String,
        pub anthropic_base_url: String,
        pub timeout_secs: u64,
        pub max_tokens: u32,
        pub extra_models: BTreeMap<Provider, Vec<String>>,
    }

    impl Default for LlmSettings {
        fn default() -> Self {
            Self {
                gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
                openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
                mistral_base_url: DEFAULT_MISTRAL_BASE_URL.to_string(),
                anthropic_base_url: DEFAULT_ANTHROPIC_BASE_URL.to_string(),
                timeout_secs: DEFAULT_TIMEOUT_SECS,
                max_tokens: DEFAULT_MAX_TOKENS,
                extra_models: BTreeMap::new(),
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let defaults = LlmSettings::default();
            let mut extra_models = BTreeMap::new();
            for provider in Provider::PRIORITY {
                let key = format!("{}_EXTRA_MODELS", provider.as_str().to_uppercase());
                let models = parse_model_list(std::env::var(key).ok().as_deref());
                if !models.is_empty() {
                    extra_models.insert(provider, models);
                }
            }

            Ok(Self {
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                llm: LlmSettings {
                    gemini_base_url: std::env::var("GEMINI_BASE_URL")
                        .unwrap_or(defaults.gemini_base_url),
                    openai_base_url: std::env::var("OPENAI_BASE_URL")
                        .unwrap_or(defaults.openai_base_url),
                    mistral_base_url: std::env::var("MISTRAL_BASE_URL")
                        .unwrap_or(defaults.mistral_base_url),
                    anthropic_base_url: std::env::var("ANTHROPIC_BASE_URL")
                        .unwrap_or(defaults.anthropic_base_url),
                    timeout_secs: std::env::var("LLM_TIMEOUT_SECS")
                        .ok()
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(defaults.timeout_secs),
                    max_tokens: std::env::var("LLM_MAX_TOKENS")
                        .ok()
                        .and_then(|s| s.parse::<u32>().ok())
                        .unwrap_or(defaults.max_tokens),
                    extra_models,
                },
            })
        }
    }

    impl LlmSettings {
        pub fn extra_models_for(&self, provider: Provider) -> &[String] {
            self.extra_models
                .get(&provider)
                .map(Vec::as_slice)
                .unwrap_or(&[])
        }
    }

    fn parse_model_list(raw: Option<&str>) -> Vec<String> {
        raw.unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn parses_comma_separated_models() {
            assert_eq!(
                parse_model_list(Some(" gpt-x , ,gpt-y")),
                vec!["gpt-x".to_string(), "gpt-y".to_string()]
            );
            assert!(parse_model_list(None).is_empty());
        }

        #[test]
        fn extra_models_default_to_empty() {
            let settings = LlmSettings::default();
            assert!(settings.extra_models_for(Provider::Mistral).is_empty());
        }
    }
}
