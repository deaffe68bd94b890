//! Translation providers
//!
//! The engine talks to translation backends through the [`Translator`] trait.
//! This module holds everything around that seam:
//!
//! 1. **Provider ids** - the closed [`ProviderId`] enum and its static metadata
//!    table (credential env var, config key path, default endpoint)
//! 2. **Credential resolution** - [`resolve_provider_api_key`] walks override →
//!    environment → persisted config
//! 3. **Configuration** - [`ConfigLoader`] loads `.env` files and the persisted
//!    TOML config once per process
//! 4. **Clients** - an OpenAI-compatible chat client, an Anthropic messages
//!    client and the Lingo.dev engine client, built by
//!    [`create_provider_client`]
//! 5. **Mock** - [`MockTranslator`] for tests and offline runs
//!
//! # Example
//!
//! ```ignore
//! use banana_l10n::providers::*;
//!
//! let config = ConfigLoader::new(std::env::current_dir()?);
//! let sources = config.key_sources()?;
//! let model = parse_model_string("groq:llama-3.3-70b-versatile").unwrap();
//! let translator = create_provider_client(
//!     model.provider,
//!     &model.name,
//!     &ClientOptions::default(),
//!     &sources,
//! )?;
//! let result = translator.translate("Hello", "en", "fr").await?;
//! ```

pub mod anthropic;
pub mod chat;
pub mod config;
pub mod engine;
pub mod factory;
pub mod keys;
pub mod mock;
pub mod prompt;
pub mod translator;

pub use anthropic::AnthropicClient;
pub use chat::ChatCompletionsClient;
pub use config::ConfigLoader;
pub use engine::EngineClient;
pub use factory::{
    ClientOptions, ModelRules, ModelSpec, create_client_for_model, create_provider_client,
    get_locale_model, parse_model_string, validate_and_get_api_keys,
};
pub use keys::{CredentialSource, KeySources, ProviderCredential, resolve_provider_api_key};
pub use mock::{MockMode, MockTranslator};
pub use translator::Translator;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every supported translation backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderId {
    #[serde(rename = "lingo.dev")]
    LingoDotDev,
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "google")]
    Google,
    #[serde(rename = "groq")]
    Groq,
    #[serde(rename = "openrouter")]
    OpenRouter,
    #[serde(rename = "mistral")]
    Mistral,
    #[serde(rename = "ollama")]
    Ollama,
}

/// Static facts about a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderMetadata {
    pub id: &'static str,
    pub display_name: &'static str,
    /// Environment variable holding the API key. `None` means the provider
    /// needs no credential.
    pub env_var: Option<&'static str>,
    /// Dotted key path of the API key in the persisted config
    pub config_key: Option<&'static str>,
    /// Environment variable that overrides the endpoint
    pub base_url_env_var: Option<&'static str>,
    pub default_base_url: &'static str,
}

impl ProviderId {
    pub const ALL: [ProviderId; 8] = [
        ProviderId::LingoDotDev,
        ProviderId::OpenAi,
        ProviderId::Anthropic,
        ProviderId::Google,
        ProviderId::Groq,
        ProviderId::OpenRouter,
        ProviderId::Mistral,
        ProviderId::Ollama,
    ];

    pub fn metadata(self) -> ProviderMetadata {
        match self {
            ProviderId::LingoDotDev => ProviderMetadata {
                id: "lingo.dev",
                display_name: "Lingo.dev",
                env_var: Some("LINGODOTDEV_API_KEY"),
                config_key: Some("auth.apiKey"),
                base_url_env_var: Some("LINGODOTDEV_API_URL"),
                default_base_url: "https://engine.lingo.dev",
            },
            ProviderId::OpenAi => ProviderMetadata {
                id: "openai",
                display_name: "OpenAI",
                env_var: Some("OPENAI_API_KEY"),
                config_key: Some("llm.openaiApiKey"),
                base_url_env_var: Some("OPENAI_BASE_URL"),
                default_base_url: "https://api.openai.com/v1",
            },
            ProviderId::Anthropic => ProviderMetadata {
                id: "anthropic",
                display_name: "Anthropic",
                env_var: Some("ANTHROPIC_API_KEY"),
                config_key: Some("llm.anthropicApiKey"),
                base_url_env_var: None,
                default_base_url: "https://api.anthropic.com/v1",
            },
            ProviderId::Google => ProviderMetadata {
                id: "google",
                display_name: "Google",
                env_var: Some("GOOGLE_API_KEY"),
                config_key: Some("llm.googleApiKey"),
                base_url_env_var: None,
                default_base_url: "https://generativelanguage.googleapis.com/v1beta/openai",
            },
            ProviderId::Groq => ProviderMetadata {
                id: "groq",
                display_name: "Groq",
                env_var: Some("GROQ_API_KEY"),
                config_key: Some("llm.groqApiKey"),
                base_url_env_var: None,
                default_base_url: "https://api.groq.com/openai/v1",
            },
            ProviderId::OpenRouter => ProviderMetadata {
                id: "openrouter",
                display_name: "OpenRouter",
                env_var: Some("OPENROUTER_API_KEY"),
                config_key: Some("llm.openrouterApiKey"),
                base_url_env_var: None,
                default_base_url: "https://openrouter.ai/api/v1",
            },
            ProviderId::Mistral => ProviderMetadata {
                id: "mistral",
                display_name: "Mistral",
                env_var: Some("MISTRAL_API_KEY"),
                config_key: Some("llm.mistralApiKey"),
                base_url_env_var: None,
                default_base_url: "https://api.mistral.ai/v1",
            },
            ProviderId::Ollama => ProviderMetadata {
                id: "ollama",
                display_name: "Ollama",
                env_var: None,
                config_key: None,
                base_url_env_var: Some("OLLAMA_BASE_URL"),
                default_base_url: "http://localhost:11434/v1",
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        self.metadata().id
    }

    /// Whether calls to this provider need an API key
    pub fn requires_api_key(self) -> bool {
        self.metadata().env_var.is_some()
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = crate::error::ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ProviderId::ALL
            .into_iter()
            .find(|id| id.as_str() == wanted)
            .ok_or_else(|| crate::error::ConfigError::UnknownProvider(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_id_round_trip() {
        for id in ProviderId::ALL {
            assert_eq!(id.to_string().parse::<ProviderId>().unwrap(), id);
        }
        assert_eq!("OpenAI".parse::<ProviderId>().unwrap(), ProviderId::OpenAi);
        assert!("unsupported".parse::<ProviderId>().is_err());
    }

    #[test]
    fn test_only_ollama_needs_no_key() {
        let keyless: Vec<ProviderId> = ProviderId::ALL
            .into_iter()
            .filter(|id| !id.requires_api_key())
            .collect();
        assert_eq!(keyless, vec![ProviderId::Ollama]);
    }

    #[test]
    fn test_serde_uses_ids() {
        assert_eq!(
            serde_json::to_string(&ProviderId::LingoDotDev).unwrap(),
            "\"lingo.dev\""
        );
        let id: ProviderId = serde_json::from_str("\"openrouter\"").unwrap();
        assert_eq!(id, ProviderId::OpenRouter);
    }
}
