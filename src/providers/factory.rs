//! Provider client construction and per-locale model selection

use super::anthropic::AnthropicClient;
use super::chat::ChatCompletionsClient;
use super::engine::EngineClient;
use super::keys::{KeySources, resolve_provider_api_key};
use super::translator::Translator;
use super::ProviderId;
use crate::error::{ProviderError, ProviderKeyMissingError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A provider plus the model to ask for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub provider: ProviderId,
    pub name: String,
}

/// `"source:target"` locale pair (either side may be `*`) → `"provider:model"`
pub type ModelRules = IndexMap<String, String>;

/// Optional client settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientOptions {
    /// Endpoint root; falls back to the provider's base URL env var, then to
    /// its public API
    pub base_url: Option<String>,
    /// System prompt template for LLM providers
    pub prompt: Option<String>,
}

/// Split `"provider:model"` at the first colon
///
/// The bare id `lingo.dev` is accepted on its own since the engine has no
/// model names. Unknown providers and empty model names give `None`.
///
/// # Example
///
/// ```ignore
/// let spec = parse_model_string("ollama:llama3:8b").unwrap();
/// assert_eq!(spec.provider, ProviderId::Ollama);
/// assert_eq!(spec.name, "llama3:8b");
/// ```
pub fn parse_model_string(value: &str) -> Option<ModelSpec> {
    let value = value.trim();
    if value == ProviderId::LingoDotDev.as_str() {
        return Some(ModelSpec {
            provider: ProviderId::LingoDotDev,
            name: String::new(),
        });
    }

    let (provider, name) = value.split_once(':')?;
    if name.trim().is_empty() {
        return None;
    }
    Some(ModelSpec {
        provider: provider.parse().ok()?,
        name: name.trim().to_string(),
    })
}

/// Model for a locale pair
///
/// Rules are tried from most to least specific: `source:target`, `*:target`,
/// `source:*`, `*:*`.
pub fn get_locale_model(rules: &ModelRules, source: &str, target: &str) -> Option<ModelSpec> {
    [
        format!("{}:{}", source, target),
        format!("*:{}", target),
        format!("{}:*", source),
        "*:*".to_string(),
    ]
    .iter()
    .find_map(|pattern| rules.get(pattern))
    .and_then(|model| parse_model_string(model))
}

/// Resolve a key for every provider the rules mention
///
/// Providers without a credential requirement are left out of the result.
/// Fails on the first provider whose key cannot be found.
pub fn validate_and_get_api_keys(
    rules: &ModelRules,
    sources: &KeySources,
) -> Result<IndexMap<ProviderId, String>, ProviderKeyMissingError> {
    let mut keys = IndexMap::new();
    for spec in rules.values().filter_map(|model| parse_model_string(model)) {
        if keys.contains_key(&spec.provider) {
            continue;
        }
        if let Some(credential) = resolve_provider_api_key(spec.provider, sources, true)? {
            keys.insert(spec.provider, credential.value);
        }
    }
    Ok(keys)
}

/// Build the client for `provider`
///
/// This is the only place a provider id turns into a concrete client.
///
/// # Errors
///
/// * [`ProviderError::KeyMissing`] when the provider needs a key and no source
///   has one
/// * [`ProviderError::Client`] when the client rejects its settings
pub fn create_provider_client(
    provider: ProviderId,
    model: &str,
    options: &ClientOptions,
    sources: &KeySources,
) -> Result<Box<dyn Translator>, ProviderError> {
    let api_key = resolve_provider_api_key(provider, sources, true)?.map(|c| c.value);
    let metadata = provider.metadata();
    let base_url = options.base_url.clone().or_else(|| {
        metadata
            .base_url_env_var
            .and_then(|name| sources.env_value(name))
            .map(str::to_string)
    });

    tracing::debug!(provider = %provider, model, base_url = ?base_url, "Creating provider client");

    let client: Box<dyn Translator> = match provider {
        ProviderId::LingoDotDev => {
            Box::new(EngineClient::new(api_key.unwrap_or_default(), base_url)?)
        }
        ProviderId::Anthropic => Box::new(AnthropicClient::new(
            model,
            api_key.unwrap_or_default(),
            base_url,
            options.prompt.clone(),
        )?),
        ProviderId::OpenAi
        | ProviderId::Google
        | ProviderId::Groq
        | ProviderId::OpenRouter
        | ProviderId::Mistral
        | ProviderId::Ollama => Box::new(ChatCompletionsClient::new(
            provider,
            model,
            api_key,
            base_url,
            options.prompt.clone(),
        )?),
    };
    Ok(client)
}

/// [`create_provider_client`] from a `"provider:model"` string
pub fn create_client_for_model(
    model: &str,
    options: &ClientOptions,
    sources: &KeySources,
) -> Result<Box<dyn Translator>, ProviderError> {
    let spec =
        parse_model_string(model).ok_or_else(|| ProviderError::InvalidModel(model.to_string()))?;
    create_provider_client(spec.provider, &spec.name, options, sources)
}
