//! Provider credential resolution
//!
//! Sources are consulted in a fixed order and the first non-empty value wins:
//!
//! 1. an explicit override supplied by the caller
//! 2. the provider's environment variable (process environment first, then
//!    `.env` files, see [`ConfigLoader`](super::ConfigLoader))
//! 3. the provider's dotted key in the persisted config file
//!
//! Sources are plain data so resolution is a pure function and tests never
//! have to touch the process environment.

use super::ProviderId;
use super::config::lookup_dotted;
use crate::error::ProviderKeyMissingError;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Where a credential came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialSource {
    Override,
    Env,
    Config,
}

/// A resolved API key
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderCredential {
    pub provider: ProviderId,
    pub value: String,
    pub source: CredentialSource,
}

impl fmt::Debug for ProviderCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredential")
            .field("provider", &self.provider)
            .field("value", &"***")
            .field("source", &self.source)
            .finish()
    }
}

/// Everything credential resolution may look at
#[derive(Debug, Clone, Default)]
pub struct KeySources {
    pub overrides: HashMap<ProviderId, String>,
    /// Environment variables, `.env` values already merged in
    pub env: HashMap<String, String>,
    /// Persisted configuration
    pub config: toml::Table,
}

impl KeySources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_override(mut self, provider: ProviderId, value: impl Into<String>) -> Self {
        self.overrides.insert(provider, value.into());
        self
    }

    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    pub fn with_config(mut self, config: toml::Table) -> Self {
        self.config = config;
        self
    }

    /// Non-empty environment value
    pub fn env_value(&self, name: &str) -> Option<&str> {
        self.env
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Resolve the API key for `provider`
///
/// # Returns
///
/// * `Ok(Some(credential))` - the first non-empty source
/// * `Ok(None)` - nothing found and `required` is false, or the provider
///   needs no credential at all (even when `required` is true)
/// * `Err(ProviderKeyMissingError)` - nothing found and `required` is true
///
/// # Example
///
/// ```ignore
/// let sources = KeySources::new().with_env("GROQ_API_KEY", "gsk-123");
/// let credential = resolve_provider_api_key(ProviderId::Groq, &sources, true)?;
/// assert_eq!(credential.unwrap().source, CredentialSource::Env);
/// ```
pub fn resolve_provider_api_key(
    provider: ProviderId,
    sources: &KeySources,
    required: bool,
) -> Result<Option<ProviderCredential>, ProviderKeyMissingError> {
    let metadata = provider.metadata();
    let Some(env_var) = metadata.env_var else {
        tracing::debug!(provider = %provider, "Provider needs no API key");
        return Ok(None);
    };

    let mut checked = vec!["override".to_string()];
    let mut found = non_empty(sources.overrides.get(&provider).map(String::as_str))
        .map(|value| (value, CredentialSource::Override));

    if found.is_none() {
        checked.push(format!("env {}", env_var));
        found = non_empty(sources.env_value(env_var)).map(|value| (value, CredentialSource::Env));
    }

    if found.is_none() {
        if let Some(config_key) = metadata.config_key {
            checked.push(format!("config {}", config_key));
            found = non_empty(lookup_dotted(&sources.config, config_key).and_then(|v| v.as_str()))
                .map(|value| (value, CredentialSource::Config));
        }
    }

    match found {
        Some((value, source)) => {
            tracing::debug!(provider = %provider, source = ?source, "Resolved provider API key");
            Ok(Some(ProviderCredential {
                provider,
                value,
                source,
            }))
        }
        None if required => Err(ProviderKeyMissingError { provider, checked }),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_groq_key(value: &str) -> toml::Table {
        let text = format!("[llm]\ngroqApiKey = \"{}\"\n", value);
        text.parse::<toml::Table>().unwrap()
    }

    fn all_sources() -> KeySources {
        KeySources::new()
            .with_override(ProviderId::Groq, "from-override")
            .with_env("GROQ_API_KEY", "from-env")
            .with_config(config_with_groq_key("from-config"))
    }

    fn resolve(sources: &KeySources) -> Option<ProviderCredential> {
        resolve_provider_api_key(ProviderId::Groq, sources, true).unwrap()
    }

    #[test]
    fn test_precedence_chain() {
        let mut sources = all_sources();
        let credential = resolve(&sources).unwrap();
        assert_eq!(credential.value, "from-override");
        assert_eq!(credential.source, CredentialSource::Override);

        sources.overrides.clear();
        let credential = resolve(&sources).unwrap();
        assert_eq!(credential.value, "from-env");
        assert_eq!(credential.source, CredentialSource::Env);

        sources.env.clear();
        let credential = resolve(&sources).unwrap();
        assert_eq!(credential.value, "from-config");
        assert_eq!(credential.source, CredentialSource::Config);

        sources.config.clear();
        let error = resolve_provider_api_key(ProviderId::Groq, &sources, true).unwrap_err();
        assert_eq!(error.provider, ProviderId::Groq);
        assert_eq!(
            error.checked,
            vec!["override", "env GROQ_API_KEY", "config llm.groqApiKey"]
        );
        assert!(error.to_string().contains("'groq'"));
    }

    #[test]
    fn test_empty_values_are_skipped() {
        let sources = KeySources::new()
            .with_override(ProviderId::Groq, "  ")
            .with_env("GROQ_API_KEY", "")
            .with_config(config_with_groq_key("from-config"));
        assert_eq!(resolve(&sources).unwrap().source, CredentialSource::Config);
    }

    #[test]
    fn test_not_required_returns_none() {
        let sources = KeySources::new();
        assert_eq!(
            resolve_provider_api_key(ProviderId::OpenAi, &sources, false).unwrap(),
            None
        );
    }

    #[test]
    fn test_keyless_provider_short_circuits() {
        let sources = KeySources::new().with_override(ProviderId::Ollama, "ignored");
        assert_eq!(
            resolve_provider_api_key(ProviderId::Ollama, &sources, true).unwrap(),
            None
        );
    }

    #[test]
    fn test_override_for_other_provider_is_ignored() {
        let sources = KeySources::new()
            .with_override(ProviderId::OpenAi, "openai-key")
            .with_env("GROQ_API_KEY", "groq-key");
        assert_eq!(resolve(&sources).unwrap().value, "groq-key");
    }

    #[test]
    fn test_debug_hides_value() {
        let credential = resolve(&all_sources()).unwrap();
        let debug = format!("{:?}", credential);
        assert!(!debug.contains("from-override"));
        assert!(debug.contains("***"));
    }
}
