//! OpenAI-compatible chat-completions client
//!
//! OpenAI, Groq, OpenRouter, Mistral, Google (through its OpenAI-compatible
//! endpoint) and Ollama all speak the same `/chat/completions` protocol, so a
//! single client covers them; only the base URL and the credential differ.
//!
//! # Example
//!
//! ```ignore
//! use banana_l10n::providers::{ChatCompletionsClient, ProviderId, Translator};
//!
//! let client = ChatCompletionsClient::new(
//!     ProviderId::Groq,
//!     "llama-3.3-70b-versatile",
//!     Some("gsk-...".to_string()),
//!     None,
//!     None,
//! )?;
//! let result = client.translate("Hello", "en", "fr").await?;
//! ```

use super::ProviderId;
use super::prompt::{DEFAULT_SYSTEM_PROMPT, build_messages, parse_reply};
use super::translator::{Translator, ensure_batch_len};
use crate::error::{TranslateError, TranslateResult};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;

/// Shared HTTP client setup for every provider client
pub(crate) fn http_client() -> TranslateResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| TranslateError::Network(format!("Failed to create HTTP client: {}", e)))
}

/// Map a non-success status to an error, otherwise parse the JSON body
pub(crate) async fn read_json(response: reqwest::Response) -> TranslateResult<Value> {
    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        return Err(if status.is_client_error() {
            TranslateError::Config(format!("API client error ({}): {}", status, error_text))
        } else {
            TranslateError::Translation(format!("API server error ({}): {}", status, error_text))
        });
    }

    response
        .json()
        .await
        .map_err(|e| TranslateError::Translation(format!("Failed to parse API response: {}", e)))
}

/// Chat-completions translator
#[derive(Clone)]
pub struct ChatCompletionsClient {
    provider: ProviderId,
    model: String,
    /// `None` for providers that need no credential
    api_key: Option<String>,
    base_url: String,
    system_prompt: String,
    client: reqwest::Client,
}

impl ChatCompletionsClient {
    /// Texts per request; larger batches are split
    const MAX_BATCH_SIZE: usize = 25;

    /// Create a client
    ///
    /// # Arguments
    ///
    /// * `provider` - Which backend this client talks to (logs and defaults)
    /// * `model` - Model name sent with every request
    /// * `api_key` - Bearer token, `None` to send no `Authorization` header
    /// * `base_url` - Endpoint root, defaults to the provider's public API
    /// * `system_prompt` - Prompt template with `{source}`/`{target}` slots
    pub fn new(
        provider: ProviderId,
        model: &str,
        api_key: Option<String>,
        base_url: Option<String>,
        system_prompt: Option<String>,
    ) -> TranslateResult<Self> {
        if model.trim().is_empty() {
            return Err(TranslateError::Config("Model name cannot be empty".to_string()));
        }
        if provider.requires_api_key() && api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
            return Err(TranslateError::Config(format!(
                "API key for {} cannot be empty",
                provider
            )));
        }

        let base_url = base_url
            .unwrap_or_else(|| provider.metadata().default_base_url.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            provider,
            model: model.to_string(),
            api_key,
            base_url,
            system_prompt: system_prompt.unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            client: http_client()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn translate_chunk(
        &self,
        texts: &[String],
        source_locale: &str,
        target_locale: &str,
    ) -> TranslateResult<Vec<String>> {
        let (system, messages) =
            build_messages(&self.system_prompt, texts, source_locale, target_locale);

        let mut all_messages = vec![json!({ "role": "system", "content": system })];
        all_messages.extend(
            messages
                .iter()
                .map(|m| json!({ "role": m.role, "content": m.content })),
        );

        let body = json!({
            "model": self.model,
            "messages": all_messages,
            "temperature": 0,
        });

        let url = format!("{}/chat/completions", self.base_url);
        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let json = read_json(request.send().await?).await?;
        let reply = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                TranslateError::Translation(
                    "Invalid API response: missing 'choices[0].message.content'".to_string(),
                )
            })?;

        parse_reply(reply, texts.len())
    }
}

impl std::fmt::Debug for ChatCompletionsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsClient")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl Translator for ChatCompletionsClient {
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> TranslateResult<String> {
        if text.is_empty() {
            return Ok(String::new());
        }
        let results = self
            .translate_chunk(&[text.to_string()], source_locale, target_locale)
            .await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| TranslateError::Translation("Empty translation result".to_string()))
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        source_locale: &str,
        target_locale: &str,
    ) -> TranslateResult<Vec<String>> {
        let mut results = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(Self::MAX_BATCH_SIZE) {
            results.extend(self.translate_chunk(chunk, source_locale, target_locale).await?);
        }
        ensure_batch_len(texts.len(), &results)?;
        Ok(results)
    }

    fn provider_name(&self) -> &str {
        self.provider.metadata().display_name
    }
}
