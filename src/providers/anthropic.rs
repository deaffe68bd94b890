//! Anthropic messages API client

use super::ProviderId;
use super::chat::{http_client, read_json};
use super::prompt::{DEFAULT_SYSTEM_PROMPT, build_messages, parse_reply};
use super::translator::{Translator, ensure_batch_len};
use crate::error::{TranslateError, TranslateResult};
use async_trait::async_trait;
use serde_json::json;

const API_VERSION: &str = "2023-06-01";

/// Translator backed by `/v1/messages`
#[derive(Clone)]
pub struct AnthropicClient {
    model: String,
    api_key: String,
    base_url: String,
    system_prompt: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl AnthropicClient {
    const MAX_BATCH_SIZE: usize = 25;

    pub fn new(
        model: &str,
        api_key: String,
        base_url: Option<String>,
        system_prompt: Option<String>,
    ) -> TranslateResult<Self> {
        if api_key.trim().is_empty() {
            return Err(TranslateError::Config("API key cannot be empty".to_string()));
        }
        if model.trim().is_empty() {
            return Err(TranslateError::Config("Model name cannot be empty".to_string()));
        }

        Ok(Self {
            model: model.to_string(),
            api_key,
            base_url: base_url
                .unwrap_or_else(|| ProviderId::Anthropic.metadata().default_base_url.to_string())
                .trim_end_matches('/')
                .to_string(),
            system_prompt: system_prompt.unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            max_tokens: 4096,
            client: http_client()?,
        })
    }

    async fn translate_chunk(
        &self,
        texts: &[String],
        source_locale: &str,
        target_locale: &str,
    ) -> TranslateResult<Vec<String>> {
        let (system, messages) =
            build_messages(&self.system_prompt, texts, source_locale, target_locale);

        let body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "system": system,
            "messages": messages,
        });

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;
        let json = read_json(response).await?;

        // The reply is the concatenation of every text block
        let blocks = json["content"].as_array().ok_or_else(|| {
            TranslateError::Translation("Invalid API response: missing 'content' array".to_string())
        })?;
        let reply: String = blocks
            .iter()
            .filter(|block| block["type"] == "text")
            .filter_map(|block| block["text"].as_str())
            .collect();

        parse_reply(&reply, texts.len())
    }
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("model", &self.model)
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl Translator for AnthropicClient {
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> TranslateResult<String> {
        if text.is_empty() {
            return Ok(String::new());
        }
        self.translate_chunk(&[text.to_string()], source_locale, target_locale)
            .await?
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
        "Anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_validates_inputs() {
        assert!(AnthropicClient::new("claude", String::new(), None, None).is_err());
        assert!(AnthropicClient::new("", "key".to_string(), None, None).is_err());
    }

    #[test]
    fn test_debug_hides_key() {
        let client = AnthropicClient::new("claude", "sk-ant-secret".to_string(), None, None).unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("sk-ant-secret"));
        assert!(debug.contains("https://api.anthropic.com/v1"));
    }
}
