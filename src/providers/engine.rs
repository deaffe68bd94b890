//! Lingo.dev localization engine client
//!
//! The engine takes the whole `key → text` object in one request and returns
//! it translated, so no prompt is involved.

use super::ProviderId;
use super::chat::{http_client, read_json};
use super::translator::{Translator, ensure_batch_len};
use crate::error::{TranslateError, TranslateResult};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::json;

#[derive(Clone)]
pub struct EngineClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl EngineClient {
    const MAX_BATCH_SIZE: usize = 100;

    pub fn new(api_key: String, base_url: Option<String>) -> TranslateResult<Self> {
        if api_key.trim().is_empty() {
            return Err(TranslateError::Config("API key cannot be empty".to_string()));
        }

        Ok(Self {
            api_key,
            base_url: base_url
                .unwrap_or_else(|| ProviderId::LingoDotDev.metadata().default_base_url.to_string())
                .trim_end_matches('/')
                .to_string(),
            client: http_client()?,
        })
    }

    async fn translate_chunk(
        &self,
        texts: &[String],
        source_locale: &str,
        target_locale: &str,
    ) -> TranslateResult<Vec<String>> {
        let data: IndexMap<String, &String> = texts
            .iter()
            .enumerate()
            .map(|(index, text)| (index.to_string(), text))
            .collect();

        let body = json!({
            "params": { "fast": false },
            "locale": { "source": source_locale, "target": target_locale },
            "data": data,
        });

        let response = self
            .client
            .post(format!("{}/i18n", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let json = read_json(response).await?;

        (0..texts.len())
            .map(|index| {
                json["data"][index.to_string().as_str()]
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| {
                        TranslateError::Translation(format!(
                            "Invalid API response: missing 'data.{}'",
                            index
                        ))
                    })
            })
            .collect()
    }
}

impl std::fmt::Debug for EngineClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineClient")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl Translator for EngineClient {
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
        "Lingo.dev"
    }
}
