//! Translator trait
//!
//! The localization engine never talks to a translation backend directly. It
//! hands batches of stale texts to a [`Translator`] and records whatever comes
//! back, so any backend (an LLM chat endpoint, a dedicated engine, a mock)
//! plugs in behind the same seam.
//!
//! # Example
//!
//! ```ignore
//! use banana_l10n::providers::{Translator, MockTranslator, MockMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let translator = MockTranslator::new(MockMode::Suffix);
//!
//!     let result = translator.translate("Hello", "en", "fr").await?;
//!     assert_eq!(result, "Hello_fr");
//!
//!     let texts = vec!["Hello".to_string(), "Goodbye".to_string()];
//!     let results = translator.translate_batch(&texts, "en", "fr").await?;
//!     assert_eq!(results.len(), 2);
//!     Ok(())
//! }
//! ```

use crate::error::{TranslateError, TranslateResult};
use async_trait::async_trait;

/// A translation backend
///
/// All methods are async: every real backend is a network call.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate one text
    ///
    /// # Arguments
    ///
    /// * `text` - The text to translate. Locked-pattern placeholder tokens
    ///   inside it must come back untouched.
    /// * `source_locale` - Canonical source locale (e.g. "en", "en-US")
    /// * `target_locale` - Canonical target locale (e.g. "fr", "zh-Hans")
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> TranslateResult<String>;

    /// Translate several texts in one go
    ///
    /// # Guarantees
    ///
    /// - Output order matches input order
    /// - Output length equals input length
    ///
    /// The default implementation translates one text at a time. Backends
    /// with per-request overhead override it.
    async fn translate_batch(
        &self,
        texts: &[String],
        source_locale: &str,
        target_locale: &str,
    ) -> TranslateResult<Vec<String>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.translate(text, source_locale, target_locale).await?);
        }
        Ok(results)
    }

    /// Name used in logs
    fn provider_name(&self) -> &str;
}

/// Fail unless a batch came back with one translation per input
pub fn ensure_batch_len(expected: usize, results: &[String]) -> TranslateResult<()> {
    if results.len() == expected {
        Ok(())
    } else {
        Err(TranslateError::CountMismatch {
            expected,
            actual: results.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Only implements `translate`, to exercise the default batch method
    struct Upper;

    #[async_trait]
    impl Translator for Upper {
        async fn translate(&self, text: &str, _: &str, _: &str) -> TranslateResult<String> {
            Ok(text.to_uppercase())
        }

        fn provider_name(&self) -> &str {
            "upper"
        }
    }

    #[tokio::test]
    async fn test_default_batch_preserves_order() {
        let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let results = Upper.translate_batch(&texts, "en", "fr").await.unwrap();
        assert_eq!(results, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_ensure_batch_len() {
        assert!(ensure_batch_len(2, &["a".to_string(), "b".to_string()]).is_ok());
        assert_eq!(
            ensure_batch_len(3, &["a".to_string()]),
            Err(TranslateError::CountMismatch {
                expected: 3,
                actual: 1
            })
        );
    }
}
