//! Offline translator for tests and dry runs
//!
//! # Example
//!
//! ```ignore
//! use banana_l10n::providers::{Translator, MockTranslator, MockMode};
//!
//! #[tokio::test]
//! async fn test_translation() {
//!     let mock = MockTranslator::new(MockMode::Suffix);
//!     let result = mock.translate("hello", "en", "fr").await.unwrap();
//!     assert_eq!(result, "hello_fr");
//! }
//! ```

use super::translator::Translator;
use crate::error::{TranslateError, TranslateResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// How the mock answers
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Append the target locale: "hello" → "hello_fr"
    Suffix,

    /// Predefined `(text, target_locale) → translation` pairs, falling back
    /// to [`MockMode::Suffix`] for anything else
    Mappings(HashMap<(String, String), String>),

    /// Wrap the text in brackets with the target locale: "hello" → "[fr] hello"
    Bracket,

    /// Fail every call with this message
    Error(String),

    /// Return the input unchanged
    NoOp,
}

/// Deterministic translator that never touches the network
///
/// Clones share one request counter, so a test can keep a clone and check how
/// many texts the pipeline actually submitted.
#[derive(Debug, Clone)]
pub struct MockTranslator {
    mode: MockMode,
    /// Simulated network delay in milliseconds
    delay_ms: u64,
    submitted: Arc<AtomicUsize>,
}

impl MockTranslator {
    /// Create a mock answering in `mode`
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mock = MockTranslator::new(MockMode::Suffix);
    /// ```
    pub fn new(mode: MockMode) -> Self {
        Self::with_delay(mode, 0)
    }

    /// Create a mock that sleeps `delay_ms` before every call
    pub fn with_delay(mode: MockMode, delay_ms: u64) -> Self {
        Self {
            mode,
            delay_ms,
            submitted: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of texts submitted so far, across all clones
    pub fn submitted(&self) -> usize {
        self.submitted.load(Ordering::SeqCst)
    }

    async fn apply_delay(&self) {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
    }

    fn apply_translation(&self, text: &str, target: &str) -> TranslateResult<String> {
        self.submitted.fetch_add(1, Ordering::SeqCst);

        match &self.mode {
            MockMode::Suffix => Ok(format!("{}_{}", text, target)),
            MockMode::Mappings(map) => {
                let key = (text.to_string(), target.to_string());
                Ok(map
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| format!("{}_{}", text, target)))
            }
            MockMode::Bracket => Ok(format!("[{}] {}", target, text)),
            MockMode::Error(msg) => Err(TranslateError::Translation(msg.clone())),
            MockMode::NoOp => Ok(text.to_string()),
        }
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        _source_locale: &str,
        target_locale: &str,
    ) -> TranslateResult<String> {
        self.apply_delay().await;
        self.apply_translation(text, target_locale)
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        _source_locale: &str,
        target_locale: &str,
    ) -> TranslateResult<Vec<String>> {
        // One delay per batch, like one request per batch
        self.apply_delay().await;
        texts
            .iter()
            .map(|text| self.apply_translation(text, target_locale))
            .collect()
    }

    fn provider_name(&self) -> &str {
        "Mock Translator"
    }
}
