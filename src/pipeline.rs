//! Per-file localization driver
//!
//! One call to [`LocalizationPipeline::localize_document`] runs a whole file:
//!
//! 1. pull the source document through its loader chain
//! 2. register every entry in the dictionary and prune vanished positions
//! 3. for each target locale, send only the stale entries to the translator
//! 4. record the translations and push one output document per target
//!
//! Outputs come back only when every target succeeded. A failure anywhere
//! returns an error and no output, so the caller never writes half a file.
//! Translations recorded before the failure stay in the dictionary and are
//! reused by the next run.
//!
//! # Example
//!
//! ```ignore
//! use banana_l10n::loaders::{BucketOptions, DocumentFormat, create_loader};
//! use banana_l10n::pipeline::LocalizationPipeline;
//! use banana_l10n::providers::{MockMode, MockTranslator};
//! use std::sync::Arc;
//!
//! let pipeline = LocalizationPipeline::new(
//!     Arc::new(MockTranslator::new(MockMode::Suffix)),
//!     "en",
//!     &["fr".to_string()],
//! )?;
//! let mut loader = create_loader(DocumentFormat::Markdown, &BucketOptions::default())?;
//! let mut dictionary = Dictionary::new();
//! let localized = pipeline
//!     .localize_document(&mut dictionary, "README.md", &mut loader, source)
//!     .await?;
//! println!("{}", localized.outputs["fr"]);
//! ```

use crate::dictionary::{Dictionary, SetTranslationError};
use crate::error::{LocaleResult, PipelineError, PipelineResult};
use crate::loaders::{BoxedLoader, Entries, LoaderContext};
use crate::locale::parse_locale;
use crate::providers::Translator;
use crate::providers::translator::ensure_batch_len;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A non-fatal problem noticed while localizing one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineWarning {
    pub file_key: String,
    pub position_key: Option<String>,
    pub stage: String,
    pub message: String,
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.position_key {
            Some(position) => write!(
                f,
                "{} [{}] {}: {}",
                self.file_key, position, self.stage, self.message
            ),
            None => write!(f, "{} {}: {}", self.file_key, self.stage, self.message),
        }
    }
}

/// What happened to one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileReport {
    pub file_key: String,
    /// Entries found in the source document
    pub entries: usize,
    /// Entry translations requested from the translator, over all targets
    pub translated: usize,
    /// Entry translations served from the dictionary, over all targets
    pub reused: usize,
    /// Positions dropped from the dictionary because they left the source
    pub pruned: Vec<String>,
    pub warnings: Vec<PipelineWarning>,
}

/// Every output of one file plus its report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedFile {
    /// Target locale → output document, in target order
    pub outputs: IndexMap<String, String>,
    pub report: FileReport,
}

/// Drives files from source text to translated outputs
///
/// The pipeline itself holds no per-file state, so one instance can serve
/// many files on separate tasks, each with its own dictionary and loader.
#[derive(Clone)]
pub struct LocalizationPipeline {
    translator: Arc<dyn Translator>,
    source_locale: String,
    target_locales: Vec<String>,
}

impl fmt::Debug for LocalizationPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalizationPipeline")
            .field("translator", &self.translator.provider_name())
            .field("source_locale", &self.source_locale)
            .field("target_locales", &self.target_locales)
            .finish()
    }
}

impl LocalizationPipeline {
    /// Create a pipeline translating from `source_locale` into `target_locales`
    ///
    /// Locale codes are canonicalized (`en_us` → `en-US`). Targets equal to the
    /// source and repeated targets are dropped.
    ///
    /// # Errors
    ///
    /// The first locale code that does not parse.
    pub fn new(
        translator: Arc<dyn Translator>,
        source_locale: &str,
        target_locales: &[String],
    ) -> LocaleResult<Self> {
        let source_locale = parse_locale(source_locale)?.to_string();

        let mut targets: Vec<String> = Vec::with_capacity(target_locales.len());
        for target in target_locales {
            let target = parse_locale(target)?.to_string();
            if target != source_locale && !targets.contains(&target) {
                targets.push(target);
            }
        }

        Ok(Self {
            translator,
            source_locale,
            target_locales: targets,
        })
    }

    pub fn source_locale(&self) -> &str {
        &self.source_locale
    }

    pub fn target_locales(&self) -> &[String] {
        &self.target_locales
    }

    /// Localize one document
    ///
    /// # Arguments
    ///
    /// * `dictionary` - Dictionary owning `file_key`; updated in place
    /// * `file_key` - Identity of the source file (usually its path)
    /// * `loader` - Loader chain for the file's format, used for this file only
    /// * `source` - Raw source document
    ///
    /// # Errors
    ///
    /// * [`PipelineError::Pull`] when the source cannot be read by the loader
    /// * [`PipelineError::Translate`] when the translator fails for a target
    /// * [`PipelineError::Push`] when an output cannot be assembled
    pub async fn localize_document(
        &self,
        dictionary: &mut Dictionary,
        file_key: &str,
        loader: &mut BoxedLoader<String, Entries>,
        source: &str,
    ) -> PipelineResult<LocalizedFile> {
        let source_locale = self.source_locale.as_str();
        let mut ctx = LoaderContext::new(file_key, source_locale);
        let mut report = FileReport {
            file_key: file_key.to_string(),
            ..FileReport::default()
        };

        let entries = loader
            .pull(source_locale, source.to_string(), &mut ctx)
            .map_err(|source| PipelineError::Pull {
                file_key: file_key.to_string(),
                locale: source_locale.to_string(),
                source,
            })?;
        report.entries = entries.len();

        let mut changed = 0usize;
        for (position, text) in &entries {
            if dictionary
                .upsert_entry(file_key, position, source_locale, text)
                .changed
            {
                changed += 1;
            }
        }
        let positions: Vec<&str> = entries.keys().map(String::as_str).collect();
        report.pruned = dictionary.prune_positions(file_key, &positions);
        debug!(
            file = file_key,
            entries = entries.len(),
            changed,
            pruned = report.pruned.len(),
            "Registered source entries"
        );

        for target in &self.target_locales {
            let translated = self
                .translate_stale(dictionary, file_key, &entries, target, &mut report)
                .await?;
            report.translated += translated;
            report.reused += entries.len() - translated;
        }

        let mut outputs = IndexMap::with_capacity(self.target_locales.len());
        for target in &self.target_locales {
            let data = target_entries(dictionary, file_key, &entries, target);
            let output = loader
                .push(target, data, &mut ctx)
                .map_err(|source| PipelineError::Push {
                    file_key: file_key.to_string(),
                    locale: target.clone(),
                    source,
                })?;
            outputs.insert(target.clone(), output);
        }

        report
            .warnings
            .extend(ctx.warnings.into_iter().map(|warning| PipelineWarning {
                file_key: file_key.to_string(),
                position_key: None,
                stage: warning.stage.to_string(),
                message: warning.message,
            }));

        info!(
            file = file_key,
            targets = self.target_locales.len(),
            translated = report.translated,
            reused = report.reused,
            warnings = report.warnings.len(),
            "Localized file"
        );

        Ok(LocalizedFile { outputs, report })
    }

    /// Translate the entries with no cached value for `target`; returns how
    /// many were sent
    async fn translate_stale(
        &self,
        dictionary: &mut Dictionary,
        file_key: &str,
        entries: &Entries,
        target: &str,
        report: &mut FileReport,
    ) -> PipelineResult<usize> {
        let required = [target.to_string()];
        let (positions, texts): (Vec<&String>, Vec<String>) = entries
            .iter()
            .filter(|(position, _)| {
                !dictionary
                    .get_stale_locales(file_key, position, &required)
                    .is_empty()
            })
            .map(|(position, text)| (position, text.clone()))
            .unzip();

        if texts.is_empty() {
            debug!(file = file_key, target, "Nothing to translate");
            return Ok(0);
        }

        let translate_error = |source| PipelineError::Translate {
            file_key: file_key.to_string(),
            locale: target.to_string(),
            source,
        };

        debug!(
            file = file_key,
            target,
            count = texts.len(),
            provider = self.translator.provider_name(),
            "Translating stale entries"
        );
        let translations = self
            .translator
            .translate_batch(&texts, &self.source_locale, target)
            .await
            .map_err(translate_error)?;
        ensure_batch_len(texts.len(), &translations).map_err(translate_error)?;

        for (position, translation) in positions.into_iter().zip(translations) {
            if let Err(error) = dictionary.set_translation(file_key, position, target, &translation)
            {
                let message = match error {
                    SetTranslationError::MissingEntry => "entry vanished before translation",
                    SetTranslationError::SourceLocale => "target is the source locale",
                    SetTranslationError::UnknownSourceLocale => "source locale of the entry is unknown",
                };
                warn!(file = file_key, position = %position, target, reason = message, "Dropped translation");
                report.warnings.push(PipelineWarning {
                    file_key: file_key.to_string(),
                    position_key: Some(position.clone()),
                    stage: "dictionary".to_string(),
                    message: message.to_string(),
                });
            }
        }

        Ok(texts.len())
    }
}

/// Entries for `target`, falling back to the source text where the
/// dictionary has nothing
fn target_entries(
    dictionary: &Dictionary,
    file_key: &str,
    entries: &Entries,
    target: &str,
) -> Entries {
    entries
        .iter()
        .map(|(position, source_text)| {
            let text = dictionary
                .get(file_key, position)
                .and_then(|entry| entry.get(target))
                .unwrap_or(source_text);
            (position.clone(), text.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loaders::{BucketOptions, DocumentFormat, create_loader};
    use crate::providers::{MockMode, MockTranslator};
    use std::collections::HashMap;

    const DOC: &str = "# Title\n\nSome content.\n\n!params\n\n!! parameter_name\n\n!type string";

    fn markdown_loader() -> BoxedLoader<String, Entries> {
        create_loader(
            DocumentFormat::Markdown,
            &BucketOptions {
                locked_patterns: vec!["^!.*$".to_string()],
                locked_keys: vec![],
            },
        )
        .unwrap()
    }

    fn french_mock() -> MockTranslator {
        let mut map = HashMap::new();
        map.insert(("# Title".to_string(), "fr".to_string()), "# Titre".to_string());
        map.insert(
            ("Some content.".to_string(), "fr".to_string()),
            "Du contenu.".to_string(),
        );
        MockTranslator::new(MockMode::Mappings(map))
    }

    fn pipeline(mock: &MockTranslator, targets: &[&str]) -> LocalizationPipeline {
        let targets: Vec<String> = targets.iter().map(|t| t.to_string()).collect();
        LocalizationPipeline::new(Arc::new(mock.clone()), "en", &targets).unwrap()
    }

    #[tokio::test]
    async fn test_locked_lines_survive_translation() {
        let mock = french_mock();
        let mut dictionary = Dictionary::new();
        let mut loader = markdown_loader();

        let localized = pipeline(&mock, &["fr"])
            .localize_document(&mut dictionary, "doc.md", &mut loader, DOC)
            .await
            .unwrap();

        assert_eq!(
            localized.outputs["fr"],
            "# Titre\n\nDu contenu.\n\n!params\n\n!! parameter_name\n\n!type string"
        );
        // Only the two prose blocks reached the translator
        assert_eq!(mock.submitted(), 2);
        assert_eq!(localized.report.entries, 2);
        assert_eq!(localized.report.translated, 2);
        assert_eq!(dictionary.get("doc.md", "0").unwrap().get("fr"), Some("# Titre"));
    }

    #[tokio::test]
    async fn test_second_run_reuses_translations() {
        let mock = french_mock();
        let pipeline = pipeline(&mock, &["fr"]);
        let mut dictionary = Dictionary::new();

        pipeline
            .localize_document(&mut dictionary, "doc.md", &mut markdown_loader(), DOC)
            .await
            .unwrap();
        let second = pipeline
            .localize_document(&mut dictionary, "doc.md", &mut markdown_loader(), DOC)
            .await
            .unwrap();

        assert_eq!(mock.submitted(), 2);
        assert_eq!(second.report.translated, 0);
        assert_eq!(second.report.reused, 2);
    }

    #[tokio::test]
    async fn test_changed_paragraph_is_retranslated_alone() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let pipeline = pipeline(&mock, &["fr", "de"]);
        let mut dictionary = Dictionary::new();

        pipeline
            .localize_document(&mut dictionary, "doc.md", &mut markdown_loader(), "One\n\nTwo\n")
            .await
            .unwrap();
        assert_eq!(mock.submitted(), 4);

        let localized = pipeline
            .localize_document(&mut dictionary, "doc.md", &mut markdown_loader(), "One\n\nTwo!\n")
            .await
            .unwrap();
        assert_eq!(mock.submitted(), 6);
        assert_eq!(localized.report.translated, 2);
        assert_eq!(localized.report.reused, 2);
        assert_eq!(localized.outputs["fr"], "One_fr\n\nTwo!_fr\n");
        assert_eq!(localized.outputs["de"], "One_de\n\nTwo!_de\n");
    }

    #[tokio::test]
    async fn test_removed_paragraph_is_pruned() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let pipeline = pipeline(&mock, &["fr"]);
        let mut dictionary = Dictionary::new();

        pipeline
            .localize_document(&mut dictionary, "doc.md", &mut markdown_loader(), "A\n\nB\n\nC")
            .await
            .unwrap();
        let localized = pipeline
            .localize_document(&mut dictionary, "doc.md", &mut markdown_loader(), "A\n\nB")
            .await
            .unwrap();

        assert_eq!(localized.report.pruned, vec!["2"]);
        assert!(dictionary.get("doc.md", "2").is_none());
    }

    #[tokio::test]
    async fn test_translator_failure_returns_no_outputs() {
        let mock = MockTranslator::new(MockMode::Error("quota exceeded".to_string()));
        let mut dictionary = Dictionary::new();

        let result = pipeline(&mock, &["fr"])
            .localize_document(&mut dictionary, "doc.md", &mut markdown_loader(), DOC)
            .await;

        match result {
            Err(PipelineError::Translate { file_key, locale, .. }) => {
                assert_eq!(file_key, "doc.md");
                assert_eq!(locale, "fr");
            }
            other => panic!("Expected Translate error, got {:?}", other),
        }
        // Source entries are registered even though nothing was translated
        assert_eq!(dictionary.entries("doc.md").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_source_fails_pull() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let mut loader = create_loader(DocumentFormat::Json, &BucketOptions::default()).unwrap();
        let mut dictionary = Dictionary::new();

        let result = pipeline(&mock, &["fr"])
            .localize_document(&mut dictionary, "en.json", &mut loader, "{ broken")
            .await;
        assert!(matches!(result, Err(PipelineError::Pull { .. })));
        assert_eq!(mock.submitted(), 0);
    }

    #[test]
    fn test_new_canonicalizes_and_dedups_targets() {
        let mock = MockTranslator::new(MockMode::NoOp);
        let targets = vec![
            "fr_ca".to_string(),
            "fr-CA".to_string(),
            "en".to_string(),
            "zh_hans".to_string(),
        ];
        let pipeline = LocalizationPipeline::new(Arc::new(mock), "en", &targets).unwrap();
        assert_eq!(pipeline.target_locales(), ["fr-CA", "zh-Hans"]);

        let invalid = LocalizationPipeline::new(
            Arc::new(MockTranslator::new(MockMode::NoOp)),
            "english",
            &[],
        );
        assert!(invalid.is_err());
    }
}
