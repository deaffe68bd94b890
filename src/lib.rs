//! Localization extraction and round-trip engine
//!
//! Source documents are pulled into flat `position → text` entries, the entries
//! whose text changed since the last run are sent to a translation provider,
//! and one document per target locale is pushed back out with its structure
//! intact.
//!
//! 1. **Locales** - [`locale`] parses and canonicalizes codes like `zh_hans_cn`
//! 2. **Locked patterns** - [`locked_patterns`] swaps spans that must never be
//!    translated for stable tokens and restores them afterwards
//! 3. **Loaders** - [`loaders`] composes pull/push stages per document format
//! 4. **Dictionary** - [`dictionary`] caches translations keyed by content
//!    hash, so unchanged entries are never translated twice
//! 5. **Providers** - [`providers`] resolves credentials and builds clients
//! 6. **Pipeline** - [`pipeline`] runs one file end to end
//!
//! # Example
//!
//! ```ignore
//! use banana_l10n::{Dictionary, LocalizationPipeline};
//! use banana_l10n::loaders::{BucketOptions, DocumentFormat, create_loader};
//! use banana_l10n::providers::{MockMode, MockTranslator};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = LocalizationPipeline::new(
//!         Arc::new(MockTranslator::new(MockMode::Suffix)),
//!         "en",
//!         &["fr".to_string()],
//!     )?;
//!     let options = BucketOptions {
//!         locked_patterns: vec!["^!.*$".to_string()],
//!         locked_keys: vec![],
//!     };
//!     let mut loader = create_loader(DocumentFormat::Markdown, &options)?;
//!     let mut dictionary = Dictionary::new();
//!
//!     let localized = pipeline
//!         .localize_document(&mut dictionary, "README.md", &mut loader, "# Hello\n\n!keep")
//!         .await?;
//!     println!("{}", localized.outputs["fr"]);
//!     Ok(())
//! }
//! ```

pub mod dictionary;
pub mod error;
pub mod loaders;
pub mod locale;
pub mod locked_patterns;
pub mod pipeline;
pub mod providers;


pub use dictionary::{Dictionary, DictionaryEntry, DictionaryWarning};
pub use error::{
    ConfigError, LoaderError, LocaleError, PipelineError, PipelineResult, ProviderError,
    ProviderKeyMissingError, TranslateError,
};
pub use locale::{LocaleComponents, parse_locale};
pub use locked_patterns::{extract, restore};
pub use pipeline::{FileReport, LocalizationPipeline, LocalizedFile, PipelineWarning};
pub use providers::{ProviderId, Translator};
