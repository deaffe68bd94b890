//! Loader pipeline
//!
//! A loader turns a raw document into a normalized representation (`pull`)
//! and back (`push`). Loaders compose: `a.then(b)` pulls through `a` then `b`
//! and pushes through `b` then `a`, so whatever a stage remembered during its
//! pull (placeholder maps, document skeletons, separators) is still on hand
//! when its own push runs.
//!
//! Stateful stages follow one rule: `push` uses the state recorded by the
//! most recent pull of the default locale, falling back to the most recent
//! pull of any locale. Target files are generated from the source document's
//! shape, not from whatever an old target file looked like.
//!
//! # Example
//!
//! ```ignore
//! use banana_l10n::loaders::*;
//!
//! let mut loader = TextFileLoader::new()
//!     .then(LockedPatternsLoader::new(&["^!.*$".to_string()]))
//!     .then(ParagraphsLoader::new());
//! let mut ctx = LoaderContext::new("docs/index.md", "en");
//!
//! let entries = loader.pull("en", source.to_string(), &mut ctx)?;
//! let output = loader.push("fr", translated_entries, &mut ctx)?;
//! ```

pub mod flat;
pub mod json;
pub mod locked_keys;
pub mod locked_patterns;
pub mod paragraphs;
pub mod text_file;
pub mod unlocalizable;

pub use flat::FlatLoader;
pub use json::JsonLoader;
pub use locked_keys::LockedKeysLoader;
pub use locked_patterns::LockedPatternsLoader;
pub use paragraphs::ParagraphsLoader;
pub use text_file::TextFileLoader;
pub use unlocalizable::UnlocalizableLoader;

use crate::error::{LoaderError, LoaderResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Position key → translatable text
pub type Entries = IndexMap<String, String>;

/// A non-fatal problem noticed by a stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderWarning {
    pub stage: &'static str,
    pub message: String,
}

/// State shared by every stage of one pull/push round for one file
#[derive(Debug, Clone, Default)]
pub struct LoaderContext {
    pub file_key: String,
    pub default_locale: Option<String>,
    pub warnings: Vec<LoaderWarning>,
}

impl LoaderContext {
    pub fn new(file_key: &str, default_locale: &str) -> Self {
        LoaderContext {
            file_key: file_key.to_string(),
            default_locale: Some(default_locale.to_string()),
            warnings: Vec::new(),
        }
    }

    pub fn is_default_locale(&self, locale: &str) -> bool {
        self.default_locale.as_deref() == Some(locale)
    }

    pub fn warn(&mut self, stage: &'static str, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(file = %self.file_key, stage, %message, "Loader warning");
        self.warnings.push(LoaderWarning { stage, message });
    }
}

/// Stage state captured during pull and consumed during push
///
/// A pull of the default locale always replaces the state. Pulls of other
/// locales only fill it in while no default-locale pull has been seen.
#[derive(Debug, Clone)]
pub(crate) struct PulledState<T> {
    value: Option<T>,
    from_default: bool,
}

impl<T> PulledState<T> {
    pub(crate) fn new() -> Self {
        PulledState {
            value: None,
            from_default: false,
        }
    }

    pub(crate) fn record(&mut self, locale: &str, ctx: &LoaderContext, value: T) {
        let is_default = ctx.is_default_locale(locale);
        if is_default || !self.from_default {
            self.value = Some(value);
            self.from_default = is_default;
        }
    }

    pub(crate) fn get(&self, stage: &'static str) -> LoaderResult<&T> {
        self.value
            .as_ref()
            .ok_or(LoaderError::PushBeforePull { stage })
    }
}

impl<T> Default for PulledState<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Rebuild an entry map in `order`, taking held-back values from `held` and
/// everything else from `data`. Keys in `data` that `order` does not know
/// are appended at the end.
pub(crate) fn reinsert_in_order(
    order: &[String],
    held: &Entries,
    mut data: Entries,
) -> Entries {
    let mut result = Entries::with_capacity(order.len().max(data.len()));
    for key in order {
        if let Some(value) = held.get(key) {
            result.insert(key.clone(), value.clone());
        } else if let Some(value) = data.shift_remove(key) {
            result.insert(key.clone(), value);
        }
    }
    result.extend(data);
    result
}

/// One stage of a pull/push pipeline
///
/// For any stage, pushing the unmodified output of a pull for the default
/// locale must reproduce that pull's input.
pub trait Loader: Send {
    type Input;
    type Output;

    /// Stage name used in errors and warnings
    fn name(&self) -> &'static str;

    fn pull(
        &mut self,
        locale: &str,
        input: Self::Input,
        ctx: &mut LoaderContext,
    ) -> LoaderResult<Self::Output>;

    fn push(
        &mut self,
        locale: &str,
        data: Self::Output,
        ctx: &mut LoaderContext,
    ) -> LoaderResult<Self::Input>;
}

impl<L: Loader + ?Sized> Loader for Box<L> {
    type Input = L::Input;
    type Output = L::Output;

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn pull(
        &mut self,
        locale: &str,
        input: Self::Input,
        ctx: &mut LoaderContext,
    ) -> LoaderResult<Self::Output> {
        (**self).pull(locale, input, ctx)
    }

    fn push(
        &mut self,
        locale: &str,
        data: Self::Output,
        ctx: &mut LoaderContext,
    ) -> LoaderResult<Self::Input> {
        (**self).push(locale, data, ctx)
    }
}

pub type BoxedLoader<I, O> = Box<dyn Loader<Input = I, Output = O>>;

/// Two stages chained together; built with [`LoaderExt::then`]
#[derive(Debug)]
pub struct Compose<A, B> {
    first: A,
    second: B,
}

impl<A, B> Loader for Compose<A, B>
where
    A: Loader,
    B: Loader<Input = A::Output>,
{
    type Input = A::Input;
    type Output = B::Output;

    fn name(&self) -> &'static str {
        "compose"
    }

    fn pull(
        &mut self,
        locale: &str,
        input: Self::Input,
        ctx: &mut LoaderContext,
    ) -> LoaderResult<Self::Output> {
        let intermediate = self.first.pull(locale, input, ctx)?;
        self.second.pull(locale, intermediate, ctx)
    }

    fn push(
        &mut self,
        locale: &str,
        data: Self::Output,
        ctx: &mut LoaderContext,
    ) -> LoaderResult<Self::Input> {
        let intermediate = self.second.push(locale, data, ctx)?;
        self.first.push(locale, intermediate, ctx)
    }
}

pub trait LoaderExt: Loader + Sized {
    fn then<B>(self, next: B) -> Compose<Self, B>
    where
        B: Loader<Input = Self::Output>,
    {
        Compose {
            first: self,
            second: next,
        }
    }
}

impl<L: Loader> LoaderExt for L {}

/// Document formats with a ready-made loader chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// Plain text, blocks separated by blank lines
    Text,
    /// Markdown, blocks separated by blank lines
    Markdown,
    /// JSON, string leaves keyed by their `/`-joined path
    Json,
}

impl FromStr for DocumentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(DocumentFormat::Text),
            "markdown" | "md" => Ok(DocumentFormat::Markdown),
            "json" => Ok(DocumentFormat::Json),
            other => Err(format!("Unsupported document format: {}", other)),
        }
    }
}

/// Per-file loader configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketOptions {
    /// Regexes for spans that must never be translated
    #[serde(default)]
    pub locked_patterns: Vec<String>,
    /// Key globs whose values always come from the source locale
    #[serde(default)]
    pub locked_keys: Vec<String>,
}

/// Build the standard chain for a document format
///
/// * text/markdown: text file → locked patterns → paragraphs → locked keys →
///   unlocalizable
/// * json: text file → locked patterns → json → flat → locked keys →
///   unlocalizable
///
/// # Errors
///
/// [`LoaderError::InvalidLockedKey`](crate::error::LoaderError::InvalidLockedKey)
/// when a locked key glob does not parse. Invalid locked patterns are not
/// errors; they are reported as warnings on pull.
pub fn create_loader(
    format: DocumentFormat,
    options: &BucketOptions,
) -> LoaderResult<BoxedLoader<String, Entries>> {
    let head = TextFileLoader::new().then(LockedPatternsLoader::new(&options.locked_patterns));
    let tail = LockedKeysLoader::new(&options.locked_keys)?.then(UnlocalizableLoader::new());

    Ok(match format {
        DocumentFormat::Text | DocumentFormat::Markdown => {
            Box::new(head.then(ParagraphsLoader::new()).then(tail))
        }
        DocumentFormat::Json => Box::new(
            head.then(JsonLoader::new())
                .then(FlatLoader::new())
                .then(tail),
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Uppercases on pull, lowercases on push
    struct Shout;

    impl Loader for Shout {
        type Input = String;
        type Output = String;

        fn name(&self) -> &'static str {
            "shout"
        }

        fn pull(&mut self, _: &str, input: String, _: &mut LoaderContext) -> LoaderResult<String> {
            Ok(input.to_uppercase())
        }

        fn push(&mut self, _: &str, data: String, _: &mut LoaderContext) -> LoaderResult<String> {
            Ok(data.to_lowercase())
        }
    }

    /// Records the order in which stages run
    struct Trace(&'static str);

    impl Loader for Trace {
        type Input = String;
        type Output = String;

        fn name(&self) -> &'static str {
            self.0
        }

        fn pull(&mut self, _: &str, input: String, ctx: &mut LoaderContext) -> LoaderResult<String> {
            ctx.warn(self.0, "pull");
            Ok(format!("{}{}", input, self.0))
        }

        fn push(&mut self, _: &str, data: String, ctx: &mut LoaderContext) -> LoaderResult<String> {
            ctx.warn(self.0, "push");
            Ok(data
                .strip_suffix(self.0)
                .map(str::to_string)
                .unwrap_or(data))
        }
    }

    #[test]
    fn test_compose_pull_forward_push_reverse() {
        let mut loader = Trace("a").then(Trace("b")).then(Trace("c"));
        let mut ctx = LoaderContext::new("f", "en");

        let pulled = loader.pull("en", "x".to_string(), &mut ctx).unwrap();
        assert_eq!(pulled, "xabc");
        let pushed = loader.push("en", pulled, &mut ctx).unwrap();
        assert_eq!(pushed, "x");

        let order: Vec<String> = ctx
            .warnings
            .iter()
            .map(|w| format!("{}:{}", w.stage, w.message))
            .collect();
        assert_eq!(
            order,
            vec!["a:pull", "b:pull", "c:pull", "c:push", "b:push", "a:push"]
        );
    }

    #[test]
    fn test_boxed_loader_composes() {
        let boxed: BoxedLoader<String, String> = Box::new(Shout);
        let mut loader = boxed.then(Trace("t"));
        let mut ctx = LoaderContext::new("f", "en");
        let pulled = loader.pull("en", "hi".to_string(), &mut ctx).unwrap();
        assert_eq!(pulled, "HIt");
        assert_eq!(loader.push("en", pulled, &mut ctx).unwrap(), "hi");
    }

    #[test]
    fn test_context_default_locale() {
        let ctx = LoaderContext::default();
        assert!(!ctx.is_default_locale("en"));
        let ctx = LoaderContext::new("f", "en");
        assert!(ctx.is_default_locale("en"));
        assert!(!ctx.is_default_locale("fr"));
    }

    #[test]
    fn test_document_format_from_str() {
        assert_eq!("md".parse::<DocumentFormat>().unwrap(), DocumentFormat::Markdown);
        assert_eq!("JSON".parse::<DocumentFormat>().unwrap(), DocumentFormat::Json);
        assert!("yaml".parse::<DocumentFormat>().is_err());
    }

    #[test]
    fn test_markdown_chain_round_trip() {
        let source = "# Title\n\nSome content.\n\n!type string\n\n42\n";
        let options = BucketOptions {
            locked_patterns: vec!["^!.*$".to_string()],
            locked_keys: vec![],
        };
        let mut loader = create_loader(DocumentFormat::Markdown, &options).unwrap();
        let mut ctx = LoaderContext::new("doc.md", "en");

        let entries = loader.pull("en", source.to_string(), &mut ctx).unwrap();
        // The locked-only block and the number never reach the translator
        assert_eq!(entries.len(), 2);
        assert_eq!(entries["0"], "# Title");
        assert_eq!(entries["1"], "Some content.");

        assert_eq!(loader.push("en", entries, &mut ctx).unwrap(), source);
    }

    #[test]
    fn test_json_chain_round_trip() {
        let source = "{\n  \"title\": \"Hello\",\n  \"count\": 3,\n  \"nav\": {\n    \"home\": \"Home\",\n    \"url\": \"https://example.com\"\n  }\n}\n";
        let mut loader = create_loader(DocumentFormat::Json, &BucketOptions::default()).unwrap();
        let mut ctx = LoaderContext::new("en.json", "en");

        let entries = loader.pull("en", source.to_string(), &mut ctx).unwrap();
        assert_eq!(entries.keys().collect::<Vec<_>>(), vec!["title", "nav/home"]);

        let mut translated = entries.clone();
        translated.insert("title".to_string(), "Bonjour".to_string());
        translated.insert("nav/home".to_string(), "Accueil".to_string());
        let output = loader.push("fr", translated, &mut ctx).unwrap();
        assert_eq!(
            output,
            "{\n  \"title\": \"Bonjour\",\n  \"count\": 3,\n  \"nav\": {\n    \"home\": \"Accueil\",\n    \"url\": \"https://example.com\"\n  }\n}\n"
        );
    }
}
