//! Error types for the localization engine
//!
//! Each concern gets its own error enum so callers can match on the failure
//! they care about. Recoverable format problems (bad regex patterns, corrupt
//! dictionary entries) are not errors at all: they travel as warning values
//! alongside successful results.

use crate::providers::ProviderId;
use thiserror::Error;

/// Errors raised while parsing or resolving locale codes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocaleError {
    /// The input was empty or whitespace only
    #[error("Locale cannot be empty")]
    Empty,
    /// The input was not a string (e.g. `null` or a number in a config file)
    #[error("Locale must be a string")]
    NotAString,
    /// The input did not match `language[-_]script?[-_]region?`
    #[error("Invalid locale format: {0}")]
    InvalidFormat(String),
    /// The code is neither a registered short code nor a registered full code
    #[error("Invalid locale code: {0}")]
    UnknownLocaleCode(String),
}

pub type LocaleResult<T> = Result<T, LocaleError>;

/// Errors raised by a single loader stage
#[derive(Error, Debug)]
pub enum LoaderError {
    /// `push` was called on a stage that never saw a `pull`
    #[error("{stage}: push called before pull")]
    PushBeforePull { stage: &'static str },
    /// The input did not have the shape the stage expects
    #[error("{stage}: {message}")]
    InvalidInput {
        stage: &'static str,
        message: String,
    },
    /// A locked key glob does not parse
    #[error("Invalid locked key '{glob}': {source}")]
    InvalidLockedKey {
        glob: String,
        #[source]
        source: globset::Error,
    },
    #[error("Failed to build locked key set: {0}")]
    GlobSetBuild(#[from] globset::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type LoaderResult<T> = Result<T, LoaderError>;

/// Errors raised by translation providers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    /// Provider configuration problem (bad key, bad base URL, 4xx responses)
    #[error("Configuration error: {0}")]
    Config(String),
    /// Transport-level failure
    #[error("Network error: {0}")]
    Network(String),
    /// The provider answered but the answer was unusable
    #[error("Translation error: {0}")]
    Translation(String),
    /// The provider returned a different number of texts than requested
    #[error("Expected {expected} translations, got {actual}")]
    CountMismatch { expected: usize, actual: usize },
}

impl From<reqwest::Error> for TranslateError {
    fn from(error: reqwest::Error) -> Self {
        TranslateError::Network(error.to_string())
    }
}

pub type TranslateResult<T> = Result<T, TranslateError>;

/// A provider needs a credential and none of the sources produced one
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("API key for provider '{provider}' is missing (checked: {})", .checked.join(", "))]
pub struct ProviderKeyMissingError {
    pub provider: ProviderId,
    /// Human readable names of the sources consulted, in precedence order
    pub checked: Vec<String>,
}

/// Errors raised while reading or writing the persisted configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config key '{0}' conflicts with an existing non-table value")]
    KeyConflict(String),
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
}

/// Errors raised while building a provider client
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error(transparent)]
    KeyMissing(#[from] ProviderKeyMissingError),
    #[error(transparent)]
    Client(#[from] TranslateError),
    #[error("Invalid model '{0}', expected 'provider:model'")]
    InvalidModel(String),
}

/// Per-file pipeline failures
///
/// Every variant names the file (and locale or position where relevant) so
/// the surrounding tool can report it without digging into the stage chain.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to extract '{file_key}' ({locale}): {source}")]
    Pull {
        file_key: String,
        locale: String,
        #[source]
        source: LoaderError,
    },
    #[error("Failed to assemble '{file_key}' for {locale}: {source}")]
    Push {
        file_key: String,
        locale: String,
        #[source]
        source: LoaderError,
    },
    #[error("Failed to translate '{file_key}' into {locale}: {source}")]
    Translate {
        file_key: String,
        locale: String,
        #[source]
        source: TranslateError,
    },
    #[error("Dictionary error: {0}")]
    Dictionary(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
