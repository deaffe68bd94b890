//! Content-addressed translation dictionary
//!
//! A dictionary maps source files to the translatable entries found in them.
//! Each entry sits at a logical position key (`nav/items/0/label`, `3`, ...)
//! and carries a per-locale content map plus the MD5 hash of its source-locale
//! text. When the source text changes the hash changes, every translated value
//! for that position is dropped, and only those positions go back to the
//! translator. Unchanged positions keep their translations across runs.
//!
//! The persisted form is pretty-printed JSON with insertion order preserved at
//! every level, so successive runs produce small diffs under version control:
//!
//! ```json
//! {
//!   "version": 1,
//!   "files": {
//!     "docs/index.md": {
//!       "entries": {
//!         "0": { "content": { "en": "Hello", "fr": "Bonjour" }, "hash": "8b1a..." }
//!       }
//!     }
//!   }
//! }
//! ```

use crate::error::{PipelineError, PipelineResult};
use crate::locale::parse_locale;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};

/// Version written to and accepted from persisted dictionaries
pub const FORMAT_VERSION: u32 = 1;

/// MD5 hex digest used as the content hash of source text
pub fn content_hash(text: &str) -> String {
    format!("{:x}", md5::compute(text.as_bytes()))
}

/// One translatable string at one position
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DictionaryEntry {
    /// Locale code → text
    pub content: IndexMap<String, String>,
    /// Digest of the most recently observed source-locale text
    pub hash: String,
    /// Source locale, from the last upsert or, for a loaded entry, the locale
    /// whose text matches `hash`; not persisted
    #[serde(skip)]
    source_locale: Option<String>,
}

impl DictionaryEntry {
    pub fn get(&self, locale: &str) -> Option<&str> {
        self.content.get(locale).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileEntries {
    pub entries: IndexMap<String, DictionaryEntry>,
}

/// Outcome of [`Dictionary::upsert_entry`]
#[derive(Debug)]
pub struct Upsert<'a> {
    pub entry: &'a DictionaryEntry,
    /// True when the position is new or its source text changed
    pub changed: bool,
}

/// A persisted entry that could not be loaded
///
/// The entry is left out of the loaded dictionary, so the next pull treats
/// the position as new and translates it again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryWarning {
    pub file_key: String,
    pub position_key: Option<String>,
    pub reason: String,
}

impl fmt::Display for DictionaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.position_key {
            Some(position) => write!(f, "{} [{}]: {}", self.file_key, position, self.reason),
            None => write!(f, "{}: {}", self.file_key, self.reason),
        }
    }
}

/// Rejected [`Dictionary::set_translation`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetTranslationError {
    /// No entry exists at the position
    MissingEntry,
    /// The locale is the entry's source locale; use `upsert_entry` instead
    SourceLocale,
    /// The entry's source locale is not known yet; upsert the source first
    UnknownSourceLocale,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dictionary {
    version: u32,
    files: IndexMap<String, FileEntries>,
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl Dictionary {
    pub fn new() -> Self {
        Dictionary {
            version: FORMAT_VERSION,
            files: IndexMap::new(),
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn file_keys(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn entries(&self, file_key: &str) -> Option<&IndexMap<String, DictionaryEntry>> {
        self.files.get(file_key).map(|file| &file.entries)
    }

    pub fn get(&self, file_key: &str, position_key: &str) -> Option<&DictionaryEntry> {
        self.files.get(file_key)?.entries.get(position_key)
    }

    /// Register the current source text of a position
    ///
    /// * New position: the entry is created with only the source value.
    /// * Changed text: source value and hash are replaced and every other
    ///   locale value is dropped.
    /// * Same text: nothing changes and `changed` is false.
    pub fn upsert_entry(
        &mut self,
        file_key: &str,
        position_key: &str,
        source_locale: &str,
        source_text: &str,
    ) -> Upsert<'_> {
        let hash = content_hash(source_text);
        let entries = &mut self.files.entry(file_key.to_string()).or_default().entries;

        let changed = match entries.get_mut(position_key) {
            Some(entry) if entry.hash == hash => {
                if entry.get(source_locale) != Some(source_text) {
                    entry
                        .content
                        .insert(source_locale.to_string(), source_text.to_string());
                }
                entry.source_locale = Some(source_locale.to_string());
                false
            }
            Some(entry) => {
                debug!(
                    file = file_key,
                    position = position_key,
                    "Source text changed, dropping cached translations"
                );
                entry.content.retain(|locale, _| locale == source_locale);
                entry
                    .content
                    .insert(source_locale.to_string(), source_text.to_string());
                entry.hash = hash;
                entry.source_locale = Some(source_locale.to_string());
                true
            }
            None => {
                let mut content = IndexMap::new();
                content.insert(source_locale.to_string(), source_text.to_string());
                entries.insert(
                    position_key.to_string(),
                    DictionaryEntry {
                        content,
                        hash,
                        source_locale: Some(source_locale.to_string()),
                    },
                );
                true
            }
        };

        // The entry exists at this point in every branch above
        let entry = &entries[position_key];
        Upsert { entry, changed }
    }

    /// Locales from `required` that have no value cached at the position
    ///
    /// Order follows `required`. A missing position is stale for every locale.
    pub fn get_stale_locales(
        &self,
        file_key: &str,
        position_key: &str,
        required: &[String],
    ) -> Vec<String> {
        let entry = self.get(file_key, position_key);
        required
            .iter()
            .filter(|locale| entry.and_then(|e| e.get(locale)).is_none())
            .cloned()
            .collect()
    }

    /// Record a translated value, overwriting any previous one
    ///
    /// Refused for the source locale, and for a loaded entry whose source
    /// locale could not be recovered until the source is upserted again.
    pub fn set_translation(
        &mut self,
        file_key: &str,
        position_key: &str,
        locale: &str,
        text: &str,
    ) -> Result<(), SetTranslationError> {
        let entry = self
            .files
            .get_mut(file_key)
            .and_then(|file| file.entries.get_mut(position_key))
            .ok_or(SetTranslationError::MissingEntry)?;

        match entry.source_locale.as_deref() {
            None => return Err(SetTranslationError::UnknownSourceLocale),
            Some(source) if source == locale => return Err(SetTranslationError::SourceLocale),
            Some(_) => {}
        }

        entry.content.insert(locale.to_string(), text.to_string());
        Ok(())
    }

    /// Drop entries whose position no longer exists in the source document
    ///
    /// Returns the removed position keys.
    pub fn prune_positions<S: AsRef<str>>(&mut self, file_key: &str, keep: &[S]) -> Vec<String> {
        let Some(file) = self.files.get_mut(file_key) else {
            return Vec::new();
        };

        let mut removed = Vec::new();
        file.entries.retain(|position, _| {
            let present = keep.iter().any(|k| k.as_ref() == position);
            if !present {
                removed.push(position.clone());
            }
            present
        });
        removed
    }

    pub fn remove_file(&mut self, file_key: &str) -> bool {
        self.files.shift_remove(file_key).is_some()
    }

    /// Deterministic pretty-printed JSON with a trailing newline
    pub fn serialize(&self) -> PipelineResult<String> {
        let mut json = serde_json::to_string_pretty(self)
            .map_err(|e| PipelineError::Dictionary(e.to_string()))?;
        json.push('\n');
        Ok(json)
    }

    /// Load a persisted dictionary
    ///
    /// Corrupt entries (non-string values, unparseable locale codes, missing or
    /// empty hash) are skipped and reported one by one. A document that is not
    /// JSON, is not an object, or carries an unsupported version is rejected.
    pub fn deserialize(input: &str) -> PipelineResult<(Dictionary, Vec<DictionaryWarning>)> {
        let root: Value =
            serde_json::from_str(input).map_err(|e| PipelineError::Dictionary(e.to_string()))?;
        let root = root
            .as_object()
            .ok_or_else(|| PipelineError::Dictionary("root must be an object".to_string()))?;

        let version = match root.get("version") {
            None => FORMAT_VERSION,
            Some(value) => value
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| PipelineError::Dictionary("version must be a number".to_string()))?,
        };
        if version != FORMAT_VERSION {
            return Err(PipelineError::Dictionary(format!(
                "unsupported dictionary version {} (expected {})",
                version, FORMAT_VERSION
            )));
        }

        let mut dictionary = Dictionary::new();
        let mut warnings = Vec::new();

        let Some(files) = root.get("files") else {
            return Ok((dictionary, warnings));
        };
        let files = files
            .as_object()
            .ok_or_else(|| PipelineError::Dictionary("files must be an object".to_string()))?;

        for (file_key, file) in files {
            let Some(entries) = file.get("entries").and_then(Value::as_object) else {
                warnings.push(DictionaryWarning {
                    file_key: file_key.clone(),
                    position_key: None,
                    reason: "missing entries object".to_string(),
                });
                continue;
            };

            let loaded = &mut dictionary.files.entry(file_key.clone()).or_default().entries;
            for (position_key, raw) in entries {
                match parse_entry(raw) {
                    Ok(entry) => {
                        loaded.insert(position_key.clone(), entry);
                    }
                    Err(reason) => {
                        warnings.push(DictionaryWarning {
                            file_key: file_key.clone(),
                            position_key: Some(position_key.clone()),
                            reason,
                        });
                    }
                }
            }
        }

        for warning in &warnings {
            warn!(%warning, "Skipping corrupt dictionary entry");
        }

        Ok((dictionary, warnings))
    }
}

fn parse_entry(raw: &Value) -> Result<DictionaryEntry, String> {
    let hash = match raw.get("hash") {
        Some(Value::String(hash)) if !hash.is_empty() => hash.clone(),
        Some(_) => return Err("hash must be a non-empty string".to_string()),
        None => return Err("missing hash".to_string()),
    };

    let content = raw
        .get("content")
        .and_then(Value::as_object)
        .ok_or_else(|| "missing content object".to_string())?;

    let mut parsed = IndexMap::with_capacity(content.len());
    for (locale, value) in content {
        if let Err(error) = parse_locale(locale) {
            return Err(format!("unknown locale code '{}': {}", locale, error));
        }
        let text = value
            .as_str()
            .ok_or_else(|| format!("value for '{}' is not a string", locale))?;
        parsed.insert(locale.clone(), text.to_string());
    }

    let source_locale = parsed
        .iter()
        .find(|(_, text)| content_hash(text) == hash)
        .map(|(locale, _)| locale.clone());

    Ok(DictionaryEntry {
        content: parsed,
        hash,
        source_locale,
    })
}
