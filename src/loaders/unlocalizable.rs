//! Values that never need a translator

use super::{Entries, Loader, LoaderContext, PulledState, reinsert_in_order};
use crate::error::LoaderResult;
use crate::locked_patterns::{TOKEN_PREFIX, TOKEN_SUFFIX};
use regex::Regex;
use std::sync::LazyLock;

static NUMBER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?(?:\d+(?:[.,]\d+)*|\.\d+)(?:[eE][-+]?\d+)?%?$").expect("valid number regex")
});

static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:[a-z][a-z0-9+.-]*://|mailto:|www\.)\S+$").expect("valid url regex")
});

static TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        "{}[0-9a-f]{{32}}{}",
        regex::escape(TOKEN_PREFIX),
        regex::escape(TOKEN_SUFFIX)
    );
    Regex::new(&pattern).expect("valid placeholder token regex")
});

/// Whether `value` has nothing a translator could change
///
/// Empty or whitespace-only text, numbers, booleans, URLs and text made only
/// of locked-pattern placeholders.
pub fn is_unlocalizable(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return true;
    }
    if matches!(trimmed.to_lowercase().as_str(), "true" | "false") {
        return true;
    }
    if NUMBER_REGEX.is_match(trimmed) || URL_REGEX.is_match(trimmed) {
        return true;
    }
    TOKEN_REGEX.is_match(trimmed) && TOKEN_REGEX.replace_all(trimmed, "").trim().is_empty()
}

#[derive(Debug, Clone, Default)]
struct Snapshot {
    order: Vec<String>,
    dropped: Entries,
}

/// Drops unlocalizable values on pull and puts the source values back on push
#[derive(Debug, Default)]
pub struct UnlocalizableLoader {
    snapshot: PulledState<Snapshot>,
}

impl UnlocalizableLoader {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Loader for UnlocalizableLoader {
    type Input = Entries;
    type Output = Entries;

    fn name(&self) -> &'static str {
        "unlocalizable"
    }

    fn pull(
        &mut self,
        locale: &str,
        input: Entries,
        ctx: &mut LoaderContext,
    ) -> LoaderResult<Entries> {
        let mut snapshot = Snapshot {
            order: input.keys().cloned().collect(),
            dropped: Entries::new(),
        };
        let mut output = Entries::with_capacity(input.len());

        for (key, value) in input {
            if is_unlocalizable(&value) {
                snapshot.dropped.insert(key, value);
            } else {
                output.insert(key, value);
            }
        }

        tracing::debug!(
            file = %ctx.file_key,
            dropped = snapshot.dropped.len(),
            kept = output.len(),
            "Filtered unlocalizable entries"
        );
        self.snapshot.record(locale, ctx, snapshot);
        Ok(output)
    }

    fn push(
        &mut self,
        _locale: &str,
        data: Entries,
        _ctx: &mut LoaderContext,
    ) -> LoaderResult<Entries> {
        let snapshot = self.snapshot.get(self.name())?;
        Ok(reinsert_in_order(&snapshot.order, &snapshot.dropped, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locked_patterns::placeholder_token;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("42")]
    #[case("-3.5")]
    #[case("1,000,000")]
    #[case("50%")]
    #[case("true")]
    #[case("FALSE")]
    #[case("https://example.com/path?q=1")]
    #[case("mailto:team@example.com")]
    #[case("www.example.com")]
    fn test_unlocalizable_values(#[case] value: &str) {
        assert!(is_unlocalizable(value));
    }

    #[rstest]
    #[case("Hello")]
    #[case("42 apples")]
    #[case("Visit https://example.com")]
    #[case("True story")]
    fn test_localizable_values(#[case] value: &str) {
        assert!(!is_unlocalizable(value));
    }

    #[test]
    fn test_placeholder_only_values() {
        let token = placeholder_token("!params");
        assert!(is_unlocalizable(&token));
        assert!(is_unlocalizable(&format!("{}\n{}", token, token)));
        assert!(!is_unlocalizable(&format!("{} text", token)));
    }

    #[test]
    fn test_dropped_values_reinserted_in_place() {
        let mut loader = UnlocalizableLoader::new();
        let mut ctx = LoaderContext::new("f", "en");
        let source: Entries = [("0", "Title"), ("1", "42"), ("2", "Body"), ("3", "")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let pulled = loader.pull("en", source.clone(), &mut ctx).unwrap();
        assert_eq!(pulled.keys().collect::<Vec<_>>(), vec!["0", "2"]);

        let pushed = loader.push("en", pulled, &mut ctx).unwrap();
        assert_eq!(
            pushed.into_iter().collect::<Vec<_>>(),
            source.into_iter().collect::<Vec<_>>()
        );
    }
}
