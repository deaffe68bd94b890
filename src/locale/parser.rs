//! Locale string parser
//!
//! Grammar: `language[-_]script?[-_]region?` where language is 2-3 letters,
//! script is 4 letters and region is 2 letters or 3 digits. Matching is
//! case-insensitive; the output is always canonical (`zh-Hans-CN`).

use crate::error::{LocaleError, LocaleResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static LOCALE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([a-z]{2,3})(?:[-_]([a-z]{4}))?(?:[-_]([a-z]{2}|[0-9]{3}))?$")
        .expect("valid locale regex")
});

/// Delimiter between locale components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocaleDelimiter {
    #[serde(rename = "-")]
    Hyphen,
    #[serde(rename = "_")]
    Underscore,
}

impl LocaleDelimiter {
    pub fn as_char(self) -> char {
        match self {
            LocaleDelimiter::Hyphen => '-',
            LocaleDelimiter::Underscore => '_',
        }
    }
}

/// Canonical components of a locale code
///
/// `language` is lower-case, `script` title-case and `region` upper-case.
/// Values are immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LocaleComponents {
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl fmt::Display for LocaleComponents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.language)?;
        if let Some(script) = &self.script {
            write!(f, "-{}", script)?;
        }
        if let Some(region) = &self.region {
            write!(f, "-{}", region)?;
        }
        Ok(())
    }
}

impl FromStr for LocaleComponents {
    type Err = LocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_locale(s)
    }
}

/// Outcome of [`parse_locale_with_details`]
///
/// Invalid input is reported as data: `is_valid` is false, `error` carries the
/// message and `components.language` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseResult {
    pub components: LocaleComponents,
    pub delimiter: Option<LocaleDelimiter>,
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Break a locale string into canonical components
///
/// # Errors
///
/// * [`LocaleError::Empty`] for empty or whitespace-only input
/// * [`LocaleError::InvalidFormat`] when the grammar does not match
///
/// # Example
///
/// ```ignore
/// let c = parse_locale("en_US")?;
/// assert_eq!(c.language, "en");
/// assert_eq!(c.region.as_deref(), Some("US"));
/// ```
pub fn parse_locale(locale: &str) -> LocaleResult<LocaleComponents> {
    if locale.trim().is_empty() {
        return Err(LocaleError::Empty);
    }

    let captures = LOCALE_REGEX
        .captures(locale)
        .ok_or_else(|| LocaleError::InvalidFormat(locale.to_string()))?;

    let language = captures
        .get(1)
        .map(|m| m.as_str().to_lowercase())
        .ok_or_else(|| LocaleError::InvalidFormat(locale.to_string()))?;
    let script = captures.get(2).map(|m| title_case(m.as_str()));
    let region = captures.get(3).map(|m| m.as_str().to_uppercase());

    Ok(LocaleComponents {
        language,
        script,
        region,
    })
}

/// Parse a locale that arrived as untyped data (config files, JSON payloads)
///
/// Anything other than a JSON string fails with [`LocaleError::NotAString`].
pub fn parse_locale_value(value: &serde_json::Value) -> LocaleResult<LocaleComponents> {
    match value {
        serde_json::Value::String(locale) => parse_locale(locale),
        _ => Err(LocaleError::NotAString),
    }
}

/// Non-failing variant of [`parse_locale`]
pub fn parse_locale_with_details(locale: &str) -> ParseResult {
    match parse_locale(locale) {
        Ok(components) => {
            let delimiter = if locale.contains('-') {
                Some(LocaleDelimiter::Hyphen)
            } else if locale.contains('_') {
                Some(LocaleDelimiter::Underscore)
            } else {
                None
            };
            ParseResult {
                components,
                delimiter,
                is_valid: true,
                error: None,
            }
        }
        Err(error) => ParseResult {
            components: LocaleComponents::default(),
            delimiter: None,
            is_valid: false,
            error: Some(error.to_string()),
        },
    }
}

pub fn get_language_code(locale: &str) -> LocaleResult<String> {
    Ok(parse_locale(locale)?.language)
}

/// Script subtag, or `None` when the locale has no script
pub fn get_script_code(locale: &str) -> LocaleResult<Option<String>> {
    Ok(parse_locale(locale)?.script)
}

/// Region subtag, or `None` when the locale has no region
pub fn get_region_code(locale: &str) -> LocaleResult<Option<String>> {
    Ok(parse_locale(locale)?.region)
}

fn title_case(script: &str) -> String {
    let mut chars = script.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("en", "en", None, None)]
    #[case("en-US", "en", None, Some("US"))]
    #[case("en_US", "en", None, Some("US"))]
    #[case("zh-Hans-CN", "zh", Some("Hans"), Some("CN"))]
    #[case("zh_Hans_CN", "zh", Some("Hans"), Some("CN"))]
    #[case("sr-Cyrl-RS", "sr", Some("Cyrl"), Some("RS"))]
    #[case("zh-Hant", "zh", Some("Hant"), None)]
    #[case("es-419", "es", None, Some("419"))]
    #[case("fil-PH", "fil", None, Some("PH"))]
    #[case("EN-us", "en", None, Some("US"))]
    #[case("zh-hans-cn", "zh", Some("Hans"), Some("CN"))]
    fn test_parse_locale_components(
        #[case] input: &str,
        #[case] language: &str,
        #[case] script: Option<&str>,
        #[case] region: Option<&str>,
    ) {
        let components = parse_locale(input).unwrap();
        assert_eq!(components.language, language);
        assert_eq!(components.script.as_deref(), script);
        assert_eq!(components.region.as_deref(), region);
    }

    #[rstest]
    #[case("e")]
    #[case("english")]
    #[case("en-")]
    #[case("en-USA1")]
    #[case("en US")]
    #[case("123")]
    #[case(" en")]
    fn test_parse_locale_invalid_format(#[case] input: &str) {
        assert_eq!(
            parse_locale(input),
            Err(LocaleError::InvalidFormat(input.to_string()))
        );
    }

    #[test]
    fn test_parse_locale_empty() {
        assert_eq!(parse_locale(""), Err(LocaleError::Empty));
        assert_eq!(parse_locale("   "), Err(LocaleError::Empty));
    }

    #[test]
    fn test_underscore_and_hyphen_forms_are_equal() {
        assert_eq!(parse_locale("en_US").unwrap(), parse_locale("en-US").unwrap());
    }

    #[test]
    fn test_parse_locale_value_rejects_non_strings() {
        assert_eq!(parse_locale_value(&json!(null)), Err(LocaleError::NotAString));
        assert_eq!(parse_locale_value(&json!(42)), Err(LocaleError::NotAString));
        assert_eq!(
            parse_locale_value(&json!("fr-CA")).unwrap().region.as_deref(),
            Some("CA")
        );
    }

    #[test]
    fn test_parse_with_details_valid() {
        let result = parse_locale_with_details("zh_Hans_CN");
        assert!(result.is_valid);
        assert_eq!(result.delimiter, Some(LocaleDelimiter::Underscore));
        assert_eq!(result.components.to_string(), "zh-Hans-CN");
        assert!(result.error.is_none());

        let result = parse_locale_with_details("es");
        assert!(result.is_valid);
        assert_eq!(result.delimiter, None);
    }

    #[test]
    fn test_parse_with_details_invalid_never_fails() {
        let result = parse_locale_with_details("not a locale");
        assert!(!result.is_valid);
        assert_eq!(result.components.language, "");
        assert_eq!(result.delimiter, None);
        assert!(result.error.unwrap().contains("Invalid locale format"));

        let result = parse_locale_with_details("");
        assert!(!result.is_valid);
        assert_eq!(result.error.as_deref(), Some("Locale cannot be empty"));
    }

    #[test]
    fn test_projections() {
        assert_eq!(get_language_code("fr_CA").unwrap(), "fr");
        assert_eq!(get_script_code("en-US").unwrap(), None);
        assert_eq!(get_script_code("zh-Hant-TW").unwrap().as_deref(), Some("Hant"));
        assert_eq!(get_region_code("es").unwrap(), None);
        assert_eq!(get_region_code("zh-Hans-CN").unwrap().as_deref(), Some("CN"));
        assert!(get_region_code("").is_err());
    }

    #[test]
    fn test_display_and_from_str() {
        let components: LocaleComponents = "sr_latn_rs".parse().unwrap();
        assert_eq!(components.to_string(), "sr-Latn-RS");
    }
}
