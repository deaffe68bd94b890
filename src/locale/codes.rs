//! Registered locale codes and code rewriting helpers

use super::parser::LocaleDelimiter;
use crate::error::{LocaleError, LocaleResult};
use regex::Regex;
use std::sync::LazyLock;

/// Short code → full codes. The first full code is the default for the
/// language; the order is part of the contract.
const LOCALE_MAP: &[(&str, &[&str])] = &[
    ("ur", &["ur-PK"]),
    ("vi", &["vi-VN"]),
    ("tr", &["tr-TR"]),
    ("ta", &["ta-IN"]),
    ("sr", &["sr-RS", "sr-Latn-RS", "sr-Cyrl-RS"]),
    ("hu", &["hu-HU"]),
    ("he", &["he-IL"]),
    ("et", &["et-EE"]),
    ("el", &["el-GR"]),
    ("da", &["da-DK"]),
    ("az", &["az-AZ"]),
    ("th", &["th-TH"]),
    ("sv", &["sv-SE"]),
    ("en", &["en-US", "en-GB", "en-AU", "en-CA"]),
    ("es", &["es-ES", "es-419", "es-MX", "es-AR"]),
    ("fr", &["fr-FR", "fr-CA", "fr-BE"]),
    ("ca", &["ca-ES"]),
    ("ja", &["ja-JP"]),
    ("kk", &["kk-KZ"]),
    ("de", &["de-DE", "de-AT", "de-CH"]),
    ("pt", &["pt-PT", "pt-BR"]),
    ("it", &["it-IT", "it-CH"]),
    ("ru", &["ru-RU", "ru-BY"]),
    ("uk", &["uk-UA"]),
    ("be", &["be-BY"]),
    ("hi", &["hi-IN"]),
    (
        "zh",
        &[
            "zh-CN",
            "zh-TW",
            "zh-HK",
            "zh-Hans",
            "zh-Hant",
            "zh-Hant-HK",
            "zh-Hant-TW",
            "zh-Hant-CN",
            "zh-Hans-HK",
            "zh-Hans-TW",
            "zh-Hans-CN",
        ],
    ),
    ("ko", &["ko-KR"]),
    ("ar", &["ar-EG", "ar-SA", "ar-AE", "ar-MA"]),
    ("bg", &["bg-BG"]),
    ("cs", &["cs-CZ"]),
    ("nl", &["nl-NL", "nl-BE"]),
    ("pl", &["pl-PL"]),
    ("id", &["id-ID"]),
    ("ms", &["ms-MY"]),
    ("fi", &["fi-FI"]),
    ("eu", &["eu-ES"]),
    ("hr", &["hr-HR"]),
    ("iw", &["iw-IL"]),
    ("km", &["km-KH"]),
    ("lv", &["lv-LV"]),
    ("lt", &["lt-LT"]),
    ("no", &["no-NO", "nb-NO", "nn-NO"]),
    ("ro", &["ro-RO"]),
    ("sk", &["sk-SK"]),
    ("sw", &["sw-TZ", "sw-KE", "sw-UG", "sw-CD", "sw-RW"]),
    ("fa", &["fa-IR"]),
    ("fil", &["fil-PH"]),
    ("pa", &["pa-IN", "pa-PK"]),
    ("bn", &["bn-BD", "bn-IN"]),
    ("ga", &["ga-IE"]),
    ("gl", &["gl-ES"]),
    ("mt", &["mt-MT"]),
    ("sl", &["sl-SI"]),
    ("sq", &["sq-AL"]),
    ("bar", &["bar-DE"]),
    ("nap", &["nap-IT"]),
    ("af", &["af-ZA"]),
    ("uz", &["uz-Latn"]),
    ("so", &["so-SO"]),
    ("ti", &["ti-ET"]),
    ("zgh", &["zgh-MA"]),
    ("tl", &["tl-PH"]),
    ("te", &["te-IN"]),
    ("rw", &["rw-RW"]),
];

static REGION_PREFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z]{2,3}-)r([A-Z])").expect("valid region prefix regex"));

pub fn locale_codes_short() -> impl Iterator<Item = &'static str> {
    LOCALE_MAP.iter().map(|(short, _)| *short)
}

pub fn locale_codes_full() -> impl Iterator<Item = &'static str> {
    LOCALE_MAP.iter().flat_map(|(_, full)| full.iter().copied())
}

/// Resolve a short or full locale code to a full code
///
/// Full codes are returned unchanged. Short codes resolve to the first
/// registered full code for that language, so `en` is always `en-US`.
///
/// # Errors
///
/// [`LocaleError::UnknownLocaleCode`] when the code is not registered.
pub fn resolve_locale_code(code: &str) -> LocaleResult<&'static str> {
    if let Some(full) = locale_codes_full().find(|full| *full == code) {
        return Ok(full);
    }

    LOCALE_MAP
        .iter()
        .find(|(short, _)| *short == code)
        .and_then(|(_, full)| full.first().copied())
        .ok_or_else(|| LocaleError::UnknownLocaleCode(code.to_string()))
}

/// Whether `code` is registered in any accepted spelling
///
/// Accepts short codes, full codes, full codes with an underscore delimiter
/// (`en_US`) and the explicit-region spelling used by Android resources
/// (`en-rUS`).
pub fn is_valid_locale_code(code: &str) -> bool {
    if locale_codes_short().any(|short| short == code) {
        return true;
    }
    locale_codes_full().any(|full| {
        full == code
            || full.replacen('-', "_", 1) == code
            || explicit_region_form(full) == code
    })
}

fn explicit_region_form(full: &str) -> String {
    match full.split_once('-') {
        Some((language, rest)) => format!("{}-r{}", language, rest),
        None => full.to_string(),
    }
}

/// Delimiter used by a locale code, underscore taking priority
pub fn get_locale_code_delimiter(locale: &str) -> Option<LocaleDelimiter> {
    if locale.contains('_') {
        Some(LocaleDelimiter::Underscore)
    } else if locale.contains('-') {
        Some(LocaleDelimiter::Hyphen)
    } else {
        None
    }
}

/// Rewrite a locale code to use `delimiter` between every component
///
/// Codes without a delimiter, or calls without one, are returned unchanged.
pub fn resolve_overridden_locale(locale: &str, delimiter: Option<LocaleDelimiter>) -> String {
    let Some(delimiter) = delimiter else {
        return locale.to_string();
    };
    match get_locale_code_delimiter(locale) {
        Some(current) => locale.replace(current.as_char(), &delimiter.as_char().to_string()),
        None => locale.to_string(),
    }
}

/// Normalize a locale code: underscores become hyphens and the Android
/// explicit-region marker is dropped (`fr-rCA` → `fr-CA`)
pub fn normalize_locale(locale: &str) -> String {
    let hyphenated = locale.replace('_', "-");
    REGION_PREFIX_REGEX
        .replace(&hyphenated, "${1}${2}")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_full_code_unchanged() {
        assert_eq!(resolve_locale_code("en-GB").unwrap(), "en-GB");
        assert_eq!(resolve_locale_code("zh-Hans-CN").unwrap(), "zh-Hans-CN");
    }

    #[test]
    fn test_resolve_short_code_is_deterministic() {
        // Several variants are registered; the first one always wins
        for _ in 0..10 {
            assert_eq!(resolve_locale_code("en").unwrap(), "en-US");
            assert_eq!(resolve_locale_code("zh").unwrap(), "zh-CN");
            assert_eq!(resolve_locale_code("sr").unwrap(), "sr-RS");
        }
        assert_eq!(resolve_locale_code("ja").unwrap(), "ja-JP");
    }

    #[test]
    fn test_resolve_unknown_code() {
        assert_eq!(
            resolve_locale_code("xx"),
            Err(LocaleError::UnknownLocaleCode("xx".to_string()))
        );
        assert!(resolve_locale_code("").is_err());
    }

    #[test]
    fn test_is_valid_locale_code_spellings() {
        assert!(is_valid_locale_code("en"));
        assert!(is_valid_locale_code("en-US"));
        assert!(is_valid_locale_code("en_US"));
        assert!(is_valid_locale_code("en-rUS"));
        assert!(is_valid_locale_code("zh_Hans-CN"));
        assert!(!is_valid_locale_code("en-XX"));
        assert!(!is_valid_locale_code("klingon"));
    }

    #[test]
    fn test_normalize_locale() {
        assert_eq!(normalize_locale("en_US"), "en-US");
        assert_eq!(normalize_locale("fr-rCA"), "fr-CA");
        assert_eq!(normalize_locale("fr_rCA"), "fr-CA");
        assert_eq!(normalize_locale("zh_Hans_CN"), "zh-Hans-CN");
        assert_eq!(normalize_locale("ru-RU"), "ru-RU");
        assert_eq!(normalize_locale("es"), "es");
    }

    #[test]
    fn test_delimiter_detection() {
        assert_eq!(get_locale_code_delimiter("en_US"), Some(LocaleDelimiter::Underscore));
        assert_eq!(get_locale_code_delimiter("en-GB"), Some(LocaleDelimiter::Hyphen));
        assert_eq!(get_locale_code_delimiter("en"), None);
    }

    #[test]
    fn test_resolve_overridden_locale() {
        assert_eq!(
            resolve_overridden_locale("en-US", Some(LocaleDelimiter::Underscore)),
            "en_US"
        );
        assert_eq!(
            resolve_overridden_locale("zh_Hans_CN", Some(LocaleDelimiter::Hyphen)),
            "zh-Hans-CN"
        );
        assert_eq!(resolve_overridden_locale("en-US", None), "en-US");
        assert_eq!(
            resolve_overridden_locale("en", Some(LocaleDelimiter::Underscore)),
            "en"
        );
    }
}
