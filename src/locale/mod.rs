/// Locale Identifier Model
///
/// Parses, validates and normalizes locale codes of the form
/// `language[-script][-region]`. Every other part of the engine keys its data
/// by the canonical strings produced here, so two spellings of the same locale
/// (`en_US`, `en-us`, `en-US`) always land on the same dictionary slot.
///
/// # Example
///
/// ```ignore
/// use banana_l10n::locale::{parse_locale, resolve_locale_code};
///
/// let components = parse_locale("zh_hans_cn")?;
/// assert_eq!(components.to_string(), "zh-Hans-CN");
/// assert_eq!(resolve_locale_code("en")?, "en-US");
/// ```
pub mod codes;
pub mod parser;

pub use codes::{
    get_locale_code_delimiter, is_valid_locale_code, locale_codes_full, locale_codes_short,
    normalize_locale, resolve_locale_code, resolve_overridden_locale,
};
pub use parser::{
    LocaleComponents, LocaleDelimiter, ParseResult, get_language_code, get_region_code,
    get_script_code, parse_locale, parse_locale_value, parse_locale_with_details,
};
