//! JSON document stage

use super::{Loader, LoaderContext, PulledState};
use crate::error::{LoaderError, LoaderResult};
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::{CompactFormatter, Formatter, PrettyFormatter, Serializer};
use std::io;

/// Layout of the source document, reused when a changed value is written
#[derive(Debug, Clone, PartialEq, Eq)]
enum Layout {
    /// Single line; `spaced` when separators are `", "` and `": "`
    Compact { spaced: bool },
    /// Multi-line with this indentation unit
    Pretty { indent: String },
}

#[derive(Debug, Clone)]
struct Pulled {
    source: String,
    value: Value,
    layout: Layout,
    /// Whitespace after the closing bracket
    trailing: String,
}

/// Parses a JSON document on pull and serializes it on push
///
/// When the pushed value equals the pulled one, the source text comes back
/// byte for byte, escapes and number spellings included. Otherwise push
/// reuses the source document's layout: single-line in the source's separator
/// style, or pretty-printed with the source's indentation unit.
#[derive(Debug, Default)]
pub struct JsonLoader {
    pulled: PulledState<Pulled>,
}

impl JsonLoader {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Indentation unit of a pretty-printed document, `None` when single-line
fn detect_indent(input: &str) -> Option<String> {
    input.lines().skip(1).find_map(|line| {
        let indent: String = line
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .collect();
        (!indent.is_empty()).then_some(indent)
    })
}

/// Whether the first `:` outside a string literal is followed by a space
fn has_spaced_separators(input: &str) -> bool {
    let mut in_string = false;
    let mut escaped = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            ':' => return chars.next() == Some(' '),
            _ => {}
        }
    }
    false
}

fn detect_layout(input: &str) -> Layout {
    match detect_indent(input) {
        Some(indent) => Layout::Pretty { indent },
        None => Layout::Compact {
            spaced: has_spaced_separators(input),
        },
    }
}

/// Single-line output with `", "` and `": "` separators
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

fn write_with<F: Formatter>(data: &Value, formatter: F) -> LoaderResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
    data.serialize(&mut serializer)?;
    Ok(buffer)
}

impl Loader for JsonLoader {
    type Input = String;
    type Output = Value;

    fn name(&self) -> &'static str {
        "json"
    }

    fn pull(
        &mut self,
        locale: &str,
        input: String,
        ctx: &mut LoaderContext,
    ) -> LoaderResult<Value> {
        let value = if input.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(&input)?
        };

        let layout = detect_layout(&input);
        let trailing = if input.trim().is_empty() {
            String::new()
        } else {
            input[input.trim_end().len()..].to_string()
        };
        self.pulled.record(
            locale,
            ctx,
            Pulled {
                source: input,
                value: value.clone(),
                layout,
                trailing,
            },
        );
        Ok(value)
    }

    fn push(
        &mut self,
        _locale: &str,
        data: Value,
        _ctx: &mut LoaderContext,
    ) -> LoaderResult<String> {
        let pulled = self.pulled.get(self.name())?;
        if data == pulled.value {
            return Ok(pulled.source.clone());
        }

        let bytes = match &pulled.layout {
            Layout::Compact { spaced: false } => write_with(&data, CompactFormatter)?,
            Layout::Compact { spaced: true } => write_with(&data, SpacedFormatter)?,
            Layout::Pretty { indent } => {
                write_with(&data, PrettyFormatter::with_indent(indent.as_bytes()))?
            }
        };

        let mut output = String::from_utf8(bytes).map_err(|e| LoaderError::InvalidInput {
            stage: "json",
            message: e.to_string(),
        })?;
        output.push_str(&pulled.trailing);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn round_trip(input: &str) -> String {
        let mut loader = JsonLoader::new();
        let mut ctx = LoaderContext::new("en.json", "en");
        let value = loader.pull("en", input.to_string(), &mut ctx).unwrap();
        loader.push("en", value, &mut ctx).unwrap()
    }

    /// Pull `input`, replace the string at `pointer` and push
    fn push_changed(input: &str, pointer: &str, text: &str) -> String {
        let mut loader = JsonLoader::new();
        let mut ctx = LoaderContext::new("en.json", "en");
        let mut value = loader.pull("en", input.to_string(), &mut ctx).unwrap();
        *value.pointer_mut(pointer).unwrap() = Value::String(text.to_string());
        loader.push("fr", value, &mut ctx).unwrap()
    }

    #[test]
    fn test_round_trip_two_spaces() {
        let input = "{\n  \"a\": \"x\",\n  \"b\": [\n    1,\n    2\n  ]\n}";
        assert_eq!(round_trip(input), input);
    }

    #[test]
    fn test_round_trip_four_spaces_and_tabs() {
        let input = "{\n    \"a\": {\n        \"b\": \"c\"\n    }\n}";
        assert_eq!(round_trip(input), input);
        let input = "{\n\t\"a\": \"b\"\n}";
        assert_eq!(round_trip(input), input);
    }

    #[test]
    fn test_round_trip_compact() {
        let input = r#"{"z":"last","a":"first"}"#;
        assert_eq!(round_trip(input), input);
    }

    #[test]
    fn test_round_trip_keeps_source_spelling() {
        for input in [
            r#"{"a": "x"}"#,
            r#"{"name": "caf\u00e9"}"#,
            "{\n  \"list\": [1, 2],\n  \"a\": \"x\"\n}",
            r#"{"big": 1e5, "small": 0.50}"#,
        ] {
            assert_eq!(round_trip(input), input);
        }
    }

    #[test]
    fn test_changed_value_keeps_spaced_separators() {
        assert_eq!(
            push_changed(r#"{"a": "x", "b": [1, 2]}"#, "/a", "y"),
            r#"{"a": "y", "b": [1, 2]}"#
        );
        assert_eq!(
            push_changed(r#"{"a":"x","b":[1,2]}"#, "/a", "y"),
            r#"{"a":"y","b":[1,2]}"#
        );
    }

    #[test]
    fn test_changed_value_keeps_indent() {
        let input = "{\n    \"a\": \"x\",\n    \"b\": {\n        \"c\": \"d\"\n    }\n}";
        assert_eq!(
            push_changed(input, "/b/c", "e"),
            "{\n    \"a\": \"x\",\n    \"b\": {\n        \"c\": \"e\"\n    }\n}"
        );
    }

    #[test]
    fn test_changed_value_keeps_trailing_newline() {
        assert_eq!(
            push_changed("{\n  \"a\": \"x\"\n}\n", "/a", "y"),
            "{\n  \"a\": \"y\"\n}\n"
        );
    }

    #[test]
    fn test_spaced_separator_detection_skips_strings() {
        assert!(!has_spaced_separators(r#"{"a: b":"x"}"#));
        assert!(has_spaced_separators(r#"{"a\"": "x"}"#));
        assert!(!has_spaced_separators("[]"));
    }

    #[test]
    fn test_empty_input_is_empty_object() {
        let mut loader = JsonLoader::new();
        let mut ctx = LoaderContext::new("en.json", "en");
        assert_eq!(loader.pull("en", "  ".to_string(), &mut ctx).unwrap(), json!({}));
        assert_eq!(loader.push("en", json!({}), &mut ctx).unwrap(), "  ");
        assert_eq!(
            loader.push("fr", json!({"a": "b"}), &mut ctx).unwrap(),
            r#"{"a":"b"}"#
        );
    }

    #[test]
    fn test_malformed_json_fails_pull() {
        let mut loader = JsonLoader::new();
        let mut ctx = LoaderContext::new("en.json", "en");
        assert!(matches!(
            loader.pull("en", "{\"a\":".to_string(), &mut ctx),
            Err(LoaderError::Json(_))
        ));
    }
}
