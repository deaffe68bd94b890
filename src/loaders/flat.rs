//! Flattens a JSON tree into position-keyed strings

use super::{Entries, Loader, LoaderContext, PulledState};
use crate::error::LoaderResult;
use serde_json::Value;

/// Turns a JSON value into `path → string` entries
///
/// Position keys are the `/`-joined object keys and array indices leading to
/// each string leaf (`nav/items/0/label`), with `~` and `/` inside keys
/// escaped as `~0` and `~1`. Non-string leaves never become entries: they
/// stay in the document skeleton recorded on pull and come back on push.
#[derive(Debug, Default)]
pub struct FlatLoader {
    skeleton: PulledState<Value>,
}

impl FlatLoader {
    pub fn new() -> Self {
        Self::default()
    }
}

fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn join(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{}/{}", prefix, segment)
    }
}

fn flatten(value: &Value, prefix: &str, entries: &mut Entries) {
    match value {
        Value::String(text) => {
            entries.insert(prefix.to_string(), text.clone());
        }
        Value::Object(map) => {
            for (key, child) in map {
                flatten(child, &join(prefix, &escape_segment(key)), entries);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten(child, &join(prefix, &index.to_string()), entries);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

impl Loader for FlatLoader {
    type Input = Value;
    type Output = Entries;

    fn name(&self) -> &'static str {
        "flat"
    }

    fn pull(
        &mut self,
        locale: &str,
        input: Value,
        ctx: &mut LoaderContext,
    ) -> LoaderResult<Entries> {
        let mut entries = Entries::new();
        flatten(&input, "", &mut entries);
        self.skeleton.record(locale, ctx, input);
        Ok(entries)
    }

    fn push(
        &mut self,
        _locale: &str,
        data: Entries,
        ctx: &mut LoaderContext,
    ) -> LoaderResult<Value> {
        let mut document = self.skeleton.get(self.name())?.clone();

        for (key, text) in data {
            // Position keys are JSON pointers without the leading slash
            let pointer = if key.is_empty() {
                String::new()
            } else {
                format!("/{}", key)
            };
            match document.pointer_mut(&pointer) {
                Some(slot) if slot.is_string() => *slot = Value::String(text),
                Some(_) => ctx.warn(
                    "flat",
                    format!("'{}' is not a string in the source document", key),
                ),
                None => ctx.warn(
                    "flat",
                    format!("'{}' does not exist in the source document", key),
                ),
            }
        }

        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "title": "Hello",
            "count": 2,
            "nav": {
                "items": [
                    { "label": "Home", "visible": true },
                    { "label": "About", "visible": null }
                ]
            },
            "a/b": { "c~d": "escaped" }
        })
    }

    #[test]
    fn test_pull_keys() {
        let mut loader = FlatLoader::new();
        let mut ctx = LoaderContext::new("en.json", "en");
        let entries = loader.pull("en", sample(), &mut ctx).unwrap();
        assert_eq!(
            entries.keys().collect::<Vec<_>>(),
            vec!["title", "nav/items/0/label", "nav/items/1/label", "a~1b/c~0d"]
        );
        assert_eq!(entries["a~1b/c~0d"], "escaped");
    }

    #[test]
    fn test_round_trip() {
        let mut loader = FlatLoader::new();
        let mut ctx = LoaderContext::new("en.json", "en");
        let entries = loader.pull("en", sample(), &mut ctx).unwrap();
        assert_eq!(loader.push("en", entries, &mut ctx).unwrap(), sample());
    }

    #[test]
    fn test_push_translations_keeps_non_strings() {
        let mut loader = FlatLoader::new();
        let mut ctx = LoaderContext::new("en.json", "en");
        loader.pull("en", sample(), &mut ctx).unwrap();

        let mut data = Entries::new();
        data.insert("nav/items/1/label".to_string(), "À propos".to_string());
        data.insert("missing/key".to_string(), "ignored".to_string());
        data.insert("count".to_string(), "deux".to_string());
        let document = loader.push("fr", data, &mut ctx).unwrap();

        assert_eq!(document["nav"]["items"][1]["label"], "À propos");
        assert_eq!(document["nav"]["items"][0]["label"], "Home");
        assert_eq!(document["count"], 2);
        assert_eq!(ctx.warnings.len(), 2);
    }

    #[test]
    fn test_root_string() {
        let mut loader = FlatLoader::new();
        let mut ctx = LoaderContext::new("en.json", "en");
        let entries = loader.pull("en", json!("solo"), &mut ctx).unwrap();
        assert_eq!(entries[""], "solo");
        assert_eq!(loader.push("en", entries, &mut ctx).unwrap(), json!("solo"));
    }
}
