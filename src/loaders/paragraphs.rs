//! Blank-line separated blocks of a text or markdown document

use super::{Entries, Loader, LoaderContext, PulledState};
use crate::error::LoaderResult;
use regex::Regex;
use std::sync::LazyLock;

static SEPARATOR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\r?\n(?:[ \t]*\r?\n)+").expect("valid paragraph separator regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    /// A block, keyed by ordinal, with its source text as fallback
    Block { key: String, source: String },
    /// The exact whitespace between two blocks
    Separator(String),
}

/// Splits a document into blocks keyed `"0"`, `"1"`, ... and reassembles it
/// with the source document's exact separators
#[derive(Debug, Default)]
pub struct ParagraphsLoader {
    layout: PulledState<Vec<Part>>,
}

impl ParagraphsLoader {
    pub fn new() -> Self {
        Self::default()
    }
}

fn split(input: &str) -> Vec<Part> {
    let mut parts = Vec::new();
    let mut cursor = 0;
    let mut ordinal = 0usize;

    let mut push_block = |parts: &mut Vec<Part>, text: &str| {
        parts.push(Part::Block {
            key: ordinal.to_string(),
            source: text.to_string(),
        });
        ordinal += 1;
    };

    for separator in SEPARATOR_REGEX.find_iter(input) {
        if cursor < separator.start() {
            push_block(&mut parts, &input[cursor..separator.start()]);
        }
        parts.push(Part::Separator(separator.as_str().to_string()));
        cursor = separator.end();
    }
    if cursor < input.len() {
        push_block(&mut parts, &input[cursor..]);
    }

    parts
}

impl Loader for ParagraphsLoader {
    type Input = String;
    type Output = Entries;

    fn name(&self) -> &'static str {
        "paragraphs"
    }

    fn pull(
        &mut self,
        locale: &str,
        input: String,
        ctx: &mut LoaderContext,
    ) -> LoaderResult<Entries> {
        let parts = split(&input);
        let entries = parts
            .iter()
            .filter_map(|part| match part {
                Part::Block { key, source } => Some((key.clone(), source.clone())),
                Part::Separator(_) => None,
            })
            .collect();
        self.layout.record(locale, ctx, parts);
        Ok(entries)
    }

    fn push(
        &mut self,
        locale: &str,
        mut data: Entries,
        ctx: &mut LoaderContext,
    ) -> LoaderResult<String> {
        let layout = self.layout.get(self.name())?;
        let mut output = String::new();

        for part in layout {
            match part {
                Part::Separator(separator) => output.push_str(separator),
                Part::Block { key, source } => match data.shift_remove(key) {
                    Some(text) => output.push_str(&text),
                    None => {
                        ctx.warn(
                            "paragraphs",
                            format!("block {} missing for {}, keeping source text", key, locale),
                        );
                        output.push_str(source);
                    }
                },
            }
        }

        for key in data.keys() {
            ctx.warn("paragraphs", format!("unknown block {} ignored", key));
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pull(input: &str) -> (ParagraphsLoader, LoaderContext, Entries) {
        let mut loader = ParagraphsLoader::new();
        let mut ctx = LoaderContext::new("doc.md", "en");
        let entries = loader.pull("en", input.to_string(), &mut ctx).unwrap();
        (loader, ctx, entries)
    }

    #[test]
    fn test_split_blocks() {
        let (_, _, entries) = pull("# Title\n\nFirst line\nsecond line\n\n\n- item");
        assert_eq!(entries.len(), 3);
        assert_eq!(entries["0"], "# Title");
        assert_eq!(entries["1"], "First line\nsecond line");
        assert_eq!(entries["2"], "- item");
    }

    #[test]
    fn test_round_trip_exact_separators() {
        for input in [
            "",
            "single",
            "a\n\nb",
            "a\r\n\r\nb",
            "a\n  \n\t\nb",
            "\n\nleading",
            "trailing\n\n",
        ] {
            let (mut loader, mut ctx, entries) = pull(input);
            assert_eq!(loader.push("en", entries, &mut ctx).unwrap(), input);
        }
    }

    #[test]
    fn test_push_translated_blocks() {
        let (mut loader, mut ctx, mut entries) = pull("Hello\n\nWorld");
        entries.insert("1".to_string(), "Monde".to_string());
        assert_eq!(loader.push("fr", entries, &mut ctx).unwrap(), "Hello\n\nMonde");
    }

    #[test]
    fn test_missing_block_keeps_source() {
        let (mut loader, mut ctx, mut entries) = pull("Hello\n\nWorld");
        entries.shift_remove("0");
        entries.insert("9".to_string(), "stray".to_string());
        assert_eq!(loader.push("fr", entries, &mut ctx).unwrap(), "Hello\n\nWorld");
        assert_eq!(ctx.warnings.len(), 2);
    }
}
