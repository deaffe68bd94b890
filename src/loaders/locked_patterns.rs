//! Locked-pattern protection as a loader stage

use super::{Loader, LoaderContext};
use crate::error::LoaderResult;
use crate::locked_patterns::{
    InvalidPattern, PlaceholderMap, compile_patterns, extract_compiled, restore,
};
use regex::Regex;

/// Replaces locked spans with placeholder tokens on pull and restores them on
/// push.
///
/// The placeholder map lives in the stage itself and never travels through
/// the translator. Maps from every pull are merged: tokens are derived from
/// the locked text, so a token means the same thing in every locale.
#[derive(Debug)]
pub struct LockedPatternsLoader {
    patterns: Vec<Regex>,
    invalid: Vec<InvalidPattern>,
    placeholders: PlaceholderMap,
}

impl LockedPatternsLoader {
    /// Compile `patterns` once. Invalid ones are skipped and reported as
    /// warnings on every pull.
    pub fn new(patterns: &[String]) -> Self {
        let (patterns, invalid) = compile_patterns(patterns);
        LockedPatternsLoader {
            patterns,
            invalid,
            placeholders: PlaceholderMap::new(),
        }
    }

    /// Every token seen so far and the text it stands for
    pub fn placeholders(&self) -> &PlaceholderMap {
        &self.placeholders
    }
}

impl Loader for LockedPatternsLoader {
    type Input = String;
    type Output = String;

    fn name(&self) -> &'static str {
        "locked-patterns"
    }

    fn pull(
        &mut self,
        _locale: &str,
        input: String,
        ctx: &mut LoaderContext,
    ) -> LoaderResult<String> {
        for invalid in &self.invalid {
            ctx.warn(
                "locked-patterns",
                format!("invalid pattern '{}' skipped: {}", invalid.pattern, invalid.message),
            );
        }

        let extraction = extract_compiled(&input, &self.patterns);
        for collision in &extraction.collisions {
            ctx.warn(
                "locked-patterns",
                format!(
                    "digest collision on {}: '{}' and '{}'",
                    collision.token, collision.existing, collision.incoming
                ),
            );
        }

        for (token, text) in extraction.placeholders {
            match self.placeholders.get(&token) {
                Some(existing) if *existing != text => ctx.warn(
                    "locked-patterns",
                    format!("digest collision on {}: '{}' and '{}'", token, existing, text),
                ),
                Some(_) => {}
                None => {
                    self.placeholders.insert(token, text);
                }
            }
        }

        Ok(extraction.content)
    }

    fn push(
        &mut self,
        _locale: &str,
        data: String,
        _ctx: &mut LoaderContext,
    ) -> LoaderResult<String> {
        Ok(restore(&data, &self.placeholders))
    }
}
