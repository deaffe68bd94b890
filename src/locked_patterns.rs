//! Locked-pattern extraction and restoration
//!
//! Locked patterns are regular expressions describing spans that must never
//! reach a translator: directives, code markers, identifiers. Extraction swaps
//! every match for a placeholder token derived from the matched text, and
//! restoration swaps the tokens back.
//!
//! Token format: `---LOCKED-PATTERN-{md5 hex of the matched text}---`. The
//! same text always yields the same token, so repeated runs over unchanged
//! input produce identical documents and identical content hashes downstream.
//!
//! Extraction is a pure function over an ordered list of [`Segment`]s. Each
//! pattern is matched against the current working copy (locked spans rendered
//! as their tokens, so `^`/`$` keep their line context), and matches that
//! touch an already locked span are discarded. A locked span is therefore
//! never re-matched by a later pattern.
//!
//! # Example
//!
//! ```ignore
//! use banana_l10n::locked_patterns::{extract, restore};
//!
//! let source = "# Title\n\n!type string";
//! let extraction = extract(source, &["^!.*$".to_string()]);
//! assert!(!extraction.content.contains("!type"));
//! assert_eq!(restore(&extraction.content, &extraction.placeholders), source);
//! ```

use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};
use std::borrow::Cow;
use tracing::{debug, warn};

pub const TOKEN_PREFIX: &str = "---LOCKED-PATTERN-";
pub const TOKEN_SUFFIX: &str = "---";

/// Placeholder token → original text, in first-seen order
pub type PlaceholderMap = IndexMap<String, String>;

/// One node of a segmented document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text that may be translated and may still be matched by later patterns
    Plain(String),
    /// Text that matched a locked pattern, kept verbatim
    Locked(String),
}

impl Segment {
    /// The text this segment contributes to the extracted document
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            Segment::Plain(text) => Cow::Borrowed(text),
            Segment::Locked(text) => Cow::Owned(placeholder_token(text)),
        }
    }
}

/// A pattern that failed to compile and was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPattern {
    pub pattern: String,
    pub message: String,
}

/// Two different locked texts produced the same token
///
/// The first text keeps the token; restoring the second occurrence yields the
/// first text. Reported so the caller can surface it, never silently fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestCollision {
    pub token: String,
    pub existing: String,
    pub incoming: String,
}

/// Result of [`extract`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Document with every locked span replaced by its token
    pub content: String,
    pub placeholders: PlaceholderMap,
    pub segments: Vec<Segment>,
    pub invalid_patterns: Vec<InvalidPattern>,
    pub collisions: Vec<DigestCollision>,
}

/// Token for a locked text
pub fn placeholder_token(text: &str) -> String {
    format!("{}{:x}{}", TOKEN_PREFIX, md5::compute(text.as_bytes()), TOKEN_SUFFIX)
}

/// Compile patterns as multi-line regexes, skipping the ones that fail
pub fn compile_patterns(patterns: &[String]) -> (Vec<Regex>, Vec<InvalidPattern>) {
    let mut compiled = Vec::with_capacity(patterns.len());
    let mut invalid = Vec::new();

    for pattern in patterns {
        match RegexBuilder::new(pattern).multi_line(true).build() {
            Ok(regex) => compiled.push(regex),
            Err(error) => {
                warn!(pattern = %pattern, error = %error, "Skipping invalid locked pattern");
                invalid.push(InvalidPattern {
                    pattern: pattern.clone(),
                    message: error.to_string(),
                });
            }
        }
    }

    (compiled, invalid)
}

/// Split `content` into plain and locked segments
///
/// Patterns are applied in list order. Adjacent plain segments are always
/// merged, so plain and locked segments strictly alternate.
pub fn segment(content: &str, patterns: &[Regex]) -> Vec<Segment> {
    let mut segments = if content.is_empty() {
        Vec::new()
    } else {
        vec![Segment::Plain(content.to_string())]
    };

    for pattern in patterns {
        segments = apply_pattern(segments, pattern);
    }

    segments
}

fn apply_pattern(segments: Vec<Segment>, pattern: &Regex) -> Vec<Segment> {
    // Render the working copy and remember where every segment landed
    let mut haystack = String::new();
    let mut ranges = Vec::with_capacity(segments.len());
    for segment in &segments {
        let start = haystack.len();
        haystack.push_str(&segment.render());
        ranges.push((start, haystack.len()));
    }

    let locked_ranges: Vec<(usize, usize)> = segments
        .iter()
        .zip(&ranges)
        .filter(|(segment, _)| matches!(segment, Segment::Locked(_)))
        .map(|(_, range)| *range)
        .collect();

    let matches: Vec<(usize, usize)> = pattern
        .find_iter(&haystack)
        .map(|m| (m.start(), m.end()))
        .filter(|(start, end)| start < end)
        .filter(|(start, end)| {
            !locked_ranges
                .iter()
                .any(|(locked_start, locked_end)| start < locked_end && locked_start < end)
        })
        .collect();

    if matches.is_empty() {
        return segments;
    }

    let mut result = Vec::with_capacity(segments.len() + matches.len() * 2);
    let mut pending = matches.into_iter().peekable();

    for (segment, (start, end)) in segments.into_iter().zip(ranges) {
        match segment {
            Segment::Locked(_) => result.push(segment),
            Segment::Plain(_) => {
                let mut cursor = start;
                while let Some(&(match_start, match_end)) = pending.peek() {
                    if match_start >= end {
                        break;
                    }
                    if cursor < match_start {
                        push_plain(&mut result, &haystack[cursor..match_start]);
                    }
                    result.push(Segment::Locked(haystack[match_start..match_end].to_string()));
                    cursor = match_end;
                    pending.next();
                }
                if cursor < end {
                    push_plain(&mut result, &haystack[cursor..end]);
                }
            }
        }
    }

    result
}

fn push_plain(segments: &mut Vec<Segment>, text: &str) {
    if let Some(Segment::Plain(last)) = segments.last_mut() {
        last.push_str(text);
    } else {
        segments.push(Segment::Plain(text.to_string()));
    }
}

/// Replace every locked span in `content` with its placeholder token
///
/// Invalid patterns are logged, reported in the result and skipped; the
/// remaining patterns still run.
pub fn extract(content: &str, patterns: &[String]) -> Extraction {
    let (compiled, invalid_patterns) = compile_patterns(patterns);
    Extraction {
        invalid_patterns,
        ..extract_compiled(content, &compiled)
    }
}

/// [`extract`] with patterns that were compiled up front
pub fn extract_compiled(content: &str, patterns: &[Regex]) -> Extraction {
    let segments = segment(content, patterns);

    let mut placeholders = PlaceholderMap::new();
    let mut collisions = Vec::new();
    let mut rendered = String::with_capacity(content.len());

    for segment in &segments {
        if let Segment::Locked(text) = segment {
            let token = placeholder_token(text);
            match placeholders.get(&token) {
                Some(existing) if existing != text => {
                    warn!(token = %token, "Locked pattern digest collision");
                    collisions.push(DigestCollision {
                        token: token.clone(),
                        existing: existing.clone(),
                        incoming: text.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    placeholders.insert(token.clone(), text.clone());
                }
            }
        }
        rendered.push_str(&segment.render());
    }

    debug!(
        locked = placeholders.len(),
        segments = segments.len(),
        "Extracted locked patterns"
    );

    Extraction {
        content: rendered,
        placeholders,
        segments,
        invalid_patterns: Vec::new(),
        collisions,
    }
}

/// Put every locked span back
///
/// Every occurrence of every token is replaced, in map order. Tokens that are
/// absent from `content` are ignored, and so is anything in `content` that
/// looks like a token but is not in the map.
pub fn restore(content: &str, placeholders: &PlaceholderMap) -> String {
    let mut result = content.to_string();
    for (token, original) in placeholders {
        if result.contains(token.as_str()) {
            result = result.replace(token.as_str(), original);
        }
    }
    result
}
