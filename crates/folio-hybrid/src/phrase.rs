//! Exact-phrase detection for verbatim quote lookups.
//!
//! Matching works on a normalized form of both query and chunk text:
//! lowercased, apostrophes removed, every other non-alphanumeric character
//! turned into a space, whitespace collapsed. A chunk matches when its
//! normalized text contains the normalized phrase.

use std::sync::OnceLock;

use regex::Regex;

/// Normalized, space-delimited form used on both sides of a phrase match.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.chars().flat_map(char::to_lowercase) {
        if matches!(c, '\'' | '\u{2018}' | '\u{2019}' | '`') {
            continue;
        }
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else {
            pending_space = true;
        }
    }
    out
}

fn quote_patterns() -> &'static [Regex; 3] {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r#""([^"]+)""#).expect("static pattern"),
            Regex::new(r"\x{201C}([^\x{201D}]+)\x{201D}").expect("static pattern"),
            // Single quotes only at word edges, so contractions stay put.
            Regex::new(r"(?:^|\s)'(.+?)'(?:$|[\s[:punct:]])").expect("static pattern"),
        ]
    })
}

/// Text between the first pair of quotes in `query`, if any.
pub fn quoted(query: &str) -> Option<&str> {
    quote_patterns()
        .iter()
        .find_map(|re| re.captures(query).and_then(|c| c.get(1)))
        .map(|m| m.as_str())
}

/// The normalized phrase a query asks to find verbatim: its quoted part, or
/// the whole query when it is short. `None` when the candidate is shorter
/// than `min_chars` once normalized.
pub fn target(query: &str, min_chars: usize, max_words: usize) -> Option<String> {
    let raw = match quoted(query) {
        Some(q) => q,
        None if query.split_whitespace().count() <= max_words => query,
        None => return None,
    };
    let phrase = normalize(raw);
    (phrase.chars().count() >= min_chars).then_some(phrase)
}

/// Precomputed haystacks for every chunk of a corpus.
#[derive(Debug, Clone)]
pub struct PhraseMatcher {
    haystacks: Vec<String>,
}

impl PhraseMatcher {
    pub fn new<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        let haystacks = texts.into_iter().map(normalize).collect();
        Self { haystacks }
    }

    /// Rows accepted by `keep` whose text contains `phrase`, ascending.
    pub fn matching_rows(&self, phrase: &str, keep: impl Fn(usize) -> bool) -> Vec<usize> {
        self.haystacks
            .iter()
            .enumerate()
            .filter(|(row, hay)| keep(*row) && hay.contains(phrase))
            .map(|(row, _)| row)
            .collect()
    }
}
