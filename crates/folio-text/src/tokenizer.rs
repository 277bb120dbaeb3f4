//! Corpus tokenizer shared by indexing and querying.
//!
//! Lower-cases the text, treats every character other than `a-z`, `0-9` and
//! the apostrophe as a separator, and keeps what remains. Contractions and
//! possessives ("o'er", "hamlet's") stay single tokens. No stopwords, no
//! stemming.

use tantivy::tokenizer::{Token, TokenStream, Tokenizer};

fn is_token_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '\''
}

/// Byte spans of tokens in `text` together with their normalized form.
fn token_spans(text: &str) -> Vec<(usize, usize, String)> {
    let mut spans = Vec::new();
    let mut current = String::new();
    let mut start = 0;
    for (offset, c) in text.char_indices() {
        // A character may lowercase to several; once part of it is in the
        // token, the span covers all of its bytes.
        let mut consumed = false;
        for lc in c.to_lowercase() {
            if is_token_char(lc) {
                if current.is_empty() {
                    start = offset;
                }
                current.push(lc);
                consumed = true;
            } else if !current.is_empty() {
                let end = if consumed { offset + c.len_utf8() } else { offset };
                spans.push((start, end, std::mem::take(&mut current)));
            }
        }
    }
    if !current.is_empty() {
        spans.push((start, text.len(), current));
    }
    spans
}

pub fn tokenize(text: &str) -> Vec<String> {
    token_spans(text).into_iter().map(|(_, _, token)| token).collect()
}

/// [`tokenize`] exposed to tantivy so the index and the query path agree.
#[derive(Clone, Default)]
pub struct PlayTokenizer;

pub struct PlayTokenStream {
    tokens: Vec<Token>,
    cursor: usize,
}

impl Tokenizer for PlayTokenizer {
    type TokenStream<'a> = PlayTokenStream;

    fn token_stream<'a>(&'a mut self, text: &'a str) -> Self::TokenStream<'a> {
        let tokens = token_spans(text)
            .into_iter()
            .enumerate()
            .map(|(position, (offset_from, offset_to, text))| Token {
                offset_from,
                offset_to,
                position,
                text,
                position_length: 1,
            })
            .collect();
        PlayTokenStream { tokens, cursor: 0 }
    }
}

impl TokenStream for PlayTokenStream {
    fn advance(&mut self) -> bool {
        if self.cursor < self.tokens.len() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    fn token(&self) -> &Token {
        &self.tokens[self.cursor - 1]
    }

    fn token_mut(&mut self) -> &mut Token {
        &mut self.tokens[self.cursor - 1]
    }
}
