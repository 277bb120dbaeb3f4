//! folio-text
//!
//! Lexical side of retrieval: the corpus tokenizer and a tantivy-backed BM25
//! index whose documents carry the row number of the chunk they index.

pub mod tantivy_utils;
pub mod tokenizer;
pub mod index;
pub mod search;

pub use index::LexicalIndex;
pub use tokenizer::tokenize;
