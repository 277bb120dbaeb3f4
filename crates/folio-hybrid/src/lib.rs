//! folio-hybrid
//!
//! Hybrid retrieval over a chunked corpus: candidates from the lexical and
//! vector indexes are min-max normalized, fused with fixed weights, boosted
//! when they contain the query's exact phrase, and capped per scene.

pub mod builder;
pub mod diversity;
pub mod eval;
pub mod fusion;
pub mod phrase;
pub mod retriever;
pub mod store;

pub use builder::IndexBuilder;
pub use retriever::RetrievalContext;
pub use store::{CorpusIndex, IndexStore, Manifest};
