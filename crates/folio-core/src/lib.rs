//! folio-core
//!
//! Shared vocabulary for the folio workspace: chunk and source types, the
//! error taxonomy, configuration, the embedding trait and chunk-file loading.

pub mod config;
pub mod corpus;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
