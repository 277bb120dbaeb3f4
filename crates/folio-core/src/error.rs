use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Cannot build an index from an empty corpus")]
    EmptyCorpus,

    #[error("Chunk file {0} not found. Run the chunking step first.")]
    CorpusMissing(PathBuf),

    #[error("Malformed chunk file: {0}")]
    Corpus(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Index artifact '{artifact}' not found in {dir}. Rebuild the index with `folio index`.")]
    IndexMissing { artifact: String, dir: PathBuf },

    #[error("Index is inconsistent: {0}. Rebuild the index with `folio index`.")]
    IndexCorrupt(String),

    #[error("Lexical index error: {0}")]
    Lexical(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for the conditions whose remedy is rebuilding the index.
    pub fn needs_rebuild(&self) -> bool {
        matches!(self, Error::IndexMissing { .. } | Error::IndexCorrupt(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
