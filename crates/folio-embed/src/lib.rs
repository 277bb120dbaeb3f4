//! folio-embed
//!
//! Embedding functions behind [`folio_core::traits::Embedder`]: a candle BERT
//! sentence encoder and a deterministic hashing embedder.

use anyhow::{Result, anyhow};
use std::path::{Path, PathBuf};
use tracing::info;

use folio_core::config::{EmbeddingBackend, EmbeddingSettings};
use folio_core::traits::Embedder;

pub mod bert;
pub mod device;
pub mod hash;
pub mod pool;
pub mod tokenize;

pub use bert::BertEmbedder;
pub use hash::HashEmbedder;
pub use pool::mean_pool_l2;

/// Pick the embedder from settings. `APP_USE_FAKE_EMBEDDINGS=1` forces the
/// hashing backend regardless of configuration.
pub fn get_default_embedder(settings: &EmbeddingSettings, model_dir: Option<&Path>) -> Result<Box<dyn Embedder>> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false);
    if use_fake || settings.backend == EmbeddingBackend::Hash {
        info!(dim = settings.dim, "using hashing embedder");
        return Ok(Box::new(HashEmbedder::new(settings.dim)));
    }
    let dir = resolve_model_dir(model_dir)?;
    Ok(Box::new(BertEmbedder::load(&dir, settings.max_len)?))
}

fn resolve_model_dir(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = configured { if p.exists() { return Ok(p.to_path_buf()); } }
    if let Ok(dir) = std::env::var("APP_MODEL_DIR") { let p = PathBuf::from(&dir); if p.exists() { return Ok(p); } }
    if let Ok(dir) = std::env::var("MODEL_DIR") { let p = PathBuf::from(&dir); if p.exists() { return Ok(p); } }
    let local = Path::new("models/all-MiniLM-L6-v2"); if local.exists() { return Ok(local.to_path_buf()); }
    Err(anyhow!("Could not locate an embedding model directory; set data.model_dir or APP_MODEL_DIR, or use embedding.backend = \"hash\""))
}
