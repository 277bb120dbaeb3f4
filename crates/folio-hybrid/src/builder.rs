use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use folio_core::error::{Error, Result};
use folio_core::traits::Embedder;
use folio_core::types::Chunk;
use folio_text::LexicalIndex;
use folio_vector::VectorIndex;

use crate::store::{corpus_fingerprint, CorpusIndex, Manifest};

/// Turns an ordered chunk list into the three index structures.
pub struct IndexBuilder<'a> {
    embedder: &'a dyn Embedder,
    batch_size: usize,
    progress: ProgressBar,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(embedder: &'a dyn Embedder, batch_size: usize) -> Self {
        Self { embedder, batch_size: batch_size.max(1), progress: ProgressBar::hidden() }
    }

    /// Draw a progress bar on stderr while embedding.
    pub fn with_progress(mut self) -> Self {
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}",
        )
        .map(|s| s.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        self.progress = ProgressBar::new(0);
        self.progress.set_style(style);
        self
    }

    /// Embed every chunk text in batches, rows in chunk order.
    pub fn embed_all(&self, chunks: &[Chunk]) -> Result<VectorIndex> {
        if chunks.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        let start = Instant::now();
        let dim = self.embedder.dim();
        self.progress.set_length(chunks.len() as u64);
        self.progress.set_position(0);
        self.progress.set_message("embedding");
        let mut rows = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts).map_err(|e| Error::Embedding(format!("{e:#}")))?;
            if vectors.len() != batch.len() {
                return Err(Error::Embedding(format!(
                    "embedder returned {} vectors for {} texts",
                    vectors.len(),
                    batch.len()
                )));
            }
            if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
                return Err(Error::Embedding(format!("embedder returned {} dimensions, expected {dim}", bad.len())));
            }
            rows.extend(vectors);
            self.progress.inc(batch.len() as u64);
        }
        self.progress.finish_with_message("embedded");
        info!(
            chunks = chunks.len(),
            dim,
            embedder = %self.embedder.embedder_id(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "embedded corpus"
        );
        VectorIndex::from_rows(rows)
    }

    pub(crate) fn manifest(&self, chunks: &[Chunk]) -> Manifest {
        Manifest::new(chunks.len(), self.embedder.dim(), self.embedder.embedder_id(), corpus_fingerprint(chunks))
    }

    /// Build a complete index held only in memory.
    pub fn build_in_memory(&self, chunks: &[Chunk]) -> Result<CorpusIndex> {
        let lexical = LexicalIndex::create_in_ram(chunks)?;
        let vectors = self.embed_all(chunks)?;
        let metas = chunks.iter().map(Chunk::meta).collect();
        CorpusIndex::from_parts(lexical, vectors, metas, self.manifest(chunks))
    }
}
