use std::path::Path;
use std::time::Instant;

use tracing::{debug, warn};

use folio_core::config::RetrievalConfig;
use folio_core::corpus::load_chunks;
use folio_core::error::{Error, Result};
use folio_core::traits::Embedder;
use folio_core::types::{Chunk, Source};
use folio_text::tokenize;

use crate::diversity::cap_per_key;
use crate::fusion::{apply_phrase_boost, drop_unsupported, rank, CandidatePool};
use crate::phrase::{self, PhraseMatcher};
use crate::store::{corpus_fingerprint, CorpusIndex, IndexStore, Manifest};

/// A loaded corpus index together with everything a query needs: chunk
/// texts, the query embedder and ranking settings. Immutable once built, so
/// one context can serve concurrent queries.
pub struct RetrievalContext {
    index: CorpusIndex,
    texts: Vec<String>,
    works: Vec<String>,
    phrases: PhraseMatcher,
    embedder: Box<dyn Embedder>,
    config: RetrievalConfig,
}

impl RetrievalContext {
    /// Pair `index` with the chunks it was built from. The chunks must match
    /// the index row for row.
    pub fn new(index: CorpusIndex, chunks: Vec<Chunk>, embedder: Box<dyn Embedder>, config: RetrievalConfig) -> Result<Self> {
        config.validate()?;
        if chunks.len() != index.len() {
            return Err(Error::IndexCorrupt(format!(
                "chunk file has {} chunks, index has {}",
                chunks.len(),
                index.len()
            )));
        }
        if let Some((row, chunk)) = chunks.iter().enumerate().find(|(row, c)| c.chunk_id != index.metas[*row].chunk_id) {
            return Err(Error::IndexCorrupt(format!(
                "row {row} is {} in the chunk file but {} in the index",
                chunk.chunk_id, index.metas[row].chunk_id
            )));
        }
        if corpus_fingerprint(&chunks) != index.manifest.corpus_fingerprint {
            return Err(Error::IndexCorrupt("chunk texts changed since the index was built".into()));
        }
        if embedder.dim() != index.vectors.dim() {
            return Err(Error::InvalidConfig(format!(
                "embedder {} produces {} dimensions but the index stores {}",
                embedder.embedder_id(),
                embedder.dim(),
                index.vectors.dim()
            )));
        }
        let embedder_id = embedder.embedder_id();
        if embedder_id != index.manifest.embedder_id {
            warn!(
                index = %index.manifest.embedder_id,
                query = %embedder_id,
                "query embedder differs from the one the index was built with"
            );
        }
        let phrases = PhraseMatcher::new(chunks.iter().map(|c| c.text.as_str()));
        let works = chunks.iter().map(|c| c.work.to_lowercase()).collect();
        let texts = chunks.into_iter().map(|c| c.text).collect();
        Ok(Self { index, texts, works, phrases, embedder, config })
    }

    /// Load the index from `store` and the chunk texts from `chunks_path`.
    pub fn open(store: &IndexStore, chunks_path: &Path, embedder: Box<dyn Embedder>, config: RetrievalConfig) -> Result<Self> {
        let index = store.load()?;
        let chunks = load_chunks(chunks_path)?;
        Self::new(index, chunks, embedder, config)
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub fn manifest(&self) -> &Manifest {
        &self.index.manifest
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Up to `k` sources for `query`, best first, optionally restricted to
    /// works whose title contains `work_filter` (case-insensitive).
    ///
    /// An empty result is not an error.
    pub fn retrieve(&self, query: &str, k: usize, work_filter: Option<&str>) -> Result<Vec<Source>> {
        let start = Instant::now();
        let cfg = &self.config;
        let filter = work_filter.map(|w| w.trim().to_lowercase()).filter(|w| !w.is_empty());
        let keep = |row: usize| filter.as_deref().map_or(true, |f| self.works[row].contains(f));

        if k == 0 {
            return Ok(Vec::new());
        }
        let tokens = tokenize(query);
        let mut hits = self.index.lexical.search(&tokens, cfg.lexical_pool)?;
        let embedding = self.embedder.embed(query).map_err(|e| Error::Embedding(format!("{e:#}")))?;
        hits.extend(self.index.vectors.search(&embedding, cfg.vector_pool)?);
        let pool = CandidatePool::collect(&hits, keep);

        let matched = phrase::target(query, cfg.min_phrase_chars, cfg.max_phrase_words)
            .map(|needle| self.phrases.matching_rows(&needle, keep))
            .unwrap_or_default();
        // Without a lexical hit or a verbatim match, nothing in the corpus
        // supports the query.
        if pool.lexical_hits() == 0 && matched.is_empty() {
            debug!(tokens = tokens.len(), candidates = pool.len(), "no lexical or phrase support");
            return Ok(Vec::new());
        }
        let candidates = pool.len();
        let phrase_matches = matched.len();
        let mut scored = pool.fuse(cfg.lexical_weight, cfg.vector_weight);
        apply_phrase_boost(&mut scored, &matched, cfg.phrase_boost);
        drop_unsupported(&mut scored);

        rank(&mut scored);
        let ranked = scored.len();
        let metas = &self.index.metas;
        let mut kept = cap_per_key(scored, cfg.max_per_scene, |s| metas[s.row].scene_key());
        let scene_capped = ranked - kept.len();
        kept.truncate(k);

        let sources: Vec<Source> = kept
            .into_iter()
            .enumerate()
            .map(|(i, s)| {
                let meta = metas[s.row].clone();
                Source {
                    sid: format!("S{}", i + 1),
                    chunk_id: meta.chunk_id.clone(),
                    meta,
                    text: self.texts[s.row].clone(),
                    score: s.score,
                    breakdown: s.breakdown,
                }
            })
            .collect();
        debug!(
            candidates,
            phrase_matches,
            scene_capped,
            returned = sources.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "retrieve"
        );
        Ok(sources)
    }

    /// [`retrieve`](Self::retrieve) with the configured `top_k` and no filter.
    pub fn retrieve_top(&self, query: &str) -> Result<Vec<Source>> {
        self.retrieve(query, self.config.top_k, None)
    }
}
