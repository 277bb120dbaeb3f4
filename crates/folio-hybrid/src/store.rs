//! Persisted form of a corpus index.
//!
//! ```text
//! <index_dir>/
//!   manifest.json   format version, counts, embedder identity, corpus fingerprint
//!   lexical/        tantivy index, document `row` = chunk row
//!   vectors.bin     (rows, dim) unit-length f32 matrix
//!   metadata.json   chunk metadata in row order
//! ```
//!
//! A build writes everything into a staging sibling directory and swaps it
//! into place with directory renames, so readers see either the old index or
//! the complete new one.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{info, warn};

use folio_core::error::{Error, Result};
use folio_core::types::{Chunk, ChunkMeta};
use folio_text::LexicalIndex;
use folio_vector::codec::{read_vectors, write_vectors};
use folio_vector::VectorIndex;

use crate::builder::IndexBuilder;

pub const FORMAT_VERSION: u32 = 1;

const MANIFEST_FILE: &str = "manifest.json";
const LEXICAL_DIR: &str = "lexical";
const LEXICAL_META: &str = "lexical/meta.json";
const VECTORS_FILE: &str = "vectors.bin";
const METADATA_FILE: &str = "metadata.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    pub chunk_count: usize,
    pub embedding_dim: usize,
    pub embedder_id: String,
    /// blake3 over chunk ids and texts in row order.
    pub corpus_fingerprint: String,
    pub built_at: DateTime<Utc>,
}

impl Manifest {
    pub fn new(chunk_count: usize, embedding_dim: usize, embedder_id: String, corpus_fingerprint: String) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            chunk_count,
            embedding_dim,
            embedder_id,
            corpus_fingerprint,
            built_at: Utc::now(),
        }
    }
}

/// Fingerprint of the ordered corpus, used to detect a chunk file that no
/// longer matches the index built from it.
pub fn corpus_fingerprint(chunks: &[Chunk]) -> String {
    let mut hasher = blake3::Hasher::new();
    for chunk in chunks {
        hasher.update(chunk.chunk_id.as_bytes());
        hasher.update(&[0x1f]);
        hasher.update(chunk.text.as_bytes());
        hasher.update(&[0x1e]);
    }
    hasher.finalize().to_hex().to_string()
}

/// The three aligned index structures plus the manifest describing them.
/// Row `i` means the same chunk in every part.
pub struct CorpusIndex {
    pub lexical: LexicalIndex,
    pub vectors: VectorIndex,
    pub metas: Vec<ChunkMeta>,
    pub manifest: Manifest,
}

impl CorpusIndex {
    pub(crate) fn from_parts(
        lexical: LexicalIndex,
        vectors: VectorIndex,
        metas: Vec<ChunkMeta>,
        manifest: Manifest,
    ) -> Result<Self> {
        let expected = manifest.chunk_count;
        for (part, len) in [("metadata", metas.len()), ("vector matrix", vectors.len()), ("lexical index", lexical.len())] {
            if len != expected {
                return Err(Error::IndexCorrupt(format!("{part} has {len} rows, manifest records {expected}")));
            }
        }
        if vectors.dim() != manifest.embedding_dim {
            return Err(Error::IndexCorrupt(format!(
                "vector matrix has {} dimensions, manifest records {}",
                vectors.dim(),
                manifest.embedding_dim
            )));
        }
        Ok(Self { lexical, vectors, metas, manifest })
    }

    pub fn len(&self) -> usize {
        self.metas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }
}

/// On-disk home of one corpus index.
#[derive(Debug, Clone)]
pub struct IndexStore {
    dir: PathBuf,
}

impl IndexStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Build and publish a fresh index for `chunks`, replacing any existing
    /// one, then load it back.
    pub fn build(&self, chunks: &[Chunk], builder: &IndexBuilder<'_>) -> Result<CorpusIndex> {
        if chunks.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        let start = Instant::now();
        let staging = self.sibling("staging")?;
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(&staging)?;
        if let Err(e) = write_artifacts(&staging, chunks, builder) {
            if let Err(cleanup) = fs::remove_dir_all(&staging) {
                warn!(path = %staging.display(), error = %cleanup, "could not remove staging directory");
            }
            return Err(e);
        }
        self.publish(&staging)?;
        info!(
            dir = %self.dir.display(),
            chunks = chunks.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "published index"
        );
        self.load()
    }

    /// Load every artifact, failing on the first missing or inconsistent one.
    pub fn load(&self) -> Result<CorpusIndex> {
        let manifest = self.read_manifest()?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(Error::IndexCorrupt(format!(
                "index format version {} is not supported (expected {FORMAT_VERSION})",
                manifest.format_version
            )));
        }
        for artifact in [LEXICAL_META, VECTORS_FILE, METADATA_FILE] {
            self.require(artifact)?;
        }
        let metas: Vec<ChunkMeta> = read_json(&self.dir.join(METADATA_FILE))?;
        let vectors = read_vectors(&self.dir.join(VECTORS_FILE))?;
        let lexical = LexicalIndex::open(&self.dir.join(LEXICAL_DIR)).map_err(|e| match e {
            Error::Lexical(msg) => Error::IndexCorrupt(format!("lexical index: {msg}")),
            other => other,
        })?;
        let index = CorpusIndex::from_parts(lexical, vectors, metas, manifest)?;
        info!(dir = %self.dir.display(), chunks = index.len(), dim = index.vectors.dim(), "loaded index");
        Ok(index)
    }

    pub fn read_manifest(&self) -> Result<Manifest> {
        self.require(MANIFEST_FILE)?;
        read_json(&self.dir.join(MANIFEST_FILE))
    }

    fn require(&self, artifact: &str) -> Result<()> {
        if self.dir.join(artifact).exists() {
            Ok(())
        } else {
            Err(Error::IndexMissing { artifact: artifact.to_string(), dir: self.dir.clone() })
        }
    }

    fn sibling(&self, suffix: &str) -> Result<PathBuf> {
        let name = self
            .dir
            .file_name()
            .ok_or_else(|| Error::InvalidConfig(format!("index_dir {} has no directory name", self.dir.display())))?;
        let parent = self.dir.parent().unwrap_or_else(|| Path::new(""));
        Ok(parent.join(format!(".{}.{suffix}", name.to_string_lossy())))
    }

    fn publish(&self, staging: &Path) -> Result<()> {
        let previous = self.sibling("previous")?;
        if previous.exists() {
            fs::remove_dir_all(&previous)?;
        }
        let replacing = self.dir.exists();
        if replacing {
            fs::rename(&self.dir, &previous)?;
        }
        if let Err(e) = fs::rename(staging, &self.dir) {
            if replacing {
                if let Err(restore) = fs::rename(&previous, &self.dir) {
                    warn!(error = %restore, "could not restore previous index");
                }
            }
            return Err(e.into());
        }
        if replacing {
            if let Err(e) = fs::remove_dir_all(&previous) {
                warn!(path = %previous.display(), error = %e, "could not remove previous index");
            }
        }
        Ok(())
    }
}

fn write_artifacts(dir: &Path, chunks: &[Chunk], builder: &IndexBuilder<'_>) -> Result<()> {
    let vectors = builder.embed_all(chunks)?;
    LexicalIndex::create_in_dir(&dir.join(LEXICAL_DIR), chunks)?;
    write_vectors(&dir.join(VECTORS_FILE), &vectors)?;
    let metas: Vec<ChunkMeta> = chunks.iter().map(Chunk::meta).collect();
    write_json(&dir.join(METADATA_FILE), &metas)?;
    // Written last: a directory without a manifest is never loadable.
    write_json(&dir.join(MANIFEST_FILE), &builder.manifest(chunks))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut out, value)?;
    out.flush()?;
    out.get_ref().sync_all()?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(File::open(path)?);
    serde_json::from_reader(reader).map_err(|e| Error::IndexCorrupt(format!("{}: {e}", path.display())))
}
