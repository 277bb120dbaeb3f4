//! Plumbing shared by the `folio` and `folio-indexer` binaries: settings,
//! logging, and the build/open steps both of them run.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use folio_core::config::{Config, DataPaths, Settings};
use folio_core::corpus::load_chunks;
use folio_core::error::Error;
use folio_core::traits::Embedder;
use folio_embed::get_default_embedder;
use folio_hybrid::{CorpusIndex, IndexBuilder, IndexStore, RetrievalContext};

pub mod render;

/// Log to stderr, `info` unless `RUST_LOG` says otherwise.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

/// 2 when rebuilding the index is the remedy, 1 otherwise.
pub fn exit_status(err: &anyhow::Error) -> u8 {
    let rebuild = err.chain().filter_map(|e| e.downcast_ref::<Error>()).any(Error::needs_rebuild);
    if rebuild { 2 } else { 1 }
}

pub fn report(err: &anyhow::Error) -> ExitCode {
    eprintln!("❌ {err:#}");
    ExitCode::from(exit_status(err))
}

pub struct App {
    pub settings: Settings,
    pub paths: DataPaths,
}

impl App {
    pub fn load() -> Result<Self> {
        let config = Config::load().context("loading configuration")?;
        Self::from_config(&config)
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let settings = config.settings()?;
        let paths = settings.data.resolve(config.base_dir());
        Ok(Self { settings, paths })
    }

    /// Override the configured locations from command-line flags.
    pub fn with_paths(mut self, chunks_path: Option<PathBuf>, index_dir: Option<PathBuf>) -> Self {
        if let Some(p) = chunks_path {
            self.paths.chunks_path = p;
        }
        if let Some(p) = index_dir {
            self.paths.index_dir = p;
        }
        self
    }

    pub fn store(&self) -> IndexStore {
        IndexStore::new(&self.paths.index_dir)
    }

    pub fn embedder(&self) -> Result<Box<dyn Embedder>> {
        get_default_embedder(&self.settings.embedding, self.paths.model_dir.as_deref()).context("loading the embedding model")
    }

    /// Embed and index the chunk file, publishing into the index directory.
    pub fn build_index(&self, progress: bool) -> Result<CorpusIndex> {
        let chunks = load_chunks(&self.paths.chunks_path)?;
        let embedder = self.embedder()?;
        let mut builder = IndexBuilder::new(embedder.as_ref(), self.settings.embedding.batch_size);
        if progress {
            builder = builder.with_progress();
        }
        let index = self
            .store()
            .build(&chunks, &builder)
            .with_context(|| format!("building the index in {}", self.paths.index_dir.display()))?;
        Ok(index)
    }

    pub fn open_context(&self) -> Result<RetrievalContext> {
        let embedder = self.embedder()?;
        let ctx = RetrievalContext::open(&self.store(), &self.paths.chunks_path, embedder, self.settings.retrieval.clone())?;
        Ok(ctx)
    }
}
