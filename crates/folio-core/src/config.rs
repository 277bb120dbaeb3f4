//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`APP_RETRIEVAL__TOP_K=5` sets `retrieval.top_k`). Every key has a default,
//! so an absent config file yields a working setup.
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
    base_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let base_dir = env::current_dir()?;
        let config = Self { figment, base_dir };
        config.settings()?.retrieval.validate()?;
        Ok(config)
    }

    /// Build from an explicit figment (tests, embedding callers).
    pub fn from_figment(figment: Figment, base_dir: impl Into<PathBuf>) -> Self {
        Self { figment, base_dir: base_dir.into() }
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{}': {}", key, e)))
    }

    pub fn settings(&self) -> Result<Settings> {
        self.figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub chunks_path: String,
    pub index_dir: String,
    pub model_dir: Option<String>,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            chunks_path: "data/chunks.jsonl".to_string(),
            index_dir: "index".to_string(),
            model_dir: None,
        }
    }
}

/// Filesystem locations after `~`/`$VAR` expansion and base resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub chunks_path: PathBuf,
    pub index_dir: PathBuf,
    pub model_dir: Option<PathBuf>,
}

impl DataSettings {
    pub fn resolve(&self, base: &Path) -> DataPaths {
        DataPaths {
            chunks_path: resolve_with_base(base, &self.chunks_path),
            index_dir: resolve_with_base(base, &self.index_dir),
            model_dir: self.model_dir.as_ref().map(|p| resolve_with_base(base, p)),
        }
    }
}

/// Tuning for the hybrid ranker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Candidates taken from the lexical signal.
    pub lexical_pool: usize,
    /// Candidates taken from the vector signal.
    pub vector_pool: usize,
    /// Results returned when the caller does not choose.
    pub top_k: usize,
    pub lexical_weight: f32,
    pub vector_weight: f32,
    /// Maximum results sharing one (work, act, scene).
    pub max_per_scene: usize,
    /// Added to the fused score of every chunk containing the query phrase.
    /// Must exceed `lexical_weight + vector_weight` so a phrase hit always
    /// outranks a non-hit.
    pub phrase_boost: f32,
    /// Normalized phrases shorter than this are not boosted.
    pub min_phrase_chars: usize,
    /// An unquoted query is used as a phrase only up to this many words.
    pub max_phrase_words: usize,
}

pub const DEFAULT_PHRASE_BOOST: f32 = 2.0;

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            lexical_pool: 50,
            vector_pool: 50,
            top_k: 8,
            lexical_weight: 0.4,
            vector_weight: 0.6,
            max_per_scene: 3,
            phrase_boost: DEFAULT_PHRASE_BOOST,
            min_phrase_chars: 6,
            max_phrase_words: 10,
        }
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<()> {
        if self.lexical_pool == 0 || self.vector_pool == 0 {
            return Err(Error::InvalidConfig("candidate pool sizes must be at least 1".into()));
        }
        for (name, w) in [("lexical_weight", self.lexical_weight), ("vector_weight", self.vector_weight)] {
            if !w.is_finite() || w < 0.0 {
                return Err(Error::InvalidConfig(format!("{name} must be a non-negative number, got {w}")));
            }
        }
        let weight_sum = self.lexical_weight + self.vector_weight;
        if weight_sum <= 0.0 {
            return Err(Error::InvalidConfig("lexical_weight + vector_weight must be positive".into()));
        }
        if self.max_per_scene == 0 {
            return Err(Error::InvalidConfig("max_per_scene must be at least 1".into()));
        }
        if !self.phrase_boost.is_finite() || self.phrase_boost <= weight_sum {
            return Err(Error::InvalidConfig(format!(
                "phrase_boost ({}) must be greater than lexical_weight + vector_weight ({})",
                self.phrase_boost, weight_sum
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Sentence-transformer BERT model loaded from `data.model_dir`.
    Bert,
    /// Feature-hashing embedder; offline and deterministic.
    Hash,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub backend: EmbeddingBackend,
    /// Dimensionality of the hashing backend; BERT reports its own.
    pub dim: usize,
    pub max_len: usize,
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { backend: EmbeddingBackend::Bert, dim: 384, max_len: 256, batch_size: 64 }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
