use anyhow::{Result, anyhow, Context};
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use folio_core::traits::Embedder;

use crate::device::select_device;
use crate::pool::mean_pool_l2;
use crate::tokenize::tokenize_on_device;

/// Sentence-transformer style BERT encoder (e.g. all-MiniLM-L6-v2): mean
/// pooling over token states followed by L2 normalization.
///
/// The model directory holds `tokenizer.json`, `config.json` and either
/// `model.safetensors` or `pytorch_model.bin`.
pub struct BertEmbedder { model: BertModel, tokenizer: Tokenizer, device: Device, dim: usize, max_len: usize, id: String }

impl BertEmbedder {
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = select_device();
        info!(model_dir = %model_dir.display(), "loading BERT embedding model");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let config_path = model_dir.join("config.json");
        let raw_config = std::fs::read_to_string(&config_path)
            .with_context(|| format!("reading {}", config_path.display()))?;
        let config: BertConfig = serde_json::from_str(&raw_config)?;
        let dim = serde_json::from_str::<serde_json::Value>(&raw_config)?
            .get("hidden_size")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| anyhow!("{} has no hidden_size", config_path.display()))? as usize;
        let weights = load_weights(model_dir, &device)?;
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model = BertModel::load(vb, &config)?;
        let name = model_dir.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| "bert".to_string());
        let id = format!("bert:{}:d{}", name, dim);
        info!(id = %id, "embedding model loaded");
        Ok(Self { model, tokenizer, device, dim, max_len, id })
    }

    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let (input_ids, attention_mask) = tokenize_on_device(&self.tokenizer, text, self.max_len, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = mean_pool_l2(&hidden, &attention_mask)?;
        let v: Vec<f32> = pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1()?;
        if v.len() != self.dim { return Err(anyhow!("model returned {} dims, expected {}", v.len(), self.dim)); }
        Ok(v)
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        return Ok(candle_core::safetensors::load(&safetensors, device)?);
    }
    let bin = model_dir.join("pytorch_model.bin");
    if bin.exists() {
        let weights = candle_core::pickle::read_all(&bin)?;
        return Ok(weights.into_iter().collect());
    }
    Err(anyhow!("No model.safetensors or pytorch_model.bin in {}", model_dir.display()))
}

impl Embedder for BertEmbedder {
    fn embedder_id(&self) -> String { self.id.clone() }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let start = Instant::now();
        let out = texts.iter().map(|t| self.embed_one(t)).collect::<Result<Vec<_>>>()?;
        debug!(texts = texts.len(), elapsed_ms = start.elapsed().as_millis() as u64, "embedded batch");
        Ok(out)
    }
}
