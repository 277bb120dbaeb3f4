use anyhow::Result;
use std::hash::Hasher;
use twox_hash::XxHash64;

use folio_core::traits::Embedder;

/// Feature-hashing embedder: every lower-cased alphanumeric word adds a signed
/// weight to one bucket. Deterministic and model-free, so texts sharing words
/// land close together. Used for tests and offline development.
pub struct HashEmbedder { dim: usize }

impl HashEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim: dim.max(1) } }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        let lower = text.to_lowercase();
        for word in lower.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            let mut hasher = XxHash64::with_seed(0);
            hasher.write(word.as_bytes());
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            let sign = if (h >> 63) == 0 { 1.0 } else { -1.0 };
            let weight = 0.5 + ((h >> 32) as u32) as f32 / u32::MAX as f32;
            v[idx] += sign * weight;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 { for x in &mut v { *x /= norm; } }
        v
    }
}

impl Embedder for HashEmbedder {
    fn embedder_id(&self) -> String { format!("hash:xxh64:d{}", self.dim) }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { usize::MAX }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}
